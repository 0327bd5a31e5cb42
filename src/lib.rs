//! A QUIC (RFC 9000) frame codec: encode and decode the base frame types,
//! and apply the connection-state side effects each frame carries.
//!
//! The entry points a packet processor needs are [`frame::frame_process`]
//! (decode a packet payload, applying side effects to a [`connection::Connection`])
//! and [`frame::frame_create`] (build and encode one outbound frame).
//! Packet-header parsing, packet-number decoding, and the wire crypto layer
//! are out of scope; this crate starts from an already-decrypted payload.

pub mod cid;
pub mod connection;
pub mod flow;
pub mod frame;
pub mod path;
pub mod pnmap;
pub mod rng;
pub mod stream;
pub mod varint;

pub use connection::{CloseDetail, Config, Connection, ConnectionState};
pub use frame::{BuildParams, Frame, FrameType, PacketMeta};
pub use frame::error::Error;
pub use varint::VarInt;
