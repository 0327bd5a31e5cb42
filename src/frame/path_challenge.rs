//! PATH_CHALLENGE (type 0x1a).

use bytes::BytesMut;

use super::{EncodeFrame, FrameType, GetFrameType};
use crate::connection::Connection;
use crate::frame::error::Error;
use crate::varint::{VarInt, WriteVarInt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathChallengeFrame {
    pub entropy: [u8; 8],
}

impl GetFrameType for PathChallengeFrame {
    fn frame_type(&self) -> FrameType {
        FrameType::PathChallenge
    }
}

impl EncodeFrame for PathChallengeFrame {
    fn max_encoding_size(&self) -> usize {
        1 + 8
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_varint(&VarInt::from(self.frame_type()));
        buf.extend_from_slice(&self.entropy);
    }
}

/// Starts validating the peer's (destination) path: draws fresh entropy
/// from the connection's CSPRNG and marks the challenge outstanding.
pub fn build(conn: &mut Connection) -> Result<PathChallengeFrame, Error> {
    let mut entropy = [0u8; 8];
    conn.rng.fill(&mut entropy);
    conn.path.destination.challenge(entropy);
    Ok(PathChallengeFrame { entropy })
}

/// Reflects the challenge back to the sender via a PATH_RESPONSE carrying
/// the same entropy, enqueued ahead of other control traffic since path
/// validation is RTT-sensitive.
pub fn parse<'a>(conn: &mut Connection, input: &'a [u8]) -> Result<(&'a [u8], PathChallengeFrame), Error> {
    let frame_type = FrameType::PathChallenge;
    let (input, entropy_bytes) = super::take(input, 8, frame_type, "truncated entropy")?;
    let mut entropy = [0u8; 8];
    entropy.copy_from_slice(entropy_bytes);

    let response = super::path_response::build(conn, entropy)?;
    conn.enqueue_control(super::Frame::PathResponse(response), true);

    Ok((input, PathChallengeFrame { entropy }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::test_connection;
    use crate::frame::Frame;

    #[test]
    fn build_marks_destination_path_pending() {
        let mut conn = test_connection();
        let frame = build(&mut conn).unwrap();
        assert!(conn.path.destination.pending);
        assert_eq!(conn.path.destination.entropy, frame.entropy);
    }

    #[test]
    fn parse_enqueues_matching_path_response() {
        let mut conn = test_connection();
        let (rest, frame) = parse(&mut conn, &[9; 8]).unwrap();
        assert!(rest.is_empty());
        assert_eq!(frame.entropy, [9; 8]);
        assert_eq!(conn.control_queue.len(), 1);
        match &conn.control_queue[0] {
            Frame::PathResponse(response) => assert_eq!(response.entropy, [9; 8]),
            other => panic!("expected PathResponse, got {other:?}"),
        }
    }
}
