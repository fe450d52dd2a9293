use super::codec::{command_reply_len, decode_command_reply};
use super::error::SocksError;
use super::types::{SocksAddress, SocksReply};

#[derive(Debug)]
pub enum ReplyParseStatus {
    NeedMore,
    Complete {
        reply: SocksReply,
        address: SocksAddress,
        consumed: usize,
    },
    Error {
        error: SocksError,
    },
}

/// Accumulates a command reply that arrives across several reads.
///
/// Bytes past the end of the frame belong to the proxied stream and are kept
/// available through [`CommandReplyParser::remaining`].
#[derive(Debug, Default)]
pub struct CommandReplyParser {
    buffer: Vec<u8>,
    consumed: usize,
}

impl CommandReplyParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> ReplyParseStatus {
        self.buffer.extend_from_slice(bytes);
        let frame_len = match command_reply_len(&self.buffer) {
            Ok(Some(len)) => len,
            Ok(None) => return ReplyParseStatus::NeedMore,
            Err(error) => return ReplyParseStatus::Error { error },
        };
        if self.buffer.len() < frame_len {
            return ReplyParseStatus::NeedMore;
        }

        match decode_command_reply(&self.buffer[..frame_len]) {
            Ok((reply, address)) => {
                self.consumed = frame_len;
                ReplyParseStatus::Complete {
                    reply,
                    address,
                    consumed: frame_len,
                }
            }
            Err(error) => ReplyParseStatus::Error { error },
        }
    }

    pub fn remaining(&self) -> &[u8] {
        &self.buffer[self.consumed..]
    }
}
