use thiserror::Error;

use super::types::{HandshakeState, SocksReply};

#[derive(Debug, Error)]
pub enum SocksError {
    #[error("unexpected protocol version {0:#04x}")]
    ProtocolVersionMismatch(u8),
    #[error("proxy accepted none of the offered authentication methods")]
    NoAcceptableAuthMethod,
    #[error("proxy selected authentication method {0:#04x}, which was not offered")]
    UnsupportedMethod(u8),
    #[error("proxy rejected the username/password credentials")]
    AuthenticationFailed,
    #[error("credential field is {0} bytes, limit is 255")]
    CredentialTooLong(usize),
    #[error("domain name is {0} bytes, limit is 255")]
    AddressTooLong(usize),
    #[error("unsupported address type {0:#04x}")]
    UnsupportedAddressType(u8),
    #[error("malformed reply: needed {needed} bytes, {available} available")]
    MalformedReply { needed: usize, available: usize },
    #[error("proxy refused the command: {0}")]
    Command(SocksReply),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("{operation} is not valid in handshake state {state}")]
    InvalidState {
        operation: &'static str,
        state: HandshakeState,
    },
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
