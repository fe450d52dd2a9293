mod codec;
mod error;
mod handshake;
mod parser;
mod types;

pub use codec::{
    AUTH_RESPONSE_LEN, METHOD_SELECTION_LEN, REPLY_HEADER_LEN, command_reply_len,
    decode_address, decode_auth_response, decode_command_reply, decode_method_selection,
    encode_address, encode_auth_request, encode_command_request, encode_greeting,
};
pub use error::SocksError;
pub use handshake::Handshake;
pub use parser::{CommandReplyParser, ReplyParseStatus};
pub use types::{
    ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, AUTH_SUBNEGOTIATION_VERSION, HandshakeState,
    MAX_FIELD_LEN, SOCKS5_VERSION, SocksAddress, SocksCommand, SocksCredentials,
    SocksHostAddress, SocksMethod, SocksReply, SocksVersion,
};
