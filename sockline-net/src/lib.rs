mod socks;

pub use socks::{
    ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, AUTH_RESPONSE_LEN, AUTH_SUBNEGOTIATION_VERSION,
    CommandReplyParser, Handshake, HandshakeState, MAX_FIELD_LEN, METHOD_SELECTION_LEN,
    REPLY_HEADER_LEN, ReplyParseStatus, SOCKS5_VERSION, SocksAddress, SocksCommand,
    SocksCredentials, SocksError, SocksHostAddress, SocksMethod, SocksReply, SocksVersion,
    command_reply_len, decode_address, decode_auth_response, decode_command_reply,
    decode_method_selection, encode_address, encode_auth_request, encode_command_request,
    encode_greeting,
};
