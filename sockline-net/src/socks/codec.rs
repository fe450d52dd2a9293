use super::error::SocksError;
use super::types::{
    ATYP_DOMAIN, ATYP_IPV4, ATYP_IPV6, AUTH_SUBNEGOTIATION_VERSION, MAX_FIELD_LEN, SOCKS5_VERSION,
    SocksAddress, SocksCommand, SocksCredentials, SocksHostAddress, SocksMethod, SocksReply,
};

pub const METHOD_SELECTION_LEN: usize = 2;
pub const AUTH_RESPONSE_LEN: usize = 2;
pub const REPLY_HEADER_LEN: usize = 4;

pub fn encode_greeting(methods: &[SocksMethod]) -> Result<Vec<u8>, SocksError> {
    if methods.is_empty() {
        return Err(SocksError::InvalidConfiguration(
            "at least one authentication method must be offered".to_string(),
        ));
    }
    if methods.len() > MAX_FIELD_LEN {
        return Err(SocksError::InvalidConfiguration(format!(
            "{} authentication methods offered, limit is 255",
            methods.len()
        )));
    }
    if methods.contains(&SocksMethod::NotAcceptable) {
        return Err(SocksError::InvalidConfiguration(
            "NotAcceptable cannot be offered as an authentication method".to_string(),
        ));
    }

    let mut buf = Vec::with_capacity(2 + methods.len());
    buf.push(SOCKS5_VERSION);
    buf.push(methods.len() as u8);
    buf.extend(methods.iter().map(|method| method.as_byte()));
    Ok(buf)
}

pub fn decode_method_selection(bytes: &[u8]) -> Result<(u8, SocksMethod), SocksError> {
    require(bytes, METHOD_SELECTION_LEN)?;
    if bytes[0] != SOCKS5_VERSION {
        return Err(SocksError::ProtocolVersionMismatch(bytes[0]));
    }
    let method = SocksMethod::from_byte(bytes[1]).ok_or(SocksError::UnsupportedMethod(bytes[1]))?;
    Ok((bytes[0], method))
}

pub fn encode_auth_request(credentials: &SocksCredentials) -> Result<Vec<u8>, SocksError> {
    credentials.validate()?;

    let username = &credentials.username;
    let password = &credentials.password;
    let mut buf = Vec::with_capacity(3 + username.len() + password.len());
    buf.push(AUTH_SUBNEGOTIATION_VERSION);
    buf.push(username.len() as u8);
    buf.extend_from_slice(username);
    buf.push(password.len() as u8);
    buf.extend_from_slice(password);
    Ok(buf)
}

/// Returns the status byte. Servers disagree on the version byte of this
/// frame, so only the status is interpreted.
pub fn decode_auth_response(bytes: &[u8]) -> Result<u8, SocksError> {
    require(bytes, AUTH_RESPONSE_LEN)?;
    Ok(bytes[1])
}

pub fn encode_command_request(
    command: SocksCommand,
    address: &SocksAddress,
) -> Result<Vec<u8>, SocksError> {
    let mut buf = vec![SOCKS5_VERSION, command.as_byte(), 0x00];
    encode_address(&mut buf, address)?;
    Ok(buf)
}

pub fn decode_command_reply(bytes: &[u8]) -> Result<(SocksReply, SocksAddress), SocksError> {
    require(bytes, 1)?;
    if bytes[0] != SOCKS5_VERSION {
        return Err(SocksError::ProtocolVersionMismatch(bytes[0]));
    }
    require(bytes, REPLY_HEADER_LEN)?;

    let reply = SocksReply::from_code(bytes[1]);
    let (address, _) = decode_address(&bytes[3..]).map_err(|err| shift_offset(err, 3))?;
    Ok((reply, address))
}

/// Total length of a command reply frame, once enough of its prefix is
/// available to tell. `None` means more header bytes are needed first.
pub fn command_reply_len(bytes: &[u8]) -> Result<Option<usize>, SocksError> {
    if let Some(&version) = bytes.first() {
        if version != SOCKS5_VERSION {
            return Err(SocksError::ProtocolVersionMismatch(version));
        }
    }
    if bytes.len() < REPLY_HEADER_LEN {
        return Ok(None);
    }

    let len = match bytes[3] {
        ATYP_IPV4 => Some(REPLY_HEADER_LEN + 4 + 2),
        ATYP_IPV6 => Some(REPLY_HEADER_LEN + 16 + 2),
        ATYP_DOMAIN => bytes
            .get(REPLY_HEADER_LEN)
            .map(|len| REPLY_HEADER_LEN + 1 + *len as usize + 2),
        other => return Err(SocksError::UnsupportedAddressType(other)),
    };
    Ok(len)
}

/// Writes `atyp | addr | port`. Nothing is written if the address is invalid.
pub fn encode_address(buf: &mut Vec<u8>, address: &SocksAddress) -> Result<(), SocksError> {
    address.validate()?;

    buf.push(address.host.address_type());
    match &address.host {
        SocksHostAddress::Ipv4(ip) => buf.extend_from_slice(ip),
        SocksHostAddress::Ipv6(ip) => buf.extend_from_slice(ip),
        SocksHostAddress::DomainName(name) => {
            buf.push(name.len() as u8);
            buf.extend_from_slice(name);
        }
    }
    buf.extend_from_slice(&address.port.to_be_bytes());
    Ok(())
}

/// Reads `atyp | addr | port` and returns the address with the number of
/// bytes consumed.
pub fn decode_address(bytes: &[u8]) -> Result<(SocksAddress, usize), SocksError> {
    require(bytes, 1)?;
    let mut cursor = 1;
    let host = match bytes[0] {
        ATYP_IPV4 => {
            require(bytes, cursor + 4)?;
            let mut ip = [0u8; 4];
            ip.copy_from_slice(&bytes[cursor..cursor + 4]);
            cursor += 4;
            SocksHostAddress::Ipv4(ip)
        }
        ATYP_DOMAIN => {
            require(bytes, cursor + 1)?;
            let len = bytes[cursor] as usize;
            cursor += 1;
            require(bytes, cursor + len)?;
            let name = bytes[cursor..cursor + len].to_vec();
            cursor += len;
            SocksHostAddress::DomainName(name)
        }
        ATYP_IPV6 => {
            require(bytes, cursor + 16)?;
            let mut ip = [0u8; 16];
            ip.copy_from_slice(&bytes[cursor..cursor + 16]);
            cursor += 16;
            SocksHostAddress::Ipv6(ip)
        }
        other => return Err(SocksError::UnsupportedAddressType(other)),
    };

    require(bytes, cursor + 2)?;
    let port = u16::from_be_bytes([bytes[cursor], bytes[cursor + 1]]);
    cursor += 2;
    Ok((SocksAddress { host, port }, cursor))
}

fn require(bytes: &[u8], needed: usize) -> Result<(), SocksError> {
    if bytes.len() < needed {
        return Err(SocksError::MalformedReply {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

fn shift_offset(error: SocksError, offset: usize) -> SocksError {
    match error {
        SocksError::MalformedReply { needed, available } => SocksError::MalformedReply {
            needed: needed + offset,
            available: available + offset,
        },
        other => other,
    }
}
