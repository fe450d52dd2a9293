use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::{Deserialize, Serialize};

use super::error::SocksError;

pub const SOCKS5_VERSION: u8 = 0x05;
pub const AUTH_SUBNEGOTIATION_VERSION: u8 = 0x01;
pub const MAX_FIELD_LEN: usize = u8::MAX as usize;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocksVersion {
    #[default]
    V5,
}

impl SocksVersion {
    pub fn as_byte(self) -> u8 {
        match self {
            SocksVersion::V5 => SOCKS5_VERSION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SocksHostAddress {
    Ipv4([u8; 4]),
    Ipv6([u8; 16]),
    DomainName(Vec<u8>),
}

impl SocksHostAddress {
    /// Rejects domain names that cannot fit behind a one-byte length prefix.
    pub fn validate(&self) -> Result<(), SocksError> {
        match self {
            SocksHostAddress::DomainName(name) if name.len() > MAX_FIELD_LEN => {
                Err(SocksError::AddressTooLong(name.len()))
            }
            _ => Ok(()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn address_type(&self) -> u8 {
        match self {
            SocksHostAddress::Ipv4(_) => ATYP_IPV4,
            SocksHostAddress::Ipv6(_) => ATYP_IPV6,
            SocksHostAddress::DomainName(_) => ATYP_DOMAIN,
        }
    }
}

impl From<Ipv4Addr> for SocksHostAddress {
    fn from(ip: Ipv4Addr) -> Self {
        SocksHostAddress::Ipv4(ip.octets())
    }
}

impl From<Ipv6Addr> for SocksHostAddress {
    fn from(ip: Ipv6Addr) -> Self {
        SocksHostAddress::Ipv6(ip.octets())
    }
}

impl From<IpAddr> for SocksHostAddress {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(ip) => ip.into(),
            IpAddr::V6(ip) => ip.into(),
        }
    }
}

impl fmt::Display for SocksHostAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksHostAddress::Ipv4(ip) => fmt::Display::fmt(&Ipv4Addr::from(*ip), f),
            SocksHostAddress::Ipv6(ip) => fmt::Display::fmt(&Ipv6Addr::from(*ip), f),
            SocksHostAddress::DomainName(name) => f.write_str(&String::from_utf8_lossy(name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SocksAddress {
    pub host: SocksHostAddress,
    pub port: u16,
}

impl SocksAddress {
    pub fn new(host: impl Into<SocksHostAddress>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The name is carried as-is; internationalized names must already be
    /// punycode encoded.
    pub fn domain(name: impl Into<Vec<u8>>, port: u16) -> Self {
        Self {
            host: SocksHostAddress::DomainName(name.into()),
            port,
        }
    }

    pub fn validate(&self) -> Result<(), SocksError> {
        self.host.validate()
    }
}

impl From<SocketAddr> for SocksAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for SocksAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            SocksHostAddress::Ipv6(_) => write!(f, "[{}]:{}", self.host, self.port),
            host => write!(f, "{}:{}", host, self.port),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocksMethod {
    None,
    UsernamePassword,
    NotAcceptable,
}

impl SocksMethod {
    pub fn as_byte(self) -> u8 {
        match self {
            SocksMethod::None => 0x00,
            SocksMethod::UsernamePassword => 0x02,
            SocksMethod::NotAcceptable => 0xFF,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(SocksMethod::None),
            0x02 => Some(SocksMethod::UsernamePassword),
            0xFF => Some(SocksMethod::NotAcceptable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocksCommand {
    Connect,
}

impl SocksCommand {
    pub fn as_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => 0x01,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SocksCredentials {
    pub username: Vec<u8>,
    pub password: Vec<u8>,
}

impl SocksCredentials {
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<Vec<u8>>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), SocksError> {
        for field in [&self.username, &self.password] {
            if field.len() > MAX_FIELD_LEN {
                return Err(SocksError::CredentialTooLong(field.len()));
            }
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Debug for SocksCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocksCredentials")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocksReply {
    Success,
    GeneralFailure,
    ConnectionNotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    Unassigned(u8),
}

impl SocksReply {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x00 => SocksReply::Success,
            0x01 => SocksReply::GeneralFailure,
            0x02 => SocksReply::ConnectionNotAllowed,
            0x03 => SocksReply::NetworkUnreachable,
            0x04 => SocksReply::HostUnreachable,
            0x05 => SocksReply::ConnectionRefused,
            0x06 => SocksReply::TtlExpired,
            0x07 => SocksReply::CommandNotSupported,
            0x08 => SocksReply::AddressTypeNotSupported,
            other => SocksReply::Unassigned(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            SocksReply::Success => 0x00,
            SocksReply::GeneralFailure => 0x01,
            SocksReply::ConnectionNotAllowed => 0x02,
            SocksReply::NetworkUnreachable => 0x03,
            SocksReply::HostUnreachable => 0x04,
            SocksReply::ConnectionRefused => 0x05,
            SocksReply::TtlExpired => 0x06,
            SocksReply::CommandNotSupported => 0x07,
            SocksReply::AddressTypeNotSupported => 0x08,
            SocksReply::Unassigned(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == SocksReply::Success
    }
}

impl fmt::Display for SocksReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksReply::Success => f.write_str("succeeded"),
            SocksReply::GeneralFailure => f.write_str("general SOCKS server failure"),
            SocksReply::ConnectionNotAllowed => f.write_str("connection not allowed by ruleset"),
            SocksReply::NetworkUnreachable => f.write_str("network unreachable"),
            SocksReply::HostUnreachable => f.write_str("host unreachable"),
            SocksReply::ConnectionRefused => f.write_str("connection refused"),
            SocksReply::TtlExpired => f.write_str("TTL expired"),
            SocksReply::CommandNotSupported => f.write_str("command not supported"),
            SocksReply::AddressTypeNotSupported => f.write_str("address type not supported"),
            SocksReply::Unassigned(code) => write!(f, "unassigned reply code {code:#04x}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    Start,
    MethodNegotiated,
    AuthPending,
    Authenticated,
    CommandSent,
    Established,
    Failed,
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandshakeState::Start => "start",
            HandshakeState::MethodNegotiated => "method negotiated",
            HandshakeState::AuthPending => "auth pending",
            HandshakeState::Authenticated => "authenticated",
            HandshakeState::CommandSent => "command sent",
            HandshakeState::Established => "established",
            HandshakeState::Failed => "failed",
        };
        f.write_str(name)
    }
}
