use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use sockline_net::{
    Handshake, SocksAddress, SocksCommand, SocksCredentials, SocksError, SocksMethod,
};
use tracing::debug;

use crate::config::ProxyConfig;

/// Opens a new connection to the proxy and tunnels it to `destination`.
///
/// On failure the connection is closed before the error is returned.
pub fn connect(
    config: &ProxyConfig,
    destination: &SocksAddress,
) -> Result<(TcpStream, SocksAddress), SocksError> {
    with_owned_transport(config, |stream| {
        connect_with_socket(stream, config, destination)
    })
}

pub fn connect_auth(
    config: &ProxyConfig,
    destination: &SocksAddress,
    credentials: &SocksCredentials,
) -> Result<(TcpStream, SocksAddress), SocksError> {
    with_owned_transport(config, |stream| {
        connect_with_socket_auth(stream, config, destination, credentials)
    })
}

/// Negotiates over a stream the caller already connected to the proxy.
/// The stream is never closed here, whatever the outcome.
pub fn connect_with_socket<S: Read + Write>(
    stream: &mut S,
    config: &ProxyConfig,
    destination: &SocksAddress,
) -> Result<SocksAddress, SocksError> {
    config.validate()?;
    destination.validate()?;

    let mut handshake = Handshake::new(stream);
    handshake.establish(&[SocksMethod::None])?;
    handshake.command(SocksCommand::Connect, destination)
}

pub fn connect_with_socket_auth<S: Read + Write>(
    stream: &mut S,
    config: &ProxyConfig,
    destination: &SocksAddress,
    credentials: &SocksCredentials,
) -> Result<SocksAddress, SocksError> {
    config.validate()?;
    destination.validate()?;
    credentials.validate()?;

    let mut handshake = Handshake::new(stream);
    handshake.establish(&[SocksMethod::UsernamePassword])?;
    handshake.authenticate(credentials)?;
    handshake.command(SocksCommand::Connect, destination)
}

/// `name` must already be ASCII (punycode for internationalized names); its
/// bytes are sent to the proxy unchanged.
pub fn connect_by_name<S: Read + Write>(
    stream: &mut S,
    config: &ProxyConfig,
    name: &str,
    port: u16,
) -> Result<SocksAddress, SocksError> {
    let destination = SocksAddress::domain(name.as_bytes(), port);
    connect_with_socket(stream, config, &destination)
}

fn with_owned_transport<F>(
    config: &ProxyConfig,
    negotiate: F,
) -> Result<(TcpStream, SocksAddress), SocksError>
where
    F: FnOnce(&mut TcpStream) -> Result<SocksAddress, SocksError>,
{
    config.validate()?;
    let mut stream = TcpStream::connect((config.host.as_str(), config.port))?;
    debug!(proxy = %config.host, port = config.port, "connected to socks proxy");

    match negotiate(&mut stream) {
        Ok(bound) => Ok((stream, bound)),
        Err(err) => {
            close_transport(stream);
            Err(err)
        }
    }
}

fn close_transport(stream: TcpStream) {
    if let Err(err) = stream.shutdown(Shutdown::Both) {
        debug!(%err, "socks transport shutdown failed");
    }
}
