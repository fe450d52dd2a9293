use std::io::{Read, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use assert_matches::assert_matches;
use sockline_client::{ProxyConfig, connect, connect_auth, connect_with_socket};
use sockline_net::{SocksAddress, SocksCredentials, SocksError, SocksReply};

/// Accepts one client and runs `script` against it on a background thread.
fn spawn_proxy<R, F>(script: F) -> (ProxyConfig, JoinHandle<R>)
where
    R: Send + 'static,
    F: FnOnce(TcpStream) -> R + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        script(stream)
    });
    (ProxyConfig::new(addr.ip().to_string(), addr.port()), handle)
}

fn read_n(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).unwrap();
    buf
}

/// True once the client side has closed the connection.
fn sees_eof(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 1];
    matches!(stream.read(&mut buf), Ok(0))
}

#[test]
fn connect_without_auth_to_domain() {
    let (config, proxy) = spawn_proxy(|mut stream| {
        assert_eq!(read_n(&mut stream, 3), vec![0x05, 0x01, 0x00]);
        stream.write_all(&[0x05, 0x00]).unwrap();

        let mut expected = vec![0x05, 0x01, 0x00, 0x03, 11];
        expected.extend_from_slice(b"example.com");
        expected.extend_from_slice(&[0x00, 0x50]);
        assert_eq!(read_n(&mut stream, expected.len()), expected);
        stream
            .write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
            .unwrap();

        assert_eq!(read_n(&mut stream, 4), b"ping".to_vec());
        stream.write_all(b"pong").unwrap();
    });

    let destination = SocksAddress::domain("example.com", 80);
    let (mut stream, bound) = connect(&config, &destination).unwrap();
    assert_eq!(bound, SocksAddress::new(Ipv4Addr::UNSPECIFIED, 0));
    assert_eq!(bound.to_string(), "0.0.0.0:0");

    stream.write_all(b"ping").unwrap();
    let mut reply = [0u8; 4];
    stream.read_exact(&mut reply).unwrap();
    assert_eq!(&reply, b"pong");
    proxy.join().unwrap();
}

#[test]
fn connect_with_credentials_returns_ipv6_bound_address() {
    let bound_ip: Ipv6Addr = "2001:db8:0:1::1f".parse().unwrap();
    let (config, proxy) = spawn_proxy(move |mut stream| {
        assert_eq!(read_n(&mut stream, 3), vec![0x05, 0x01, 0x02]);
        stream.write_all(&[0x05, 0x02]).unwrap();

        let mut auth = vec![0x01, 5];
        auth.extend_from_slice(b"alice");
        auth.push(6);
        auth.extend_from_slice(b"secret");
        assert_eq!(read_n(&mut stream, auth.len()), auth);
        stream.write_all(&[0x01, 0x00]).unwrap();

        assert_eq!(
            read_n(&mut stream, 10),
            vec![0x05, 0x01, 0x00, 0x01, 203, 0, 113, 5, 0x01, 0xbb]
        );
        let mut reply = vec![0x05, 0x00, 0x00, 0x04];
        reply.extend_from_slice(&bound_ip.octets());
        reply.extend_from_slice(&[0xd4, 0x31]);
        stream.write_all(&reply).unwrap();
    });

    let destination = SocksAddress::new(Ipv4Addr::new(203, 0, 113, 5), 443);
    let credentials = SocksCredentials::new("alice", "secret");
    let (_stream, bound) = connect_auth(&config, &destination, &credentials).unwrap();
    assert_eq!(bound, SocksAddress::new(bound_ip, 54321));
    proxy.join().unwrap();
}

#[test]
fn rejected_methods_close_owned_transport() {
    let (config, proxy) = spawn_proxy(|mut stream| {
        read_n(&mut stream, 3);
        stream.write_all(&[0x05, 0xFF]).unwrap();
        sees_eof(&mut stream)
    });

    let destination = SocksAddress::domain("example.com", 80);
    assert_matches!(
        connect(&config, &destination),
        Err(SocksError::NoAcceptableAuthMethod)
    );
    assert!(proxy.join().unwrap());
}

#[test]
fn failed_authentication_closes_owned_transport() {
    let (config, proxy) = spawn_proxy(|mut stream| {
        read_n(&mut stream, 3);
        stream.write_all(&[0x05, 0x02]).unwrap();
        read_n(&mut stream, 2 + 5 + 1 + 5);
        stream.write_all(&[0x01, 0x01]).unwrap();
        sees_eof(&mut stream)
    });

    let destination = SocksAddress::domain("example.com", 80);
    let credentials = SocksCredentials::new("alice", "wrong");
    assert_matches!(
        connect_auth(&config, &destination, &credentials),
        Err(SocksError::AuthenticationFailed)
    );
    assert!(proxy.join().unwrap());
}

#[test]
fn refused_command_closes_owned_transport() {
    let (config, proxy) = spawn_proxy(|mut stream| {
        read_n(&mut stream, 3);
        stream.write_all(&[0x05, 0x00]).unwrap();
        read_n(&mut stream, 10);
        stream
            .write_all(&[0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0])
            .unwrap();
        sees_eof(&mut stream)
    });

    let destination = SocksAddress::new(Ipv4Addr::new(192, 0, 2, 1), 25);
    assert_matches!(
        connect(&config, &destination),
        Err(SocksError::Command(SocksReply::ConnectionRefused))
    );
    assert!(proxy.join().unwrap());
}

#[test]
fn caller_owned_transport_stays_open_after_failure() {
    let (config, proxy) = spawn_proxy(|mut stream| {
        read_n(&mut stream, 3);
        stream.write_all(&[0x05, 0xFF]).unwrap();
        read_n(&mut stream, 5)
    });

    let mut stream = TcpStream::connect((config.host.as_str(), config.port)).unwrap();
    let destination = SocksAddress::domain("example.com", 80);
    assert_matches!(
        connect_with_socket(&mut stream, &config, &destination),
        Err(SocksError::NoAcceptableAuthMethod)
    );

    stream.write_all(b"still").unwrap();
    assert_eq!(proxy.join().unwrap(), b"still".to_vec());
}

#[test]
fn unreachable_proxy_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ProxyConfig::new(addr.ip().to_string(), addr.port());
    let destination = SocksAddress::domain("example.com", 80);
    assert_matches!(
        connect(&config, &destination),
        Err(SocksError::Transport(_))
    );
}
