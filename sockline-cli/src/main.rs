use clap::Parser;
use std::io::{Read, Write};
use std::net::{IpAddr, Shutdown, TcpStream};
use std::path::PathBuf;
use std::thread;

use sockline_client::{ClientConfig, connect, connect_auth};
use sockline_net::{SocksAddress, SocksCredentials};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sockline-cli", about = "Open a TCP tunnel through a SOCKS5 proxy")]
struct Cli {
    #[arg(long)]
    config: Option<PathBuf>,
    /// Proxy endpoint as HOST:PORT, overrides the config file.
    #[arg(long)]
    proxy: Option<String>,
    #[arg(long, requires = "password")]
    username: Option<String>,
    #[arg(long, requires = "username")]
    password: Option<String>,
    #[arg(long = "log-level")]
    log_level: Option<String>,
    destination: String,
    port: u16,
}

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path).map_err(|err| err.to_string())?,
        None => ClientConfig::default(),
    };
    apply_overrides(&mut config, &cli)?;
    init_logging(&config.logging.level);

    let destination = parse_destination(&cli.destination, cli.port);
    let credentials = config.credentials().map_err(|err| err.to_string())?;
    let (stream, bound) = match &credentials {
        Some(credentials) => connect_auth(&config.proxy, &destination, credentials),
        None => connect(&config.proxy, &destination),
    }
    .map_err(|err| err.to_string())?;
    info!(%destination, %bound, "tunnel established");

    relay(stream).map_err(|err| err.to_string())
}

fn apply_overrides(config: &mut ClientConfig, cli: &Cli) -> Result<(), String> {
    if let Some(proxy) = &cli.proxy {
        let (host, port) = split_endpoint(proxy)?;
        config.proxy.host = host;
        config.proxy.port = port;
    }
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        config.auth.username = Some(username.clone());
        config.auth.password = Some(password.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    Ok(())
}

fn split_endpoint(endpoint: &str) -> Result<(String, u16), String> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| format!("proxy endpoint {endpoint:?} is missing a port"))?;
    let port = port
        .parse::<u16>()
        .map_err(|err| format!("invalid proxy port {port:?}: {err}"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host.to_string(), port))
}

fn parse_destination(destination: &str, port: u16) -> SocksAddress {
    match destination.parse::<IpAddr>() {
        Ok(ip) => SocksAddress::new(ip, port),
        Err(_) => SocksAddress::domain(destination, port),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn relay(stream: TcpStream) -> std::io::Result<()> {
    let mut upstream = stream.try_clone()?;
    let downstream = thread::spawn(move || -> std::io::Result<u64> {
        let mut stdout = std::io::stdout();
        let copied = std::io::copy(&mut upstream, &mut stdout)?;
        stdout.flush()?;
        Ok(copied)
    });

    let mut writer = stream;
    let sent = copy_stdin(&mut writer)?;
    debug!(sent, "stdin closed");
    let _ = writer.shutdown(Shutdown::Write);

    let received = downstream
        .join()
        .map_err(|_| std::io::Error::other("relay thread panicked"))??;
    debug!(received, "tunnel closed");
    Ok(())
}

fn copy_stdin(writer: &mut TcpStream) -> std::io::Result<u64> {
    let mut stdin = std::io::stdin().lock();
    let mut buffer = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = stdin.read(&mut buffer)?;
        if n == 0 {
            return Ok(total);
        }
        writer.write_all(&buffer[..n])?;
        total += n as u64;
    }
}
