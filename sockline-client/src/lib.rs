mod config;
mod connect;
mod error;

pub use config::{AuthConfig, ClientConfig, LoggingConfig, ProxyConfig};
pub use connect::{
    connect, connect_auth, connect_by_name, connect_with_socket, connect_with_socket_auth,
};
pub use error::ConfigError;
