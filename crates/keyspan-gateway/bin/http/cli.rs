use clap::Parser;
use keyspan_shortener::NodeConfig;
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "KEYSPAN_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "KEYSPAN_BASE_URL";
pub const REQUEST_TIMEOUT_ENV: &str = "KEYSPAN_REQUEST_TIMEOUT_SECS";
pub const SHUTDOWN_TIMEOUT_ENV: &str = "KEYSPAN_SHUTDOWN_TIMEOUT_SECS";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080/api/v1";

#[derive(Debug, Parser)]
#[command(name = "keyspan-gateway", version, about = "HTTP gateway for the keyspan shortener")]
pub struct Cli {
    #[command(flatten)]
    pub node: NodeConfig,

    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix joined with each new code in responses.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = REQUEST_TIMEOUT_ENV, default_value_t = 5)]
    pub request_timeout_secs: u64,

    /// How long in-flight requests may run after a shutdown signal.
    #[arg(long, env = SHUTDOWN_TIMEOUT_ENV, default_value_t = 10)]
    pub shutdown_timeout_secs: u64,
}
