//! Parley terminal client.
//!
//! # Usage
//!
//! ```bash
//! parley --base-url https://example.org --cookie "sessionid=..." --csrf-token "..."
//! ```
//!
//! Type to send to the open conversation. Commands: `/open <user id>`,
//! `/users <query>`, `/typing on|off`, `/quit`. Logs go to stderr.

use clap::Parser;
use parley_app::{Runtime, SessionConfig};
use parley_cli::{HttpChatApi, LineDriver, websocket_url};
use parley_client::{ReconnectPolicy, TransportConfig};
use parley_core::SystemEnv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Parley chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Terminal client for Parley real-time chat")]
#[command(version)]
struct Args {
    /// Base URL of the host application
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Websocket URL. Derived from the base URL when omitted.
    #[arg(long)]
    ws_url: Option<String>,

    /// Session cookie sent with every request and the websocket handshake
    #[arg(long)]
    cookie: Option<String>,

    /// CSRF token for state-changing requests
    #[arg(long)]
    csrf_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Reconnect attempts before giving up
    #[arg(long, default_value_t = ReconnectPolicy::DEFAULT_MAX_ATTEMPTS)]
    max_reconnect_attempts: u32,

    /// Do not acknowledge messages in the open conversation
    #[arg(long)]
    no_read_receipts: bool,

    /// Frames kept for resend while disconnected
    #[arg(long, default_value_t = TransportConfig::DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            auto_read_receipts: !self.no_read_receipts,
            transport: TransportConfig { outbox_capacity: self.outbox_capacity },
            reconnect: ReconnectPolicy { max_attempts: self.max_reconnect_attempts, ..ReconnectPolicy::default() },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let config = args.session_config();
    let ws_url = args.ws_url.clone().unwrap_or_else(|| websocket_url(&args.base_url));
    tracing::info!(base_url = %args.base_url, %ws_url, "parley starting");

    let api = HttpChatApi::new(&args.base_url, args.cookie.as_deref(), args.csrf_token.as_deref())?;
    let driver = LineDriver::new(ws_url, args.cookie, std::io::stdout());

    let view = Runtime::new(driver, api, SystemEnv::new(), config).run().await?;
    tracing::info!(conversations = view.conversations.len(), unread = view.total_unread(), "session ended");

    Ok(())
}
