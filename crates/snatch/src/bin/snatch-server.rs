//! Snatch game server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin snatch-server
//! cargo run --bin snatch-server -- --bind 0.0.0.0:8080 \
//!     --dictionary ./words.txt
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use snatch::{ServerConfig, SnatchError, SnatchServerBuilder, init_logging};
use snatch::prelude::GameConfig;

#[derive(Parser, Debug)]
#[command(name = "snatch-server")]
#[command(about = "Multi-room word-snatching game server", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = ServerConfig::DEFAULT_BIND_ADDR)]
    bind: String,

    /// Newline-separated word list
    #[arg(short, long, default_value = ServerConfig::DEFAULT_DICTIONARY_PATH)]
    dictionary: PathBuf,

    /// Seconds a player has to flip before the turn passes
    #[arg(long, default_value_t = 15)]
    turn_timeout_secs: u64,

    /// Seconds a claim lock is held before it is released
    #[arg(long, default_value_t = 30)]
    lock_timeout_secs: u64,

    /// Milliseconds between snapshot broadcasts (0 disables them)
    #[arg(long, default_value_t = 2000)]
    snapshot_interval_ms: u64,

    /// Seconds of client silence before a connection is dropped
    #[arg(long, default_value_t = 60)]
    idle_timeout_secs: u64,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            dictionary_path: self.dictionary,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            game: GameConfig {
                turn_timeout: Duration::from_secs(self.turn_timeout_secs),
                lock_timeout: Duration::from_secs(self.lock_timeout_secs),
                snapshot_interval: Duration::from_millis(
                    self.snapshot_interval_ms,
                ),
                ..GameConfig::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), SnatchError> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.into_config();
    tracing::info!(?config, "starting");

    let server = SnatchServerBuilder::from_config(config).build().await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("ctrl-c received, shutting down");
        })
        .await
}
