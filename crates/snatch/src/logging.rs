//! Tracing subscriber setup for the server binary.

use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_level` for the snatch crates when it is unset.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let crates = [
            "snatch",
            "snatch_server",
            "snatch_transport",
            "snatch_session",
            "snatch_room",
            "snatch_timer",
        ];
        crates
            .iter()
            .map(|name| format!("{name}={default_level}"))
            .collect::<Vec<_>>()
            .join(",")
            .into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
