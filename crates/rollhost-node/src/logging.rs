//! Logging defaults for the node binary.

use std::env;
use std::str::FromStr;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default [`tracing`] initialization: honors `RUST_LOG`, falls back
/// to a filter that keeps the noisy dependencies quiet.
pub fn initialize_logging() {
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_rust_log_value());
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_filter(EnvFilter::from_str(&env_filter).expect("RUST_LOG must parse")),
        )
        .init();
    set_tracing_panic_hook();
    tracing::debug!(
        RUST_LOG = env_filter,
        "logging initialized; restart with a custom `RUST_LOG` to change filtering"
    );
}

fn default_rust_log_value() -> String {
    [
        "info", // Default logging level.
        // Warn-only:
        "sqlx=warn",
        // Info is plenty for the HTTP plumbing:
        "hyper=info",
        "tower_http=info",
        "reqwest=info",
    ]
    .join(",")
}

/// Routes panics through tracing before the default hook runs.
fn set_tracing_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        tracing::error!(%panic_info, "panic");
        prev_hook(panic_info);
    }));
}
