//! Tracing subscriber setup

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("thermoscan=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("thermoscan=info"))
    }
}

/// Install a human-readable subscriber.
///
/// `verbose` forces debug output for Thermoscan crates and ignores
/// `RUST_LOG`. Only the first call in a process has any effect.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(filter(verbose))
            .with(tracing_subscriber::fmt::layer())
            .try_init();
    });
}

/// Install a subscriber that writes one JSON object per event
pub fn init_tracing_json() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(filter(false))
            .with(tracing_subscriber::fmt::layer().json())
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing(true);
        init_tracing(false);
        init_tracing_json();
        tracing::info!("still logging");
    }
}
