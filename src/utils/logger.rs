//! Logging configuration using tracing.

use crate::config::StorageSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging at the level configured in [`StorageSettings`].
///
/// `RUST_LOG` takes precedence when set; an unparsable level falls back to
/// `info`.
pub fn init(settings: &StorageSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
