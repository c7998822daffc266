//! Tracing initialization.
//!
//! Logs go to stdout through a `fmt` layer. The filter comes from `RUST_LOG` when it is set,
//! otherwise from the configured `log_level` directive:
//!
//! ```bash
//! RUST_LOG=imgvault=debug,tower_http=info imgvault -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing with console output
///
/// Parameters:
/// - `log_level`: filter directive used when `RUST_LOG` is unset or invalid
pub fn init_telemetry(log_level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(log_level))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");

    Ok(())
}
