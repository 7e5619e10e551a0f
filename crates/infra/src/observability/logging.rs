//! Process-wide `tracing` subscriber setup.

use gardenwise_domain::{GardenwiseError, Result};
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,gardenwise_core=info,gardenwise_infra=info";

/// Set to `true` to emit one JSON object per event.
pub const JSON_ENV: &str = "GARDENWISE_LOG_JSON";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing() -> Result<()> {
    let json =
        std::env::var(JSON_ENV).map(|value| value.eq_ignore_ascii_case("true")).unwrap_or(false);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if json { builder.json().try_init() } else { builder.try_init() };

    installed.map_err(|err| {
        GardenwiseError::Internal(format!("failed to install tracing subscriber: {err}"))
    })
}
