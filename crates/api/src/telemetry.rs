//! Process-wide logging setup.
//!
//! | env     | format          | default level |
//! |---------|-----------------|---------------|
//! | `local` | human-readable  | DEBUG         |
//! | `dev`   | JSON            | DEBUG         |
//! | `prod`  | JSON            | INFO          |
//!
//! `RUST_LOG` overrides the default level.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Env;

/// Default filter directive for `env`.
#[must_use]
pub fn default_directive(env: Env) -> &'static str {
    match env {
        Env::Local | Env::Dev => "debug",
        Env::Prod => "info",
    }
}

fn filter_for(env: Env) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(env)))
}

/// Installs the global `tracing` subscriber for `env`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing(env: Env) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let builder = fmt().with_env_filter(filter_for(env)).with_target(true);

    let result = match env {
        Env::Local => builder.pretty().try_init(),
        Env::Dev | Env::Prod => builder.json().try_init(),
    };

    if result.is_ok() {
        tracing::debug!(%env, "tracing initialized");
    }
    result
}
