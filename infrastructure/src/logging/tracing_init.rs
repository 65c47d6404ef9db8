//! Default tracing subscriber installation.

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber with an env-filter.
///
/// `filter` overrides `RUST_LOG`; without either, the level defaults to
/// `info`. Safe to call more than once: subsequent installations are
/// no-ops.
pub fn init_tracing(filter: Option<&str>) {
    let env_filter = match filter {
        Some(directives) => EnvFilter::try_new(directives).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing(Some("debug"));
        init_tracing(None);
    }
}
