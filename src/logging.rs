use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable that overrides the log filter (e.g. `debug`, `yodas_cleanse=trace`).
pub const LOG_ENV_VAR: &str = "YODAS_CLEANSE_LOG";

/// Initialize structured JSON logging.
///
/// Defaults to `info` level unless overridden by `YODAS_CLEANSE_LOG`. Batch runs are long, so
/// stage timings and survivor counts are visible out of the box.
pub fn init() {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
        .from_env_lossy();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
