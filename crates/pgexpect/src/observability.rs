use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_LOG_FILTER, Settings};

/// Installs a test-friendly subscriber and routes `log` records through it.
/// Safe to call from every test; only the first call has an effect.
pub fn init_test_logging(settings: &Settings) {
    let filter = EnvFilter::try_new(&settings.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        let _ = tracing_log::LogTracer::init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_harmless() {
        let settings = Settings { log_filter: "not a [valid filter".into(), ..Default::default() };
        init_test_logging(&settings);
        init_test_logging(&Settings::default());
        tracing::info!("logging initialized");
    }
}
