use log::{info, log_enabled, warn, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// Logs at `info` unless `RUST_LOG` says otherwise.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Logs a warning message.
pub fn log_warn(message: &str) {
    if log_enabled!(Level::Warn) {
        warn!("{message}");
    }
}

/// Logs an informational message.
pub fn log_info(message: &str) {
    if log_enabled!(Level::Info) {
        info!("{message}");
    }
}
