//! Installation explicite du subscriber `tracing`.
//!
//! Sans appel à [`init_logging`] ou [`init_logging_with_level`], les traces
//! émises par la bibliothèque ne vont nulle part.

use pmoconfig::Config;
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" | "WARNING" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialise les logs à partir de `host.logger.*`.
///
/// Retourne `false` si la console est désactivée dans la configuration ou si
/// un subscriber global était déjà installé.
pub fn init_logging(config: &Config) -> bool {
    let level = config
        .get_log_min_level()
        .ok()
        .and_then(|l| string_to_level(&l))
        .unwrap_or(Level::INFO);

    let enable_console = config.get_log_enable_console().unwrap_or(true);
    if !enable_console {
        return false;
    }

    init_logging_with_level(level)
}

/// Initialise un subscriber console ; `RUST_LOG` a priorité sur `level`.
pub fn init_logging_with_level(level: Level) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
