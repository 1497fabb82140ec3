use tracing::{warn, Level};

use super::env::get_env_variable;

/// Maps a `VERBOSITY` value to a level, `None` for anything unrecognized.
fn parse_level(verbosity: &str) -> Option<Level> {
    match verbosity.trim().to_uppercase().as_str() {
        "TRACE" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

pub fn init_logger() {
    let verbosity = get_env_variable("VERBOSITY");
    let level = verbosity
        .as_deref()
        .and_then(parse_level)
        .unwrap_or(Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Some(raw) = verbosity.filter(|raw| parse_level(raw).is_none()) {
        warn!("Invalid value '{}' for VERBOSITY, using INFO", raw);
    }
}
