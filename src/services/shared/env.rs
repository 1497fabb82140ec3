use std::{path::PathBuf, sync::Once};

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::{dotenv, from_filename, var};
use tracing::warn;

use super::constants::{
    DEFAULT_ERROR_ARTIFACT_DIR, DEFAULT_FETCH_DELAY_MS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_NAV_CONFIG_PATH, DEFAULT_OUT_DIR, DEFAULT_UTC_OFFSET_HOURS,
};

pub fn check_for_env_variables() {
    match get_env_variable("NAV_CONFIG_PATH") {
        Some(path) => println!("Ticker config set to {} ✅", path),
        None => println!(
            "NAV_CONFIG_PATH not set, reading tickers from {} ⚠️",
            DEFAULT_NAV_CONFIG_PATH
        ),
    };
    match get_env_variable("DIVIDENDS_OUT_DIR") {
        Some(path) => println!("Output directory set to {} ✅", path),
        None => println!(
            "DIVIDENDS_OUT_DIR not set, writing ticker files to {} ⚠️",
            DEFAULT_OUT_DIR
        ),
    };
    match get_env_variable("ERROR_ARTIFACT_DIR") {
        Some(path) => println!("Error artifacts go to {} ✅", path),
        None => println!(
            "ERROR_ARTIFACT_DIR not set, diagnostics go to {} ⚠️",
            DEFAULT_ERROR_ARTIFACT_DIR
        ),
    };
}

/// The dotenv file for a `RUST_ENV` value; `None` means the plain `.env` lookup.
fn env_file_for(environment: &str) -> Option<&'static str> {
    match environment {
        "development" => Some(".env.dev"),
        "production" => Some(".env.prod"),
        _ => None,
    }
}

static ENV_FILE_LOADED: Once = Once::new();

/// Reads a variable after loading the dotenv file for the current `RUST_ENV` once per process.
/// Values already set in the environment win over the file.
pub fn get_env_variable(variable_to_get: &str) -> Option<String> {
    ENV_FILE_LOADED.call_once(|| {
        let environment = var("RUST_ENV").unwrap_or_else(|_| "development".into());
        let _ = match env_file_for(&environment) {
            Some(file_name) => from_filename(file_name),
            None => dotenv(),
        };
    });
    var(variable_to_get).ok().filter(|value| !value.trim().is_empty())
}

fn get_parsed_env_variable<T: std::str::FromStr>(variable_to_get: &str, default: T) -> T {
    match get_env_variable(variable_to_get) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default", raw, variable_to_get);
            default
        }),
        None => default,
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub nav_config_path: PathBuf,
    pub out_dir: PathBuf,
    pub error_artifact_dir: PathBuf,
    pub fetch_delay_ms: u64,
    pub http_timeout_secs: u64,
    pub utc_offset: FixedOffset,
}

impl Settings {
    pub fn from_env() -> Self {
        let offset_hours =
            get_parsed_env_variable("UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS);

        Settings {
            nav_config_path: get_env_variable("NAV_CONFIG_PATH")
                .unwrap_or_else(|| DEFAULT_NAV_CONFIG_PATH.to_string())
                .into(),
            out_dir: get_env_variable("DIVIDENDS_OUT_DIR")
                .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string())
                .into(),
            error_artifact_dir: get_env_variable("ERROR_ARTIFACT_DIR")
                .unwrap_or_else(|| DEFAULT_ERROR_ARTIFACT_DIR.to_string())
                .into(),
            fetch_delay_ms: get_parsed_env_variable("FETCH_DELAY_MS", DEFAULT_FETCH_DELAY_MS),
            http_timeout_secs: get_parsed_env_variable(
                "HTTP_TIMEOUT_SECS",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            utc_offset: utc_offset_from_hours(offset_hours),
        }
    }
}

pub fn utc_offset_from_hours(hours: i32) -> FixedOffset {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            warn!("UTC offset of {} hours is out of range, using UTC", hours);
            Utc.fix()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_env_picks_the_dotenv_file() {
        assert_eq!(env_file_for("development"), Some(".env.dev"));
        assert_eq!(env_file_for("production"), Some(".env.prod"));
        assert_eq!(env_file_for("staging"), None);
    }

    #[test]
    fn offset_hours_map_to_seconds() {
        assert_eq!(utc_offset_from_hours(9).local_minus_utc(), 9 * 3600);
        assert_eq!(utc_offset_from_hours(-5).local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(utc_offset_from_hours(30).local_minus_utc(), 0);
    }
}
