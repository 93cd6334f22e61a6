use dotenvy::dotenv;
use miette::IntoDiagnostic;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::lookup::DEFAULT_SUGGESTION_LIMIT;
use crate::Error;

pub struct Config {
    pub dictionary_dir: PathBuf,
    pub dictionary_name: String,
    pub suggestion_limit: usize,
    pub fetch_timeout: Duration,
}

pub fn load_config() -> miette::Result<Config> {
    info!("Loading configuration");

    // Load environment variables
    dotenv().ok();

    let dictionary_dir =
        PathBuf::from(env::var("DICTIONARY_DIR").unwrap_or_else(|_| "./data".to_string()));

    let dictionary_name = env::var("DICTIONARY_NAME").unwrap_or_else(|_| "boggle".to_string());
    if dictionary_name.trim().is_empty() {
        return Err(Error::Config("DICTIONARY_NAME must not be empty".to_string()).into());
    }

    let suggestion_limit = parse_positive::<usize>(
        "SUGGESTION_LIMIT",
        &env::var("SUGGESTION_LIMIT").unwrap_or_else(|_| DEFAULT_SUGGESTION_LIMIT.to_string()),
    )?;

    // A zero timeout would fail any read that is not ready on its first poll
    let fetch_timeout_secs = parse_positive::<u64>(
        "FETCH_TIMEOUT_SECS",
        &env::var("FETCH_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string()),
    )?;

    Ok(Config {
        dictionary_dir,
        dictionary_name: dictionary_name.trim().to_string(),
        suggestion_limit,
        fetch_timeout: Duration::from_secs(fetch_timeout_secs),
    })
}

/// Parse a numeric setting that must be at least 1.
fn parse_positive<T>(name: &str, value: &str) -> miette::Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let parsed = value
        .trim()
        .parse::<T>()
        .into_diagnostic()
        .map_err(|_| Error::Config(format!("Invalid {name}")))?;
    if parsed == T::default() {
        return Err(Error::Config(format!("{name} must be at least 1")).into());
    }
    Ok(parsed)
}
