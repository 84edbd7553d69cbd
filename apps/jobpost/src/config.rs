use anyhow::{Context, Result};

/// Job API client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
    /// Retries for idempotent reads only; submits are never retried.
    pub max_retries: u32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_url: require_env("JOBPOST_API_URL")?
                .trim_end_matches('/')
                .to_string(),
            api_token: std::env::var("JOBPOST_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            timeout_secs: std::env::var("JOBPOST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("JOBPOST_TIMEOUT_SECS must be a whole number of seconds")?,
            max_retries: std::env::var("JOBPOST_MAX_RETRIES")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u32>()
                .context("JOBPOST_MAX_RETRIES must be a non-negative integer")?,
            rust_log: rust_log(),
        })
    }
}

/// Log level for the crate's default filter. Read on its own so commands
/// that never touch the API can still set up logging.
pub fn rust_log() -> String {
    log_level(std::env::var("RUST_LOG").ok())
}

fn log_level(raw: Option<String>) -> String {
    raw.map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "info".to_string())
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_defaults_to_info() {
        assert_eq!(log_level(None), "info");
        assert_eq!(log_level(Some("  ".to_string())), "info");
        assert_eq!(log_level(Some(" debug ".to_string())), "debug");
    }
}
