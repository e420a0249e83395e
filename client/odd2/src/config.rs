//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{ClientError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Odd 2 web app (e.g. http://127.0.0.1:5001)
    pub base_url: String,
    /// How often (in seconds) to re-check a pending payment
    pub poll_interval_secs: u64,
    /// How many status checks to make before giving up
    pub max_poll_attempts: u32,
    /// Delay (in seconds) between initiation and the first status check
    pub first_check_delay_secs: u64,
    /// Timeout (in seconds) applied to every HTTP request
    pub http_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            base_url: env_var("ODD2_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:5001".to_string()),
            poll_interval_secs: env_var("POLL_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid POLL_INTERVAL_SECS".to_string()))?,
            max_poll_attempts: env_var("MAX_POLL_ATTEMPTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid MAX_POLL_ATTEMPTS".to_string()))?,
            first_check_delay_secs: env_var("FIRST_CHECK_DELAY_SECS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid FIRST_CHECK_DELAY_SECS".to_string()))?,
            http_timeout_secs: env_var("HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ClientError::Config("Invalid HTTP_TIMEOUT_SECS".to_string()))?,
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ClientError::Config(format!("Missing env var: {key}")))
}
