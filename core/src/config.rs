use std::time::Duration;

/// Client configuration loaded from environment variables.
///
/// Defaults target the mock server on localhost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the market API (default: `http://localhost:3000`).
    pub base_url: String,
    /// Per-request timeout. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    /// Send the description under `discription` for backends that still
    /// expect the misspelled key.
    pub legacy_description_key: bool,
}

/// A configuration variable held a value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid value {value:?} for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: None,
            legacy_description_key: false,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load configuration from environment variables with defaults. A
    /// `.env` file in the working directory is read first when present.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `MARKET_BASE_URL`               | `http://localhost:3000` |
    /// | `MARKET_TIMEOUT_SECS`           | unset                   |
    /// | `MARKET_LEGACY_DESCRIPTION_KEY` | `false`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = lookup("MARKET_BASE_URL").unwrap_or(defaults.base_url);

        let timeout = match lookup("MARKET_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError {
                    var: "MARKET_TIMEOUT_SECS",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(ConfigError {
                        var: "MARKET_TIMEOUT_SECS",
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let legacy_description_key = match lookup("MARKET_LEGACY_DESCRIPTION_KEY") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError {
                var: "MARKET_LEGACY_DESCRIPTION_KEY",
                value: raw.clone(),
                reason: "expected true/false".to_string(),
            })?,
            None => false,
        };

        Ok(Self {
            base_url,
            timeout,
            legacy_description_key,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
