use crate::error::{AppError, Result};

pub const UPSTREAM_URL: &str =
    "https://draw.ar-lottery01.com/WinGo/WinGo_1M/GetHistoryIssuePage.json";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Tick interval (seconds) between scheduled collector runs.
pub const POLL_INTERVAL_SECS: u64 = 10;

/// Upstream request timeout (seconds). Must stay below the tick interval so a
/// hung request cannot push into the next tick.
pub const FETCH_TIMEOUT_SECS: u64 = 8;

/// Rows returned by GET /history.
pub const HISTORY_LIMIT: i64 = 50;

/// Pool sizing: one connection for the running tick, the rest for readers.
pub const DB_MAX_CONNECTIONS: u32 = 5;
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Upstream key names that have carried the draw period, highest priority first.
pub const PERIOD_KEYS: &[&str] = &["issueNumber", "issue", "period", "planNo", "issueNo", "drawId"];

/// Upstream key names that have carried the winning number, highest priority first.
pub const NUMBER_KEYS: &[&str] = &["number", "winningNumber", "openNumber", "result", "winNumber", "code"];

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Seconds between scheduled ticks (POLL_INTERVAL_SECS)
    pub poll_interval_secs: u64,
    /// Upstream request timeout in seconds (FETCH_TIMEOUT_SECS)
    pub fetch_timeout_secs: u64,
    /// User-Agent sent upstream (UPSTREAM_USER_AGENT)
    pub user_agent: String,
    /// Optional Referer header (UPSTREAM_REFERER)
    pub referer: Option<String>,
    /// Optional Origin header (UPSTREAM_ORIGIN)
    pub origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. `from_env` passes
    /// the process environment; tests pass a map.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cfg = Self {
            upstream_url: var("UPSTREAM_URL").unwrap_or_else(|| UPSTREAM_URL.to_string()),
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            db_path: var("DB_PATH").unwrap_or_else(|| "draws.db".to_string()),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            poll_interval_secs: parse_secs(&var, "POLL_INTERVAL_SECS", POLL_INTERVAL_SECS)?,
            fetch_timeout_secs: parse_secs(&var, "FETCH_TIMEOUT_SECS", FETCH_TIMEOUT_SECS)?,
            user_agent: var("UPSTREAM_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            referer: var("UPSTREAM_REFERER").filter(|s| !s.trim().is_empty()),
            origin: var("UPSTREAM_ORIGIN").filter(|s| !s.trim().is_empty()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("POLL_INTERVAL_SECS must be at least 1".to_string()));
        }
        if self.fetch_timeout_secs == 0 || self.fetch_timeout_secs >= self.poll_interval_secs {
            return Err(AppError::Config(format!(
                "FETCH_TIMEOUT_SECS ({}) must be between 1 and POLL_INTERVAL_SECS ({}) exclusive",
                self.fetch_timeout_secs, self.poll_interval_secs
            )));
        }
        Ok(())
    }
}

fn parse_secs<F>(var: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::Config(format!("{key} must be a whole number of seconds"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.upstream_url, UPSTREAM_URL);
        assert_eq!(cfg.db_path, "draws.db");
        assert_eq!(cfg.api_port, 8000);
        assert_eq!(cfg.poll_interval_secs, POLL_INTERVAL_SECS);
        assert_eq!(cfg.fetch_timeout_secs, FETCH_TIMEOUT_SECS);
        assert!(cfg.referer.is_none());
        assert!(cfg.origin.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config_from(&[
            ("UPSTREAM_URL", "http://localhost:9999/draws.json"),
            ("API_PORT", "3001"),
            ("POLL_INTERVAL_SECS", "30"),
            ("FETCH_TIMEOUT_SECS", "15"),
            ("UPSTREAM_REFERER", "https://example.test/"),
        ])
        .unwrap();
        assert_eq!(cfg.upstream_url, "http://localhost:9999/draws.json");
        assert_eq!(cfg.api_port, 3001);
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.fetch_timeout_secs, 15);
        assert_eq!(cfg.referer.as_deref(), Some("https://example.test/"));
    }

    #[test]
    fn timeout_must_be_shorter_than_interval() {
        let err = config_from(&[("POLL_INTERVAL_SECS", "10"), ("FETCH_TIMEOUT_SECS", "10")]);
        assert!(matches!(err, Err(AppError::Config(_))));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert!(matches!(config_from(&[("API_PORT", "eighty")]), Err(AppError::Config(_))));
        assert!(matches!(
            config_from(&[("POLL_INTERVAL_SECS", "10s")]),
            Err(AppError::Config(_))
        ));
        assert!(matches!(config_from(&[("POLL_INTERVAL_SECS", "0")]), Err(AppError::Config(_))));
    }
}
