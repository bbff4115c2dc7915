//! Process configuration.
//!
//! Resolved once at startup from environment variables (after `.env` is
//! loaded) and immutable afterwards.
//!
//! | variable | default |
//! |---|---|
//! | `LOG_LEVEL` | `INFO` |
//! | `THRESHOLD` | `0.136868298` |
//! | `HIGH_RISK_THRESHOLD` | `0.9` (three-tier policy only) |
//! | `RISK_POLICY` | `two_tier` |
//! | `RESPONSE_FORMAT` | `html` |
//! | `MODEL_PATH` | `rf_model.json` next to the executable |
//! | `MODEL_SHA256` | unset (no digest pin) |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `5000` |
//! | `APP_DEBUG` | `false` |
//! | `STATIC_DIR` | `static` next to the executable |
//! | `INFERENCE_TIMEOUT_MS` | unset (unbounded) |
//! | `LOG_FILE` | unset (log to stdout) |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::{RiskPolicy, TierScheme, DEFAULT_HIGH_RISK_THRESHOLD, DEFAULT_THRESHOLD};

/// File name of the model artifact looked up next to the executable.
pub const DEFAULT_MODEL_FILE: &str = "rf_model.json";
pub const DEFAULT_PORT: u16 = 5000;

/// Error type for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// How `/predict` renders a successful assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Embedded in the visualization page.
    #[default]
    Html,
    /// Raw JSON.
    Json,
}

impl FromStr for ResponseFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown response format '{other}' (expected html or json)")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Raw `LOG_LEVEL`, if set.
    pub log_level: Option<String>,
    /// Append logs to this file instead of stdout.
    pub log_file: Option<PathBuf>,
    pub threshold: f64,
    pub high_risk_threshold: f64,
    pub risk_scheme: TierScheme,
    pub response_format: ResponseFormat,
    pub model_path: PathBuf,
    /// Expected hex SHA-256 of the model artifact.
    pub model_sha256: Option<String>,
    pub host: IpAddr,
    pub port: u16,
    pub debug: bool,
    pub static_dir: PathBuf,
    pub inference_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = install_dir();
        Self {
            log_level: None,
            log_file: None,
            threshold: DEFAULT_THRESHOLD,
            high_risk_threshold: DEFAULT_HIGH_RISK_THRESHOLD,
            risk_scheme: TierScheme::TwoTier,
            response_format: ResponseFormat::Html,
            model_path: base.join(DEFAULT_MODEL_FILE),
            model_sha256: None,
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            debug: false,
            static_dir: base.join("static"),
            inference_timeout: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` if any variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    /// Returns `ConfigError` if any variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.log_level = get("LOG_LEVEL");
        config.log_file = get("LOG_FILE").map(PathBuf::from);

        if let Some(v) = get("THRESHOLD") {
            config.threshold = parse_probability("THRESHOLD", &v)?;
        }
        if let Some(v) = get("HIGH_RISK_THRESHOLD") {
            config.high_risk_threshold = parse_probability("HIGH_RISK_THRESHOLD", &v)?;
        }
        if let Some(v) = get("RISK_POLICY") {
            config.risk_scheme = v
                .parse()
                .map_err(|e: String| ConfigError::invalid("RISK_POLICY", &v, e))?;
        }
        if config.risk_scheme == TierScheme::ThreeTier
            && config.high_risk_threshold <= config.threshold
        {
            return Err(ConfigError::invalid(
                "HIGH_RISK_THRESHOLD",
                &config.high_risk_threshold.to_string(),
                format!("must be greater than THRESHOLD ({})", config.threshold),
            ));
        }
        if let Some(v) = get("RESPONSE_FORMAT") {
            config.response_format = v
                .parse()
                .map_err(|e: String| ConfigError::invalid("RESPONSE_FORMAT", &v, e))?;
        }

        if let Some(v) = get("MODEL_PATH") {
            config.model_path = PathBuf::from(v);
        }
        if let Some(v) = get("MODEL_SHA256") {
            let digest = v.trim();
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::invalid(
                    "MODEL_SHA256",
                    &v,
                    "expected 64 hex characters",
                ));
            }
            config.model_sha256 = Some(digest.to_ascii_lowercase());
        }

        if let Some(v) = get("HOST") {
            config.host = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("HOST", &v, e))?;
        }
        if let Some(v) = get("PORT") {
            config.port = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &v, e))?;
        }
        if let Some(v) = get("APP_DEBUG") {
            config.debug = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = get("STATIC_DIR") {
            config.static_dir = PathBuf::from(v);
        }
        if let Some(v) = get("INFERENCE_TIMEOUT_MS") {
            let ms: u64 = v
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("INFERENCE_TIMEOUT_MS", &v, e))?;
            if ms == 0 {
                return Err(ConfigError::invalid(
                    "INFERENCE_TIMEOUT_MS",
                    &v,
                    "must be positive",
                ));
            }
            config.inference_timeout = Some(Duration::from_millis(ms));
        }

        Ok(config)
    }

    /// Decision table for the risk classifier.
    #[must_use]
    pub fn risk_policy(&self) -> RiskPolicy {
        RiskPolicy {
            scheme: self.risk_scheme,
            threshold: self.threshold,
            high_risk_threshold: self.high_risk_threshold,
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// `tracing` filter directive for the configured level.
    ///
    /// Accepts the usual level names (`WARNING` and `CRITICAL` included);
    /// unknown names fall back to `info`. Without an explicit level, debug
    /// mode logs at `debug`.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        let Some(level) = &self.log_level else {
            return if self.debug { "debug" } else { "info" };
        };
        match level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => "trace",
            "DEBUG" => "debug",
            "WARN" | "WARNING" => "warn",
            "ERROR" | "CRITICAL" | "FATAL" => "error",
            _ => "info",
        }
    }
}

fn parse_probability(key: &'static str, raw: &str) -> Result<f64, ConfigError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, raw, e))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(key, raw, "must be within [0, 1]"));
    }
    Ok(value)
}

/// Directory containing the running executable, or the working directory
/// when that cannot be determined.
fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
