//! Endpoint and credential configuration, injected once at construction.
//!
//! # Environment Variables
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | Backend URL | `RATEFOLD_BACKEND_URL` | `BACKEND_URL` |
//! | Backend key | `RATEFOLD_BACKEND_KEY` | `BACKEND_API_KEY` |
//! | Official provider URL | `RATEFOLD_OFFICIAL_URL` | `OFFICIAL_API_URL` |
//! | Official provider key | `RATEFOLD_OFFICIAL_KEY` | `OFFICIAL_API_KEY` |
//! | P2P provider URL | `RATEFOLD_P2P_URL` | `P2P_API_URL` |
//! | History provider URL | `RATEFOLD_HISTORY_URL` | `HISTORY_API_URL` |
//! | Request timeout (ms) | `RATEFOLD_TIMEOUT_MS` | - |
//! | Custom rates (`name=value;...`) | `RATEFOLD_CUSTOM_RATES` | - |

use std::env;
use std::io;
use std::path::PathBuf;

use crate::ValidationError;

/// Per-request timeout applied when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// User-defined rate shown next to the fetched instruments.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRateConfig {
    pub name: String,
    pub value: f64,
}

impl CustomRateConfig {
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::EmptySetting {
                field: "custom_rate.name",
            });
        }
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "custom_rate.value",
            });
        }
        if value < 0.0 {
            return Err(ValidationError::NegativeValue {
                field: "custom_rate.value",
            });
        }
        Ok(Self { name, value })
    }

    /// Parses `name=value`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidCustomRate {
            value: input.to_owned(),
        };
        let (name, value) = input.split_once('=').ok_or_else(invalid)?;
        let value = value.trim().parse::<f64>().map_err(|_| invalid())?;
        Self::new(name, value)
    }
}

/// Endpoints, credentials and limits for every rate source.
#[derive(Debug, Clone, PartialEq)]
pub struct RatesConfig {
    pub backend_url: Option<String>,
    pub backend_key: Option<String>,
    pub official_provider_url: Option<String>,
    pub official_provider_key: Option<String>,
    pub p2p_provider_url: Option<String>,
    pub history_provider_url: Option<String>,
    /// `None` disables the per-request timeout.
    pub timeout_ms: Option<u64>,
    pub custom_rates: Vec<CustomRateConfig>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            backend_key: None,
            official_provider_url: None,
            official_provider_key: None,
            p2p_provider_url: None,
            history_provider_url: None,
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            custom_rates: Vec::new(),
        }
    }
}

impl RatesConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ValidationError> {
        if let Some(error) = dotenv_problem(dotenvy::dotenv()) {
            tracing::warn!(%error, "ignoring unusable .env file");
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |primary: &str, fallback: Option<&str>| {
            lookup(primary)
                .or_else(|| fallback.and_then(&lookup))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let timeout_ms = match read("RATEFOLD_TIMEOUT_MS", None) {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => Some(DEFAULT_TIMEOUT_MS),
        };

        let custom_rates = read("RATEFOLD_CUSTOM_RATES", None)
            .map(|raw| {
                raw.split(';')
                    .filter(|entry| !entry.trim().is_empty())
                    .map(CustomRateConfig::parse)
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let config = Self {
            backend_url: read("RATEFOLD_BACKEND_URL", Some("BACKEND_URL")),
            backend_key: read("RATEFOLD_BACKEND_KEY", Some("BACKEND_API_KEY")),
            official_provider_url: read("RATEFOLD_OFFICIAL_URL", Some("OFFICIAL_API_URL")),
            official_provider_key: read("RATEFOLD_OFFICIAL_KEY", Some("OFFICIAL_API_KEY")),
            p2p_provider_url: read("RATEFOLD_P2P_URL", Some("P2P_API_URL")),
            history_provider_url: read("RATEFOLD_HISTORY_URL", Some("HISTORY_API_URL")),
            timeout_ms,
            custom_rates,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_backend(mut self, url: impl Into<String>, key: Option<String>) -> Self {
        self.backend_url = Some(url.into());
        self.backend_key = key;
        self
    }

    pub fn with_official_provider(mut self, url: impl Into<String>, key: Option<String>) -> Self {
        self.official_provider_url = Some(url.into());
        self.official_provider_key = key;
        self
    }

    pub fn with_p2p_provider(mut self, url: impl Into<String>) -> Self {
        self.p2p_provider_url = Some(url.into());
        self
    }

    pub fn with_history_provider(mut self, url: impl Into<String>) -> Self {
        self.history_provider_url = Some(url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_custom_rate(mut self, rate: CustomRateConfig) -> Self {
        self.custom_rates.push(rate);
        self
    }

    /// Checks URL shapes, timeout and custom values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_url("backend_url", self.backend_url.as_deref())?;
        validate_url(
            "official_provider_url",
            self.official_provider_url.as_deref(),
        )?;
        validate_url("p2p_provider_url", self.p2p_provider_url.as_deref())?;
        validate_url("history_provider_url", self.history_provider_url.as_deref())?;

        if self.timeout_ms == Some(0) {
            return Err(ValidationError::InvalidNumber {
                field: "timeout_ms",
                value: String::from("0"),
            });
        }

        for rate in &self.custom_rates {
            CustomRateConfig::new(rate.name.clone(), rate.value)?;
        }

        Ok(())
    }

    /// Backend base URL without a trailing slash.
    pub(crate) fn backend_base(&self) -> Option<&str> {
        self.backend_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
    }
}

fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.trim().is_empty() {
        return Err(ValidationError::EmptySetting { field });
    }
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ValidationError::InvalidUrl {
            field,
            value: value.to_owned(),
        });
    }
    Ok(())
}

fn parse_timeout(raw: &str) -> Result<u64, ValidationError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::InvalidNumber {
            field: "timeout_ms",
            value: raw.to_owned(),
        }),
    }
}

/// A missing `.env` is normal; anything else is worth a warning.
fn dotenv_problem(outcome: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    match outcome {
        Ok(_) => None,
        Err(dotenvy::Error::Io(error)) if error.kind() == io::ErrorKind::NotFound => None,
        Err(error) => Some(error),
    }
}
