//! Configuration for backend selection and timeouts

use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::ProviderKind;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;

pub const ENV_PROVIDER: &str = "LLM_RELAY_PROVIDER";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_API_URL: &str = "OPENAI_API_URL";
pub const ENV_MODELS: &str = "OPENAI_MODELS";
pub const ENV_TIMEOUT_SECS: &str = "LLM_RELAY_TIMEOUT_SECS";
pub const ENV_HEALTH_TIMEOUT_SECS: &str = "LLM_RELAY_HEALTH_TIMEOUT_SECS";

pub fn default_openai_models() -> Vec<String>
{   [ "gpt-3.5-turbo"
    , "gpt-3.5-turbo-16k"
    , "gpt-4"
    , "gpt-4-turbo-preview"
    ].iter().map(|m| m.to_string()).collect()
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig
{   /// Which backend to build
    pub kind: ProviderKind
  , /// API base URL
    pub api_base: String
  , pub api_key: Option<String>
  , /// Models accepted by the backend
    pub models: Vec<String>
  , /// Hit the models endpoint during health checks
    pub health_probe: bool
}

impl Default for ProviderConfig
{   fn default() -> Self
    {   ProviderConfig
        {   kind: ProviderKind::Mock
          , api_base: DEFAULT_API_BASE.to_string()
          , api_key: None
          , models: default_openai_models()
          , health_probe: false
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig
{   /// Bound on a single dispatch, in seconds
    pub request_timeout_secs: u64
  , /// Bound on a health probe, in seconds
    pub health_timeout_secs: u64
}

impl TimeoutConfig
{   pub fn request_timeout(&self) -> Duration
    {   Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration
    {   Duration::from_secs(self.health_timeout_secs)
    }
}

impl Default for TimeoutConfig
{   fn default() -> Self
    {   TimeoutConfig
        {   request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS
          , health_timeout_secs: DEFAULT_HEALTH_TIMEOUT_SECS
        }
    }
}

/// Relay configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig
{   pub provider: ProviderConfig
  , pub timeouts: TimeoutConfig
}

impl RelayConfig
{   pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   serde_json::from_str(json).map_err(|e| {
          crate::error::Error::InvalidConfiguration(e.to_string())
        })
    }

    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, crate::error::Error>
    {   Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    ///
    /// Without an explicit provider, an API key selects OpenAI and
    /// its absence selects the mock backend.
    pub fn from_lookup<F>(lookup: F)
      -> Result<Self, crate::error::Error>
    where F: Fn(&str) -> Option<String>
    {   let mut config = RelayConfig::default();

        config.provider.api_key = lookup(ENV_API_KEY)
          .filter(|k| !k.trim().is_empty());

        config.provider.kind = match lookup(ENV_PROVIDER)
        {   Some(name) => name.parse()?
          , None if config.provider.api_key.is_some() => ProviderKind::OpenAI
          , None => ProviderKind::Mock
        };

        if let Some(url) = lookup(ENV_API_URL)
        {   config.provider.api_base = url;
        }

        if let Some(models) = lookup(ENV_MODELS)
        {   let models: Vec<String>
              = models.split(',')
                .map(|m| m.trim())
                .filter(|m| !m.is_empty())
                .map(|m| m.to_string())
                .collect();
            if models.is_empty()
            {   return Err(crate::error::Error::InvalidConfiguration(
                  format!("{} lists no models", ENV_MODELS)
                ));
            }
            config.provider.models = models;
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS)
        {   config.timeouts.request_timeout_secs
              = parse_secs(ENV_TIMEOUT_SECS, &secs)?;
        }

        if let Some(secs) = lookup(ENV_HEALTH_TIMEOUT_SECS)
        {   config.timeouts.health_timeout_secs
              = parse_secs(ENV_HEALTH_TIMEOUT_SECS, &secs)?;
        }

        Ok(config)
    }
}

fn parse_secs(key: &str, value: &str)
  -> Result<u64, crate::error::Error>
{   match value.trim().parse::<u64>()
    {   Ok(secs) if secs > 0 => Ok(secs)
      , _ => Err(crate::error::Error::InvalidConfiguration(
          format!("{} must be a positive number of seconds, got '{}'", key, value)
        ))
    }
}
