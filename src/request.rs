//! Request and response types shared by the orchestrator and backends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound prompt request as received from the transport layer.
/// Optional fields are filled by `normalize::apply_defaults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PromptRequest
{   /// Caller-supplied id, assigned by the orchestrator when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>
  , /// The prompt text
    pub prompt: String
  , /// Model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
  , /// Max tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , /// Temperature for sampling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>
  , #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>
  , /// Prior messages, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<String>>
}

impl PromptRequest
{   pub fn new(prompt: impl Into<String>) -> Self
    {   PromptRequest
        {   prompt: prompt.into()
          , ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self
    {   self.id = Some(id.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self
    {   self.user_id = Some(user_id.into());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self
    {   self.context = Some(context);
        self
    }
}

/// A validated request with every generation parameter resolved.
/// This is the only request shape a backend ever sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest
{   pub id: String
  , pub prompt: String
  , pub model: String
  , pub max_tokens: u32
  , pub temperature: f64
  , pub user_id: Option<String>
  , pub context: Vec<String>
}

impl GenerationRequest
{   /// Build from a request that has been through `apply_defaults`.
    /// Missing fields fall back to the same defaults.
    pub fn from_normalized(request: PromptRequest, id: String) -> Self
    {   GenerationRequest
        {   id
          , prompt: request.prompt
          , model: request.model.unwrap_or_else(||
              crate::normalize::DEFAULT_MODEL.to_string()
            )
          , max_tokens: request.max_tokens
              .unwrap_or(crate::normalize::DEFAULT_MAX_TOKENS)
          , temperature: request.temperature
              .unwrap_or(crate::normalize::DEFAULT_TEMPERATURE)
          , user_id: request.user_id
          , context: request.context.unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus
{   Success
  , Error
}

/// Unified prompt response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse
{   pub id: String
  , pub request_id: Option<String>
  , /// Generated text, only on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>
  , /// Model that generated it
    pub model: String
  , /// Tokens used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>
  , pub processing_time_ms: f64
  , pub timestamp: DateTime<Utc>
  , pub status: ResponseStatus
  , /// Only on error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>
}

impl PromptResponse
{   /// Successful reply. Id and timing are placeholders until the
    /// orchestrator finalizes the response.
    pub fn success(
      request_id: impl Into<String>
    , content: impl Into<String>
    , model: impl Into<String>
    , tokens_used: Option<u32>
    ) -> Self
    {   PromptResponse
        {   id: String::new()
          , request_id: Some(request_id.into())
          , content: Some(content.into())
          , model: model.into()
          , tokens_used
          , processing_time_ms: 0.0
          , timestamp: Utc::now()
          , status: ResponseStatus::Success
          , error_message: None
        }
    }

    pub fn error(
      id: impl Into<String>
    , request_id: Option<String>
    , model: impl Into<String>
    , error_message: impl Into<String>
    , timestamp: DateTime<Utc>
    ) -> Self
    {   PromptResponse
        {   id: id.into()
          , request_id
          , content: None
          , model: model.into()
          , tokens_used: None
          , processing_time_ms: 0.0
          , timestamp
          , status: ResponseStatus::Error
          , error_message: Some(error_message.into())
        }
    }

    /// SUCCESS with non-blank content and no error message
    pub fn is_successful(&self) -> bool
    {   self.status == ResponseStatus::Success
          && self.error_message.is_none()
          && self.content
              .as_deref()
              .is_some_and(|c| !c.trim().is_empty())
    }

    /// ERROR with a message and no content
    pub fn is_error(&self) -> bool
    {   self.status == ResponseStatus::Error
          && self.content.is_none()
          && self.error_message
              .as_deref()
              .is_some_and(|m| !m.is_empty())
    }
}

/// Models offered by the active backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelsReport
{   pub models: Vec<String>
  , pub default_model: String
  , pub count: usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus
{   Healthy
  , Unhealthy
}

/// Service health snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport
{   pub status: HealthStatus
  , pub provider_healthy: bool
  , pub provider: String
  , pub version: String
  , pub timestamp: DateTime<Utc>
}
