use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace, error, warn};

use super::LlmProvider;
use crate::error::Error;
use crate::request::{GenerationRequest, PromptResponse};

const PROVIDER_NAME: &str = "OpenAI";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

impl ChatMessage
{   fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: "user".to_string()
          , content: content.into()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub max_tokens: u32
  , pub temperature: f64
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   #[serde(default)]
    pub model: Option<String>
  , #[serde(default)]
    pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
  , #[serde(default)]
    pub error: Option<ApiErrorBody>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ChatMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: Option<u32>
  , #[serde(default)]
    pub completion_tokens: Option<u32>
  , #[serde(default)]
    pub total_tokens: Option<u32>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody
{   pub message: String
  , #[serde(default, rename = "type")]
    pub kind: Option<String>
  , #[serde(default)]
    pub code: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope
{   error: ApiErrorBody
}

// ===== OpenAI Provider =====

/// Chat-completions backend. Works against any OpenAI-compatible
/// endpoint through `api_base`.
pub struct OpenAiProvider
{   api_base: String
  , api_key: Option<String>
  , models: Vec<String>
  , health_probe: bool
  , health_timeout: Duration
  , http_client: reqwest::Client
}

impl OpenAiProvider
{   pub fn from_config(
      provider: &crate::config::ProviderConfig
    , timeouts: &crate::config::TimeoutConfig
    ) -> Result<Self, Error>
    {   debug!("Creating OpenAiProvider for {}", provider.api_base);

        if provider.api_base.trim().is_empty()
        {   return Err(Error::InvalidConfiguration(
              "api_base is empty".to_string()
            ));
        }

        let http_client = reqwest::Client::builder()
          .timeout(timeouts.request_timeout())
          .build()
          .map_err(|e| Error::InvalidConfiguration(e.to_string()))?;

        Ok(OpenAiProvider
        {   api_base: provider.api_base
              .trim_end_matches('/')
              .to_string()
          , api_key: provider.api_key.clone()
          , models: provider.models.clone()
          , health_probe: provider.health_probe
          , health_timeout: timeouts.health_timeout()
          , http_client
        })
    }

    fn api_key(&self) -> Result<&str, Error>
    {   self.api_key.as_deref()
          .ok_or_else(|| {
            error!("No API key configured");
            Error::MissingApiKey(PROVIDER_NAME.to_string())
          })
    }

    fn build_request(request: &GenerationRequest)
      -> ChatCompletionRequest
    {   let mut messages: Vec<ChatMessage>
          = request.context
            .iter()
            .map(|c| ChatMessage::user(c.as_str()))
            .collect();
        messages.push(ChatMessage::user(request.prompt.as_str()));

        ChatCompletionRequest
        {   model: request.model.clone()
          , messages
          , max_tokens: request.max_tokens
          , temperature: request.temperature
          , user: request.user_id.clone()
        }
    }

    fn into_response(
      body: ChatCompletionResponse
    , request: &GenerationRequest
    ) -> Result<PromptResponse, Error>
    {   if let Some(api_error) = body.error
        {   error!("OpenAI returned error payload: {}", api_error.message);
            return Err(Error::ApiError(
              format!("OpenAI API returned error: {}", api_error.message)
            ));
        }

        let choice = body.choices
          .into_iter()
          .next()
          .ok_or_else(|| {
            error!("No choices in response");
            Error::NoChoicesInResponse
          })?;

        if choice.message.content.trim().is_empty()
        {   error!("Empty content in response");
            return Err(Error::EmptyContent);
        }

        let model = body.model
          .filter(|m| !m.is_empty())
          .unwrap_or_else(|| request.model.clone());

        Ok(PromptResponse::success(
          request.id.as_str()
        , choice.message.content
        , model
        , body.usage.and_then(|u| u.total_tokens)
        ))
    }

    async fn probe_models_endpoint(&self) -> Result<(), Error>
    {   let api_key = self.api_key()?;
        let response = self.http_client
          .get(format!("{}/models", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .timeout(self.health_timeout)
          .send()
          .await
          .map_err(map_transport_error)?;

        let status = response.status();
        trace!("Models response status: {}", status);
        if !status.is_success()
        {   return Err(Error::ApiError(format!("HTTP {}", status)));
        }
        Ok(())
    }
}

fn map_transport_error(e: reqwest::Error) -> Error
{   if e.is_timeout()
    {   error!("OpenAI request timed out: {}", e);
        Error::Timeout
    } else
    {   error!("HTTP error: {}", e);
        Error::HttpError(e.to_string())
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider
{   async fn generate_response(
      &self
    , request: &GenerationRequest
    ) -> Result<PromptResponse, Error>
    {   debug!("Sending request to OpenAI for model: {}", request.model);

        let api_key = self.api_key()?;
        let payload = Self::build_request(request);
        trace!("OpenAI request: {:?}", payload);

        let response = self.http_client
          .post(format!("{}/chat/completions", self.api_base))
          .header("Authorization", format!("Bearer {}", api_key))
          .header("Content-Type", "application/json")
          .json(&payload)
          .send()
          .await
          .map_err(map_transport_error)?;

        let status = response.status();
        trace!("OpenAI response status: {}", status);

        let text = response.text().await
          .map_err(map_transport_error)?;

        if !status.is_success()
        {   let detail = serde_json::from_str::<ErrorEnvelope>(&text)
              .map(|envelope| envelope.error.message)
              .unwrap_or(text);
            error!("OpenAI API error: {} - {}", status, detail);
            return Err(Error::ApiError(
              format!("HTTP {}: {}", status.as_u16(), detail)
            ));
        }

        let body: ChatCompletionResponse
          = serde_json::from_str(&text).map_err(|e| {
            error!("Parse error: {}", e);
            Error::ParseError(e.to_string())
          })?;

        Self::into_response(body, request)
    }

    async fn is_healthy(&self) -> bool
    {   match self.supported_models()
        {   Ok(models) if !models.is_empty() => {}
          , _ => {
              warn!("OpenAI health check failed: no models configured");
              return false;
            }
        }

        if !self.health_probe
        {   return true;
        }

        match self.probe_models_endpoint().await
        {   Ok(()) => {
              debug!("OpenAI health check passed");
              true
            }
          , Err(e) => {
              warn!("OpenAI health check failed: {}", e);
              false
            }
        }
    }

    fn supported_models(&self) -> Result<Vec<String>, Error>
    {   if self.models.is_empty()
        {   return Err(Error::InvalidConfiguration(
              "no models configured for OpenAI".to_string()
            ));
        }
        Ok(self.models.clone())
    }

    fn provider_name(&self) -> &str
    {   PROVIDER_NAME
    }
}
