//! Request validation and default values

use log::warn;
use crate::request::PromptRequest;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const MAX_PROMPT_CHARS: usize = 10_000;
pub const MIN_MAX_TOKENS: u32 = 1;
pub const MAX_MAX_TOKENS: u32 = 4000;
pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 2.0;

/// Check a request before any work is done on it.
///
/// Never fails loudly: the caller decides what to tell the user.
/// Prompt length is counted in characters, not bytes.
pub fn validate(request: Option<&PromptRequest>) -> bool
{   let request = match request
    {   Some(r) => r
      , None => {
          warn!("Request validation failed: request is missing");
          return false;
        }
    };

    if request.prompt.trim().is_empty()
    {   warn!("Request validation failed: prompt is empty");
        return false;
    }

    let prompt_chars = request.prompt.chars().count();
    if prompt_chars > MAX_PROMPT_CHARS
    {   warn!(
          "Request validation failed: prompt too long ({} characters)",
          prompt_chars
        );
        return false;
    }

    if let Some(max_tokens) = request.max_tokens
    {   if !(MIN_MAX_TOKENS..=MAX_MAX_TOKENS).contains(&max_tokens)
        {   warn!(
              "Request validation failed: invalid max_tokens value: {}",
              max_tokens
            );
            return false;
        }
    }

    // NaN falls outside the range too
    if let Some(temperature) = request.temperature
    {   if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature)
        {   warn!(
              "Request validation failed: invalid temperature value: {}",
              temperature
            );
            return false;
        }
    }

    true
}

/// Copy of `request` with every absent optional field defaulted.
/// Present fields are never overwritten, so this is idempotent.
pub fn apply_defaults(request: &PromptRequest) -> PromptRequest
{   PromptRequest
    {   id: request.id.clone()
      , prompt: request.prompt.clone()
      , model: Some(
          request.model.clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
        )
      , max_tokens: Some(request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS))
      , temperature: Some(
          request.temperature.unwrap_or(DEFAULT_TEMPERATURE)
        )
      , user_id: request.user_id.clone()
      , context: request.context.clone()
    }
}
