use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use log::debug;

use super::LlmProvider;
use crate::error::Error;
use crate::request::{GenerationRequest, PromptResponse};

const PROVIDER_NAME: &str = "Mock";

/// Local backend with no network access.
///
/// Replies are deterministic: either the scripted content or an echo
/// of the prompt. A scripted failure is returned for every call.
#[derive(Debug)]
pub struct MockProvider
{   models: Vec<String>
  , reply: Option<String>
  , failure: Option<Error>
  , healthy: bool
  , calls: AtomicUsize
}

impl MockProvider
{   pub fn new() -> Self
    {   MockProvider
        {   models: vec![
              "gpt-3.5-turbo".to_string()
            , "gpt-4".to_string()
            ]
          , reply: None
          , failure: None
          , healthy: true
          , calls: AtomicUsize::new(0)
        }
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where I: IntoIterator<Item = S>
        , S: Into<String>
    {   self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reply(mut self, content: impl Into<String>) -> Self
    {   self.reply = Some(content.into());
        self
    }

    pub fn with_failure(mut self, failure: Error) -> Self
    {   self.failure = Some(failure);
        self
    }

    pub fn with_health(mut self, healthy: bool) -> Self
    {   self.healthy = healthy;
        self
    }

    /// Number of `generate_response` calls so far
    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockProvider
{   fn default() -> Self
    {   MockProvider::new()
    }
}

fn estimate_tokens(prompt: &str, content: &str) -> u32
{   let words = prompt.split_whitespace().count()
      + content.split_whitespace().count();
    u32::try_from(words).unwrap_or(u32::MAX)
}

#[async_trait]
impl LlmProvider for MockProvider
{   async fn generate_response(
      &self
    , request: &GenerationRequest
    ) -> Result<PromptResponse, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        debug!("Mock provider handling request {}", request.id);

        if let Some(failure) = &self.failure
        {   return Err(failure.clone());
        }

        let content = self.reply.clone().unwrap_or_else(||
          format!("Mock response to: {}", request.prompt)
        );
        let tokens = estimate_tokens(&request.prompt, &content);

        Ok(PromptResponse::success(
          request.id.as_str()
        , content
        , request.model.as_str()
        , Some(tokens)
        ))
    }

    async fn is_healthy(&self) -> bool
    {   self.healthy && !self.models.is_empty()
    }

    fn supported_models(&self) -> Result<Vec<String>, Error>
    {   Ok(self.models.clone())
    }

    fn provider_name(&self) -> &str
    {   PROVIDER_NAME
    }
}
