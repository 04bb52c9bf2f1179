//! LLM provider implementations

pub mod openai;
pub mod mock;

use std::sync::Arc;
use async_trait::async_trait;
use log::debug;

pub use mock::MockProvider;
pub use openai::OpenAiProvider;

/// Capability set every backend offers.
///
/// The orchestrator only ever talks to this trait, so any backend can
/// be swapped in at construction time.
#[async_trait]
pub trait LlmProvider: Send + Sync
{   /// Generate text for a normalized request.
    ///
    /// On success the response has status SUCCESS and non-blank
    /// content. Every failure mode (transport, timeout, upstream error
    /// payload, empty reply) comes back as `Error`.
    async fn generate_response(
      &self
    , request: &crate::request::GenerationRequest
    ) -> Result<crate::request::PromptResponse, crate::error::Error>;

    /// Never fails: probe errors read as `false`
    async fn is_healthy(&self) -> bool;

    /// Fixed, ordered list of model ids
    fn supported_models(&self)
      -> Result<Vec<String>, crate::error::Error>;

    fn provider_name(&self) -> &str;
}

/// Build the backend named by the configuration
pub fn build_provider(
  config: &crate::config::RelayConfig
) -> Result<Arc<dyn LlmProvider>, crate::error::Error>
{   debug!("Building provider: {}", config.provider.kind);
    match config.provider.kind
    {   crate::ProviderKind::OpenAI => {
          let provider = OpenAiProvider::from_config(
            &config.provider,
            &config.timeouts
          )?;
          Ok(Arc::new(provider))
        }
      , crate::ProviderKind::Mock => {
          Ok(Arc::new(MockProvider::new()))
        }
    }
}
