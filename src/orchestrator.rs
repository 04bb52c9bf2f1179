use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use futures::FutureExt;
use log::{debug, error, info, warn};

use crate::clock::{self, Clock, SystemClock};
use crate::error::{Error, ProcessError};
use crate::id::{IdGenerator, UuidGenerator};
use crate::normalize::{self, DEFAULT_MODEL};
use crate::providers::LlmProvider;
use crate::request::
{   GenerationRequest
  , HealthReport
  , HealthStatus
  , ModelsReport
  , PromptRequest
  , PromptResponse
};

const PROMPT_PREVIEW_CHARS: usize = 50;

/// Request pipeline in front of a single backend.
///
/// Holds no per-request state: concurrent callers share one instance
/// without coordination. The orchestrator is the only place that
/// assigns response ids and timing, and the only place failures are
/// classified.
pub struct Orchestrator
{   provider: Arc<dyn LlmProvider>
  , clock: Arc<dyn Clock>
  , ids: Arc<dyn IdGenerator>
  , request_timeout: Duration
  , health_timeout: Duration
}

impl Orchestrator
{   /// System clock, UUID ids and default timeouts
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self
    {   let timeouts = crate::config::TimeoutConfig::default();
        Orchestrator
        {   provider
          , clock: Arc::new(SystemClock::new())
          , ids: Arc::new(UuidGenerator)
          , request_timeout: timeouts.request_timeout()
          , health_timeout: timeouts.health_timeout()
        }
    }

    /// Select the backend and timeouts from configuration
    pub fn from_config(config: &crate::config::RelayConfig)
      -> Result<Self, Error>
    {   let provider = crate::providers::build_provider(config)?;
        info!(
          "Orchestrator using provider {}",
          provider.provider_name()
        );
        Ok(Orchestrator::new(provider)
          .with_request_timeout(config.timeouts.request_timeout())
          .with_health_timeout(config.timeouts.health_timeout()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self
    {   self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self
    {   self.ids = ids;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self
    {   self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self
    {   self.health_timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str
    {   self.provider.provider_name()
    }

    /// Validate, normalize, check the model, dispatch once, finalize.
    ///
    /// Validation problems and unknown models are `InvalidArgument`
    /// and never reach the backend. Everything that goes wrong from
    /// dispatch on is `Processing`, with the backend error as cause.
    /// No retries.
    pub async fn process_request(
      &self
    , request: PromptRequest
    ) -> Result<PromptResponse, ProcessError>
    {   info!(
          "Processing prompt request: {}",
          prompt_preview(&request.prompt)
        );

        if !normalize::validate(Some(&request))
        {   return Err(ProcessError::InvalidArgument(
              "Invalid request: missing required fields".to_string()
            ));
        }

        let normalized = normalize::apply_defaults(&request);
        let request_id = normalized.id.clone()
          .unwrap_or_else(|| self.ids.next_id());
        let generation
          = GenerationRequest::from_normalized(normalized, request_id);

        let models = self.checked_models().map_err(|cause| {
          error!("Could not read supported models: {}", cause);
          ProcessError::processing(cause)
        })?;

        if !models.iter().any(|m| *m == generation.model)
        {   warn!("Rejecting unsupported model: {}", generation.model);
            return Err(ProcessError::InvalidArgument(
              format!("Model '{}' is not supported", generation.model)
            ));
        }

        let started = self.clock.now();
        let outcome = self.dispatch(&generation).await;
        let finished = self.clock.now();

        let response = outcome.and_then(check_contract)
          .map_err(|cause| {
            error!(
              "Error processing request {}: {}",
              generation.id, cause
            );
            ProcessError::processing(cause)
          })?;

        let elapsed = clock::elapsed_ms(started, finished);
        info!(
          "Successfully processed request {} in {} ms",
          generation.id, elapsed
        );

        // Backend timing and ids are discarded
        Ok(PromptResponse
        {   id: self.ids.next_id()
          , request_id: Some(generation.id)
          , processing_time_ms: elapsed
          , timestamp: finished
          , ..response
        })
    }

    /// Models offered by the backend, or the default model alone if
    /// the backend cannot say.
    pub fn get_available_models(&self) -> Vec<String>
    {   match self.checked_models()
        {   Ok(models) if !models.is_empty() => models
          , Ok(_) => {
              error!("Provider reported no models, using fallback");
              vec![DEFAULT_MODEL.to_string()]
            }
          , Err(e) => {
              error!("Error getting available models: {}", e);
              vec![DEFAULT_MODEL.to_string()]
            }
        }
    }

    /// Backend health bounded by the health timeout. Never fails.
    pub async fn is_service_healthy(&self) -> bool
    {   let probe = AssertUnwindSafe(self.provider.is_healthy())
          .catch_unwind();
        match tokio::time::timeout(self.health_timeout, probe).await
        {   Ok(Ok(healthy)) => healthy
          , Ok(Err(panic)) => {
              error!(
                "Error checking service health: {}",
                panic_message(&*panic)
              );
              false
            }
          , Err(_) => {
              warn!(
                "Health check timed out after {:?}",
                self.health_timeout
              );
              false
            }
        }
    }

    /// ERROR response for a request that failed in `process_request`
    pub fn error_response(
      &self
    , request: &PromptRequest
    , failure: &ProcessError
    ) -> PromptResponse
    {   PromptResponse::error(
          self.ids.next_id()
        , request.id.clone()
        , request.model.clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
        , failure.to_string()
        , self.clock.now()
        )
    }

    pub fn models_report(&self) -> ModelsReport
    {   let models = self.get_available_models();
        ModelsReport
        {   count: models.len()
          , models
          , default_model: DEFAULT_MODEL.to_string()
        }
    }

    pub async fn health_report(&self) -> HealthReport
    {   let healthy = self.is_service_healthy().await;
        HealthReport
        {   status: if healthy
            {   HealthStatus::Healthy
            } else
            {   HealthStatus::Unhealthy
            }
          , provider_healthy: healthy
          , provider: self.provider.provider_name().to_string()
          , version: env!("CARGO_PKG_VERSION").to_string()
          , timestamp: self.clock.now()
        }
    }

    fn checked_models(&self) -> Result<Vec<String>, Error>
    {   let provider = &self.provider;
        match std::panic::catch_unwind(AssertUnwindSafe(||
          provider.supported_models()
        ))
        {   Ok(result) => result
          , Err(panic) => Err(Error::Internal(
              panic_message(&*panic)
            ))
        }
    }

    async fn dispatch(&self, request: &GenerationRequest)
      -> Result<PromptResponse, Error>
    {   debug!(
          "Dispatching request {} to {}",
          request.id,
          self.provider.provider_name()
        );
        let call = AssertUnwindSafe(
          self.provider.generate_response(request)
        ).catch_unwind();

        match tokio::time::timeout(self.request_timeout, call).await
        {   Ok(Ok(result)) => result
          , Ok(Err(panic)) => Err(Error::Internal(
              panic_message(&*panic)
            ))
          , Err(_) => {
              error!(
                "Request {} timed out after {:?}",
                request.id, self.request_timeout
              );
              Err(Error::Timeout)
            }
        }
    }
}

/// A backend must hand back a well-formed SUCCESS
fn check_contract(response: PromptResponse)
  -> Result<PromptResponse, Error>
{   if response.is_successful()
    {   return Ok(response);
    }
    match response.error_message
    {   Some(message) => Err(Error::ApiError(message))
      , None => Err(Error::EmptyContent)
    }
}

fn prompt_preview(prompt: &str) -> String
{   prompt.chars().take(PROMPT_PREVIEW_CHARS).collect()
}

fn panic_message(panic: &(dyn Any + Send)) -> String
{   if let Some(s) = panic.downcast_ref::<&str>()
    {   s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>()
    {   s.clone()
    } else
    {   "backend panicked".to_string()
    }
}
