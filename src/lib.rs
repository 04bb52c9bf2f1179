pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod normalize;
pub mod clock;
pub mod id;
pub mod orchestrator;
use serde::{Deserialize, Serialize};

/*

llm-relay takes a prompt request, checks it, fills in defaults, hands it
to whichever backend is configured and returns a timed, identified
response. Backends are interchangeable behind `providers::LlmProvider`.

llm-relay/
├── Cargo.toml
├── src/
│   ├── lib.rs           # Re-exports and shared enums
│   ├── error.rs         # Backend errors and request classification
│   ├── config.rs        # Backend selection and timeouts
│   ├── request.rs       # Request/response types
│   ├── normalize.rs     # Validation and defaults
│   ├── clock.rs         # Injectable time source
│   ├── id.rs            # Injectable id source
│   ├── orchestrator.rs  # validate -> normalize -> dispatch -> finalize
│   └── providers/
│       ├── mod.rs       # LlmProvider trait and factory
│       ├── openai.rs    # Chat-completions HTTP backend
│       └── mock.rs      # Deterministic local backend
└── tests/

*/

pub use error::{Error, ErrorKind, ProcessError};
pub use config::RelayConfig;
pub use orchestrator::Orchestrator;
pub use providers::LlmProvider;
pub use request::
{   GenerationRequest
  , PromptRequest
  , PromptResponse
  , ResponseStatus
};

/// Backends that can be selected at deployment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind
{   /// OpenAI chat completions (or any compatible endpoint)
    OpenAI
  , /// Local deterministic backend, no network
    Mock
}

impl std::str::FromStr for ProviderKind
{   type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "openai" => Ok(ProviderKind::OpenAI)
          , "mock" => Ok(ProviderKind::Mock)
          , other => Err(crate::error::Error::InvalidConfiguration(
              format!("Unknown provider: {}", other)
            ))
        }
    }
}

impl std::fmt::Display for ProviderKind
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   match self
        {   ProviderKind::OpenAI => write!(f, "openai")
          , ProviderKind::Mock => write!(f, "mock")
        }
    }
}

/// Install env_logger as the `log` backend. Safe to call repeatedly.
pub fn init_logging()
{   let _ = env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
