//! Error types for backend calls and request orchestration

/// Error raised by an LLM backend.
/// Implements Clone so a cause can be kept alongside its wrapper.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error
{   /// API key is missing for a provider
    #[error("Missing API key for: {0}")]
    MissingApiKey(String)
  , /// HTTP request error
    #[error("HTTP error: {0}")]
    HttpError(String)
  , /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String)
  , /// Failed to parse API response
    #[error("Parse error: {0}")]
    ParseError(String)
  , /// No choices in API response
    #[error("API response contained no choices")]
    NoChoicesInResponse
  , /// A choice came back with blank text
    #[error("API response contained empty content")]
    EmptyContent
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
  , /// Timeout error
    #[error("Request timed out")]
    Timeout
  , /// Backend panicked or broke its contract
    #[error("Internal error: {0}")]
    Internal(String)
  , /// Generic error
    #[error("Error: {0}")]
    Other(String)
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

/// Coarse classification used by callers to pick a client or
/// server error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{   InvalidArgument
  , Processing
}

/// Failure of `Orchestrator::process_request`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProcessError
{   /// Rejected before dispatch: bad fields or an unsupported model
    #[error("{0}")]
    InvalidArgument(String)
  , /// Failed during or after dispatch
    #[error("{message}")]
    Processing
    {   message: String
      , #[source]
        cause: Error
    }
}

impl ProcessError
{   /// Wrap a backend error, naming it in the message
    pub fn processing(cause: Error) -> Self
    {   ProcessError::Processing
        {   message: format!("Failed to process request: {}", cause)
          , cause
        }
    }

    pub fn kind(&self) -> ErrorKind
    {   match self
        {   ProcessError::InvalidArgument(_) => ErrorKind::InvalidArgument
          , ProcessError::Processing { .. } => ErrorKind::Processing
        }
    }

    pub fn is_client_error(&self) -> bool
    {   self.kind() == ErrorKind::InvalidArgument
    }

    /// The backend error behind a processing failure
    pub fn cause(&self) -> Option<&Error>
    {   match self
        {   ProcessError::InvalidArgument(_) => None
          , ProcessError::Processing { cause, .. } => Some(cause)
        }
    }
}
