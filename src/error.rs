use thiserror::Error;

/// Failures of the completion service itself (transport layer).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client is not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Missing required workflow field: '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] LlmError),

    #[error("Response is not valid JSON: {0}")]
    Parse(String),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    #[error("Workflow generation failed: {cause}")]
    Fatal {
        #[source]
        cause: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn fatal(cause: PipelineError) -> Self {
        match cause {
            // Never nest one fatal inside another.
            PipelineError::Fatal { .. } => cause,
            other => PipelineError::Fatal { cause: Box::new(other) },
        }
    }

    /// Innermost cause of a fatal failure, or the error itself.
    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Fatal { cause } => cause.root_cause(),
            other => other,
        }
    }
}
