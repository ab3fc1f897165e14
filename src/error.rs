//! Error types for the fetch → filter → aggregate pipeline.

use std::fmt;

/// Failures raised by the Fetcher and Paginator.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a response body.
    Transport { url: String, message: String },
    /// The body was not JSON, or not the expected payload shape.
    Decode { url: String, message: String },
    /// The API answered with its `{ status, message }` error shape.
    Remote { status: u16, message: String },
    /// Non-success HTTP status without a recognisable error body.
    Status { url: String, status: u16 },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { url, message } => write!(f, "GET {} failed: {}", url, message),
            Self::Decode { url, message } => {
                write!(f, "failed to decode response from {}: {}", url, message)
            }
            Self::Remote { status, message } => write!(f, "API error {}: {}", status, message),
            Self::Status { url, status } => write!(f, "GET {} returned HTTP {}", url, status),
        }
    }
}

impl std::error::Error for ApiError {}

/// A run that cannot be aggregated without corrupting the timeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingDuration { run_id: String },
    InvalidDuration { run_id: String, seconds: f64 },
    MissingPlayers { run_id: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDuration { run_id } => write!(f, "run {} has no primary time", run_id),
            Self::InvalidDuration { run_id, seconds } => {
                write!(f, "run {} has invalid primary time {}", run_id, seconds)
            }
            Self::MissingPlayers { run_id } => {
                write!(f, "run {} has no embedded player data", run_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Any fatal pipeline failure. No partial table is produced alongside one.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Api(ApiError),
    Validation(ValidationError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "fetch failed: {}", e),
            Self::Validation(e) => write!(f, "invalid run data: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Validation(e) => Some(e),
        }
    }
}

impl From<ApiError> for PipelineError {
    fn from(e: ApiError) -> Self {
        Self::Api(e)
    }
}

impl From<ValidationError> for PipelineError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}
