use thiserror::Error;

/// Errors raised by the prediction pipeline.
///
/// Only `InvalidConfiguration` aborts a run. The other variants describe
/// degradations that the pipeline absorbs: missing optional data falls back
/// to heuristics, and a classifier failure falls back to the seasonal rules
/// for the affected cell.
#[derive(Debug, Error)]
pub enum PfzError {
    /// Bad grid bounds, resolution, or clustering parameters.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A model artifact, scaler, or land geometry dataset could not be used.
    #[error("optional data unavailable ({resource}): {reason}")]
    OptionalDataUnavailable {
        resource: &'static str,
        reason: String,
    },

    /// The model artifact is loaded but inference failed for one input.
    #[error("classifier runtime error: {0}")]
    ClassifierRuntime(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PfzError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn unavailable(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::OptionalDataUnavailable { resource, reason: reason.into() }
    }

    /// `true` for the variants that must abort a run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidConfiguration(_))
    }
}

pub type Result<T> = std::result::Result<T, PfzError>;
