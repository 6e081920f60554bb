/// Convenience result type used across gloperate.
pub type GloperateResult<T> = Result<T, GloperateError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Configuration and type-mismatch errors are fatal at pipeline-assembly
/// time; context, resource and processing errors are stage-local and are
/// absorbed by the scheduler (logged, outputs left stale).
#[derive(thiserror::Error, Debug)]
pub enum GloperateError {
    /// Invalid pipeline assembly: duplicate stage names, unknown slots,
    /// cyclic stage dependencies.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Attempt to connect two slots of different payload types.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Missing or invalid rendering context at processing time.
    #[error("context error: {0}")]
    Context(String),

    /// A resource loader failed or no loader matched the request.
    #[error("resource error: {0}")]
    Resource(String),

    /// A stage failed mid-computation; its outputs stay at their
    /// pre-failure validity.
    #[error("processing error: {0}")]
    Process(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GloperateError {
    /// Build a [`GloperateError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`GloperateError::TypeMismatch`] value.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Build a [`GloperateError::Context`] value.
    pub fn context(msg: impl Into<String>) -> Self {
        Self::Context(msg.into())
    }

    /// Build a [`GloperateError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`GloperateError::Process`] value.
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Whether this error class must abort pipeline assembly/processing
    /// instead of being absorbed as a stage-local failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::TypeMismatch(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
