//! Error taxonomy for model acquisition, turn execution and the transcript.

/// Failure reported by an external generation backend.
///
/// Backends map their transport failures onto these variants; `Other` keeps
/// the raw description for services that only hand back text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("{0}")]
    Other(String),
}

/// Raised when a model handle cannot be acquired.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelLoadError {
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("model not found: {0}")]
    NotFound(String),

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ModelLoadError {
    /// Wraps a failed credential exchange.
    pub fn auth(err: ServiceError) -> Self {
        ModelLoadError::AuthFailure(err.to_string())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelLoadError::AuthFailure(_) => "auth_failure",
            ModelLoadError::NotFound(_) => "not_found",
            ModelLoadError::ConnectionFailure(_) => "connection_failure",
            ModelLoadError::Unauthorized(_) => "unauthorized",
            ModelLoadError::Backend(_) => "backend",
        }
    }
}

impl From<ServiceError> for ModelLoadError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized(msg) => ModelLoadError::Unauthorized(msg),
            ServiceError::NotFound(msg) => ModelLoadError::NotFound(msg),
            ServiceError::Connection(msg) => ModelLoadError::ConnectionFailure(msg),
            ServiceError::RateLimited(msg) => ModelLoadError::Backend(format!("rate limited: {msg}")),
            ServiceError::Other(msg) => ModelLoadError::Backend(msg),
        }
    }
}

/// Raised when a chat turn cannot be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no model was supplied")]
    NoModel,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    #[error("{0}")]
    Unknown(String),
}

impl GenerationError {
    /// Classifies a backend failure.
    ///
    /// Typed variants map one-to-one. Untyped descriptions fall back to the
    /// markers a text-only service embeds in its messages.
    pub fn classify(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthorized(msg) => GenerationError::Unauthorized(msg),
            ServiceError::RateLimited(msg) => GenerationError::RateLimited(msg),
            ServiceError::Connection(msg) => GenerationError::ConnectionFailure(msg),
            ServiceError::NotFound(msg) => GenerationError::Unknown(format!("not found: {msg}")),
            ServiceError::Other(msg) => Self::classify_text(msg),
        }
    }

    fn classify_text(msg: String) -> Self {
        if msg.contains("401") {
            GenerationError::Unauthorized(msg)
        } else if msg.contains("429") {
            GenerationError::RateLimited(msg)
        } else if msg.contains("No model was supplied") {
            GenerationError::NoModel
        } else if msg.contains("ConnectionError") {
            GenerationError::ConnectionFailure(msg)
        } else {
            GenerationError::Unknown(msg)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::NoModel => "no_model",
            GenerationError::Unauthorized(_) => "unauthorized",
            GenerationError::RateLimited(_) => "rate_limited",
            GenerationError::ConnectionFailure(_) => "connection_failure",
            GenerationError::Unknown(_) => "unknown",
        }
    }

    /// Message shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::NoModel => {
                "Model not loaded. Check your model selection or connection.".to_string()
            }
            GenerationError::Unauthorized(_) => "Invalid API key or unauthorized access.".to_string(),
            GenerationError::RateLimited(_) => {
                "Rate limit exceeded. Consider using an API key.".to_string()
            }
            GenerationError::ConnectionFailure(_) => {
                "Connection error. Check your internet connection.".to_string()
            }
            GenerationError::Unknown(msg) => format!("An error occurred: {msg}"),
        }
    }
}

/// Operation needs at least one turn in the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("transcript is empty")]
pub struct PreconditionError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_map_directly() {
        assert_eq!(
            GenerationError::classify(ServiceError::RateLimited("slow down".into())),
            GenerationError::RateLimited("slow down".into())
        );
        assert_eq!(
            GenerationError::classify(ServiceError::Connection("refused".into())).kind(),
            "connection_failure"
        );
    }

    #[test]
    fn untyped_text_falls_back_to_markers() {
        let kind = |s: &str| GenerationError::classify(ServiceError::Other(s.into())).kind();
        assert_eq!(kind("HTTP 401 Unauthorized"), "unauthorized");
        assert_eq!(kind("status 429: too many requests"), "rate_limited");
        assert_eq!(kind("No model was supplied, defaulted to gpt2"), "no_model");
        assert_eq!(kind("ConnectionError: host unreachable"), "connection_failure");
        assert_eq!(kind("CUDA out of memory"), "unknown");
    }

    #[test]
    fn load_errors_keep_their_cause() {
        assert_eq!(
            ModelLoadError::from(ServiceError::NotFound("x/y".into())),
            ModelLoadError::NotFound("x/y".into())
        );
        assert_eq!(
            ModelLoadError::auth(ServiceError::Unauthorized("bad token".into())).kind(),
            "auth_failure"
        );
    }

    #[test]
    fn unknown_message_includes_description() {
        let e = GenerationError::Unknown("boom".into());
        assert_eq!(e.user_message(), "An error occurred: boom");
    }
}
