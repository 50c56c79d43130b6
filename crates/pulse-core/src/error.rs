use crate::types::enums::EntityType;
use pulse_events::Collection;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },
    #[error("{collection} row not found: {id}")]
    NotFound { collection: Collection, id: String },
    #[error("backend rejected write: {message}")]
    Rejected { message: String },
}

impl BackendError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Network-class failures; a later attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl ValidationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error(transparent)]
    Remote(#[from] BackendError),
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityType, id: String },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl MutationError {
    /// One-line notice suitable for showing to the user.
    pub fn user_notice(&self) -> String {
        match self {
            Self::Remote(err) if err.is_transient() => {
                "Could not reach the server. Your change was not saved.".to_string()
            }
            Self::Remote(err) => format!("The server rejected the change: {err}"),
            Self::NotFound { entity, .. } => format!("That {entity} no longer exists."),
            Self::Invalid(ValidationError::InvalidInput { message }) => {
                format!("Please check your input: {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("reasoning service not configured")]
    Unconfigured,
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("rate limited")]
    RateLimited,
    #[error("unexpected status {code}")]
    Status { code: u16 },
    #[error("response contained no json")]
    NoJson,
    #[error("response json did not parse: {message}")]
    Parse { message: String },
    #[error("response json failed validation: {message}")]
    Schema { message: String },
}

impl AiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    pub fn user_notice(&self) -> &'static str {
        match self {
            Self::RateLimited => "The AI service is rate limited, retry shortly.",
            Self::Unconfigured => "AI analysis is not configured; showing an offline estimate.",
            _ => "AI generation failed; showing an offline estimate.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("a reply is still pending")]
    Busy,
    #[error("message is empty")]
    EmptyMessage,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config: {message}")]
    Parse { message: String },
}

#[derive(Debug, Error)]
pub enum PulseError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
