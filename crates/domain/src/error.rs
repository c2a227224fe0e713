use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("{kind} id must not be empty")]
    EmptyId { kind: &'static str },
    #[error("index {index} is out of range for {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("lightbox has no items to show")]
    EmptyLightbox,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),
    #[error("upload queue step out of order: {0}")]
    QueueOutOfOrder(&'static str),
    #[error("photo not found in feed: {0}")]
    PhotoNotInFeed(String),
    #[error("{field} is invalid: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
}

impl DomainError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}
