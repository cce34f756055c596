//! Error taxonomy shared by every dashboard operation.
//!
//! Validation failures never reach the network, `Unauthorized` means the
//! session was invalidated, backend and transport failures carry the message
//! shown inline, and document failures happen after the business operation
//! already succeeded.

use thiserror::Error;

use crate::reservations::ReservationError;

/// Generic message used when the backend gives us nothing better.
pub const GENERIC_API_ERROR: &str = "Request to the restaurant backend failed";

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Reservation(#[from] ReservationError),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in or the session has expired. Please log in again.")]
    Unauthorized,

    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    #[error("Document generation failed: {0}")]
    Document(String),

    #[error("Session storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DashboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for failures caught before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Reservation(_) | Self::Validation(_))
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// The message displayed inline next to the form or list.
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend { message, .. } if message.trim().is_empty() => {
                GENERIC_API_ERROR.to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_backend_message_falls_back_to_generic_text() {
        let err = DashboardError::Backend {
            status: 500,
            message: "  ".into(),
        };
        assert_eq!(err.user_message(), GENERIC_API_ERROR);
    }

    #[test]
    fn reservation_errors_count_as_validation() {
        let err: DashboardError = ReservationError::InvalidPhone.into();
        assert!(err.is_validation());
        assert_eq!(err.user_message(), "invalid phone");
        assert!(!DashboardError::Unauthorized.is_validation());
    }
}
