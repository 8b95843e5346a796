use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpendError {
    #[error("Not logged in (or the session expired). Run `spendlog login` first.")]
    AuthRequired,

    #[error("Request failed ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Could not reach the backend: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("No expense with id {0}")]
    NotFound(String),

    #[error("Expense {id}: invalid amount {raw:?}")]
    InvalidAmount { id: String, raw: String },

    #[error("Expense {id}: invalid date {raw:?}")]
    InvalidDate { id: String, raw: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl SpendError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SpendError::Validation(msg.into())
    }

    /// Remote failures are the ones that leave local state untouched and
    /// may simply be retried by the user.
    pub fn is_remote(&self) -> bool {
        matches!(self, SpendError::Remote { .. } | SpendError::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, SpendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_includes_status() {
        let e = SpendError::Remote { status: 500, message: "boom".into() };
        assert_eq!(e.to_string(), "Request failed (500): boom");
        assert!(e.is_remote());
    }

    #[test]
    fn test_validation_is_not_remote() {
        let e = SpendError::validation("All fields are required.");
        assert_eq!(e.to_string(), "All fields are required.");
        assert!(!e.is_remote());
    }
}
