use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Fetch error: {message}")]
    Fetch {
        status: Option<u16>,
        message: String,
    },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    #[error("Notification error: {notifier}: {message}")]
    Notification { notifier: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn fetch_status(status: u16, reason: &str) -> Self {
        AppError::Fetch {
            status: Some(status),
            message: format!("HTTP {} {}", status, reason),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        AppError::Persistence {
            message: message.into(),
        }
    }

    /// Errors that belong to the upstream poll and are routed to the error-state tracker.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::Fetch { .. } | AppError::Parse { .. } | AppError::Http(_)
        )
    }
}

// Implement conversion from validation errors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("{}", err))
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
