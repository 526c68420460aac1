//! Error type for the trigger host and table sink

use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Database(diesel::result::Error),
    Pool(r2d2::Error),
    InvalidPayload(serde_json::Error),
    Broker(String),
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Pool(e) => write!(f, "Database pool error: {}", e),
            AppError::InvalidPayload(e) => write!(f, "Invalid message payload: {}", e),
            AppError::Broker(msg) => write!(f, "Broker error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            AppError::Pool(e) => Some(e),
            AppError::InvalidPayload(e) => Some(e),
            AppError::Broker(_) | AppError::Config(_) => None,
        }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(e: diesel::result::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::InvalidPayload(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            AppError::Config("DATABASE_URL must be set".to_string()).to_string(),
            "Configuration error: DATABASE_URL must be set"
        );
        assert_eq!(
            AppError::Broker("timed out".to_string()).to_string(),
            "Broker error: timed out"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let app: AppError = err.into();
        assert!(matches!(app, AppError::InvalidPayload(_)));
        assert!(app.to_string().starts_with("Invalid message payload"));
    }
}
