use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx answer from the backend
    #[error("Backend error {status}: {message}")]
    Backend {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid API response: {0}")]
    ParseError(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Message suitable for showing to the user, before translation
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Backend { message, .. } => message.clone(),
            ApiError::HttpError(e) if e.is_connect() || e.is_request() => {
                "Failed to fetch".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Backend { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

impl From<aes_gcm::Error> for ApiError {
    fn from(err: aes_gcm::Error) -> Self {
        ApiError::EncryptionError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_accessors() {
        let err = ApiError::Backend {
            status: 409,
            code: Some("23505".to_string()),
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.code(), Some("23505"));
        assert_eq!(err.user_message(), "duplicate key value");
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(ApiError::Timeout(12).to_string(), "Request timed out after 12s");
        assert_eq!(ApiError::Timeout(12).code(), None);
    }
}
