//! Error types shared across qtov crates.

use std::path::PathBuf;

use qtov_job_model::job::JobError;

/// Top-level error type for qtov operations.
#[derive(Debug, thiserror::Error)]
pub enum QtovError {
    #[error("Invalid job: {message}")]
    Validation { message: String },

    #[error("Probe error: {message}")]
    Probe { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using QtovError.
pub type QtovResult<T> = Result<T, QtovError>;

impl QtovError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }
}

impl From<JobError> for QtovError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Invalid { message } => Self::Validation { message },
            JobError::Parse(e) => Self::Validation {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_messages() {
        assert_eq!(
            QtovError::render("ffmpeg exited").to_string(),
            "Render error: ffmpeg exited"
        );
        assert_eq!(
            QtovError::validation("quote is empty").to_string(),
            "Invalid job: quote is empty"
        );
    }

    #[test]
    fn test_job_error_becomes_validation() {
        let err: QtovError = JobError::invalid("quote must be a non-empty string").into();
        assert!(matches!(err, QtovError::Validation { .. }));
        assert_eq!(err.to_string(), "Invalid job: quote must be a non-empty string");

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: QtovError = JobError::Parse(parse).into();
        assert!(matches!(err, QtovError::Validation { .. }));
    }

    #[test]
    fn test_io_error_is_transparent() {
        let err: QtovError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err.to_string(), "disk gone");
    }
}
