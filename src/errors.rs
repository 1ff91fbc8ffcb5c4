//! CLI boundary error: carries a user-facing message and the process
//! exit code.

use crate::services::retention::{RestoreError, SweepError};
use crate::services::store::StoreError;
use crate::services::upload::UploadError;
use std::fmt;

/// A lightweight wrapper for command failures that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub exit_code: i32,
    pub message: String,
}

impl AppError {
    pub fn new(exit_code: i32, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    /// Shortcut for a generic failure (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let exit_code = match err {
            StoreError::AccessDenied(_) => 2,
            _ => 1,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        AppError::failure(err.to_string())
    }
}

impl From<SweepError> for AppError {
    fn from(err: SweepError) -> Self {
        AppError::failure(err.to_string())
    }
}

impl From<RestoreError> for AppError {
    fn from(err: RestoreError) -> Self {
        AppError::failure(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::failure(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::failure(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::failure(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::failure(err.to_string())
    }
}
