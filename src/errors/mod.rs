// Application error taxonomy and the result alias used by handlers and directories.
use thiserror::Error;

pub mod response;
pub mod store;

pub use store::{StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User already exists: {0}")]
    DuplicateAccount(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Invalid password")]
    InvalidCredentials,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    // Carries the page to send the user back to alongside the message.
    #[error("{message}")]
    Validation { message: String, back_to: &'static str },

    #[error("Invalid file format: {0}")]
    InvalidImport(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Background task failed: {0}")]
    Background(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn validation(message: impl Into<String>, back_to: &'static str) -> Self {
        AppError::Validation {
            message: message.into(),
            back_to,
        }
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
