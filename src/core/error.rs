//! Defines the custom error types for the bulk-verify application.

use std::io;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// The primary error type for the verification workflow.
#[derive(Error, Debug)]
pub enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error initializing necessary components (e.g., the HTTP client).
    #[error("Initialization Error: {0}")]
    Initialization(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error during JSON serialization or deserialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error parsing a URL.
    #[error("URL Parsing Error: {0}")]
    UrlParse(#[from] UrlParseError),

    /// Transport-level failure making an HTTP request via reqwest.
    #[error("HTTP Request Error: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status code.
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus {
        /// The status code returned by the backend.
        status: u16,
        /// The (possibly truncated) response body.
        body: String,
    },

    /// A bulk submission was attempted with no addresses.
    #[error("No valid email addresses to verify")]
    EmptyBatch,

    /// A bulk submission exceeded the configured batch size.
    #[error("Batch of {count} emails exceeds the maximum of {max}")]
    BatchTooLarge {
        /// Number of addresses in the rejected batch.
        count: usize,
        /// Configured maximum batch size.
        max: usize,
    },

    /// An address failed the client-side format check.
    #[error("Invalid email format: '{0}'")]
    InvalidEmailFormat(String),

    /// Polling was requested but no job has been submitted.
    #[error("No verification job is active")]
    NoActiveJob,

    /// A new job or poll was requested while a poll task is still registered.
    #[error("A poll is already running for job {0}")]
    PollAlreadyActive(String),

    /// Error related to concurrency or task execution.
    #[error("Task Execution Error: {0}")]
    Task(String),

    /// An underlying error that doesn't fit other categories, using anyhow.
    #[error("Generic Error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors raised before any request left the client.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            AppError::EmptyBatch
                | AppError::BatchTooLarge { .. }
                | AppError::InvalidEmailFormat(_)
                | AppError::NoActiveJob
                | AppError::PollAlreadyActive(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
