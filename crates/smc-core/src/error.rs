//! # AppError
//!
//! Centralized error handling for the StopMalwareContent API.
//! Maps domain-specific failures to actionable error types; the API layer
//! turns each variant into a status code.

use thiserror::Error;

/// The primary error type for all smc-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing, invalid or expired bearer token
    #[error("{0}")]
    Unauthorized(String),

    /// Login with anything but the master credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Report reason outside the fixed vocabulary; carries the rejected code
    #[error("Invalid reason")]
    InvalidReason(String),

    /// Captcha oracle rejected the token (or could not be reached)
    #[error("Invalid captcha")]
    InvalidCaptcha,

    /// A report for this domain already exists; carries the domain
    #[error("Report already exists")]
    DuplicateReport(String),

    /// Constructor-level validation failure (e.g. blank domain)
    #[error("validation error: {0}")]
    Validation(String),

    /// Infrastructure failure (e.g. store unreachable)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for StopMalwareContent logic.
pub type Result<T> = std::result::Result<T, AppError>;
