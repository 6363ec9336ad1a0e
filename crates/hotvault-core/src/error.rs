//! Unified application error types for HotVault.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

use crate::types::amount::TokenAmount;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No contract configuration exists for the requested network.
    InvalidNetwork,
    /// A read against the chain or payment service could not complete.
    UpstreamUnavailable,
    /// Preflight could not bring allowances to sufficiency.
    InsufficientAllowance,
    /// The destination (proof set) creation transaction failed.
    DestinationCreationFailed,
    /// Handing bytes to the storage provider failed.
    TransferFailed,
    /// Registering the root on-chain failed or reverted.
    RootRegistrationFailed,
    /// No independent root confirmation arrived within the bounded wait.
    ConfirmationTimeout,
    /// The caller abandoned the session.
    Cancelled,
    /// Input validation failed.
    Validation,
    /// The requested resource was not found.
    NotFound,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A local I/O error occurred.
    Io,
    /// An external collaborator returned an error.
    ExternalService,
    /// An internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Whether repeating the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNetwork => write!(f, "INVALID_NETWORK"),
            Self::UpstreamUnavailable => write!(f, "UPSTREAM_UNAVAILABLE"),
            Self::InsufficientAllowance => write!(f, "INSUFFICIENT_ALLOWANCE"),
            Self::DestinationCreationFailed => write!(f, "DESTINATION_CREATION_FAILED"),
            Self::TransferFailed => write!(f, "TRANSFER_FAILED"),
            Self::RootRegistrationFailed => write!(f, "ROOT_REGISTRATION_FAILED"),
            Self::ConfirmationTimeout => write!(f, "CONFIRMATION_TIMEOUT"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Io => write!(f, "IO"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Which preflight transaction was being attempted when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreflightStep {
    /// Wallet balance check before any transaction.
    BalanceCheck,
    /// Deposit into the payment escrow.
    Deposit,
    /// Spending approval for the storage service.
    Approval,
}

impl fmt::Display for PreflightStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BalanceCheck => write!(f, "balance check"),
            Self::Deposit => write!(f, "deposit"),
            Self::Approval => write!(f, "approval"),
        }
    }
}

/// Amounts the preflight gate attempted to put in place.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Shortfall {
    /// Amount that was to be deposited into escrow.
    pub deposit: TokenAmount,
    /// Rate allowance (per epoch) that was to be approved.
    pub rate_limit: TokenAmount,
    /// Lockup allowance that was to be approved.
    pub lockup_limit: TokenAmount,
    /// The step that failed.
    pub failed_step: PreflightStep,
}

/// Structured diagnostics attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorDetails {
    /// Attempted preflight amounts.
    Shortfall(Shortfall),
}

/// The unified application error used throughout HotVault.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Optional structured diagnostics.
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            details: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
            details: None,
        }
    }

    /// Re-tag an error with a different kind, keeping the original as the cause.
    pub fn wrap(kind: ErrorKind, message: impl Into<String>, cause: AppError) -> Self {
        Self::with_source(kind, message, cause)
    }

    /// Attach structured diagnostics.
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// Create an invalid-network error.
    pub fn invalid_network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNetwork, message)
    }

    /// Create an upstream-unavailable error.
    pub fn upstream_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    /// Create an insufficient-allowance error carrying the attempted amounts.
    pub fn insufficient_allowance(message: impl Into<String>, shortfall: Shortfall) -> Self {
        Self::new(ErrorKind::InsufficientAllowance, message)
            .with_details(ErrorDetails::Shortfall(shortfall))
    }

    /// Create a destination-creation error.
    pub fn destination_creation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DestinationCreationFailed, message)
    }

    /// Create a transfer error.
    pub fn transfer(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransferFailed, message)
    }

    /// Create a root-registration error.
    pub fn root_registration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RootRegistrationFailed, message)
    }

    /// Create a confirmation-timeout error.
    pub fn confirmation_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfirmationTimeout, message)
    }

    /// Create a cancellation error.
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// The attached shortfall, if any.
    pub fn shortfall(&self) -> Option<&Shortfall> {
        match &self.details {
            Some(ErrorDetails::Shortfall(s)) => Some(s),
            None => None,
        }
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
            details: self.details.clone(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "gateway")]
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() || err.is_connect() {
            ErrorKind::UpstreamUnavailable
        } else if err.is_decode() {
            ErrorKind::Serialization
        } else {
            ErrorKind::ExternalService
        };
        Self::with_source(kind, format!("Gateway request failed: {err}"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::invalid_network("no contracts for 'devnet'");
        assert_eq!(err.to_string(), "INVALID_NETWORK: no contracts for 'devnet'");
    }

    #[test]
    fn test_clone_keeps_details_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::with_source(ErrorKind::Io, "read failed", io).with_details(
            ErrorDetails::Shortfall(Shortfall {
                deposit: TokenAmount::from_base_units(5),
                rate_limit: TokenAmount::from_base_units(1),
                lockup_limit: TokenAmount::from_base_units(5),
                failed_step: PreflightStep::Deposit,
            }),
        );
        let cloned = err.clone();
        assert!(cloned.source.is_none());
        assert_eq!(
            cloned.shortfall().map(|s| s.failed_step),
            Some(PreflightStep::Deposit)
        );
    }

    #[test]
    fn test_only_upstream_is_retryable() {
        assert!(ErrorKind::UpstreamUnavailable.is_retryable());
        assert!(!ErrorKind::InsufficientAllowance.is_retryable());
        assert!(!ErrorKind::ConfirmationTimeout.is_retryable());
    }
}
