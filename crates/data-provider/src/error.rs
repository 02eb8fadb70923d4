// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy shared by every data provider
//!
//! Errors are classified by [`ErrorKind`] so that callers can react to the
//! class of failure without knowing which backend produced it. A dispatching
//! layer must hand these errors back untouched: kind and message are part of
//! the contract.

use thiserror::Error;

/// Result type alias for data provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Backend-agnostic classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The experiment, series or blob does not exist (or was not recognized)
    NotFound,
    /// The request was malformed
    InvalidArgument,
    /// The caller is known but may not access the resource
    PermissionDenied,
    /// The caller could not be identified
    Unauthenticated,
    /// The provider does not support the operation
    Unimplemented,
    /// The provider's storage or upstream service is unreachable
    Unavailable,
    /// Any other failure inside the provider
    Internal,
}

/// Common errors that can occur when reading from a data provider
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum ProviderError {
    /// Requested entity does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Request arguments were rejected
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Caller lacks permission
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// Caller is not authenticated
    #[error("Unauthenticated: {message}")]
    Unauthenticated { message: String },

    /// Operation not supported by this provider
    #[error("Unimplemented: {message}")]
    Unimplemented { message: String },

    /// Backing store unavailable
    #[error("Service unavailable: {message}")]
    Unavailable { message: String },

    /// Internal provider failure
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Provider specific error
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl ProviderError {
    /// Create a not-found error
    pub fn not_found<T: ToString>(message: T) -> Self {
        Self::NotFound {
            message: message.to_string(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument<T: ToString>(message: T) -> Self {
        Self::InvalidArgument {
            message: message.to_string(),
        }
    }

    /// Create a permission-denied error
    pub fn permission_denied<T: ToString>(message: T) -> Self {
        Self::PermissionDenied {
            message: message.to_string(),
        }
    }

    /// Create an unauthenticated error
    pub fn unauthenticated<T: ToString>(message: T) -> Self {
        Self::Unauthenticated {
            message: message.to_string(),
        }
    }

    /// Create an unimplemented error
    pub fn unimplemented<T: ToString>(message: T) -> Self {
        Self::Unimplemented {
            message: message.to_string(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable<T: ToString>(message: T) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    /// Create an internal error
    pub fn internal<T: ToString>(message: T) -> Self {
        Self::Internal {
            message: message.to_string(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::Unimplemented { .. } => ErrorKind::Unimplemented,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Internal { .. } | Self::Custom(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error means the requested entity was not recognized
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error stems from the caller's identity or permissions
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::Unauthenticated { .. }
        )
    }
}
