//! Error types for reconciliation
//!
//! This module defines the errors a reconciler operation can end with and
//! the structured diagnostic handed back to the orchestrator for each.

use harper_acl::CodecError;
use harper_client::ClientError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::kind::ObjectKind;

/// The five lifecycle operations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Absent to Present from a plan.
    Create,
    /// Present to Present, re-fetching remote state.
    Read,
    /// Present to Present' under the same identity.
    Update,
    /// Present to Absent.
    Delete,
    /// Absent to Present from an external name.
    Import,
}

impl Operation {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation error types.
///
/// Nothing is retried internally; every error is surfaced to the
/// orchestrator as a [`Diagnostic`].
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A declared field is missing or unusable
    #[error("invalid {kind} declaration: {message}")]
    Validation {
        /// Object kind.
        kind: ObjectKind,
        /// What is wrong.
        message: String,
    },

    /// The declared permission tree has the wrong shape
    #[error("malformed permission tree: {0}")]
    MalformedTree(#[from] CodecError),

    /// The remote call succeeded but returned no usable identity
    #[error("{kind} {operation} succeeded but returned no identity")]
    IdentityUnavailable {
        /// Object kind.
        kind: ObjectKind,
        /// Operation that needed the identity.
        operation: Operation,
    },

    /// The kind does not support the operation
    #[error("{operation} is not supported for {kind} objects")]
    UnsupportedOperation {
        /// Object kind.
        kind: ObjectKind,
        /// Rejected operation.
        operation: Operation,
    },

    /// The object already exists remotely
    #[error("{kind} '{name}' already exists: {source}")]
    RemoteConflict {
        /// Object kind.
        kind: ObjectKind,
        /// Object name or identity.
        name: String,
        /// What the remote reported.
        #[source]
        source: ClientError,
    },

    /// The object is absent remotely on Read or Delete
    #[error("{kind} '{name}' does not exist: {source}")]
    RemoteNotFound {
        /// Object kind.
        kind: ObjectKind,
        /// Object name or identity.
        name: String,
        /// What the remote reported.
        #[source]
        source: ClientError,
    },

    /// Any other remote failure
    #[error("Unable to {operation} {kind}, got error: {source}")]
    Client {
        /// Object kind.
        kind: ObjectKind,
        /// Operation in progress.
        operation: Operation,
        /// Underlying client error.
        #[source]
        source: ClientError,
    },
}

/// Result type for reconciler operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

impl ReconcileError {
    /// Wrap a client error.
    ///
    /// Conflicts become `RemoteConflict`. Not-found becomes `RemoteNotFound`
    /// only on Read and Delete, where it means the object itself is absent;
    /// on Create and Update it names some other object (a missing schema or
    /// role) and stays a `Client` error.
    pub fn remote(kind: ObjectKind, operation: Operation, name: &str, error: ClientError) -> Self {
        match (operation, error) {
            (_, source @ ClientError::Conflict(_)) => ReconcileError::RemoteConflict {
                kind,
                name: name.to_string(),
                source,
            },
            (Operation::Read | Operation::Delete, source @ ClientError::NotFound(_)) => {
                ReconcileError::RemoteNotFound {
                    kind,
                    name: name.to_string(),
                    source,
                }
            }
            (_, source) => ReconcileError::Client {
                kind,
                operation,
                source,
            },
        }
    }

    /// An object the remote listing does not contain.
    pub fn absent(kind: ObjectKind, name: &str, listing: &str) -> Self {
        ReconcileError::RemoteNotFound {
            kind,
            name: name.to_string(),
            source: ClientError::NotFound(format!("'{}' is not in {}", name, listing)),
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(kind: ObjectKind, message: impl Into<String>) -> Self {
        ReconcileError::Validation {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an unsupported operation.
    pub fn unsupported(kind: ObjectKind, operation: Operation) -> Self {
        ReconcileError::UnsupportedOperation { kind, operation }
    }

    /// Whether the error reports a missing remote object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::RemoteNotFound { .. })
    }

    /// Get error code for diagnostics.
    pub fn error_code(&self) -> &'static str {
        match self {
            ReconcileError::Validation { .. } => "VALIDATION_ERROR",
            ReconcileError::MalformedTree(_) => "MALFORMED_TREE",
            ReconcileError::IdentityUnavailable { .. } => "IDENTITY_UNAVAILABLE",
            ReconcileError::UnsupportedOperation { .. } => "UNSUPPORTED_OPERATION",
            ReconcileError::RemoteConflict { .. } => "REMOTE_CONFLICT",
            ReconcileError::RemoteNotFound { .. } => "REMOTE_NOT_FOUND",
            ReconcileError::Client { .. } => "CLIENT_ERROR",
        }
    }

    /// Short, human-readable headline.
    pub fn summary(&self) -> &'static str {
        match self {
            ReconcileError::Validation { .. } => "Invalid Configuration",
            ReconcileError::MalformedTree(_) => "Invalid Permission Tree",
            ReconcileError::IdentityUnavailable { .. } => "Missing Identity",
            ReconcileError::UnsupportedOperation { .. } => "Unsupported Operation",
            ReconcileError::RemoteConflict { .. } => "Already Exists",
            ReconcileError::RemoteNotFound { .. } => "Not Found",
            ReconcileError::Client { .. } => "Client Error",
        }
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The operation failed.
    Error,
}

/// Structured failure handed to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Stable error code (e.g., `REMOTE_CONFLICT`).
    pub code: String,
    /// Headline.
    pub summary: String,
    /// Full message.
    pub detail: String,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: impl Into<String>, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl From<&ReconcileError> for Diagnostic {
    fn from(error: &ReconcileError) -> Self {
        Diagnostic::error(error.error_code(), error.summary(), error.to_string())
    }
}

impl From<ReconcileError> for Diagnostic {
    fn from(error: ReconcileError) -> Self {
        Diagnostic::from(&error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.summary, self.detail)
    }
}
