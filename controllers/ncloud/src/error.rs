//! Reconciler and controller error types.
//!
//! `ReconcileError` is what a single reconciliation operation returns. Every
//! variant carries enough context (kind, handle, last status, vendor error)
//! for the caller to decide whether to retry, abandon or recreate.

use crate::lifecycle::{Goal, Handle};
use ncloud_client::NcloudError;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by reconciliation operations.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The declared spec is inconsistent for the active deployment mode.
    /// Raised before any network call.
    #[error("invalid {kind} spec: {message}")]
    Validation { kind: &'static str, message: String },

    /// The vendor refused a call
    #[error("{kind} {operation} rejected by NCloud: {source}")]
    RemoteRejected {
        kind: &'static str,
        operation: &'static str,
        handle: Option<Handle>,
        #[source]
        source: NcloudError,
    },

    /// The resource entered a failure status (or vanished while being
    /// brought up). Not retried.
    #[error("{kind} {handle} reached failure status {status}")]
    RemoteResourceFailed {
        kind: &'static str,
        handle: Handle,
        status: String,
    },

    /// The deadline elapsed before the goal was reached
    #[error(
        "timed out after {waited:?} waiting for {kind} {handle} to become {goal} (last status: {})",
        .last_status.as_deref().unwrap_or("none")
    )]
    ReconciliationTimeout {
        kind: &'static str,
        handle: Handle,
        goal: Goal,
        last_status: Option<String>,
        waited: Duration,
    },

    /// The handle (or lookup criteria) no longer resolves
    #[error("{kind} {target} not found")]
    NotFound { kind: &'static str, target: String },

    /// A lookup required exactly one match and found several
    #[error("{kind} lookup matched {count} resources, expected exactly one")]
    AmbiguousResult { kind: &'static str, count: usize },

    /// The update touches creation-only fields; destroy and recreate instead
    #[error("{kind} {handle}: immutable fields changed: {}", .fields.join(", "))]
    ImmutableFieldChanged {
        kind: &'static str,
        handle: Handle,
        fields: Vec<&'static str>,
    },

    /// The wait was cancelled; the remote resource is left as it is
    #[error(
        "cancelled while waiting for {kind} {handle} (last status: {})",
        .last_status.as_deref().unwrap_or("none")
    )]
    Cancelled {
        kind: &'static str,
        handle: Handle,
        last_status: Option<String>,
    },
}

impl ReconcileError {
    pub(crate) fn validation(kind: &'static str, message: impl Into<String>) -> Self {
        ReconcileError::Validation {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, target: impl Into<String>) -> Self {
        ReconcileError::NotFound {
            kind,
            target: target.into(),
        }
    }

    /// Map a vendor error; a vendor "not found" on a known handle becomes `NotFound`
    pub(crate) fn remote(
        kind: &'static str,
        operation: &'static str,
        handle: Option<&Handle>,
        source: NcloudError,
    ) -> Self {
        match (handle, source.is_not_found()) {
            (Some(handle), true) => Self::not_found(kind, handle.as_str()),
            _ => ReconcileError::RemoteRejected {
                kind,
                operation,
                handle: handle.cloned(),
                source,
            },
        }
    }

    /// Handle of the affected resource, when one was obtained
    pub fn handle(&self) -> Option<&Handle> {
        match self {
            ReconcileError::RemoteRejected { handle, .. } => handle.as_ref(),
            ReconcileError::RemoteResourceFailed { handle, .. }
            | ReconcileError::ReconciliationTimeout { handle, .. }
            | ReconcileError::ImmutableFieldChanged { handle, .. }
            | ReconcileError::Cancelled { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound { .. })
    }
}

/// Errors that can occur in the NCloud controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading or writing a local file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be parsed
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_yaml::Error),

    /// The state file could not be parsed or written
    #[error("Invalid state file: {0}")]
    StateFile(#[from] serde_json::Error),

    /// The manifest parsed but is inconsistent (duplicate or empty names)
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A `${name}` reference names no resource declared before it
    #[error("{resource} references unknown resource {reference:?}")]
    UnresolvedReference { resource: String, reference: String },

    /// Reconciliation of a declared resource failed
    #[error("Reconciliation of {name} failed: {source}")]
    Reconcile {
        name: String,
        #[source]
        source: ReconcileError,
    },

    /// NCloud client error
    #[error("NCloud error: {0}")]
    Client(#[from] NcloudError),
}

impl ControllerError {
    pub(crate) fn reconcile(name: &str, source: ReconcileError) -> Self {
        ControllerError::Reconcile {
            name: name.to_string(),
            source,
        }
    }
}
