//! Reconciler contract
//!
//! Each object kind implements [`Reconciler`], the five-operation lifecycle
//! driven by the orchestrator:
//!
//! ```text
//! Absent ──Create/Import──▶ Present ──Update──▶ Present'
//!                              │  ▲
//!                              └──┘ Read (observe, detect drift)
//! Present ──Delete──▶ Absent
//! ```
//!
//! Operations run to completion, awaiting any remote call, before they
//! return. The orchestrator must not run two operations on the same
//! identity concurrently.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::identity::Identity;
use crate::kind::ObjectKind;

/// Declared fields paired with a resolved identity.
///
/// Serialized as `{ "id": ..., <fields> }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReconciledObject<F> {
    /// Resolved identity.
    pub id: Identity,

    /// Declared fields, some possibly unknown.
    #[serde(flatten)]
    pub fields: F,
}

impl<F> ReconciledObject<F> {
    /// Pair fields with an identity.
    pub fn new(id: Identity, fields: F) -> Self {
        Self { id, fields }
    }
}

/// Lifecycle operations for one object kind.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Declared field set of the kind.
    type Fields: Clone + Send + Sync + 'static;

    /// The kind this reconciler manages.
    fn kind(&self) -> ObjectKind;

    /// Bring a planned object into existence.
    async fn create(&self, plan: Self::Fields) -> ReconcileResult<ReconciledObject<Self::Fields>>;

    /// Re-observe a tracked object. Never changes the remote.
    async fn read(
        &self,
        prior: ReconciledObject<Self::Fields>,
    ) -> ReconcileResult<ReconciledObject<Self::Fields>>;

    /// Replace a tracked object with a new plan.
    async fn update(
        &self,
        plan: Self::Fields,
        prior: ReconciledObject<Self::Fields>,
    ) -> ReconcileResult<ReconciledObject<Self::Fields>>;

    /// Remove a tracked object.
    async fn delete(&self, prior: ReconciledObject<Self::Fields>) -> ReconcileResult<()>;

    /// Adopt an existing remote object by external name.
    async fn import(&self, external_name: &str) -> ReconcileResult<ReconciledObject<Self::Fields>>;
}

/// A required string field, present and non-empty.
pub(crate) fn required<'a>(
    kind: ObjectKind,
    field: &str,
    value: &'a Option<String>,
) -> ReconcileResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ReconcileError::validation(
            kind,
            format!("missing required field `{}`", field),
        )),
    }
}

/// Reject an operation the kind does not support.
pub(crate) fn ensure_supported(kind: ObjectKind, operation: Operation) -> ReconcileResult<()> {
    if kind.supports(operation) {
        Ok(())
    } else {
        Err(ReconcileError::unsupported(kind, operation))
    }
}

/// Treat "already absent" as a successful delete.
pub(crate) fn tolerate_absent(result: ReconcileResult<()>) -> ReconcileResult<()> {
    match result {
        Err(ReconcileError::RemoteNotFound { kind, name, .. }) => {
            warn!("{} '{}' was already absent; treating delete as done", kind, name);
            Ok(())
        }
        other => other,
    }
}
