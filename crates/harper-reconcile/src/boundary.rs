//! Orchestrator boundary.
//!
//! [`ResourceHandler`] is the JSON-level, object-safe view of a
//! [`Reconciler`]. The orchestrator adapter hands it plan and state values
//! as JSON and gets back either the new state or a [`Diagnostic`], never
//! both.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Diagnostic, Operation, ReconcileError};
use crate::kind::ObjectKind;
use crate::reconciler::{ReconciledObject, Reconciler};

/// Result of a boundary call.
pub type HandlerResult<T> = Result<T, Diagnostic>;

/// JSON-level lifecycle operations for one resource type.
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    /// Kind handled.
    fn kind(&self) -> ObjectKind;

    /// Create from a plan value.
    async fn create(&self, plan: Value) -> HandlerResult<Value>;

    /// Re-observe a state value.
    async fn read(&self, state: Value) -> HandlerResult<Value>;

    /// Replace a state value with a plan.
    async fn update(&self, plan: Value, state: Value) -> HandlerResult<Value>;

    /// Remove the object a state value tracks.
    async fn delete(&self, state: Value) -> HandlerResult<()>;

    /// Adopt a remote object by external name.
    async fn import(&self, name: &str) -> HandlerResult<Value>;
}

#[async_trait]
impl<R> ResourceHandler for R
where
    R: Reconciler,
    R::Fields: Serialize + DeserializeOwned,
{
    fn kind(&self) -> ObjectKind {
        Reconciler::kind(self)
    }

    async fn create(&self, plan: Value) -> HandlerResult<Value> {
        let kind = Reconciler::kind(self);
        let plan = parse(kind, Operation::Create, "plan", plan)?;
        respond(kind, Operation::Create, Reconciler::create(self, plan).await)
    }

    async fn read(&self, state: Value) -> HandlerResult<Value> {
        let kind = Reconciler::kind(self);
        let prior = parse(kind, Operation::Read, "state", state)?;
        respond(kind, Operation::Read, Reconciler::read(self, prior).await)
    }

    async fn update(&self, plan: Value, state: Value) -> HandlerResult<Value> {
        let kind = Reconciler::kind(self);
        let plan = parse(kind, Operation::Update, "plan", plan)?;
        let prior = parse(kind, Operation::Update, "state", state)?;
        respond(kind, Operation::Update, Reconciler::update(self, plan, prior).await)
    }

    async fn delete(&self, state: Value) -> HandlerResult<()> {
        let kind = Reconciler::kind(self);
        let prior = parse(kind, Operation::Delete, "state", state)?;
        Reconciler::delete(self, prior)
            .await
            .map_err(|e| failed(kind, Operation::Delete, e))
    }

    async fn import(&self, name: &str) -> HandlerResult<Value> {
        let kind = Reconciler::kind(self);
        respond(kind, Operation::Import, Reconciler::import(self, name).await)
    }
}

fn parse<T: DeserializeOwned>(
    kind: ObjectKind,
    operation: Operation,
    what: &str,
    value: Value,
) -> HandlerResult<T> {
    serde_json::from_value(value).map_err(|e| {
        failed(
            kind,
            operation,
            ReconcileError::validation(kind, format!("unreadable {}: {}", what, e)),
        )
    })
}

fn respond<F: Serialize>(
    kind: ObjectKind,
    operation: Operation,
    result: Result<ReconciledObject<F>, ReconcileError>,
) -> HandlerResult<Value> {
    let object = result.map_err(|e| failed(kind, operation, e))?;
    serde_json::to_value(&object).map_err(|e| {
        Diagnostic::error(
            "SERIALIZATION_ERROR",
            "Invalid State",
            format!("cannot serialize {} state: {}", kind, e),
        )
    })
}

fn failed(kind: ObjectKind, operation: Operation, error: ReconcileError) -> Diagnostic {
    warn!(
        kind = %kind,
        operation = %operation,
        code = error.error_code(),
        "Reconcile failed: {}",
        error
    );
    Diagnostic::from(error)
}
