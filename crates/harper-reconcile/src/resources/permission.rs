//! State-only permission reconciler.
//!
//! A permission object has no remote counterpart. It lives only in the
//! orchestrator's tracked state so that other objects can depend on it.
//! Read trusts the tracked state, so drift is never detected for this kind.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

use crate::error::{Operation, ReconcileResult};
use crate::identity::{derive_identity, updated_identity};
use crate::kind::ObjectKind;
use crate::reconciler::{ensure_supported, ReconciledObject, Reconciler};

const KIND: ObjectKind = ObjectKind::Permission;

/// CRUD flags for one table. Undeclared flags are `false`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableAccess {
    /// May read rows.
    pub read: bool,
    /// May insert rows.
    pub insert: bool,
    /// May update rows.
    pub update: bool,
    /// May delete rows.
    pub delete: bool,
}

impl TableAccess {
    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }
}

/// Declared permission fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PermissionFields {
    /// Grants every permission.
    pub super_user: Option<bool>,
    /// Grants cluster operations.
    pub cluster_user: Option<bool>,
    /// Table name to access flags.
    pub table_permissions: Option<BTreeMap<String, TableAccess>>,
}

/// Tracks permission grants in state only. Holds no client.
#[derive(Debug, Default)]
pub struct PermissionReconciler;

impl PermissionReconciler {
    /// Create a new permission reconciler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Reconciler for PermissionReconciler {
    type Fields = PermissionFields;

    fn kind(&self) -> ObjectKind {
        KIND
    }

    #[instrument(skip(self, plan))]
    async fn create(
        &self,
        plan: PermissionFields,
    ) -> ReconcileResult<ReconciledObject<PermissionFields>> {
        let id = derive_identity(KIND, Operation::Create, &[], None)?;
        debug!("Tracking permission {}", id);
        Ok(ReconciledObject::new(id, plan))
    }

    async fn read(
        &self,
        prior: ReconciledObject<PermissionFields>,
    ) -> ReconcileResult<ReconciledObject<PermissionFields>> {
        Ok(prior)
    }

    #[instrument(skip(self, plan, prior), fields(id = %prior.id))]
    async fn update(
        &self,
        plan: PermissionFields,
        prior: ReconciledObject<PermissionFields>,
    ) -> ReconcileResult<ReconciledObject<PermissionFields>> {
        let id = updated_identity(KIND, &prior.id, &[], None)?;
        debug!("Replacing tracked permission fields");
        Ok(ReconciledObject::new(id, plan))
    }

    async fn delete(&self, prior: ReconciledObject<PermissionFields>) -> ReconcileResult<()> {
        debug!("Forgetting permission {}", prior.id);
        Ok(())
    }

    async fn import(
        &self,
        external_name: &str,
    ) -> ReconcileResult<ReconciledObject<PermissionFields>> {
        ensure_supported(KIND, Operation::Import)?;
        let id = derive_identity(KIND, Operation::Import, &[external_name], None)?;
        Ok(ReconciledObject::new(id, PermissionFields::default()))
    }
}
