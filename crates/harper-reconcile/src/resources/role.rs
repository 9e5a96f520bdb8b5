//! Role reconciler.
//!
//! A role's declared fields are the top-level flags plus a nested
//! `schema_permissions` tree; together they encode into a [`Permission`]
//! through [`harper_acl::encode`]. Identity is the id the remote issues on
//! add and returns again on alter.

use async_trait::async_trait;
use harper_acl::codec::{CLUSTER_USER, SCHEMA_PERMISSIONS, SUPER_USER};
use harper_acl::{decode, encode, Permission};
use harper_client::{RemoteAdmin, RoleInfo};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::identity::{derive_identity, updated_identity};
use crate::kind::ObjectKind;
use crate::reconciler::{required, tolerate_absent, ReconciledObject, Reconciler};

const KIND: ObjectKind = ObjectKind::Role;

/// Declared role fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoleFields {
    /// Role name.
    pub name: Option<String>,
    /// Grants every permission.
    pub super_user: Option<bool>,
    /// Grants cluster operations.
    pub cluster_user: Option<bool>,
    /// Nested `schema -> tables -> table -> attribute_permissions` tree.
    pub schema_permissions: Option<Value>,
}

impl RoleFields {
    /// Fields for a role with no grants.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Assemble the declared permission tree, omitting undeclared slots.
    pub fn permission_tree(&self) -> Value {
        let mut root = Map::new();
        if let Some(flag) = self.super_user {
            root.insert(SUPER_USER.to_string(), Value::Bool(flag));
        }
        if let Some(flag) = self.cluster_user {
            root.insert(CLUSTER_USER.to_string(), Value::Bool(flag));
        }
        if let Some(tree) = &self.schema_permissions {
            root.insert(SCHEMA_PERMISSIONS.to_string(), tree.clone());
        }
        Value::Object(root)
    }

    /// Encode the declared tree into a [`Permission`].
    pub fn permission(&self) -> ReconcileResult<Permission> {
        Ok(encode(&self.permission_tree())?)
    }
}

/// Adds, alters and drops roles.
pub struct RoleReconciler {
    client: Arc<dyn RemoteAdmin>,
}

impl RoleReconciler {
    /// Create a new role reconciler.
    pub fn new(client: Arc<dyn RemoteAdmin>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reconciler for RoleReconciler {
    type Fields = RoleFields;

    fn kind(&self) -> ObjectKind {
        KIND
    }

    #[instrument(skip(self, plan), fields(name = ?plan.name))]
    async fn create(&self, plan: RoleFields) -> ReconcileResult<ReconciledObject<RoleFields>> {
        let name = required(KIND, "name", &plan.name)?;
        let permission = plan.permission()?;

        let role = self
            .client
            .add_role(name, &permission)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Create, name, e))?;

        let id = derive_identity(KIND, Operation::Create, &[name], role.id.as_deref())?;
        info!("Created role {}: {}", name, id);
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn read(
        &self,
        prior: ReconciledObject<RoleFields>,
    ) -> ReconcileResult<ReconciledObject<RoleFields>> {
        let id = prior.id.as_str();
        let role = self
            .client
            .find_role(id)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Read, id, e))?
            .ok_or_else(|| ReconcileError::absent(KIND, id, "list_roles"))?;

        let fields = observed(&prior.fields, role);
        Ok(ReconciledObject::new(prior.id.clone(), fields))
    }

    #[instrument(skip(self, plan, prior), fields(id = %prior.id, name = ?plan.name))]
    async fn update(
        &self,
        plan: RoleFields,
        prior: ReconciledObject<RoleFields>,
    ) -> ReconcileResult<ReconciledObject<RoleFields>> {
        let name = required(KIND, "name", &plan.name)?;
        let permission = plan.permission()?;

        let role = self
            .client
            .alter_role(prior.id.as_str(), name, &permission)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Update, prior.id.as_str(), e))?;

        let id = updated_identity(KIND, &prior.id, &[name], role.id.as_deref())?;
        if id != prior.id {
            info!("Role {} reissued as {}", prior.id, id);
        } else {
            info!("Updated role: {}", id);
        }
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn delete(&self, prior: ReconciledObject<RoleFields>) -> ReconcileResult<()> {
        let id = prior.id.as_str();

        tolerate_absent(
            self.client
                .drop_role(id)
                .await
                .map_err(|e| ReconcileError::remote(KIND, Operation::Delete, id, e)),
        )?;

        info!("Dropped role: {}", id);
        Ok(())
    }

    async fn import(&self, external_name: &str) -> ReconcileResult<ReconciledObject<RoleFields>> {
        let id = derive_identity(KIND, Operation::Import, &[], Some(external_name))?;
        Ok(ReconciledObject::new(id, RoleFields::default()))
    }
}

/// Merge a fetched role into tracked fields.
///
/// When the remote grant equals what the tracked fields encode to, the
/// tracked declaration is kept as written. Otherwise the remote grant is
/// decoded into the tree; flags the tracked state never declared stay
/// undeclared while they are `false` remotely.
fn observed(prior: &RoleFields, role: RoleInfo) -> RoleFields {
    let name = Some(role.name);
    if prior.permission().ok().as_ref() == Some(&role.permission) {
        debug!("Role permission matches tracked state");
        return RoleFields { name, ..prior.clone() };
    }

    if !prior.permission_tree().as_object().map_or(true, Map::is_empty) {
        warn!("Role permission drifted from tracked state");
    }

    let tree = decode(&role.permission);
    let schema_permissions = match tree.get(SCHEMA_PERMISSIONS) {
        Some(schemas) if prior.schema_permissions.is_some() || !role.permission.schemas.is_empty() => {
            Some(schemas.clone())
        }
        _ => None,
    };

    RoleFields {
        name,
        super_user: observed_flag(prior.super_user, role.permission.super_user),
        cluster_user: observed_flag(prior.cluster_user, role.permission.cluster_user),
        schema_permissions,
    }
}

fn observed_flag(prior: Option<bool>, remote: bool) -> Option<bool> {
    match prior {
        None if !remote => None,
        _ => Some(remote),
    }
}
