//! Schema reconciler.

use async_trait::async_trait;
use harper_client::RemoteAdmin;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::identity::{derive_identity, updated_identity};
use crate::kind::ObjectKind;
use crate::reconciler::{ensure_supported, required, tolerate_absent, ReconciledObject, Reconciler};

const KIND: ObjectKind = ObjectKind::Schema;

/// Declared schema fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchemaFields {
    /// Schema name. Changing it replaces the schema.
    pub name: Option<String>,
}

impl SchemaFields {
    /// Fields for a named schema.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// Creates and drops schemas.
pub struct SchemaReconciler {
    client: Arc<dyn RemoteAdmin>,
}

impl SchemaReconciler {
    /// Create a new schema reconciler.
    pub fn new(client: Arc<dyn RemoteAdmin>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reconciler for SchemaReconciler {
    type Fields = SchemaFields;

    fn kind(&self) -> ObjectKind {
        KIND
    }

    #[instrument(skip(self, plan), fields(name = ?plan.name))]
    async fn create(&self, plan: SchemaFields) -> ReconcileResult<ReconciledObject<SchemaFields>> {
        let name = required(KIND, "name", &plan.name)?;

        self.client
            .create_schema(name)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Create, name, e))?;

        let id = derive_identity(KIND, Operation::Create, &[name], None)?;
        info!("Created schema: {}", id);
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn read(
        &self,
        prior: ReconciledObject<SchemaFields>,
    ) -> ReconcileResult<ReconciledObject<SchemaFields>> {
        let name = prior.id.as_str();
        let info = self
            .client
            .describe_schema(name)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Read, name, e))?;

        debug!("Schema {} has {} tables", info.name, info.tables.len());
        Ok(ReconciledObject::new(prior.id.clone(), SchemaFields::named(info.name)))
    }

    async fn update(
        &self,
        plan: SchemaFields,
        prior: ReconciledObject<SchemaFields>,
    ) -> ReconcileResult<ReconciledObject<SchemaFields>> {
        ensure_supported(KIND, Operation::Update)?;
        let name = required(KIND, "name", &plan.name)?;
        let id = updated_identity(KIND, &prior.id, &[name], None)?;
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn delete(&self, prior: ReconciledObject<SchemaFields>) -> ReconcileResult<()> {
        let name = prior.fields.name.as_deref().unwrap_or(prior.id.as_str());

        tolerate_absent(
            self.client
                .drop_schema(name)
                .await
                .map_err(|e| ReconcileError::remote(KIND, Operation::Delete, name, e)),
        )?;

        info!("Dropped schema: {}", name);
        Ok(())
    }

    async fn import(&self, external_name: &str) -> ReconcileResult<ReconciledObject<SchemaFields>> {
        let id = derive_identity(KIND, Operation::Import, &[external_name], None)?;
        Ok(ReconciledObject::new(id, SchemaFields::named(external_name)))
    }
}
