//! Table reconciler.

use async_trait::async_trait;
use harper_client::RemoteAdmin;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::identity::{derive_identity, split_qualified, updated_identity};
use crate::kind::ObjectKind;
use crate::reconciler::{ensure_supported, required, tolerate_absent, ReconciledObject, Reconciler};

const KIND: ObjectKind = ObjectKind::Table;

/// Declared table fields. Every field requires replacement when changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableFields {
    /// Owning schema.
    pub schema: Option<String>,
    /// Table name.
    pub name: Option<String>,
    /// Primary key attribute.
    pub hash_attribute: Option<String>,
}

impl TableFields {
    /// Fields for a fully declared table.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        hash_attribute: impl Into<String>,
    ) -> Self {
        Self {
            schema: Some(schema.into()),
            name: Some(name.into()),
            hash_attribute: Some(hash_attribute.into()),
        }
    }

    fn located(&self) -> ReconcileResult<(&str, &str, &str)> {
        Ok((
            required(KIND, "schema", &self.schema)?,
            required(KIND, "name", &self.name)?,
            required(KIND, "hash_attribute", &self.hash_attribute)?,
        ))
    }
}

/// Creates and drops tables.
pub struct TableReconciler {
    client: Arc<dyn RemoteAdmin>,
}

impl TableReconciler {
    /// Create a new table reconciler.
    pub fn new(client: Arc<dyn RemoteAdmin>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reconciler for TableReconciler {
    type Fields = TableFields;

    fn kind(&self) -> ObjectKind {
        KIND
    }

    #[instrument(skip(self, plan), fields(schema = ?plan.schema, name = ?plan.name))]
    async fn create(&self, plan: TableFields) -> ReconcileResult<ReconciledObject<TableFields>> {
        let (schema, name, hash_attribute) = plan.located()?;
        let id = derive_identity(KIND, Operation::Create, &[schema, name], None)?;

        self.client
            .create_table(schema, name, hash_attribute)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Create, id.as_str(), e))?;

        info!("Created table: {}", id);
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn read(
        &self,
        prior: ReconciledObject<TableFields>,
    ) -> ReconcileResult<ReconciledObject<TableFields>> {
        let (schema, name) = locate(&prior)?;
        let info = self
            .client
            .describe_table(schema, name)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Read, prior.id.as_str(), e))?;

        if let Some(declared) = prior.fields.hash_attribute.as_deref() {
            if declared != info.hash_attribute {
                warn!(
                    "Table {} hash attribute drifted: tracked '{}', remote '{}'",
                    prior.id, declared, info.hash_attribute
                );
            }
        }

        let fields = TableFields::new(info.schema, info.name, info.hash_attribute);
        Ok(ReconciledObject::new(prior.id.clone(), fields))
    }

    async fn update(
        &self,
        plan: TableFields,
        prior: ReconciledObject<TableFields>,
    ) -> ReconcileResult<ReconciledObject<TableFields>> {
        ensure_supported(KIND, Operation::Update)?;
        let schema = required(KIND, "schema", &plan.schema)?;
        let name = required(KIND, "name", &plan.name)?;
        let id = updated_identity(KIND, &prior.id, &[schema, name], None)?;
        Ok(ReconciledObject::new(id, plan))
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn delete(&self, prior: ReconciledObject<TableFields>) -> ReconcileResult<()> {
        let (schema, name, hash_attribute) = prior.fields.located()?;

        tolerate_absent(
            self.client
                .drop_table(schema, name, hash_attribute)
                .await
                .map_err(|e| ReconcileError::remote(KIND, Operation::Delete, prior.id.as_str(), e)),
        )?;

        info!("Dropped table: {}", prior.id);
        Ok(())
    }

    async fn import(&self, external_name: &str) -> ReconcileResult<ReconciledObject<TableFields>> {
        let (schema, name) = split_qualified(external_name).ok_or_else(|| {
            ReconcileError::validation(
                KIND,
                format!("import name '{}' must have the form <schema>.<name>", external_name),
            )
        })?;

        let id = derive_identity(KIND, Operation::Import, &[schema, name], None)?;
        let fields = TableFields {
            schema: Some(schema.to_string()),
            name: Some(name.to_string()),
            hash_attribute: None,
        };
        Ok(ReconciledObject::new(id, fields))
    }
}

/// Schema and name of a tracked table, from its fields or else its identity.
fn locate(prior: &ReconciledObject<TableFields>) -> ReconcileResult<(&str, &str)> {
    match (prior.fields.schema.as_deref(), prior.fields.name.as_deref()) {
        (Some(schema), Some(name)) if !schema.is_empty() && !name.is_empty() => Ok((schema, name)),
        _ => split_qualified(prior.id.as_str()).ok_or_else(|| {
            ReconcileError::validation(KIND, format!("cannot locate table '{}'", prior.id))
        }),
    }
}
