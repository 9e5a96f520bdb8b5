//! User reconciler.
//!
//! Users are altered in place: an Update sends the whole field set to the
//! remote and recomputes identity from the (possibly changed) username.

use async_trait::async_trait;
use harper_client::{RemoteAdmin, UserSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::identity::{derive_identity, updated_identity, Identity};
use crate::kind::ObjectKind;
use crate::reconciler::{required, tolerate_absent, ReconciledObject, Reconciler};

const KIND: ObjectKind = ObjectKind::User;

/// Default for an undeclared `active` flag.
pub const DEFAULT_ACTIVE: bool = true;

/// Declared user fields.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserFields {
    /// Login name.
    pub username: Option<String>,
    /// Login password. Never readable from the remote.
    pub password: Option<String>,
    /// Name of the role the user is assigned.
    pub role: Option<String>,
    /// Whether the account can log in.
    pub active: Option<bool>,
}

impl UserFields {
    /// Fields for an active user.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: Some(username.into()),
            password: Some(password.into()),
            role: Some(role.into()),
            active: Some(DEFAULT_ACTIVE),
        }
    }

    fn spec(&self) -> ReconcileResult<UserSpec> {
        Ok(UserSpec {
            username: required(KIND, "username", &self.username)?.to_string(),
            password: required(KIND, "password", &self.password)?.to_string(),
            role: required(KIND, "role", &self.role)?.to_string(),
            active: self.active.unwrap_or(DEFAULT_ACTIVE),
        })
    }
}

impl fmt::Debug for UserFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFields")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("role", &self.role)
            .field("active", &self.active)
            .finish()
    }
}

/// Adds, alters and drops users.
pub struct UserReconciler {
    client: Arc<dyn RemoteAdmin>,
}

impl UserReconciler {
    /// Create a new user reconciler.
    pub fn new(client: Arc<dyn RemoteAdmin>) -> Self {
        Self { client }
    }

    /// Send the full field set and return the new state. Alters the user
    /// when a prior identity is tracked, adds it otherwise.
    async fn apply(
        &self,
        plan: UserFields,
        prior: Option<&Identity>,
    ) -> ReconcileResult<ReconciledObject<UserFields>> {
        let spec = plan.spec()?;
        let username = spec.username.as_str();
        let (operation, result) = match prior {
            Some(_) => (Operation::Update, self.client.alter_user(&spec).await),
            None => (Operation::Create, self.client.add_user(&spec).await),
        };
        result.map_err(|e| ReconcileError::remote(KIND, operation, username, e))?;

        let id = match prior {
            Some(prior) => updated_identity(KIND, prior, &[username], None)?,
            None => derive_identity(KIND, operation, &[username], None)?,
        };
        let fields = UserFields {
            active: Some(spec.active),
            ..plan
        };
        Ok(ReconciledObject::new(id, fields))
    }
}

#[async_trait]
impl Reconciler for UserReconciler {
    type Fields = UserFields;

    fn kind(&self) -> ObjectKind {
        KIND
    }

    #[instrument(skip(self, plan), fields(username = ?plan.username))]
    async fn create(&self, plan: UserFields) -> ReconcileResult<ReconciledObject<UserFields>> {
        let object = self.apply(plan, None).await?;
        info!("Created user: {}", object.id);
        Ok(object)
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn read(
        &self,
        prior: ReconciledObject<UserFields>,
    ) -> ReconcileResult<ReconciledObject<UserFields>> {
        let username = prior.id.as_str();
        let info = self
            .client
            .find_user(username)
            .await
            .map_err(|e| ReconcileError::remote(KIND, Operation::Read, username, e))?
            .ok_or_else(|| ReconcileError::absent(KIND, username, "list_users"))?;

        debug!("User {} is {}", info.username, if info.active { "active" } else { "inactive" });
        let fields = UserFields {
            username: Some(info.username),
            password: prior.fields.password.clone(),
            role: info.role.or_else(|| prior.fields.role.clone()),
            active: Some(info.active),
        };
        Ok(ReconciledObject::new(prior.id.clone(), fields))
    }

    #[instrument(skip(self, plan, prior), fields(id = %prior.id, username = ?plan.username))]
    async fn update(
        &self,
        plan: UserFields,
        prior: ReconciledObject<UserFields>,
    ) -> ReconcileResult<ReconciledObject<UserFields>> {
        let object = self.apply(plan, Some(&prior.id)).await?;
        if object.id != prior.id {
            info!("Renamed user {} to {}", prior.id, object.id);
        } else {
            info!("Updated user: {}", object.id);
        }
        Ok(object)
    }

    #[instrument(skip(self, prior), fields(id = %prior.id))]
    async fn delete(&self, prior: ReconciledObject<UserFields>) -> ReconcileResult<()> {
        let username = prior.fields.username.as_deref().unwrap_or(prior.id.as_str());

        tolerate_absent(
            self.client
                .drop_user(username)
                .await
                .map_err(|e| ReconcileError::remote(KIND, Operation::Delete, username, e)),
        )?;

        info!("Dropped user: {}", username);
        Ok(())
    }

    async fn import(&self, external_name: &str) -> ReconcileResult<ReconciledObject<UserFields>> {
        let id = derive_identity(KIND, Operation::Import, &[external_name], None)?;
        let fields = UserFields {
            username: Some(external_name.to_string()),
            ..UserFields::default()
        };
        Ok(ReconciledObject::new(id, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeAdmin;

    fn setup() -> (Arc<FakeAdmin>, UserReconciler) {
        let fake = Arc::new(FakeAdmin::new());
        let reconciler = UserReconciler::new(fake.clone());
        (fake, reconciler)
    }

    #[tokio::test]
    async fn test_create_defaults_active() {
        let (fake, reconciler) = setup();
        let plan = UserFields {
            active: None,
            ..UserFields::new("alice", "secret", "reader")
        };

        let object = reconciler.create(plan).await.unwrap();
        assert_eq!(object.id.as_str(), "alice");
        assert_eq!(object.fields.active, Some(true));

        let stored = fake.user("alice").unwrap();
        assert!(stored.active);
        assert_eq!(stored.role, "reader");
    }

    #[tokio::test]
    async fn test_create_requires_password() {
        let (fake, reconciler) = setup();
        let plan = UserFields {
            password: None,
            ..UserFields::new("alice", "secret", "reader")
        };

        let err = reconciler.create(plan).await.unwrap_err();
        assert!(err.to_string().contains("password"));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_alters_whole_user() {
        let (fake, reconciler) = setup();
        let prior = reconciler
            .create(UserFields::new("alice", "secret", "reader"))
            .await
            .unwrap();

        let plan = UserFields {
            active: Some(false),
            ..UserFields::new("alice", "changed", "writer")
        };
        let object = reconciler.update(plan, prior).await.unwrap();
        assert_eq!(object.id.as_str(), "alice");

        let stored = fake.user("alice").unwrap();
        assert_eq!(stored.password, "changed");
        assert_eq!(stored.role, "writer");
        assert!(!stored.active);
        assert_eq!(fake.calls(), vec!["add_user alice", "alter_user alice"]);
    }

    #[tokio::test]
    async fn test_update_recomputes_identity() {
        let (_fake, reconciler) = setup();
        reconciler
            .create(UserFields::new("bob", "secret", "reader"))
            .await
            .unwrap();
        let prior = reconciler
            .create(UserFields::new("alice", "secret", "reader"))
            .await
            .unwrap();

        let object = reconciler
            .update(UserFields::new("bob", "secret", "reader"), prior)
            .await
            .unwrap();
        assert_eq!(object.id.as_str(), "bob");
    }

    #[tokio::test]
    async fn test_import_leaves_fields_unresolved() {
        let (fake, reconciler) = setup();

        let object = reconciler.import("alice").await.unwrap();
        assert_eq!(object.id.as_str(), "alice");
        assert_eq!(object.fields.username.as_deref(), Some("alice"));
        assert_eq!(object.fields.password, None);
        assert_eq!(object.fields.role, None);
        assert_eq!(object.fields.active, None);
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_read_fills_remote_fields_and_keeps_password() {
        let (fake, reconciler) = setup();
        let created = reconciler
            .create(UserFields::new("alice", "secret", "reader"))
            .await
            .unwrap();
        fake.set_user_active("alice", false);

        let read = reconciler.read(created).await.unwrap();
        assert_eq!(read.id.as_str(), "alice");
        assert_eq!(read.fields.active, Some(false));
        assert_eq!(read.fields.role.as_deref(), Some("reader"));
        assert_eq!(read.fields.password.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_read_missing_user() {
        let (_fake, reconciler) = setup();
        let imported = reconciler.import("ghost").await.unwrap();

        let err = reconciler.read(imported).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_tolerates_absent() {
        let (fake, reconciler) = setup();
        let prior = reconciler
            .create(UserFields::new("alice", "secret", "reader"))
            .await
            .unwrap();

        reconciler.delete(prior.clone()).await.unwrap();
        reconciler.delete(prior).await.unwrap();
        assert!(fake.user("alice").is_none());
    }

    #[test]
    fn test_debug_masks_password() {
        let rendered = format!("{:?}", UserFields::new("alice", "hunter2", "reader"));
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
    }
}
