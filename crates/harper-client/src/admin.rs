//! Remote administration capability.
//!
//! [`RemoteAdmin`] is the set of administrative calls the reconcilers make
//! against a database instance. Every call is atomic from the caller's
//! point of view: it either takes effect and returns a result, or fails.

use async_trait::async_trait;
use harper_acl::Permission;
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

/// A schema as reported by `describe_schema`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaInfo {
    /// Schema name.
    pub name: String,
    /// Names of the tables in the schema.
    #[serde(default)]
    pub tables: Vec<String>,
}

/// A table as reported by `describe_table`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableInfo {
    /// Owning schema.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Primary key attribute.
    pub hash_attribute: String,
}

/// Full field set for `add_user` and `alter_user`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSpec {
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Name of the role the user starts with.
    pub role: String,
    /// Whether the account can log in.
    pub active: bool,
}

impl std::fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSpec")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

/// A user as reported by `list_users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    /// Login name.
    pub username: String,
    /// Whether the account can log in.
    pub active: bool,
    /// Name of the user's role, when the server reports one.
    pub role: Option<String>,
}

/// A role as returned by `add_role`, `alter_role` and `list_roles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleInfo {
    /// Server-issued role id. A response may omit it.
    pub id: Option<String>,
    /// Role name.
    pub name: String,
    /// Granted permission.
    pub permission: Permission,
}

/// Administrative calls against one database instance.
///
/// Implementations are shared between reconcilers behind an `Arc` and must
/// not hold per-call state.
#[async_trait]
pub trait RemoteAdmin: Send + Sync {
    /// Create a schema. Fails with a conflict if it already exists.
    async fn create_schema(&self, name: &str) -> ClientResult<()>;

    /// Drop a schema and everything in it.
    async fn drop_schema(&self, name: &str) -> ClientResult<()>;

    /// Describe a schema.
    async fn describe_schema(&self, name: &str) -> ClientResult<SchemaInfo>;

    /// Create a table keyed by `hash_attribute`.
    async fn create_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()>;

    /// Drop a table.
    async fn drop_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()>;

    /// Describe a table.
    async fn describe_table(&self, schema: &str, name: &str) -> ClientResult<TableInfo>;

    /// Add a user.
    async fn add_user(&self, user: &UserSpec) -> ClientResult<()>;

    /// Replace every field of an existing user.
    async fn alter_user(&self, user: &UserSpec) -> ClientResult<()>;

    /// Drop a user.
    async fn drop_user(&self, username: &str) -> ClientResult<()>;

    /// List all users.
    async fn list_users(&self) -> ClientResult<Vec<UserInfo>>;

    /// Add a role and return it with its server-issued id.
    async fn add_role(&self, name: &str, permission: &Permission) -> ClientResult<RoleInfo>;

    /// Replace the name and permission of the role addressed by `id`.
    async fn alter_role(&self, id: &str, name: &str, permission: &Permission) -> ClientResult<RoleInfo>;

    /// Drop the role addressed by `id`.
    async fn drop_role(&self, id: &str) -> ClientResult<()>;

    /// List all roles.
    async fn list_roles(&self) -> ClientResult<Vec<RoleInfo>>;

    /// Find a user by name.
    async fn find_user(&self, username: &str) -> ClientResult<Option<UserInfo>> {
        let users = self.list_users().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    /// Find a role by id.
    async fn find_role(&self, id: &str) -> ClientResult<Option<RoleInfo>> {
        let roles = self.list_roles().await?;
        Ok(roles.into_iter().find(|r| r.id.as_deref() == Some(id)))
    }
}
