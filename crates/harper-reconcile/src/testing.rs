//! In-memory remote used by the reconciler unit tests.

use async_trait::async_trait;
use harper_acl::Permission;
use harper_client::{ClientError, ClientResult, RemoteAdmin, RoleInfo, SchemaInfo, TableInfo, UserInfo, UserSpec};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

/// Records every call and keeps just enough state to answer reads and
/// report conflicts and missing objects.
#[derive(Default)]
pub(crate) struct FakeAdmin {
    calls: Mutex<Vec<String>>,
    schemas: Mutex<BTreeSet<String>>,
    tables: Mutex<BTreeMap<(String, String), String>>,
    users: Mutex<BTreeMap<String, UserSpec>>,
    roles: Mutex<BTreeMap<String, RoleInfo>>,
    next_role: AtomicU32,
    omit_role_ids: AtomicBool,
}

impl FakeAdmin {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make add/alter role responses carry no id.
    pub(crate) fn omit_role_ids(&self) {
        self.omit_role_ids.store(true, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn has_schema(&self, name: &str) -> bool {
        self.schemas.lock().unwrap().contains(name)
    }

    pub(crate) fn user(&self, username: &str) -> Option<UserSpec> {
        self.users.lock().unwrap().get(username).cloned()
    }

    pub(crate) fn role(&self, id: &str) -> Option<RoleInfo> {
        self.roles.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn set_table_hash(&self, schema: &str, name: &str, hash: &str) {
        self.tables
            .lock()
            .unwrap()
            .insert((schema.to_string(), name.to_string()), hash.to_string());
    }

    pub(crate) fn set_user_active(&self, username: &str, active: bool) {
        if let Some(user) = self.users.lock().unwrap().get_mut(username) {
            user.active = active;
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn issued_id(&self) -> Option<String> {
        if self.omit_role_ids.load(Ordering::SeqCst) {
            None
        } else {
            Some(format!("role-{}", self.next_role.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }
}

#[async_trait]
impl RemoteAdmin for FakeAdmin {
    async fn create_schema(&self, name: &str) -> ClientResult<()> {
        self.record(format!("create_schema {}", name));
        if !self.schemas.lock().unwrap().insert(name.to_string()) {
            return Err(ClientError::Conflict(format!("database '{}' already exists", name)));
        }
        Ok(())
    }

    async fn drop_schema(&self, name: &str) -> ClientResult<()> {
        self.record(format!("drop_schema {}", name));
        if !self.schemas.lock().unwrap().remove(name) {
            return Err(ClientError::NotFound(format!("Schema '{}' does not exist", name)));
        }
        Ok(())
    }

    async fn describe_schema(&self, name: &str) -> ClientResult<SchemaInfo> {
        self.record(format!("describe_schema {}", name));
        if !self.has_schema(name) {
            return Err(ClientError::NotFound(format!("Schema '{}' does not exist", name)));
        }
        let tables = self
            .tables
            .lock()
            .unwrap()
            .keys()
            .filter(|(schema, _)| schema == name)
            .map(|(_, table)| table.clone())
            .collect();
        Ok(SchemaInfo {
            name: name.to_string(),
            tables,
        })
    }

    async fn create_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()> {
        self.record(format!("create_table {}.{} {}", schema, name, hash_attribute));
        let mut tables = self.tables.lock().unwrap();
        let key = (schema.to_string(), name.to_string());
        if tables.contains_key(&key) {
            return Err(ClientError::Conflict(format!("table '{}.{}' already exists", schema, name)));
        }
        tables.insert(key, hash_attribute.to_string());
        Ok(())
    }

    async fn drop_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()> {
        self.record(format!("drop_table {}.{} {}", schema, name, hash_attribute));
        let key = (schema.to_string(), name.to_string());
        if self.tables.lock().unwrap().remove(&key).is_none() {
            return Err(ClientError::NotFound(format!("Table '{}.{}' does not exist", schema, name)));
        }
        Ok(())
    }

    async fn describe_table(&self, schema: &str, name: &str) -> ClientResult<TableInfo> {
        self.record(format!("describe_table {}.{}", schema, name));
        let key = (schema.to_string(), name.to_string());
        match self.tables.lock().unwrap().get(&key) {
            Some(hash) => Ok(TableInfo {
                schema: schema.to_string(),
                name: name.to_string(),
                hash_attribute: hash.clone(),
            }),
            None => Err(ClientError::NotFound(format!("Table '{}.{}' does not exist", schema, name))),
        }
    }

    async fn add_user(&self, user: &UserSpec) -> ClientResult<()> {
        self.record(format!("add_user {}", user.username));
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.username) {
            return Err(ClientError::Conflict(format!("User {} already exists", user.username)));
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn alter_user(&self, user: &UserSpec) -> ClientResult<()> {
        self.record(format!("alter_user {}", user.username));
        let mut users = self.users.lock().unwrap();
        match users.get_mut(&user.username) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(ClientError::NotFound(format!("User {} does not exist", user.username))),
        }
    }

    async fn drop_user(&self, username: &str) -> ClientResult<()> {
        self.record(format!("drop_user {}", username));
        if self.users.lock().unwrap().remove(username).is_none() {
            return Err(ClientError::NotFound(format!("User {} does not exist", username)));
        }
        Ok(())
    }

    async fn list_users(&self) -> ClientResult<Vec<UserInfo>> {
        self.record("list_users".to_string());
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .map(|u| UserInfo {
                username: u.username.clone(),
                active: u.active,
                role: Some(u.role.clone()),
            })
            .collect())
    }

    async fn add_role(&self, name: &str, permission: &Permission) -> ClientResult<RoleInfo> {
        self.record(format!("add_role {}", name));
        let id = self.issued_id();
        let role = RoleInfo {
            id: id.clone(),
            name: name.to_string(),
            permission: permission.clone(),
        };
        if let Some(id) = id {
            self.roles.lock().unwrap().insert(id, role.clone());
        }
        Ok(role)
    }

    async fn alter_role(&self, id: &str, name: &str, permission: &Permission) -> ClientResult<RoleInfo> {
        self.record(format!("alter_role {} {}", id, name));
        let mut roles = self.roles.lock().unwrap();
        if !roles.contains_key(id) {
            return Err(ClientError::NotFound(format!("Role '{}' does not exist", id)));
        }
        let stored = RoleInfo {
            id: Some(id.to_string()),
            name: name.to_string(),
            permission: permission.clone(),
        };
        roles.insert(id.to_string(), stored.clone());
        if self.omit_role_ids.load(Ordering::SeqCst) {
            return Ok(RoleInfo { id: None, ..stored });
        }
        Ok(stored)
    }

    async fn drop_role(&self, id: &str) -> ClientResult<()> {
        self.record(format!("drop_role {}", id));
        if self.roles.lock().unwrap().remove(id).is_none() {
            return Err(ClientError::NotFound(format!("Role '{}' does not exist", id)));
        }
        Ok(())
    }

    async fn list_roles(&self) -> ClientResult<Vec<RoleInfo>> {
        self.record("list_roles".to_string());
        Ok(self.roles.lock().unwrap().values().cloned().collect())
    }
}
