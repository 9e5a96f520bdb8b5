//! Provider: the entry point the orchestrator adapter talks to.
//!
//! A [`Provider`] is built once per process around a single shared
//! [`RemoteAdmin`] client and exposes one reconciler per object kind.

use harper_client::{ClientConfig, ClientResult, ConfigError, HarperClient, RemoteAdmin};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::boundary::ResourceHandler;
use crate::declaration::{provider_declaration, ResourceDeclaration};
use crate::kind::ObjectKind;
use crate::resources::{
    PermissionReconciler, RoleReconciler, SchemaReconciler, TableReconciler, UserReconciler,
};

/// Provider version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resource declaration order.
const RESOURCE_ORDER: [ObjectKind; 5] = [
    ObjectKind::Schema,
    ObjectKind::Role,
    ObjectKind::Table,
    ObjectKind::User,
    ObjectKind::Permission,
];

/// Provider-level settings as declared by [`provider_declaration`].
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Operations API URL.
    pub endpoint: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
}

impl ProviderSettings {
    /// Parse settings from the orchestrator's configuration value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            key: "provider".to_string(),
            message: e.to_string(),
        })
    }

    /// Turn settings into a client configuration.
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let endpoint = self
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingSetting("endpoint".to_string()))?;

        Ok(ClientConfig {
            username: self.username,
            password: self.password,
            ..ClientConfig::new(endpoint)
        })
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Reconcilers for every object kind, sharing one client.
pub struct Provider {
    client: Arc<dyn RemoteAdmin>,
    schemas: Arc<SchemaReconciler>,
    tables: Arc<TableReconciler>,
    users: Arc<UserReconciler>,
    roles: Arc<RoleReconciler>,
    permissions: Arc<PermissionReconciler>,
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl Provider {
    /// Create a provider around an already built client.
    pub fn new(client: Arc<dyn RemoteAdmin>) -> Self {
        let schemas = Arc::new(SchemaReconciler::new(client.clone()));
        let tables = Arc::new(TableReconciler::new(client.clone()));
        let users = Arc::new(UserReconciler::new(client.clone()));
        let roles = Arc::new(RoleReconciler::new(client.clone()));
        let permissions = Arc::new(PermissionReconciler::new());

        let mut handlers: HashMap<String, Arc<dyn ResourceHandler>> = HashMap::new();
        handlers.insert(ObjectKind::Schema.type_name(), schemas.clone());
        handlers.insert(ObjectKind::Table.type_name(), tables.clone());
        handlers.insert(ObjectKind::User.type_name(), users.clone());
        handlers.insert(ObjectKind::Role.type_name(), roles.clone());
        handlers.insert(ObjectKind::Permission.type_name(), permissions.clone());

        Self {
            client,
            schemas,
            tables,
            users,
            roles,
            permissions,
            handlers,
        }
    }

    /// Create a provider with an HTTP client for `config`.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = HarperClient::new(config)?;
        info!("Configured HarperDB provider v{} for {}", VERSION, client.endpoint());
        Ok(Self::new(Arc::new(client)))
    }

    /// Create a provider from the orchestrator's provider configuration.
    pub fn configure(settings: Value) -> ClientResult<Self> {
        let config = ProviderSettings::from_value(settings)?.into_config()?;
        Self::from_config(&config)
    }

    /// Create a provider configured from `HARPERDB_*` environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_config(&ClientConfig::from_env())
    }

    /// Shared remote client.
    pub fn client(&self) -> Arc<dyn RemoteAdmin> {
        self.client.clone()
    }

    /// Schema reconciler.
    pub fn schemas(&self) -> &SchemaReconciler {
        &self.schemas
    }

    /// Table reconciler.
    pub fn tables(&self) -> &TableReconciler {
        &self.tables
    }

    /// User reconciler.
    pub fn users(&self) -> &UserReconciler {
        &self.users
    }

    /// Role reconciler.
    pub fn roles(&self) -> &RoleReconciler {
        &self.roles
    }

    /// State-only permission reconciler.
    pub fn permissions(&self) -> &PermissionReconciler {
        &self.permissions
    }

    /// Declarations of every resource type.
    pub fn resources(&self) -> Vec<ResourceDeclaration> {
        RESOURCE_ORDER
            .iter()
            .map(|kind| ResourceDeclaration::for_kind(*kind))
            .collect()
    }

    /// Provider configuration declaration.
    pub fn declaration(&self) -> ResourceDeclaration {
        provider_declaration()
    }

    /// Look up the handler for a resource type name.
    pub fn handler(&self, type_name: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.handlers.get(type_name).cloned()
    }

    /// Provider version.
    pub fn version(&self) -> &'static str {
        VERSION
    }
}
