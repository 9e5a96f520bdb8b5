//! HTTP client for the HarperDB operations API.
//!
//! Every administrative call is a `POST` of `{"operation": ..., ...}` to the
//! configured endpoint, authenticated with HTTP Basic credentials when they
//! are configured.

use async_trait::async_trait;
use harper_acl::Permission;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};

use crate::admin::{RemoteAdmin, RoleInfo, SchemaInfo, TableInfo, UserInfo, UserSpec};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::wire;

/// Operations API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HarperClient {
    /// HTTP client instance.
    client: Client,

    /// Endpoint and credentials.
    config: ClientConfig,
}

impl HarperClient {
    /// Create a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// The endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Send one operation and return the decoded response body.
    async fn execute(&self, body: Value) -> ClientResult<Value> {
        let mut request = self.client.post(&self.config.endpoint).json(&body);

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("HarperDB authentication failed ({})", status.as_u16());
            return Err(ClientError::AuthenticationFailed);
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            let message = error_message(&text);
            warn!("HarperDB API error ({}): {}", status.as_u16(), message);
            return Err(ClientError::from_status(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl RemoteAdmin for HarperClient {
    #[instrument(skip(self), fields(schema = %name))]
    async fn create_schema(&self, name: &str) -> ClientResult<()> {
        debug!("Creating schema {}", name);
        self.execute(json!({ "operation": "create_schema", "schema": name }))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(schema = %name))]
    async fn drop_schema(&self, name: &str) -> ClientResult<()> {
        debug!("Dropping schema {}", name);
        self.execute(json!({ "operation": "drop_schema", "schema": name }))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(schema = %name))]
    async fn describe_schema(&self, name: &str) -> ClientResult<SchemaInfo> {
        let body = self
            .execute(json!({ "operation": "describe_schema", "schema": name }))
            .await?;

        let tables = match body {
            Value::Object(tables) => tables.keys().cloned().collect(),
            Value::Null => Vec::new(),
            other => {
                return Err(ClientError::InvalidResponse(format!(
                    "describe_schema returned {}",
                    other
                )))
            }
        };

        Ok(SchemaInfo {
            name: name.to_string(),
            tables,
        })
    }

    #[instrument(skip(self), fields(schema = %schema, table = %name))]
    async fn create_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()> {
        debug!("Creating table {}.{} keyed by {}", schema, name, hash_attribute);
        self.execute(json!({
            "operation": "create_table",
            "schema": schema,
            "table": name,
            "hash_attribute": hash_attribute,
        }))
        .await
        .map(drop)
    }

    #[instrument(skip(self), fields(schema = %schema, table = %name))]
    async fn drop_table(&self, schema: &str, name: &str, hash_attribute: &str) -> ClientResult<()> {
        debug!("Dropping table {}.{} (hash attribute {})", schema, name, hash_attribute);
        self.execute(json!({ "operation": "drop_table", "schema": schema, "table": name }))
            .await
            .map(drop)
    }

    #[instrument(skip(self), fields(schema = %schema, table = %name))]
    async fn describe_table(&self, schema: &str, name: &str) -> ClientResult<TableInfo> {
        let body = self
            .execute(json!({ "operation": "describe_table", "schema": schema, "table": name }))
            .await?;

        let hash_attribute = body
            .get("hash_attribute")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::InvalidResponse("describe_table response has no hash_attribute".to_string())
            })?;

        Ok(TableInfo {
            schema: body
                .get("schema")
                .and_then(Value::as_str)
                .unwrap_or(schema)
                .to_string(),
            name: body
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string(),
            hash_attribute: hash_attribute.to_string(),
        })
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn add_user(&self, user: &UserSpec) -> ClientResult<()> {
        debug!("Adding user {} with role {}", user.username, user.role);
        self.execute(user_body("add_user", user)).await.map(drop)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn alter_user(&self, user: &UserSpec) -> ClientResult<()> {
        debug!("Altering user {}", user.username);
        self.execute(user_body("alter_user", user)).await.map(drop)
    }

    #[instrument(skip(self), fields(username = %username))]
    async fn drop_user(&self, username: &str) -> ClientResult<()> {
        debug!("Dropping user {}", username);
        self.execute(json!({ "operation": "drop_user", "username": username }))
            .await
            .map(drop)
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> ClientResult<Vec<UserInfo>> {
        let body = self.execute(json!({ "operation": "list_users" })).await?;
        records(&body, "list_users")?
            .iter()
            .map(wire::user_from_wire)
            .collect()
    }

    #[instrument(skip(self, permission), fields(role = %name))]
    async fn add_role(&self, name: &str, permission: &Permission) -> ClientResult<RoleInfo> {
        debug!("Adding role {}", name);
        let body = self
            .execute(json!({
                "operation": "add_role",
                "role": name,
                "permission": wire::to_wire(permission)?,
            }))
            .await?;
        Ok(role_response(&body, name, permission))
    }

    #[instrument(skip(self, permission), fields(role_id = %id, role = %name))]
    async fn alter_role(&self, id: &str, name: &str, permission: &Permission) -> ClientResult<RoleInfo> {
        debug!("Altering role {} ({})", name, id);
        let body = self
            .execute(json!({
                "operation": "alter_role",
                "id": id,
                "role": name,
                "permission": wire::to_wire(permission)?,
            }))
            .await?;
        Ok(role_response(&body, name, permission))
    }

    #[instrument(skip(self), fields(role_id = %id))]
    async fn drop_role(&self, id: &str) -> ClientResult<()> {
        debug!("Dropping role {}", id);
        self.execute(json!({ "operation": "drop_role", "id": id }))
            .await
            .map(drop)
    }

    #[instrument(skip(self))]
    async fn list_roles(&self) -> ClientResult<Vec<RoleInfo>> {
        let body = self.execute(json!({ "operation": "list_roles" })).await?;
        records(&body, "list_roles")?
            .iter()
            .map(wire::role_from_wire)
            .collect()
    }
}

fn user_body(operation: &str, user: &UserSpec) -> Value {
    json!({
        "operation": operation,
        "username": user.username,
        "password": user.password,
        "role": user.role,
        "active": user.active,
    })
}

/// Role returned by add/alter. Only the id is taken from the response.
fn role_response(body: &Value, name: &str, permission: &Permission) -> RoleInfo {
    RoleInfo {
        id: body
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        name: body
            .get("role")
            .and_then(Value::as_str)
            .unwrap_or(name)
            .to_string(),
        permission: permission.clone(),
    }
}

fn records<'a>(body: &'a Value, operation: &str) -> ClientResult<&'a Vec<Value>> {
    body.as_array().ok_or_else(|| {
        ClientError::InvalidResponse(format!("{} returned a non-array body", operation))
    })
}

/// Extract the `error` (or `message`) field of an error body, falling back
/// to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| {
            body.get("error")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.to_string())
}
