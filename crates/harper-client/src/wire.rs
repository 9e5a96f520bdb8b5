//! Wire format of role permissions and administrative responses.
//!
//! The server stores a role permission as one flat object: the two
//! cluster-wide flags sit next to one key per schema.
//!
//! ```text
//! {
//!   "super_user": false,
//!   "cluster_user": false,
//!   "inventory": {
//!     "tables": {
//!       "items": {
//!         "read": true, "insert": false, "update": false, "delete": false,
//!         "attribute_permissions": [
//!           { "attribute_name": "id", "read": true, "insert": false, "update": false }
//!         ]
//!       }
//!     }
//!   }
//! }
//! ```

use harper_acl::{AttributePermission, Permission, SchemaPermission, TablePermission};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::admin::{RoleInfo, UserInfo};
use crate::error::{ClientError, ClientResult};

const SUPER_USER: &str = "super_user";
const CLUSTER_USER: &str = "cluster_user";

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireSchema {
    #[serde(default)]
    tables: BTreeMap<String, WireTable>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireTable {
    #[serde(default)]
    read: bool,
    #[serde(default)]
    insert: bool,
    #[serde(default)]
    update: bool,
    #[serde(default)]
    delete: bool,
    #[serde(default)]
    attribute_permissions: Option<Vec<WireAttribute>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAttribute {
    attribute_name: String,
    #[serde(default)]
    read: bool,
    #[serde(default)]
    insert: bool,
    #[serde(default)]
    update: bool,
}

impl From<&TablePermission> for WireTable {
    fn from(table: &TablePermission) -> Self {
        Self {
            read: table.read,
            insert: table.insert,
            update: table.update,
            delete: table.delete,
            attribute_permissions: Some(
                table
                    .attribute_permissions
                    .iter()
                    .map(|a| WireAttribute {
                        attribute_name: a.name.clone(),
                        read: a.read,
                        insert: a.insert,
                        update: a.update,
                    })
                    .collect(),
            ),
        }
    }
}

impl From<WireTable> for TablePermission {
    fn from(table: WireTable) -> Self {
        Self {
            read: table.read,
            insert: table.insert,
            update: table.update,
            delete: table.delete,
            attribute_permissions: table
                .attribute_permissions
                .unwrap_or_default()
                .into_iter()
                .map(|a| AttributePermission {
                    name: a.attribute_name,
                    read: a.read,
                    insert: a.insert,
                    update: a.update,
                })
                .collect(),
        }
    }
}

/// Render a permission as the server's flat permission object.
///
/// # Errors
///
/// A schema named `super_user` or `cluster_user` collides with the
/// cluster-wide flags and cannot be expressed.
pub fn to_wire(permission: &Permission) -> ClientResult<Value> {
    let mut root = Map::new();
    root.insert(SUPER_USER.to_string(), Value::Bool(permission.super_user));
    root.insert(CLUSTER_USER.to_string(), Value::Bool(permission.cluster_user));

    for (name, schema) in &permission.schemas {
        if name == SUPER_USER || name == CLUSTER_USER {
            return Err(ClientError::InvalidRequest(format!(
                "schema name '{}' is reserved in role permissions",
                name
            )));
        }
        let wire = WireSchema {
            tables: schema
                .tables
                .iter()
                .map(|(table, perm)| (table.clone(), WireTable::from(perm)))
                .collect(),
        };
        let value = serde_json::to_value(wire)
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;
        root.insert(name.clone(), value);
    }

    Ok(Value::Object(root))
}

/// Parse the server's flat permission object.
///
/// Object-valued keys are schemas; other non-flag keys the server adds are
/// ignored. A `null` permission is empty.
pub fn from_wire(value: &Value) -> ClientResult<Permission> {
    let root = match value {
        Value::Null => return Ok(Permission::new()),
        Value::Object(root) => root,
        other => {
            return Err(ClientError::InvalidResponse(format!(
                "expected permission object, got {}",
                other
            )))
        }
    };

    let mut permission = Permission::with_flags(
        root.get(SUPER_USER).and_then(Value::as_bool).unwrap_or(false),
        root.get(CLUSTER_USER).and_then(Value::as_bool).unwrap_or(false),
    );

    for (name, raw) in root {
        if name == SUPER_USER || name == CLUSTER_USER || !raw.is_object() {
            continue;
        }
        let wire: WireSchema = serde_json::from_value(raw.clone()).map_err(|e| {
            ClientError::InvalidResponse(format!("permission for schema '{}': {}", name, e))
        })?;
        let schema = SchemaPermission {
            tables: wire
                .tables
                .into_iter()
                .map(|(table, perm)| (table, TablePermission::from(perm)))
                .collect(),
        };
        permission.add_schema(name.clone(), schema);
    }

    Ok(permission)
}

/// Parse one role record (`{ "id", "role", "permission" }`).
pub fn role_from_wire(value: &Value) -> ClientResult<RoleInfo> {
    let record = value
        .as_object()
        .ok_or_else(|| ClientError::InvalidResponse(format!("expected role object, got {}", value)))?;

    let name = record
        .get("role")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::InvalidResponse("role record has no 'role' name".to_string()))?;

    Ok(RoleInfo {
        id: record
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        name: name.to_string(),
        permission: from_wire(record.get("permission").unwrap_or(&Value::Null))?,
    })
}

/// Parse one user record.
///
/// The server reports `role` either as the role name or as the full role
/// record; both reduce to the role name.
pub fn user_from_wire(value: &Value) -> ClientResult<UserInfo> {
    let record = value
        .as_object()
        .ok_or_else(|| ClientError::InvalidResponse(format!("expected user object, got {}", value)))?;

    let username = record
        .get("username")
        .and_then(Value::as_str)
        .ok_or_else(|| ClientError::InvalidResponse("user record has no 'username'".to_string()))?;

    let role = match record.get("role") {
        Some(Value::String(role)) => Some(role.clone()),
        Some(Value::Object(role)) => role.get("role").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };

    Ok(UserInfo {
        username: username.to_string(),
        active: record.get("active").and_then(Value::as_bool).unwrap_or(false),
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Permission {
        let mut perm = Permission::with_flags(false, true);
        perm.grant_table(
            "inventory",
            "items",
            TablePermission::read_only().with_attribute(AttributePermission::new("id").readable()),
        );
        perm
    }

    #[test]
    fn test_to_wire_layout() {
        let wire = to_wire(&sample()).unwrap();
        assert_eq!(
            wire,
            json!({
                "super_user": false,
                "cluster_user": true,
                "inventory": {
                    "tables": {
                        "items": {
                            "read": true,
                            "insert": false,
                            "update": false,
                            "delete": false,
                            "attribute_permissions": [
                                { "attribute_name": "id", "read": true, "insert": false, "update": false }
                            ]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_from_wire_inverts_to_wire() {
        let perm = sample();
        assert_eq!(from_wire(&to_wire(&perm).unwrap()).unwrap(), perm);
    }

    #[test]
    fn test_reserved_schema_name() {
        let mut perm = Permission::new();
        perm.add_schema("super_user", SchemaPermission::new());
        assert!(matches!(to_wire(&perm), Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_wire_ignores_unknown_flags() {
        let perm = from_wire(&json!({
            "super_user": true,
            "structure_user": false,
            "inventory": { "tables": { "items": { "read": true, "attribute_permissions": null } } }
        }))
        .unwrap();

        assert!(perm.super_user);
        assert_eq!(perm.schemas.len(), 1);
        assert!(perm.table("inventory", "items").unwrap().attribute_permissions.is_empty());
    }

    #[test]
    fn test_role_from_wire() {
        let role = role_from_wire(&json!({
            "id": "b1a5-77",
            "role": "reader",
            "permission": { "super_user": false }
        }))
        .unwrap();
        assert_eq!(role.id.as_deref(), Some("b1a5-77"));
        assert_eq!(role.name, "reader");

        let role = role_from_wire(&json!({ "id": "", "role": "reader" })).unwrap();
        assert!(role.id.is_none());
        assert!(role.permission.is_empty());

        assert!(role_from_wire(&json!({ "id": "x" })).is_err());
    }

    #[test]
    fn test_user_from_wire_role_shapes() {
        let user = user_from_wire(&json!({
            "username": "alice",
            "active": true,
            "role": { "id": "r1", "role": "reader", "permission": {} }
        }))
        .unwrap();
        assert_eq!(user.role.as_deref(), Some("reader"));
        assert!(user.active);

        let user = user_from_wire(&json!({ "username": "bob", "active": false, "role": "writer" })).unwrap();
        assert_eq!(user.role.as_deref(), Some("writer"));
        assert!(!user.active);
    }
}
