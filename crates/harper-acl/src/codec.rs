//! # Permission Tree Codec
//!
//! Converts between the declared permission tree (a dynamically-shaped
//! JSON value) and the typed [`Permission`] value.
//!
//! The declared tree has the shape:
//!
//! ```text
//! {
//!   "super_user":   bool?,
//!   "cluster_user": bool?,
//!   "schema_permissions": {
//!     <schema>: {
//!       "tables": {
//!         <table>: {
//!           "read": bool?, "insert": bool?, "update": bool?, "delete": bool?,
//!           "attribute_permissions": [
//!             { "name": string, "read": bool?, "insert": bool?, "update": bool? }
//!           ]?
//!         }
//!       }?
//!     }
//!   }?
//! }
//! ```
//!
//! `null` counts as absent at every optional slot. [`encode`] fails on the
//! first shape violation; [`decode`] always writes every flag and list, so
//! its output is the default-filled form of whatever was encoded.

use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::permission::{AttributePermission, Permission, SchemaPermission, TablePermission};

/// Top-level super user flag.
pub const SUPER_USER: &str = "super_user";
/// Top-level cluster user flag.
pub const CLUSTER_USER: &str = "cluster_user";
/// Map of schema name to schema grants.
pub const SCHEMA_PERMISSIONS: &str = "schema_permissions";
/// Map of table name to table grants, inside a schema entry.
pub const TABLES: &str = "tables";
/// Ordered list of attribute grants, inside a table entry.
pub const ATTRIBUTE_PERMISSIONS: &str = "attribute_permissions";
/// Required attribute name.
pub const NAME: &str = "name";

const READ: &str = "read";
const INSERT: &str = "insert";
const UPDATE: &str = "update";
const DELETE: &str = "delete";

/// Shape violations found while encoding a permission tree.
///
/// Every variant carries the dotted path of the offending slot, e.g.
/// `schema_permissions.inventory.tables.items.attribute_permissions[0].name`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A required field is absent.
    #[error("missing required field `{path}`")]
    MissingField {
        /// Path of the missing field.
        path: String,
    },

    /// A slot holds a value of the wrong JSON type.
    #[error("expected {expected} at `{path}`, found {found}")]
    UnexpectedType {
        /// Path of the slot.
        path: String,
        /// Expected JSON type.
        expected: &'static str,
        /// JSON type actually found.
        found: &'static str,
    },

    /// An attribute name is the empty string.
    #[error("attribute name at `{path}` must not be empty")]
    EmptyName {
        /// Path of the name field.
        path: String,
    },

    /// The same attribute appears twice within one table.
    #[error("attribute `{name}` is listed more than once at `{path}`")]
    DuplicateAttribute {
        /// Path of the attribute list.
        path: String,
        /// The repeated attribute name.
        name: String,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

impl CodecError {
    /// Path of the slot that caused the error.
    pub fn path(&self) -> &str {
        match self {
            CodecError::MissingField { path }
            | CodecError::UnexpectedType { path, .. }
            | CodecError::EmptyName { path }
            | CodecError::DuplicateAttribute { path, .. } => path,
        }
    }
}

/// Encode a declared permission tree into a [`Permission`].
///
/// Absent flags become `false` and absent lists become empty. A `null`
/// root is the empty tree.
///
/// # Errors
///
/// Returns the first [`CodecError`] found, in declaration order for
/// attribute lists.
pub fn encode(tree: &Value) -> CodecResult<Permission> {
    if tree.is_null() {
        return Ok(Permission::new());
    }

    let root = object(tree, "")?;
    let mut permission = Permission::with_flags(
        flag(root, SUPER_USER, "")?,
        flag(root, CLUSTER_USER, "")?,
    );

    if let Some(schemas) = optional(root, SCHEMA_PERMISSIONS) {
        let schemas_path = SCHEMA_PERMISSIONS.to_string();
        for (name, raw) in object(schemas, &schemas_path)? {
            let path = join(&schemas_path, name);
            permission.add_schema(name.clone(), encode_schema(raw, &path)?);
        }
    }

    Ok(permission)
}

/// Decode a [`Permission`] back into the declared tree shape.
///
/// Every flag and list is written explicitly.
pub fn decode(permission: &Permission) -> Value {
    let schemas: Map<String, Value> = permission
        .schemas
        .iter()
        .map(|(name, schema)| (name.clone(), decode_schema(schema)))
        .collect();

    let mut root = Map::new();
    root.insert(SUPER_USER.to_string(), Value::Bool(permission.super_user));
    root.insert(CLUSTER_USER.to_string(), Value::Bool(permission.cluster_user));
    root.insert(SCHEMA_PERMISSIONS.to_string(), Value::Object(schemas));
    Value::Object(root)
}

/// Default-fill a declared tree: `decode(encode(tree)?)`.
pub fn normalize(tree: &Value) -> CodecResult<Value> {
    encode(tree).map(|permission| decode(&permission))
}

fn encode_schema(raw: &Value, path: &str) -> CodecResult<SchemaPermission> {
    let mut schema = SchemaPermission::new();
    if raw.is_null() {
        return Ok(schema);
    }

    let entry = object(raw, path)?;
    if let Some(tables) = optional(entry, TABLES) {
        let tables_path = join(path, TABLES);
        for (name, raw_table) in object(tables, &tables_path)? {
            let table_path = join(&tables_path, name);
            schema
                .tables
                .insert(name.clone(), encode_table(raw_table, &table_path)?);
        }
    }

    Ok(schema)
}

fn encode_table(raw: &Value, path: &str) -> CodecResult<TablePermission> {
    if raw.is_null() {
        return Ok(TablePermission::new());
    }

    let entry = object(raw, path)?;
    let mut table = TablePermission {
        read: flag(entry, READ, path)?,
        insert: flag(entry, INSERT, path)?,
        update: flag(entry, UPDATE, path)?,
        delete: flag(entry, DELETE, path)?,
        attribute_permissions: Vec::new(),
    };

    if let Some(list) = optional(entry, ATTRIBUTE_PERMISSIONS) {
        let list_path = join(path, ATTRIBUTE_PERMISSIONS);
        let items = list.as_array().ok_or_else(|| CodecError::UnexpectedType {
            path: list_path.clone(),
            expected: "array",
            found: type_name(list),
        })?;

        let mut seen = HashSet::new();
        for (index, raw_attr) in items.iter().enumerate() {
            let attr = encode_attribute(raw_attr, &format!("{}[{}]", list_path, index))?;
            if !seen.insert(attr.name.clone()) {
                return Err(CodecError::DuplicateAttribute {
                    path: list_path,
                    name: attr.name,
                });
            }
            table.attribute_permissions.push(attr);
        }
    }

    Ok(table)
}

fn encode_attribute(raw: &Value, path: &str) -> CodecResult<AttributePermission> {
    let entry = object(raw, path)?;
    let name_path = join(path, NAME);

    let name = match optional(entry, NAME) {
        None => return Err(CodecError::MissingField { path: name_path }),
        Some(Value::String(name)) if name.is_empty() => {
            return Err(CodecError::EmptyName { path: name_path })
        }
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(CodecError::UnexpectedType {
                path: name_path,
                expected: "string",
                found: type_name(other),
            })
        }
    };

    Ok(AttributePermission {
        name,
        read: flag(entry, READ, path)?,
        insert: flag(entry, INSERT, path)?,
        update: flag(entry, UPDATE, path)?,
    })
}

fn decode_schema(schema: &SchemaPermission) -> Value {
    let tables: Map<String, Value> = schema
        .tables
        .iter()
        .map(|(name, table)| (name.clone(), decode_table(table)))
        .collect();

    let mut entry = Map::new();
    entry.insert(TABLES.to_string(), Value::Object(tables));
    Value::Object(entry)
}

fn decode_table(table: &TablePermission) -> Value {
    let attributes = table
        .attribute_permissions
        .iter()
        .map(decode_attribute)
        .collect();

    let mut entry = Map::new();
    entry.insert(READ.to_string(), Value::Bool(table.read));
    entry.insert(INSERT.to_string(), Value::Bool(table.insert));
    entry.insert(UPDATE.to_string(), Value::Bool(table.update));
    entry.insert(DELETE.to_string(), Value::Bool(table.delete));
    entry.insert(ATTRIBUTE_PERMISSIONS.to_string(), Value::Array(attributes));
    Value::Object(entry)
}

fn decode_attribute(attribute: &AttributePermission) -> Value {
    let mut entry = Map::new();
    entry.insert(NAME.to_string(), Value::String(attribute.name.clone()));
    entry.insert(READ.to_string(), Value::Bool(attribute.read));
    entry.insert(INSERT.to_string(), Value::Bool(attribute.insert));
    entry.insert(UPDATE.to_string(), Value::Bool(attribute.update));
    Value::Object(entry)
}

/// A present, non-null field.
fn optional<'a>(entry: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    entry.get(key).filter(|value| !value.is_null())
}

fn flag(entry: &Map<String, Value>, key: &str, parent: &str) -> CodecResult<bool> {
    match optional(entry, key) {
        None => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(CodecError::UnexpectedType {
            path: join(parent, key),
            expected: "bool",
            found: type_name(other),
        }),
    }
}

fn object<'a>(value: &'a Value, path: &str) -> CodecResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| CodecError::UnexpectedType {
        path: display_path(path),
        expected: "object",
        found: type_name(value),
    })
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_tree_round_trip() {
        let expected = json!({
            "super_user": false,
            "cluster_user": false,
            "schema_permissions": {}
        });

        assert_eq!(normalize(&json!({})).unwrap(), expected);
        assert_eq!(normalize(&Value::Null).unwrap(), expected);
        assert!(encode(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_single_table_without_attributes() {
        let tree = json!({
            "schema_permissions": {
                "inventory": { "tables": { "items": { "read": true } } }
            }
        });

        let expected = json!({
            "super_user": false,
            "cluster_user": false,
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": {
                            "read": true,
                            "insert": false,
                            "update": false,
                            "delete": false,
                            "attribute_permissions": []
                        }
                    }
                }
            }
        });

        assert_eq!(normalize(&tree).unwrap(), expected);
    }

    #[test]
    fn test_attributes_with_only_names() {
        let tree = json!({
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": {
                            "attribute_permissions": [
                                { "name": "sku" },
                                { "name": "price" },
                                { "name": "id" }
                            ]
                        }
                    }
                }
            }
        });

        let permission = encode(&tree).unwrap();
        let items = permission.table("inventory", "items").unwrap();
        let names: Vec<&str> = items
            .attribute_permissions
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["sku", "price", "id"]);
        for attr in &items.attribute_permissions {
            assert!(!attr.read && !attr.insert && !attr.update);
        }

        let decoded = decode(&permission);
        let list = &decoded["schema_permissions"]["inventory"]["tables"]["items"]
            ["attribute_permissions"];
        assert_eq!(list[0], json!({ "name": "sku", "read": false, "insert": false, "update": false }));
        assert_eq!(list[2]["name"], json!("id"));
    }

    #[test]
    fn test_fully_specified_tree_round_trips_exactly() {
        let tree = json!({
            "super_user": false,
            "cluster_user": true,
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": {
                            "read": true,
                            "insert": true,
                            "update": false,
                            "delete": false,
                            "attribute_permissions": [
                                { "name": "id", "read": true, "insert": false, "update": false },
                                { "name": "price", "read": true, "insert": true, "update": true }
                            ]
                        },
                        "orders": {
                            "read": false,
                            "insert": false,
                            "update": false,
                            "delete": true,
                            "attribute_permissions": []
                        }
                    }
                },
                "audit": { "tables": {} }
            }
        });

        assert_eq!(decode(&encode(&tree).unwrap()), tree);
    }

    #[test]
    fn test_schema_without_tables_key() {
        let permission = encode(&json!({
            "schema_permissions": { "inventory": {} }
        }))
        .unwrap();

        assert!(permission.schemas["inventory"].tables.is_empty());
    }

    #[test]
    fn test_null_slots_are_absent() {
        let permission = encode(&json!({
            "super_user": null,
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": { "read": null, "attribute_permissions": null }
                    }
                }
            }
        }))
        .unwrap();

        let items = permission.table("inventory", "items").unwrap();
        assert!(!permission.super_user);
        assert!(!items.read);
        assert!(items.attribute_permissions.is_empty());
    }

    #[test]
    fn test_missing_attribute_name() {
        let err = encode(&json!({
            "schema_permissions": {
                "inventory": {
                    "tables": { "items": { "attribute_permissions": [{ "read": true }] } }
                }
            }
        }))
        .unwrap_err();

        assert_eq!(
            err,
            CodecError::MissingField {
                path: "schema_permissions.inventory.tables.items.attribute_permissions[0].name"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_empty_attribute_name() {
        let err = encode(&json!({
            "schema_permissions": {
                "s": { "tables": { "t": { "attribute_permissions": [{ "name": "" }] } } }
            }
        }))
        .unwrap_err();

        assert!(matches!(err, CodecError::EmptyName { .. }));
    }

    #[test]
    fn test_wrong_flag_type() {
        let err = encode(&json!({
            "schema_permissions": {
                "inventory": { "tables": { "items": { "delete": "yes" } } }
            }
        }))
        .unwrap_err();

        assert_eq!(
            err,
            CodecError::UnexpectedType {
                path: "schema_permissions.inventory.tables.items.delete".to_string(),
                expected: "bool",
                found: "string",
            }
        );
    }

    #[test]
    fn test_wrong_top_level_flag_type() {
        let err = encode(&json!({ "super_user": 1 })).unwrap_err();
        assert_eq!(err.path(), "super_user");
    }

    #[test]
    fn test_wrong_name_type() {
        let err = encode(&json!({
            "schema_permissions": {
                "s": { "tables": { "t": { "attribute_permissions": [{ "name": 7 }] } } }
            }
        }))
        .unwrap_err();

        assert!(matches!(
            err,
            CodecError::UnexpectedType { expected: "string", found: "number", .. }
        ));
    }

    #[test]
    fn test_non_object_root_and_entries() {
        let err = encode(&json!([1, 2])).unwrap_err();
        assert_eq!(err.path(), "<root>");

        let err = encode(&json!({ "schema_permissions": { "s": { "tables": { "t": true } } } }))
            .unwrap_err();
        assert_eq!(err.path(), "schema_permissions.s.tables.t");

        let err = encode(&json!({
            "schema_permissions": { "s": { "tables": { "t": { "attribute_permissions": {} } } } }
        }))
        .unwrap_err();
        assert!(matches!(err, CodecError::UnexpectedType { expected: "array", .. }));
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let err = encode(&json!({
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": {
                            "attribute_permissions": [
                                { "name": "id", "read": true },
                                { "name": "id", "update": true }
                            ]
                        }
                    }
                }
            }
        }))
        .unwrap_err();

        assert_eq!(
            err,
            CodecError::DuplicateAttribute {
                path: "schema_permissions.inventory.tables.items.attribute_permissions"
                    .to_string(),
                name: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_role_scenario_permission() {
        let permission = encode(&json!({
            "super_user": false,
            "schema_permissions": {
                "inventory": {
                    "tables": {
                        "items": {
                            "read": true,
                            "attribute_permissions": [{ "name": "id", "read": true }]
                        }
                    }
                }
            }
        }))
        .unwrap();

        let items = &permission.schemas["inventory"].tables["items"];
        assert!(items.read);
        assert_eq!(items.attribute_permissions.len(), 1);
        let attr = &items.attribute_permissions[0];
        assert_eq!(attr.name, "id");
        assert!(attr.read);
        assert!(!attr.insert);
        assert!(!attr.update);
    }
}
