//! # Permissions
//!
//! The normalized permission value granted to a role.
//! A permission is a pair of cluster-wide flags plus a tree of per-schema,
//! per-table and per-attribute grants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The full set of grants carried by a role.
///
/// Schema names are unique, case-sensitive keys. Every flag that was not
/// declared is `false`.
///
/// # Example
///
/// ```
/// use harper_acl::permission::{Permission, TablePermission};
///
/// let mut perm = Permission::new();
/// perm.grant_table("inventory", "items", TablePermission::read_only());
///
/// assert!(perm.table("inventory", "items").unwrap().read);
/// assert!(perm.table("inventory", "missing").is_none());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    /// Unrestricted access to every schema.
    #[serde(default)]
    pub super_user: bool,
    /// Allowed to take part in clustering.
    #[serde(default)]
    pub cluster_user: bool,
    /// Grants keyed by schema name.
    #[serde(default)]
    pub schemas: BTreeMap<String, SchemaPermission>,
}

impl Permission {
    /// Create an empty permission (no flags, no schemas).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a permission with the given cluster-wide flags.
    pub fn with_flags(super_user: bool, cluster_user: bool) -> Self {
        Self {
            super_user,
            cluster_user,
            schemas: BTreeMap::new(),
        }
    }

    /// Replace the grants for one schema.
    pub fn add_schema(&mut self, name: impl Into<String>, schema: SchemaPermission) {
        self.schemas.insert(name.into(), schema);
    }

    /// Set the grants for one table, creating the schema entry if needed.
    pub fn grant_table(
        &mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        permission: TablePermission,
    ) {
        self.schemas
            .entry(schema.into())
            .or_default()
            .tables
            .insert(table.into(), permission);
    }

    /// Look up the grants for a single table.
    pub fn table(&self, schema: &str, table: &str) -> Option<&TablePermission> {
        self.schemas.get(schema)?.tables.get(table)
    }

    /// Whether no flag is set and no schema is listed.
    pub fn is_empty(&self) -> bool {
        !self.super_user && !self.cluster_user && self.schemas.is_empty()
    }
}

/// Grants within a single schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaPermission {
    /// Grants keyed by table name.
    #[serde(default)]
    pub tables: BTreeMap<String, TablePermission>,
}

impl SchemaPermission {
    /// Create a schema entry with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style table grant.
    pub fn with_table(mut self, name: impl Into<String>, table: TablePermission) -> Self {
        self.tables.insert(name.into(), table);
        self
    }
}

/// Grants on a single table.
///
/// `attribute_permissions` keeps declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TablePermission {
    /// May read rows.
    #[serde(default)]
    pub read: bool,
    /// May insert rows.
    #[serde(default)]
    pub insert: bool,
    /// May update rows.
    #[serde(default)]
    pub update: bool,
    /// May delete rows.
    #[serde(default)]
    pub delete: bool,
    /// Per-attribute refinements, in declaration order.
    #[serde(default)]
    pub attribute_permissions: Vec<AttributePermission>,
}

impl TablePermission {
    /// Create a table grant with every flag set to `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access only.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Read, insert, update and delete.
    pub fn full() -> Self {
        Self {
            read: true,
            insert: true,
            update: true,
            delete: true,
            attribute_permissions: Vec::new(),
        }
    }

    /// Append an attribute refinement.
    pub fn with_attribute(mut self, attribute: AttributePermission) -> Self {
        self.attribute_permissions.push(attribute);
        self
    }

    /// First attribute refinement with the given name.
    pub fn attribute(&self, name: &str) -> Option<&AttributePermission> {
        self.attribute_permissions.iter().find(|a| a.name == name)
    }
}

/// Grants on a single attribute of a table.
///
/// There is no delete flag at attribute granularity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributePermission {
    /// Attribute name (never empty once encoded).
    pub name: String,
    /// May read the attribute.
    #[serde(default)]
    pub read: bool,
    /// May set the attribute on insert.
    #[serde(default)]
    pub insert: bool,
    /// May change the attribute on update.
    #[serde(default)]
    pub update: bool,
}

impl AttributePermission {
    /// Create an attribute refinement with every flag `false`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read: false,
            insert: false,
            update: false,
        }
    }

    /// Builder-style read flag.
    pub fn readable(mut self) -> Self {
        self.read = true;
        self
    }

    /// Builder-style insert flag.
    pub fn insertable(mut self) -> Self {
        self.insert = true;
        self
    }

    /// Builder-style update flag.
    pub fn updatable(mut self) -> Self {
        self.update = true;
        self
    }
}
