//! Resource declarations.
//!
//! Field metadata the orchestrator consumes to validate plans and decide
//! between in-place update and replacement. The reconcilers do not enforce
//! this metadata a second time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::kind::{ObjectKind, TYPE_PREFIX};

/// Value type of a declared attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "attributes")]
pub enum AttributeType {
    /// A string.
    String,
    /// A boolean.
    Bool,
    /// A map from dynamic keys to nested objects.
    Map(Vec<AttributeSpec>),
    /// An ordered list of nested objects.
    List(Vec<AttributeSpec>),
}

/// Whether a value comes from the plan, the reconciler, or either.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Must be declared.
    Required,
    /// May be declared.
    Optional,
    /// Set by the reconciler, never declared.
    Computed,
    /// May be declared; otherwise the default is used.
    OptionalComputed,
}

/// One declared attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeSpec {
    /// Attribute name as it appears in plan and state.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Value type.
    #[serde(flatten)]
    pub attribute_type: AttributeType,
    /// Required, optional or computed.
    pub presence: Presence,
    /// Never shown in plan output.
    #[serde(default)]
    pub sensitive: bool,
    /// Changing the value replaces the object.
    #[serde(default)]
    pub requires_replace: bool,
    /// Value used when the attribute is not declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl AttributeSpec {
    fn new(name: &str, description: &str, attribute_type: AttributeType, presence: Presence) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            attribute_type,
            presence,
            sensitive: false,
            requires_replace: false,
            default: None,
        }
    }

    /// A required string.
    pub fn required_string(name: &str, description: &str) -> Self {
        Self::new(name, description, AttributeType::String, Presence::Required)
    }

    /// An optional string.
    pub fn optional_string(name: &str, description: &str) -> Self {
        Self::new(name, description, AttributeType::String, Presence::Optional)
    }

    /// An optional boolean.
    pub fn optional_bool(name: &str, description: &str) -> Self {
        Self::new(name, description, AttributeType::Bool, Presence::Optional)
    }

    /// An optional boolean that falls back to `default`.
    pub fn defaulted_bool(name: &str, description: &str, default: bool) -> Self {
        Self::new(name, description, AttributeType::Bool, Presence::OptionalComputed)
            .with_default(Value::Bool(default))
    }

    /// The computed `id` attribute.
    pub fn id(description: &str) -> Self {
        Self::new("id", description, AttributeType::String, Presence::Computed)
    }

    /// An optional map of nested objects.
    pub fn map(name: &str, description: &str, attributes: Vec<AttributeSpec>) -> Self {
        Self::new(name, description, AttributeType::Map(attributes), Presence::Optional)
    }

    /// An optional list of nested objects.
    pub fn list(name: &str, description: &str, attributes: Vec<AttributeSpec>) -> Self {
        Self::new(name, description, AttributeType::List(attributes), Presence::Optional)
    }

    /// Mark the value as secret.
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Mark that a change replaces the object.
    pub fn requires_replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Whether the plan must carry a value.
    pub fn is_required(&self) -> bool {
        self.presence == Presence::Required
    }
}

/// Declared shape of one resource type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceDeclaration {
    /// Resource type name (e.g., `harperdb_schema`).
    pub type_name: String,

    /// Human-readable description.
    pub description: String,

    /// Attributes, `id` first.
    pub attributes: Vec<AttributeSpec>,
}

impl ResourceDeclaration {
    /// Create a declaration with only the computed `id` attribute.
    pub fn new(kind: ObjectKind, description: impl Into<String>, id_description: &str) -> Self {
        Self {
            type_name: kind.type_name(),
            description: description.into(),
            attributes: vec![AttributeSpec::id(id_description)],
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Look up an attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Declaration for `kind`.
    pub fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Schema => schema(),
            ObjectKind::Table => table(),
            ObjectKind::User => user(),
            ObjectKind::Role => role(),
            ObjectKind::Permission => permission(),
        }
    }
}

/// Provider configuration declaration.
pub fn provider_declaration() -> ResourceDeclaration {
    ResourceDeclaration {
        type_name: TYPE_PREFIX.to_string(),
        description: "Manage HarperDB schemas, tables, users and roles".to_string(),
        attributes: vec![
            AttributeSpec::required_string("endpoint", "Operations API URL"),
            AttributeSpec::optional_string("username", "Basic auth username"),
            AttributeSpec::optional_string("password", "Basic auth password").sensitive(),
        ],
    }
}

fn schema() -> ResourceDeclaration {
    ResourceDeclaration::new(ObjectKind::Schema, "HarperDB schema", "Schema name")
        .with_attribute(AttributeSpec::required_string("name", "Schema name").requires_replace())
}

fn table() -> ResourceDeclaration {
    ResourceDeclaration::new(ObjectKind::Table, "HarperDB table", "<schema>.<name>")
        .with_attribute(AttributeSpec::required_string("schema", "Owning schema").requires_replace())
        .with_attribute(AttributeSpec::required_string("name", "Table name").requires_replace())
        .with_attribute(
            AttributeSpec::required_string("hash_attribute", "Primary key attribute").requires_replace(),
        )
}

fn user() -> ResourceDeclaration {
    ResourceDeclaration::new(ObjectKind::User, "HarperDB user", "Username")
        .with_attribute(AttributeSpec::required_string("username", "Login name"))
        .with_attribute(AttributeSpec::required_string("password", "Login password").sensitive())
        .with_attribute(AttributeSpec::required_string("role", "Assigned role name"))
        .with_attribute(AttributeSpec::defaulted_bool("active", "Whether the user can log in", true))
}

fn crud_flags(include_delete: bool) -> Vec<AttributeSpec> {
    let mut flags = vec![
        AttributeSpec::defaulted_bool("read", "Read access", false),
        AttributeSpec::defaulted_bool("insert", "Insert access", false),
        AttributeSpec::defaulted_bool("update", "Update access", false),
    ];
    if include_delete {
        flags.push(AttributeSpec::defaulted_bool("delete", "Delete access", false));
    }
    flags
}

fn role() -> ResourceDeclaration {
    let mut attribute = vec![AttributeSpec::required_string("name", "Attribute name")];
    attribute.extend(crud_flags(false));

    let mut table = crud_flags(true);
    table.push(AttributeSpec::list(
        "attribute_permissions",
        "Per-attribute access, in declaration order",
        attribute,
    ));

    let schema = vec![AttributeSpec::map("tables", "Table name to table access", table)];

    ResourceDeclaration::new(ObjectKind::Role, "HarperDB role", "Server-issued role id")
        .with_attribute(AttributeSpec::required_string("name", "Role name"))
        .with_attribute(AttributeSpec::optional_bool("super_user", "Grants every permission"))
        .with_attribute(AttributeSpec::optional_bool("cluster_user", "Grants cluster operations"))
        .with_attribute(AttributeSpec::map(
            "schema_permissions",
            "Schema name to schema access",
            schema,
        ))
}

fn permission() -> ResourceDeclaration {
    ResourceDeclaration::new(
        ObjectKind::Permission,
        "Permission grant tracked in state only",
        "Generated identifier",
    )
    .with_attribute(AttributeSpec::optional_bool("super_user", "Grants every permission"))
    .with_attribute(AttributeSpec::optional_bool("cluster_user", "Grants cluster operations"))
    .with_attribute(AttributeSpec::map(
        "table_permissions",
        "Table name to table access",
        crud_flags(true),
    ))
}
