//! # Object Kinds
//!
//! The administrative object kinds and the per-kind rules that do not
//! depend on any particular object: which operations are supported, where
//! identity comes from, and what an Update does to identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Operation;

/// Provider type name prefix for resource declarations.
pub const TYPE_PREFIX: &str = "harperdb";

/// Kinds of administrative objects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A schema (database namespace).
    Schema,
    /// A table inside a schema.
    Table,
    /// A login user.
    User,
    /// A role carrying a permission.
    Role,
    /// A permission grant tracked only in orchestrator state.
    Permission,
}

/// Where an object's identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// The object's own name.
    Name,
    /// `"<schema>.<name>"`.
    QualifiedName,
    /// An id issued by the remote on create/alter.
    RemoteIssued,
    /// A random token generated locally.
    Generated,
}

/// What an Update does to an existing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityChange {
    /// Update is unsupported; a changed name means delete and recreate.
    RequiresReplace,
    /// Recomputed from the new fields; the object is altered in place.
    RecomputedInPlace,
    /// The id returned by the alter call wins over the prior one.
    RemoteReissued,
    /// The prior identity is kept verbatim.
    Preserved,
}

impl ObjectKind {
    /// Get all object kinds.
    pub fn all() -> [ObjectKind; 5] {
        [
            ObjectKind::Schema,
            ObjectKind::Table,
            ObjectKind::User,
            ObjectKind::Role,
            ObjectKind::Permission,
        ]
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Schema => "schema",
            ObjectKind::Table => "table",
            ObjectKind::User => "user",
            ObjectKind::Role => "role",
            ObjectKind::Permission => "permission",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "schema" => Some(ObjectKind::Schema),
            "table" => Some(ObjectKind::Table),
            "user" => Some(ObjectKind::User),
            "role" => Some(ObjectKind::Role),
            "permission" => Some(ObjectKind::Permission),
            _ => None,
        }
    }

    /// Resource type name as seen by the orchestrator (e.g., `harperdb_table`).
    pub fn type_name(&self) -> String {
        format!("{}_{}", TYPE_PREFIX, self.as_str())
    }

    /// Parse a resource type name produced by [`ObjectKind::type_name`].
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        type_name
            .strip_prefix(TYPE_PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(Self::parse)
    }

    /// Whether objects of this kind exist in the remote database.
    pub fn has_remote(&self) -> bool {
        !matches!(self, ObjectKind::Permission)
    }

    /// Where identity comes from.
    pub fn identity_source(&self) -> IdentitySource {
        match self {
            ObjectKind::Schema | ObjectKind::User => IdentitySource::Name,
            ObjectKind::Table => IdentitySource::QualifiedName,
            ObjectKind::Role => IdentitySource::RemoteIssued,
            ObjectKind::Permission => IdentitySource::Generated,
        }
    }

    /// What an Update does to identity.
    pub fn identity_change(&self) -> IdentityChange {
        match self {
            ObjectKind::Schema | ObjectKind::Table => IdentityChange::RequiresReplace,
            ObjectKind::User => IdentityChange::RecomputedInPlace,
            ObjectKind::Role => IdentityChange::RemoteReissued,
            ObjectKind::Permission => IdentityChange::Preserved,
        }
    }

    /// Whether the kind supports an operation at all.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::Update => self.identity_change() != IdentityChange::RequiresReplace,
            Operation::Import => self.has_remote(),
            Operation::Create | Operation::Read | Operation::Delete => true,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
