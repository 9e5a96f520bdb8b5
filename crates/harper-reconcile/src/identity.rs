//! Identity policy.
//!
//! Derives the stable identity of an object from its declared fields, a
//! remote-issued id, or a generated token, depending on its kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Operation, ReconcileError, ReconcileResult};
use crate::kind::{IdentityChange, IdentitySource, ObjectKind};

/// Separator between schema and table in a qualified table identity.
pub const QUALIFIER: char = '.';

/// Stable key correlating a declared object with its remote and tracked
/// representations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wrap an already-derived identity value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derive the identity of an object.
///
/// `names` are the naming fields in order (`[name]` or `[schema, name]`);
/// `remote` is the id returned by the remote call, if any.
///
/// # Errors
///
/// - `Validation` when a naming field the kind needs is missing or empty, or
///   a table's schema contains the qualifier
/// - `IdentityUnavailable` when the kind needs a remote-issued id and none
///   was returned
///
/// # Example
///
/// ```
/// use harper_reconcile::identity::derive_identity;
/// use harper_reconcile::{ObjectKind, Operation};
///
/// let id = derive_identity(ObjectKind::Table, Operation::Create, &["inventory", "items"], None).unwrap();
/// assert_eq!(id.as_str(), "inventory.items");
///
/// let err = derive_identity(ObjectKind::Role, Operation::Create, &[], None).unwrap_err();
/// assert_eq!(err.error_code(), "IDENTITY_UNAVAILABLE");
/// ```
pub fn derive_identity(
    kind: ObjectKind,
    operation: Operation,
    names: &[&str],
    remote: Option<&str>,
) -> ReconcileResult<Identity> {
    match kind.identity_source() {
        IdentitySource::Name => match names {
            [name] if !name.is_empty() => Ok(Identity::new(*name)),
            _ => Err(ReconcileError::validation(kind, "identity requires a non-empty name")),
        },
        IdentitySource::QualifiedName => match names {
            [schema, _] if schema.contains(QUALIFIER) => Err(ReconcileError::validation(
                kind,
                format!("schema '{}' must not contain '{}'", schema, QUALIFIER),
            )),
            [schema, name] if !schema.is_empty() && !name.is_empty() => {
                Ok(Identity::new(format!("{}{}{}", schema, QUALIFIER, name)))
            }
            _ => Err(ReconcileError::validation(
                kind,
                "identity requires a non-empty schema and name",
            )),
        },
        IdentitySource::RemoteIssued => remote
            .filter(|id| !id.is_empty())
            .map(Identity::new)
            .ok_or(ReconcileError::IdentityUnavailable { kind, operation }),
        IdentitySource::Generated => Ok(Identity::new(Uuid::new_v4().to_string())),
    }
}

/// Identity after an Update, following the kind's [`IdentityChange`].
///
/// Kinds whose identity only changes by replacement reject the update.
pub fn updated_identity(
    kind: ObjectKind,
    prior: &Identity,
    names: &[&str],
    remote: Option<&str>,
) -> ReconcileResult<Identity> {
    match kind.identity_change() {
        IdentityChange::RequiresReplace => Err(ReconcileError::unsupported(kind, Operation::Update)),
        IdentityChange::RecomputedInPlace => derive_identity(kind, Operation::Update, names, remote),
        IdentityChange::RemoteReissued => Ok(remote
            .filter(|id| !id.is_empty())
            .map(Identity::new)
            .unwrap_or_else(|| prior.clone())),
        IdentityChange::Preserved => Ok(prior.clone()),
    }
}

/// Split a qualified table identity into `(schema, name)` at the first
/// separator.
///
/// Schemas never contain the separator (`derive_identity` rejects them), so
/// everything after the first one is the table name.
pub fn split_qualified(identity: &str) -> Option<(&str, &str)> {
    identity
        .split_once(QUALIFIER)
        .filter(|(schema, name)| !schema.is_empty() && !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_identity() {
        let id = derive_identity(ObjectKind::Schema, Operation::Create, &["inventory"], None).unwrap();
        assert_eq!(id, Identity::new("inventory"));

        let id = derive_identity(ObjectKind::User, Operation::Update, &["alice"], Some("ignored")).unwrap();
        assert_eq!(id.as_str(), "alice");
    }

    #[test]
    fn test_name_identity_requires_name() {
        let err = derive_identity(ObjectKind::Schema, Operation::Create, &[""], None).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let err = derive_identity(ObjectKind::User, Operation::Create, &[], None).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_qualified_identity() {
        let id = derive_identity(ObjectKind::Table, Operation::Create, &["inventory", "items"], None)
            .unwrap();
        assert_eq!(id.to_string(), "inventory.items");

        assert!(derive_identity(ObjectKind::Table, Operation::Create, &["inventory"], None).is_err());
        assert!(derive_identity(ObjectKind::Table, Operation::Create, &["", "items"], None).is_err());
    }

    #[test]
    fn test_qualified_identity_rejects_dotted_schema() {
        let err = derive_identity(ObjectKind::Table, Operation::Create, &["a.b", "c"], None)
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("schema 'a.b' must not contain '.'"));

        // A dotted table name still splits back to the declared pair.
        let id = derive_identity(ObjectKind::Table, Operation::Create, &["a", "b.c"], None).unwrap();
        assert_eq!(split_qualified(id.as_str()), Some(("a", "b.c")));
    }

    #[test]
    fn test_updated_identity_per_kind() {
        let prior = Identity::new("old");

        let err = updated_identity(ObjectKind::Schema, &prior, &["new"], None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");
        let err = updated_identity(ObjectKind::Table, &prior, &["s", "t"], None).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_OPERATION");

        let id = updated_identity(ObjectKind::User, &prior, &["alice"], None).unwrap();
        assert_eq!(id.as_str(), "alice");

        let id = updated_identity(ObjectKind::Role, &prior, &["reader"], Some("r-2")).unwrap();
        assert_eq!(id.as_str(), "r-2");
        let id = updated_identity(ObjectKind::Role, &prior, &["reader"], None).unwrap();
        assert_eq!(id, prior);
        let id = updated_identity(ObjectKind::Role, &prior, &["reader"], Some("")).unwrap();
        assert_eq!(id, prior);

        let id = updated_identity(ObjectKind::Permission, &prior, &[], None).unwrap();
        assert_eq!(id, prior);
    }

    #[test]
    fn test_remote_identity() {
        let id = derive_identity(ObjectKind::Role, Operation::Create, &["reader"], Some("r-1")).unwrap();
        assert_eq!(id.as_str(), "r-1");

        let err = derive_identity(ObjectKind::Role, Operation::Update, &["reader"], Some("")).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::IdentityUnavailable {
                kind: ObjectKind::Role,
                operation: Operation::Update
            }
        ));
    }

    #[test]
    fn test_generated_identity_is_fresh() {
        let a = derive_identity(ObjectKind::Permission, Operation::Create, &[], None).unwrap();
        let b = derive_identity(ObjectKind::Permission, Operation::Create, &[], None).unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("inventory.items"), Some(("inventory", "items")));
        assert_eq!(split_qualified("a.b.c"), Some(("a", "b.c")));
        assert_eq!(split_qualified("inventory"), None);
        assert_eq!(split_qualified(".items"), None);
        assert_eq!(split_qualified("inventory."), None);
    }
}
