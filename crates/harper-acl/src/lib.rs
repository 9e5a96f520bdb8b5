//! # Harper ACL
//!
//! Role permissions for HarperDB administration, shared by the remote
//! client and the reconcilers.
//!
//! ## Overview
//!
//! The harper-acl crate handles:
//! - **Permissions**: The normalized permission value attached to a role
//! - **Codec**: Conversion between a declared, dynamically-shaped permission
//!   tree and the typed [`Permission`] value
//!
//! ## Architecture
//!
//! ```text
//! Permission
//!   ├─ super_user, cluster_user
//!   └─ schemas: <schema> ─→ SchemaPermission
//!                             └─ tables: <table> ─→ TablePermission
//!                                                     ├─ read, insert, update, delete
//!                                                     └─ attribute_permissions: [AttributePermission]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use harper_acl::codec;
//! use serde_json::json;
//!
//! let tree = json!({
//!     "super_user": false,
//!     "schema_permissions": {
//!         "inventory": {
//!             "tables": {
//!                 "items": {
//!                     "read": true,
//!                     "attribute_permissions": [{ "name": "id", "read": true }]
//!                 }
//!             }
//!         }
//!     }
//! });
//!
//! let permission = codec::encode(&tree).unwrap();
//! let items = permission.table("inventory", "items").unwrap();
//! assert!(items.read);
//! assert!(!items.delete);
//! assert_eq!(items.attribute_permissions[0].name, "id");
//!
//! // Decoding yields the default-filled form of the declared tree.
//! let normal = codec::decode(&permission);
//! assert_eq!(normal["cluster_user"], json!(false));
//! ```
//!
//! ## Defaults
//!
//! An absent flag is always `false` and an absent list is always empty.
//! Nothing is inherited from an enclosing level.

pub mod codec;
pub mod permission;

// Re-export main types for convenience
pub use codec::{decode, encode, normalize, CodecError, CodecResult};
pub use permission::{AttributePermission, Permission, SchemaPermission, TablePermission};
