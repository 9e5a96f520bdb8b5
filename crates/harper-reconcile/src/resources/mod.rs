//! Per-kind reconcilers.
//!
//! | Kind       | Identity            | Update            | Import |
//! |------------|---------------------|-------------------|--------|
//! | Schema     | name                | unsupported       | yes    |
//! | Table      | `schema.name`       | unsupported       | yes    |
//! | User       | username            | alter in place    | yes    |
//! | Role       | remote-issued id    | alter, id reissued| yes    |
//! | Permission | generated UUID      | fields replaced   | no     |

pub mod permission;
pub mod role;
pub mod schema;
pub mod table;
pub mod user;

pub use permission::{PermissionFields, PermissionReconciler, TableAccess};
pub use role::{RoleFields, RoleReconciler};
pub use schema::{SchemaFields, SchemaReconciler};
pub use table::{TableFields, TableReconciler};
pub use user::{UserFields, UserReconciler};
