//! # Harper Reconcile
//!
//! Reconciles declared HarperDB administration objects against a live
//! instance for an external plan/state orchestrator.
//!
//! ## Overview
//!
//! The harper-reconcile crate handles:
//! - **Kinds**: Schema, Table, User, Role and the state-only Permission
//! - **Identity**: How each kind's stable identity is derived
//! - **Reconcilers**: Create, Read, Update, Delete and Import per kind
//! - **Boundary**: A JSON-level [`ResourceHandler`] per resource type and
//!   the [`Diagnostic`] returned on failure
//! - **Provider**: One shared client, one reconciler per kind, and the
//!   resource declarations the orchestrator consumes
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator adapter
//!   └─ Provider::handler("harperdb_<kind>") ─→ ResourceHandler (JSON)
//!                                                 └─ Reconciler (typed)
//!                                                      ├─ identity policy
//!                                                      ├─ harper_acl codec (roles)
//!                                                      └─ RemoteAdmin ─→ HarperDB
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use harper_reconcile::resources::SchemaFields;
//! use harper_reconcile::{Provider, Reconciler};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = Provider::from_env()?;
//!
//!     let schema = provider.schemas().create(SchemaFields::named("inventory")).await?;
//!     assert_eq!(schema.id.as_str(), "inventory");
//!
//!     provider.schemas().delete(schema).await?;
//!     Ok(())
//! }
//! ```

pub mod boundary;
pub mod declaration;
pub mod error;
pub mod identity;
pub mod kind;
pub mod provider;
pub mod reconciler;
pub mod resources;

#[cfg(test)]
mod testing;

// Re-export main types
pub use boundary::{HandlerResult, ResourceHandler};
pub use declaration::{AttributeSpec, AttributeType, Presence, ResourceDeclaration};
pub use error::{Diagnostic, Operation, ReconcileError, ReconcileResult, Severity};
pub use identity::{derive_identity, Identity};
pub use kind::{IdentityChange, IdentitySource, ObjectKind};
pub use provider::{Provider, ProviderSettings, VERSION};
pub use reconciler::{ReconciledObject, Reconciler};
