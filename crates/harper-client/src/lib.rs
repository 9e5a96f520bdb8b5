//! # Harper Client
//!
//! Remote administration capability for HarperDB.
//!
//! ## Overview
//!
//! The harper-client crate handles:
//! - **Capability**: The [`RemoteAdmin`] trait consumed by reconcilers
//! - **HTTP**: [`HarperClient`], which speaks the JSON operations API
//! - **Wire format**: Conversion of role permissions to and from the
//!   server's flat permission object
//! - **Configuration**: Endpoint and credentials loaded from the environment
//!
//! ## Operations API
//!
//! Every call is a `POST` to the endpoint root with a body naming the
//! operation:
//!
//! ```text
//! { "operation": "create_schema", "schema": "inventory" }
//! { "operation": "add_role", "role": "reader", "permission": { ... } }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use harper_client::{ClientConfig, HarperClient, RemoteAdmin};
//!
//! async fn bootstrap() -> Result<(), harper_client::ClientError> {
//!     let config = ClientConfig::from_env();
//!     config.validate()?;
//!
//!     let client = HarperClient::new(&config)?;
//!     client.create_schema("inventory").await?;
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod wire;

// Re-export main types
pub use admin::{RemoteAdmin, RoleInfo, SchemaInfo, TableInfo, UserInfo, UserSpec};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use http::HarperClient;
