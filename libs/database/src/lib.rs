//! MongoDB connection library.
//!
//! Provides configuration, connection management with retry, and health
//! checks for the MongoDB-backed services in this workspace.
//!
//! # Example
//!
//! ```ignore
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//! use core_config::FromEnv;
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod common;
pub mod mongodb;

pub use common::{DatabaseError, DatabaseResult};
