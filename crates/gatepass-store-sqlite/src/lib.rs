//! SQLite backend for the Gatepass visitor register.
//!
//! Stores visitors as storage-shape rows in a single `visitors` table. Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_MAX_VALUE_LEN, SqliteStore};
