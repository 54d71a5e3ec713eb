//! Local fallback store for when no database backend is configured.
//!
//! Emulates a browser's local storage: one JSON document of string keys, each
//! holding a JSON value. Visitors live as an ordered array under
//! [`VISITORS_KEY`], in domain shape. No field mapping is applied on this
//! path, which the store advertises as [`RecordShape::Domain`].
//!
//! [`RecordShape::Domain`]: gatepass_core::store::RecordShape::Domain

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{LocalStore, VISITORS_KEY};
