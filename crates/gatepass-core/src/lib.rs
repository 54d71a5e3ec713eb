//! Core types and logic for the Gatepass visitor register.
//!
//! Field mapping, validation, photo checks and the submission pipeline live
//! here. This crate does no I/O; persistence backends implement
//! [`store::VisitorRepository`] in their own crates.

pub mod capture;
pub mod error;
pub mod fields;
pub mod photo;
pub mod pipeline;
pub mod store;
pub mod validate;
pub mod visitor;

pub use error::{Error, MappingError, Result};
