//! Core contracts and helpers for synthscope.
//!
//! This crate defines the in-memory dataset model, cell values, the semantic
//! schema shared by every metric, and the column profiler that derives that
//! schema from the real dataset.

pub mod dataset;
pub mod error;
pub mod profile;
pub mod schema;
pub mod value;

pub use dataset::{Column, Dataset};
pub use error::{Error, Result};
pub use profile::{ProfileOptions, profile};
pub use schema::{ColumnSchema, Schema, SemanticType};
pub use value::{Value, parse_datetime};

/// Current contract version for serialized schema artifacts.
pub const SCHEMA_VERSION: &str = "0.1";
