//! Catalog entities and the rules every write must satisfy.

pub mod entities;
pub mod error;
pub mod rules;
pub mod types;
