//! Catalog use cases: cached reads and cache-coherent writes.

pub mod admin;
pub mod catalog;
pub mod error;
pub mod pagination;
pub mod repos;
