//! Content index: assembles home, listing and dashboard read-models for a
//! content site out of concurrent queries against a document store.

pub mod config;
pub mod db;
pub mod fixtures;
pub mod index;
pub mod model;
pub mod store;
