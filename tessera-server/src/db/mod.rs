//! Database module for Tessera Server
//!
//! Contains the PostgreSQL product repository backing the core registry.

pub mod product;

pub use product::PostgresProductStore;
