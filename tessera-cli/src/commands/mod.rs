//! CLI command implementations.

pub mod create;
pub mod embed;
pub mod pattern;
pub mod verify;
