//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod health;
pub mod products;
pub mod verify;

pub use crate::state::AppState;
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use products::{
    create_product, get_code, get_pattern, get_product, CreateProductRequest, ProductResponse,
};
pub use verify::{verify_handler, VerifiedProduct, VerifyResponse};
