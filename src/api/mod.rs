//! API Module
//!
//! HTTP handlers and routing for the diagnostics REST API.
//!
//! # Endpoints
//! - `GET /health` - Breaker state and cache occupancy
//! - `GET /stats` - Cache statistics
//! - `POST /circuit/reset` - Force the breaker closed
//! - `DELETE /cache` - Drop every cached entry
//! - `DELETE /cache/:resource_type` - Drop one namespace
//! - `DELETE /cache/:resource_type/:resource_id` - Drop one entry

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
