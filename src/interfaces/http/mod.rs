//! REST API
//!
//! - `common`: response envelope, error mapping, validated JSON extractor
//! - `modules`: one folder per resource (dto + handlers)
//! - `router`: route table, shared state and Swagger documentation

pub mod common;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, ApiState};
