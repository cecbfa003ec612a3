//! # Box Office
//!
//! Seat reservation and checkout for ticketed events, with a per-event
//! waiting room that caps concurrent shoppers.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: seats, reservations, purchases, tickets and the repository traits
//! - **application**: booking services and the waiting room admission queue
//! - **infrastructure**: in-memory and SeaORM-backed storage
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, clock, retry, shutdown and input validation

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider};

pub use interfaces::http::{create_api_router, ApiState};
