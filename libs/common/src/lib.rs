//! Common library for the Venue Vista services
//!
//! This crate provides shared functionality used across the users, venues,
//! bookings and gateway services, including database connectivity, the HTTP
//! error taxonomy, token handling, settings and logging setup.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env("postgresql://localhost/venue_vista")?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod dates;
pub mod error;
pub mod jwt;
pub mod settings;
pub mod telemetry;
