//! Common utilities and shared types for campus.
//!
//! This crate provides foundational components used across all campus crates:
//!
//! - **Configuration**: Server settings via [`Config`], client settings via [`ClientConfig`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and opaque session tokens via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use campus_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} listening on {}", id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{ClientConfig, Config};
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, hash_token};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "campus_sid";
