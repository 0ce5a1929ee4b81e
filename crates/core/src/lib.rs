//! Core business logic for campus.

pub mod services;

pub use services::*;

/// Generate a unique ID using ULID.
pub fn generate_id() -> String {
    campus_common::IdGenerator::new().generate()
}
