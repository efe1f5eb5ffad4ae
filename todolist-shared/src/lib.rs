//! # Todolist Shared Library
//!
//! Domain types, persistence, authentication and the list/task services used
//! by the Todolist API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, to-do lists, tasks and their public projections
//! - `store`: Transactional persistence port with Postgres and in-memory adapters
//! - `db`: Connection pool and migrations
//! - `auth`: Passwords, tokens, request identity, authority checks and the
//!   signup/verification flow
//! - `notify`: Outbound verification email delivery
//! - `services`: List and task operations
//! - `clock`: Injectable time source
//! - `error`: Domain error type

pub mod auth;
pub mod clock;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;

/// Current version of the Todolist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
