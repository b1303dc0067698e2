//! # ProjectHub Shared Library
//!
//! Types and database logic used by the ProjectHub API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, identity tokens, bearer header parsing
//! - `db`: SQLite pool and embedded migrations
//! - `models`: users, projects, tasks and partial updates

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the ProjectHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
