/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Banner and health check
/// - `users`: Registration, login, profile
/// - `projects`: Project CRUD
/// - `tasks`: Task CRUD and per-project listing

pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
