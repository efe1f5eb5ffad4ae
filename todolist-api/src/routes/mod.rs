/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login and account verification
/// - `lists`: To-do lists and their members
/// - `tasks`: Tasks within a list

pub mod auth;
pub mod health;
pub mod lists;
pub mod tasks;
