/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Authentication endpoints (register, login, logout, me)
/// - `tasks`: Task CRUD endpoints, scoped to the authenticated subject
/// - `chat`: Natural-language task entry backed by the agent dispatch

pub mod auth;
pub mod chat;
pub mod health;
pub mod tasks;
