/// Database models for Ticklist
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts and authentication
/// - `task`: To-do items, always scoped to their owner
/// - `conversation`: Chat transcripts for the natural-language surface
/// - `message`: Individual messages within a conversation
///
/// All task and conversation queries carry an owner-equality predicate; a
/// row owned by someone else is indistinguishable from a row that does not
/// exist.

pub mod conversation;
pub mod message;
pub mod task;
pub mod user;
