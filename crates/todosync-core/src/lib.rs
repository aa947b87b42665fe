//! Domain layer of the todosync client.
//!
//! Holds the session lifecycle, the error taxonomy shared by every crate,
//! configuration and payload models, and the traits the outer layers plug
//! into.

pub mod clock;
pub mod config;
pub mod error;
pub mod hook;
pub mod notification;
pub mod session;
pub mod todo;
pub mod user;

// Re-export common error type
pub use error::{Result, TodoSyncError};
