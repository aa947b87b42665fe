//! Session domain module.
//!
//! This module contains the authenticated-session model, the persistence
//! seam, and the manager that owns the session lifecycle.
//!
//! # Module Structure
//!
//! - `model`: Session state and its persisted snapshot (`Session`, `SessionSnapshot`)
//! - `event`: Lifecycle events and checkpoint outcomes
//! - `store`: Persistence trait (`SessionStore`) and an in-memory implementation
//! - `manager`: Session lifecycle management (`SessionManager`)
//!
//! # Usage
//!
//! ```ignore
//! use todosync_core::session::{SessionManager, SessionStore, SessionEvent};
//! ```

mod event;
mod manager;
mod model;
mod store;


// Re-export public API
pub use event::{ClearReason, ExpiryStatus, RehydrateOutcome, SessionEvent};
pub use manager::SessionManager;
pub use model::{SESSION_STORAGE_KEY, SESSION_TTL, Session, SessionSnapshot};
pub use store::{InMemorySessionStore, SessionStore};
