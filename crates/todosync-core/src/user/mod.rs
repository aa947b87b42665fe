//! User domain module.
//!
//! Profile representation and the authentication payloads exchanged with
//! the backend, plus the profile lookup seam used by the session watchdog.

mod model;
mod service;

pub use model::{AccountDeletion, Credentials, ProfileUpdate, TokenResponse, UserProfile};
pub use service::ProfileFetcher;
