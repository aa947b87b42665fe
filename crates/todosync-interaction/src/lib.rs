//! Remote layer: the HTTP transport and the REST endpoint clients.

pub mod auth_api;
pub mod todo_api;
pub mod transport;
pub mod user_api;

pub use auth_api::AuthApi;
pub use todo_api::TodoApi;
pub use transport::{HttpTransport, classify_status};
pub use user_api::UserApi;
