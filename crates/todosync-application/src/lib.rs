//! Application layer for todosync.
//!
//! Coordinates the session, the remote endpoints and the result cache:
//! the use cases a front end calls, the background session watchdog, and
//! the teardown that runs when a session ends.

pub mod auth_usecase;
pub mod bootstrap;
pub mod cache;
pub mod notification_center;
pub mod teardown;
pub mod todo_usecase;
pub mod watchdog;

pub use auth_usecase::AuthUseCase;
pub use bootstrap::AppContext;
pub use cache::{QueryKey, QueryOptions, QueryStatus, QuerySubscription, ResultCache};
pub use notification_center::NotificationCenter;
pub use teardown::{Navigation, SessionTeardown};
pub use todo_usecase::TodoUseCase;
pub use watchdog::SessionWatchdog;
