//! Query result cache.
//!
//! # Module Structure
//!
//! - `key`: Hierarchical cache keys and the key families of each resource
//! - `result_cache`: The cache itself (`ResultCache`) and its observer handle

mod key;
mod result_cache;

pub use key::{KeySegment, QueryKey, auth_keys, todo_keys};
pub use result_cache::{QueryOptions, QueryStatus, QuerySubscription, ResultCache};
