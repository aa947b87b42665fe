//! Todo domain module.
//!
//! Plain CRUD payloads exchanged with `/api/todos`. The client attaches no
//! behavior to them beyond the title check done before a request is sent.
//!
//! # Usage
//!
//! ```ignore
//! use todosync_core::todo::{NewTodo, Priority, Todo, TodoListParams, TodoPage, TodoUpdate};
//! ```

mod model;

pub use model::{
    MAX_TITLE_LEN, NewTodo, Priority, SortOrder, Todo, TodoListParams, TodoPage, TodoUpdate,
};
