//! Client for the `/api/todos` endpoints.

use crate::transport::HttpTransport;
use std::sync::Arc;
use todosync_core::Result;
use todosync_core::todo::{NewTodo, Todo, TodoListParams, TodoPage, TodoUpdate};

#[derive(Clone)]
pub struct TodoApi {
    transport: Arc<HttpTransport>,
}

impl TodoApi {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn list(&self, params: &TodoListParams) -> Result<TodoPage> {
        self.transport.get_with_query("/api/todos/", params).await
    }

    pub async fn get(&self, id: &str) -> Result<Todo> {
        self.transport.get(&format!("/api/todos/{id}")).await
    }

    pub async fn create(&self, todo: &NewTodo) -> Result<Todo> {
        self.transport.post("/api/todos/", todo).await
    }

    pub async fn update(&self, id: &str, update: &TodoUpdate) -> Result<Todo> {
        self.transport.put(&format!("/api/todos/{id}"), update).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.transport.delete(&format!("/api/todos/{id}")).await
    }

    /// Marks a todo completed. The server removes completed todos, so the
    /// response body is not used.
    pub async fn complete(&self, id: &str) -> Result<()> {
        self.transport
            .post_empty(&format!("/api/todos/{id}/complete"))
            .await
    }
}
