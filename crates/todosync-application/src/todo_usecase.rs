//! Todo queries and mutations.

use crate::auth_usecase::user_message;
use crate::cache::{QuerySubscription, ResultCache, todo_keys};
use std::sync::Arc;
use todosync_core::Result;
use todosync_core::notification::Notifier;
use todosync_core::todo::{NewTodo, Todo, TodoListParams, TodoPage, TodoUpdate};
use todosync_interaction::TodoApi;

/// Cached todo reads and the invalidation each write implies.
pub struct TodoUseCase {
    api: TodoApi,
    cache: ResultCache,
    notifier: Arc<dyn Notifier>,
}

impl TodoUseCase {
    pub fn new(api: TodoApi, cache: ResultCache, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            cache,
            notifier,
        }
    }

    pub async fn list(&self, params: &TodoListParams) -> Result<TodoPage> {
        let api = self.api.clone();
        let owned = params.clone();
        self.cache
            .query(
                todo_keys::list(params),
                move || {
                    let api = api.clone();
                    let params = owned.clone();
                    async move { api.list(&params).await }
                },
                self.cache.default_options(),
            )
            .await
    }

    /// Keeps the list for `params` observed: it is fetched now and refetched
    /// whenever a mutation invalidates it, until the handle is dropped.
    pub fn watch_list(&self, params: &TodoListParams) -> QuerySubscription {
        let api = self.api.clone();
        let owned = params.clone();
        self.cache.subscribe::<TodoPage, _, _>(
            todo_keys::list(params),
            move || {
                let api = api.clone();
                let params = owned.clone();
                async move { api.list(&params).await }
            },
            self.cache.default_options(),
        )
    }

    pub async fn get(&self, id: &str) -> Result<Todo> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.cache
            .query(
                todo_keys::detail(id),
                move || {
                    let api = api.clone();
                    let id = owned.clone();
                    async move { api.get(&id).await }
                },
                self.cache.default_options(),
            )
            .await
    }

    pub async fn create(&self, todo: &NewTodo) -> Result<Todo> {
        todo.validate()?;
        let created = self.report(self.api.create(todo).await)?;

        self.cache.invalidate(&todo_keys::lists());
        self.notifier.success("Todo created successfully");
        Ok(created)
    }

    pub async fn update(&self, id: &str, update: &TodoUpdate) -> Result<Todo> {
        update.validate()?;
        let updated = self.report(self.api.update(id, update).await)?;

        self.invalidate_todo(id);
        self.notifier.success("Todo updated successfully");
        Ok(updated)
    }

    /// Completing a todo removes it on the server.
    pub async fn complete(&self, id: &str) -> Result<()> {
        self.report(self.api.complete(id).await)?;

        self.invalidate_todo(id);
        self.notifier.success("Todo completed");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.report(self.api.delete(id).await)?;

        self.invalidate_todo(id);
        self.notifier.success("Todo deleted");
        Ok(())
    }

    fn invalidate_todo(&self, id: &str) {
        self.cache.invalidate(&todo_keys::lists());
        self.cache.invalidate(&todo_keys::detail(id));
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.is_auth() {
                self.notifier.error(&user_message(e));
            }
        }
        result
    }
}
