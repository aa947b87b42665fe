//! Todo domain model.

use crate::error::{Result, TodoSyncError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Longest title the server accepts.
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for Priority {
    type Err = TodoSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(TodoSyncError::validation(format!(
                "Unknown priority '{other}' (expected low, medium or high)"
            ))),
        }
    }
}

/// A todo as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/todos/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub due_date: NaiveDate,
}

impl NewTodo {
    pub fn validate(&self) -> Result<()> {
        validate_title(&self.title)
    }
}

/// Body of `PUT /api/todos/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl TodoUpdate {
    pub fn validate(&self) -> Result<()> {
        match &self.title {
            Some(title) => validate_title(title),
            None => Ok(()),
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TodoSyncError::validation(
            "Title cannot be empty or just whitespace",
        ));
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(TodoSyncError::validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Wire spelling, as sent in the `sort_order` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters of `GET /api/todos/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoListParams {
    pub page: u32,
    pub page_size: u32,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl Default for TodoListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            sort_by: "created_at".to_string(),
            sort_order: SortOrder::Desc,
        }
    }
}

/// A page of todos.
///
/// The list endpoint has answered both with a bare array and with a paginated
/// envelope; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TodoPageWire")]
pub struct TodoPage {
    pub items: Vec<Todo>,
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TodoPageWire {
    Bare(Vec<Todo>),
    Envelope {
        items: Vec<Todo>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        page_size: Option<u32>,
    },
}

impl From<TodoPageWire> for TodoPage {
    fn from(wire: TodoPageWire) -> Self {
        match wire {
            TodoPageWire::Envelope {
                items,
                total,
                page,
                page_size,
            } => Self {
                items,
                total,
                page,
                page_size,
            },
            TodoPageWire::Bare(items) => Self {
                total: Some(items.len() as u64),
                items,
                page: None,
                page_size: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_as_str_matches_wire_format() {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            assert_eq!(json!(order), json!(order.as_str()));
        }
    }

    fn todo_json(id: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": "u-1",
            "title": "Write docs",
            "description": null,
            "priority": "high",
            "due_date": "2024-12-31",
            "is_completed": false,
            "created_at": "2024-01-15T10:30:00Z",
            "updated_at": "2024-01-15T10:30:00Z"
        })
    }

    #[test]
    fn test_page_accepts_bare_array() {
        let page: TodoPage = serde_json::from_value(json!([todo_json("a"), todo_json("b")])).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, Some(2));
        assert_eq!(page.items[0].priority, Some(Priority::High));
    }

    #[test]
    fn test_page_accepts_envelope() {
        let page: TodoPage = serde_json::from_value(json!({
            "items": [todo_json("a")],
            "total": 41,
            "page": 3,
            "page_size": 20
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, Some(41));
        assert_eq!(page.page, Some(3));
    }

    #[test]
    fn test_title_validation() {
        let mut todo = NewTodo {
            title: "   ".into(),
            description: None,
            priority: None,
            due_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        };
        assert!(todo.validate().is_err());

        todo.title = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(todo.validate().is_err());

        todo.title = "Ship it".into();
        assert!(todo.validate().is_ok());
    }

    #[test]
    fn test_list_params_serialize_as_query() {
        let params = TodoListParams::default();
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"page": 1, "page_size": 20, "sort_by": "created_at", "sort_order": "desc"})
        );
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
