use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use todosync_application::AppContext;
use todosync_core::todo::{NewTodo, Priority, SortOrder, Todo, TodoListParams, TodoUpdate};

#[derive(Clone, Copy, ValueEnum)]
pub enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Asc,
            Order::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Subcommand)]
pub enum TodoAction {
    /// List todos
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
        #[arg(long, default_value = "created_at")]
        sort_by: String,
        #[arg(long, value_enum, default_value_t = Order::Desc)]
        order: Order,
    },
    /// Show one todo
    Show { id: String },
    /// Create a todo
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
        #[arg(long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// Change a todo
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Mark a todo done (the server removes it)
    Complete { id: String },
    /// Delete a todo
    Delete { id: String },
}

pub async fn run(ctx: &AppContext, action: TodoAction) -> Result<()> {
    let todos = ctx.todos();
    match action {
        TodoAction::List {
            page,
            page_size,
            sort_by,
            order,
        } => {
            let params = TodoListParams {
                page,
                page_size,
                sort_by,
                sort_order: order.into(),
            };
            let page = todos.list(&params).await.context("Failed to list todos")?;
            if page.items.is_empty() {
                println!("No todos");
            }
            for todo in &page.items {
                println!("{}", summary(todo));
            }
            if let Some(total) = page.total {
                println!("({} of {total})", page.items.len());
            }
        }
        TodoAction::Show { id } => {
            let todo = todos.get(&id).await.context("Failed to load todo")?;
            println!("{}", summary(&todo));
            if let Some(description) = &todo.description {
                println!("    {description}");
            }
        }
        TodoAction::Add {
            title,
            due,
            description,
            priority,
        } => {
            let new_todo = NewTodo {
                title,
                description,
                priority,
                due_date: due,
            };
            let todo = todos.create(&new_todo).await.context("Failed to create todo")?;
            println!("{}", summary(&todo));
        }
        TodoAction::Update {
            id,
            title,
            description,
            priority,
            due,
        } => {
            let update = TodoUpdate {
                title,
                description,
                priority,
                due_date: due,
                is_completed: None,
            };
            let todo = todos
                .update(&id, &update)
                .await
                .context("Failed to update todo")?;
            println!("{}", summary(&todo));
        }
        TodoAction::Complete { id } => {
            todos.complete(&id).await.context("Failed to complete todo")?;
        }
        TodoAction::Delete { id } => {
            todos.delete(&id).await.context("Failed to delete todo")?;
        }
    }
    Ok(())
}

fn summary(todo: &Todo) -> String {
    let check = if todo.is_completed { "x" } else { " " };
    let priority = match todo.priority {
        Some(Priority::High) => " !!",
        Some(Priority::Medium) => " !",
        Some(Priority::Low) | None => "",
    };
    format!("[{check}] {}  {}{priority}  (due {})", todo.id, todo.title, todo.due_date)
}
