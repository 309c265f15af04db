use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use store::{TodoInfo, UserSummary};
use uuid::Uuid;

/// A `todos` row joined with its owner's username.
#[derive(Debug, Clone, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub owner_username: String,
}

impl Todo {
    pub fn to_info(&self) -> TodoInfo {
        TodoInfo {
            id: self.id.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user: UserSummary {
                id: self.user_id.to_string(),
                username: self.owner_username.clone(),
            },
        }
    }
}
