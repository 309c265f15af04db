//! # Datastore — users, todos and friendships
//!
//! Every handler reaches storage through the [`Datastore`] trait, held as
//! `Arc<dyn Datastore>` in the application state. Two implementations exist:
//!
//! | Type | Backing | Used by |
//! |------|---------|---------|
//! | [`PgDatastore`] | PostgreSQL via SQLx, schema in `migrations/` | the server when `database.url` is set |
//! | [`MemoryDatastore`] | `tokio::sync::Mutex` around plain collections | tests, and the server when no database is configured |
//!
//! ## Contract
//!
//! - Todo reads and writes are **ownership-scoped**: `update_todo` and `delete_todo`
//!   take both the todo id and the caller's id and behave as if the todo did not exist
//!   when the owner differs.
//! - `list_visible_todos` returns the viewer's todos and those of every friend,
//!   newest first, each joined with its owner's username.
//! - Friendships are passed as a [`FriendPair`], so both directions are one edge.
//!   `add_friend` returns `false` when the edge already exists; `remove_friend` of a
//!   missing edge is a no-op.
//! - `create_user` reports a taken username or email as [`ApiError::Conflict`].

mod memory;
mod pool;
mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{FriendPair, Todo, User};

pub use memory::MemoryDatastore;
pub use pool::{connect, migrate};
pub use postgres::PgDatastore;

#[cfg(doc)]
use crate::error::ApiError;

pub const USERNAME_TAKEN: &str = "Username already exists";
pub const EMAIL_TAKEN: &str = "Email already registered";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Validated partial update. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<NaiveDate>>,
}

/// A 1-based page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    pub fn total_pages(&self, total_count: i64) -> u32 {
        let limit = i64::from(self.limit.max(1));
        u32::try_from((total_count + limit - 1) / limit).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VisibleTodos {
    pub todos: Vec<Todo>,
    pub total_count: i64,
}

#[async_trait]
pub trait Datastore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> ApiResult<User>;
    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>>;
    /// Everyone except `viewer_id`, optionally filtered by a case-insensitive
    /// substring of the username, ordered by username.
    async fn search_users(
        &self,
        viewer_id: Uuid,
        term: Option<&str>,
        limit: i64,
    ) -> ApiResult<Vec<User>>;

    async fn create_todo(&self, todo: NewTodo) -> ApiResult<Todo>;
    async fn update_todo(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: TodoChanges,
    ) -> ApiResult<Option<Todo>>;
    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> ApiResult<bool>;
    async fn list_visible_todos(
        &self,
        viewer_id: Uuid,
        page: Option<PageRequest>,
    ) -> ApiResult<VisibleTodos>;

    async fn add_friend(&self, pair: FriendPair) -> ApiResult<bool>;
    async fn remove_friend(&self, pair: FriendPair) -> ApiResult<()>;
    async fn list_friends(&self, user_id: Uuid) -> ApiResult<Vec<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let page = PageRequest { page: 3, limit: 10 };
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(21), 3);
    }
}
