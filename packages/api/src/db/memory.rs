//! In-process [`Datastore`] with the same observable behaviour as Postgres.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    Datastore, NewTodo, NewUser, PageRequest, TodoChanges, VisibleTodos, EMAIL_TAKEN,
    USERNAME_TAKEN,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{FriendPair, Todo, User};

/// A todo without the joined owner name.
#[derive(Debug, Clone)]
struct StoredTodo {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    completed: bool,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    todos: HashMap<Uuid, StoredTodo>,
    friendships: BTreeSet<FriendPair>,
}

impl Tables {
    fn joined(&self, todo: &StoredTodo) -> Todo {
        let owner_username = self
            .users
            .get(&todo.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        Todo {
            id: todo.id,
            user_id: todo.user_id,
            title: todo.title.clone(),
            description: todo.description.clone(),
            completed: todo.completed,
            due_date: todo.due_date,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
            owner_username,
        }
    }

    fn friend_ids(&self, user_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.friendships.iter().filter_map(move |pair| pair.other(user_id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryDatastore {
    tables: Mutex<Tables>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(ApiError::conflict(USERNAME_TAKEN));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(ApiError::conflict(EMAIL_TAKEN));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn search_users(
        &self,
        viewer_id: Uuid,
        term: Option<&str>,
        limit: i64,
    ) -> ApiResult<Vec<User>> {
        let needle = term.map(str::to_lowercase);
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.id != viewer_id)
            .filter(|u| match &needle {
                Some(needle) => u.username.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(users)
    }

    async fn create_todo(&self, todo: NewTodo) -> ApiResult<Todo> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&todo.user_id) {
            return Err(ApiError::NotFound("User not found"));
        }

        let now = Utc::now();
        let stored = StoredTodo {
            id: Uuid::new_v4(),
            user_id: todo.user_id,
            title: todo.title,
            description: todo.description,
            completed: false,
            due_date: todo.due_date,
            created_at: now,
            updated_at: now,
        };
        let joined = tables.joined(&stored);
        tables.todos.insert(stored.id, stored);
        Ok(joined)
    }

    async fn update_todo(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: TodoChanges,
    ) -> ApiResult<Option<Todo>> {
        let mut tables = self.tables.lock().await;
        let Some(todo) = tables
            .todos
            .get_mut(&id)
            .filter(|t| t.user_id == owner_id)
        else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            todo.title = title;
        }
        if let Some(description) = changes.description {
            todo.description = description;
        }
        if let Some(completed) = changes.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = changes.due_date {
            todo.due_date = due_date;
        }
        todo.updated_at = Utc::now();

        let todo = todo.clone();
        Ok(Some(tables.joined(&todo)))
    }

    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> ApiResult<bool> {
        let mut tables = self.tables.lock().await;
        let owned = tables.todos.get(&id).is_some_and(|t| t.user_id == owner_id);
        if owned {
            tables.todos.remove(&id);
        }
        Ok(owned)
    }

    async fn list_visible_todos(
        &self,
        viewer_id: Uuid,
        page: Option<PageRequest>,
    ) -> ApiResult<VisibleTodos> {
        let tables = self.tables.lock().await;
        let mut visible: BTreeSet<Uuid> = tables.friend_ids(viewer_id).collect();
        visible.insert(viewer_id);

        let mut todos: Vec<Todo> = tables
            .todos
            .values()
            .filter(|t| visible.contains(&t.user_id))
            .map(|t| tables.joined(t))
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total_count = todos.len() as i64;
        if let Some(page) = page {
            let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
            todos = todos
                .into_iter()
                .skip(offset)
                .take(page.limit as usize)
                .collect();
        }
        Ok(VisibleTodos { todos, total_count })
    }

    async fn add_friend(&self, pair: FriendPair) -> ApiResult<bool> {
        let mut tables = self.tables.lock().await;
        if ![pair.low(), pair.high()].iter().all(|id| tables.users.contains_key(id)) {
            return Err(ApiError::NotFound("User not found"));
        }
        Ok(tables.friendships.insert(pair))
    }

    async fn remove_friend(&self, pair: FriendPair) -> ApiResult<()> {
        self.tables.lock().await.friendships.remove(&pair);
        Ok(())
    }

    async fn list_friends(&self, user_id: Uuid) -> ApiResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut friends: Vec<User> = tables
            .friend_ids(user_id)
            .filter_map(|id| tables.users.get(&id).cloned())
            .collect();
        friends.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(friends)
    }
}
