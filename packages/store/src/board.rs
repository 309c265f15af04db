//! # Todo board — client state with optimistic mutations
//!
//! [`TodoBoard`] is everything a client needs to render the todo page: the viewer, the
//! cached visible todos, the cached friend list, the display preferences and the
//! selected [`Panel`]. It talks to the server only through the [`TodoBackend`] trait,
//! so the same logic runs against the HTTP client or an in-process fake.
//!
//! ## Mutations
//!
//! Every mutating call goes through an [`OptimisticCache`]: the change is applied
//! locally first, then sent to the backend. A successful response replaces the local
//! guess with the server's data; any failure restores the snapshot and stores the
//! backend's message in [`TodoBoard::error`].
//!
//! | Method | Optimistic | On success |
//! |--------|-----------|------------|
//! | [`add_todo`](TodoBoard::add_todo) | placeholder inserted at the top | placeholder replaced by the created todo |
//! | [`toggle_todo`](TodoBoard::toggle_todo) / [`edit_todo`](TodoBoard::edit_todo) | patch applied in place | todo replaced by the server copy |
//! | [`delete_todo`](TodoBoard::delete_todo) | todo removed | nothing further |
//! | [`remove_friend`](TodoBoard::remove_friend) | friend and their todos removed | nothing further |
//! | preference setters | flag flipped | nothing further |
//! | [`add_friend`](TodoBoard::add_friend) | no (the server knows the friend's id) | todos and friends reloaded |
//!
//! Reads go through [`refresh`](TodoBoard::refresh), which skips the network while
//! all caches are within their TTL, and [`reload`](TodoBoard::reload), which always fetches.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;

use crate::cache::OptimisticCache;
use crate::models::{
    parse_due_date, NewTodo, Preferences, PreferencesUpdate, TodoInfo, TodoPatch, UserSummary,
};
use crate::visibility::{BoardView, Panel, TaskViews};

/// A failed backend call. `message` is what the user gets to see.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// HTTP status, when the failure came from the server rather than the transport.
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// Async interface to the todo API.
pub trait TodoBackend {
    fn list_todos(&self) -> impl Future<Output = Result<Vec<TodoInfo>, BackendError>>;
    fn create_todo(
        &self,
        todo: &NewTodo,
    ) -> impl Future<Output = Result<TodoInfo, BackendError>>;
    fn update_todo(
        &self,
        id: &str,
        patch: &TodoPatch,
    ) -> impl Future<Output = Result<TodoInfo, BackendError>>;
    fn delete_todo(&self, id: &str) -> impl Future<Output = Result<(), BackendError>>;
    fn list_friends(&self) -> impl Future<Output = Result<Vec<UserSummary>, BackendError>>;
    fn add_friend(&self, username: &str) -> impl Future<Output = Result<(), BackendError>>;
    fn remove_friend(&self, friend_id: &str) -> impl Future<Output = Result<(), BackendError>>;
    fn get_preferences(&self) -> impl Future<Output = Result<Preferences, BackendError>>;
    fn save_preferences(
        &self,
        update: &PreferencesUpdate,
    ) -> impl Future<Output = Result<(), BackendError>>;
}

const PENDING_PREFIX: &str = "pending-";

pub struct TodoBoard<B: TodoBackend> {
    backend: B,
    viewer: UserSummary,
    todos: OptimisticCache<Vec<TodoInfo>>,
    friends: OptimisticCache<Vec<UserSummary>>,
    preferences: OptimisticCache<Preferences>,
    panel: Panel,
    error: Option<String>,
    next_pending: u64,
}

impl<B: TodoBackend> TodoBoard<B> {
    pub fn new(backend: B, viewer: UserSummary, ttl: Duration) -> Self {
        Self {
            backend,
            viewer,
            todos: OptimisticCache::new(Vec::new(), ttl),
            friends: OptimisticCache::new(Vec::new(), ttl),
            preferences: OptimisticCache::new(Preferences::default(), ttl),
            panel: Panel::default(),
            error: None,
            next_pending: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn viewer(&self) -> &UserSummary {
        &self.viewer
    }

    pub fn todos(&self) -> &[TodoInfo] {
        self.todos.get()
    }

    pub fn friends(&self) -> &[UserSummary] {
        self.friends.get()
    }

    pub fn preferences(&self) -> Preferences {
        *self.preferences.get()
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    /// The message of the last failed operation, if the most recent one failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn views(&self) -> TaskViews {
        TaskViews::build(self.todos.get(), &self.viewer.id, self.preferences())
    }

    pub fn board(&self) -> BoardView {
        self.views().into_board(self.panel, self.preferences())
    }

    fn record<T>(&mut self, result: Result<T, BackendError>) -> Result<T, BackendError> {
        if let Err(err) = &result {
            self.error = Some(err.message.clone());
        }
        result
    }

    /// Fetch from the backend unless every cache is still fresh.
    pub async fn refresh(&mut self) -> Result<(), BackendError> {
        if self.todos.is_fresh() && self.friends.is_fresh() && self.preferences.is_fresh() {
            return Ok(());
        }
        self.reload().await
    }

    pub async fn reload(&mut self) -> Result<(), BackendError> {
        self.error = None;
        let result = self.fetch_all().await;
        self.record(result)
    }

    async fn fetch_all(&mut self) -> Result<(), BackendError> {
        let todos = self.backend.list_todos().await?;
        let friends = self.backend.list_friends().await?;
        let preferences = self.backend.get_preferences().await?;
        self.todos.replace(todos);
        self.friends.replace(friends);
        self.preferences.replace(preferences);
        Ok(())
    }

    pub async fn add_todo(&mut self, draft: NewTodo) -> Result<TodoInfo, BackendError> {
        self.error = None;
        let title = draft.title.trim();
        if title.is_empty() {
            return self.record(Err(BackendError::new("Title is required")));
        }

        let pending_id = format!("{PENDING_PREFIX}{}", self.next_pending);
        self.next_pending += 1;
        let now = Utc::now();
        let placeholder = TodoInfo {
            id: pending_id.clone(),
            title: title.to_string(),
            description: draft
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            completed: false,
            due_date: draft.due_date.as_deref().and_then(parse_due_date),
            created_at: now,
            updated_at: now,
            user: self.viewer.clone(),
        };

        let snapshot = self.todos.apply(|todos| todos.insert(0, placeholder));
        match self.backend.create_todo(&draft).await {
            Ok(created) => {
                let confirmed = created.clone();
                self.todos.confirm(snapshot, |todos| {
                    if let Some(slot) = todos.iter_mut().find(|t| t.id == pending_id) {
                        *slot = confirmed;
                    }
                });
                Ok(created)
            }
            Err(err) => {
                self.todos.rollback(snapshot);
                self.record(Err(err))
            }
        }
    }

    fn own_todo(&self, id: &str) -> Option<&TodoInfo> {
        self.todos
            .get()
            .iter()
            .find(|t| t.id == id && t.is_owned_by(&self.viewer.id))
    }

    pub async fn toggle_todo(&mut self, id: &str) -> Result<TodoInfo, BackendError> {
        let Some(todo) = self.own_todo(id) else {
            return self.record(Err(BackendError::new("Todo not found")));
        };
        let patch = TodoPatch::completed(!todo.completed);
        self.edit_todo(id, patch).await
    }

    pub async fn edit_todo(
        &mut self,
        id: &str,
        patch: TodoPatch,
    ) -> Result<TodoInfo, BackendError> {
        self.error = None;
        if self.own_todo(id).is_none() {
            return self.record(Err(BackendError::new("Todo not found")));
        }
        if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
            return self.record(Err(BackendError::new("Title cannot be empty")));
        }

        let snapshot = self.todos.apply(|todos| {
            if let Some(todo) = todos.iter_mut().find(|t| t.id == id) {
                patch.apply_to(todo);
            }
        });
        match self.backend.update_todo(id, &patch).await {
            Ok(updated) => {
                let confirmed = updated.clone();
                self.todos.confirm(snapshot, |todos| {
                    if let Some(slot) = todos.iter_mut().find(|t| t.id == id) {
                        *slot = confirmed;
                    }
                });
                Ok(updated)
            }
            Err(err) => {
                self.todos.rollback(snapshot);
                self.record(Err(err))
            }
        }
    }

    pub async fn delete_todo(&mut self, id: &str) -> Result<(), BackendError> {
        self.error = None;
        if self.own_todo(id).is_none() {
            return self.record(Err(BackendError::new("Todo not found")));
        }

        let snapshot = self.todos.apply(|todos| todos.retain(|t| t.id != id));
        match self.backend.delete_todo(id).await {
            Ok(()) => {
                self.todos.confirm(snapshot, |_| {});
                Ok(())
            }
            Err(err) => {
                self.todos.rollback(snapshot);
                self.record(Err(err))
            }
        }
    }

    pub async fn add_friend(&mut self, username: &str) -> Result<(), BackendError> {
        self.error = None;
        let username = username.trim();
        if username.is_empty() {
            return self.record(Err(BackendError::new("Username is required")));
        }

        let result = self.backend.add_friend(username).await;
        self.record(result)?;
        self.todos.invalidate();
        self.friends.invalidate();
        self.reload().await
    }

    pub async fn remove_friend(&mut self, friend_id: &str) -> Result<(), BackendError> {
        self.error = None;
        let friends = self.friends.apply(|friends| friends.retain(|f| f.id != friend_id));
        let todos = self.todos.apply(|todos| todos.retain(|t| !t.is_owned_by(friend_id)));

        match self.backend.remove_friend(friend_id).await {
            Ok(()) => {
                self.friends.confirm(friends, |_| {});
                self.todos.confirm(todos, |_| {});
                Ok(())
            }
            Err(err) => {
                self.friends.rollback(friends);
                self.todos.rollback(todos);
                self.record(Err(err))
            }
        }
    }

    pub async fn set_sort_by_due_date(&mut self, value: bool) -> Result<(), BackendError> {
        self.update_preferences(PreferencesUpdate {
            sort_by_due_date: Some(value),
            hide_completed: None,
        })
        .await
    }

    pub async fn set_hide_completed(&mut self, value: bool) -> Result<(), BackendError> {
        self.update_preferences(PreferencesUpdate {
            sort_by_due_date: None,
            hide_completed: Some(value),
        })
        .await
    }

    async fn update_preferences(&mut self, update: PreferencesUpdate) -> Result<(), BackendError> {
        self.error = None;
        let snapshot = self
            .preferences
            .apply(|preferences| *preferences = preferences.merged(&update));

        match self.backend.save_preferences(&update).await {
            Ok(()) => {
                self.preferences.confirm(snapshot, |_| {});
                Ok(())
            }
            Err(err) => {
                self.preferences.rollback(snapshot);
                self.record(Err(err))
            }
        }
    }

    /// Switch the secondary panel.
    ///
    /// Showing Finished Tasks hides completed todos from My Tasks, and going back to
    /// Friends' Tasks shows them again.
    /// If saving the preference fails, the previous panel stays selected.
    pub async fn select_panel(&mut self, panel: Panel) -> Result<(), BackendError> {
        let hide_completed = panel == Panel::Finished;
        if self.preferences().hide_completed != hide_completed {
            self.set_hide_completed(hide_completed).await?;
        }
        self.panel = panel;
        Ok(())
    }
}
