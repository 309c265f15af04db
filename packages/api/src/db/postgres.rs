//! PostgreSQL implementation of [`Datastore`].
//!
//! Every write is a single statement, so there is no partial state to roll back:
//! todo inserts and updates return the joined row through a CTE, and a friendship is
//! one `friendships` row keyed by its [`FriendPair`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    Datastore, NewTodo, NewUser, PageRequest, TodoChanges, VisibleTodos, EMAIL_TAKEN,
    USERNAME_TAKEN,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{FriendPair, Todo, User};

/// Ids of `$1`'s friends, whichever side of the pair they were stored on.
const FRIEND_IDS: &str = "SELECT CASE WHEN f.user_low = $1 THEN f.user_high ELSE f.user_low END \
     FROM friendships f WHERE f.user_low = $1 OR f.user_high = $1";

#[derive(Debug, Clone)]
pub struct PgDatastore {
    pool: PgPool,
}

impl PgDatastore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Turn a unique-constraint violation on `users` into a 409.
fn user_conflict(err: sqlx::Error) -> ApiError {
    let constraint = err
        .as_database_error()
        .filter(|e| e.is_unique_violation())
        .and_then(|e| e.constraint().map(str::to_string));

    match constraint.as_deref() {
        Some("users_username_key") => ApiError::conflict(USERNAME_TAKEN),
        Some("users_email_key") => ApiError::conflict(EMAIL_TAKEN),
        _ => ApiError::Database(err),
    }
}

/// A write naming a user that no longer exists (a stale session) trips the
/// `user_id` / `user_low` / `user_high` foreign keys.
fn missing_user(err: sqlx::Error) -> ApiError {
    if is_foreign_key_violation(&err) {
        ApiError::NotFound("User not found")
    } else {
        ApiError::Database(err)
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in `term` escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl Datastore for PgDatastore {
    async fn create_user(&self, user: NewUser) -> ApiResult<User> {
        sqlx::query_as(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(user_conflict)
    }

    async fn find_user_by_id(&self, id: Uuid) -> ApiResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn search_users(
        &self,
        viewer_id: Uuid,
        term: Option<&str>,
        limit: i64,
    ) -> ApiResult<Vec<User>> {
        Ok(sqlx::query_as(
            "SELECT * FROM users WHERE id <> $1 AND ($2::text IS NULL OR username ILIKE $2) \
             ORDER BY username LIMIT $3",
        )
        .bind(viewer_id)
        .bind(term.map(contains_pattern))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_todo(&self, todo: NewTodo) -> ApiResult<Todo> {
        Ok(sqlx::query_as(
            "WITH inserted AS ( \
                 INSERT INTO todos (id, user_id, title, description, due_date) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING * \
             ) \
             SELECT inserted.*, u.username AS owner_username \
             FROM inserted JOIN users u ON u.id = inserted.user_id",
        )
        .bind(Uuid::new_v4())
        .bind(todo.user_id)
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(missing_user)?)
    }

    async fn update_todo(
        &self,
        id: Uuid,
        owner_id: Uuid,
        changes: TodoChanges,
    ) -> ApiResult<Option<Todo>> {
        Ok(sqlx::query_as(
            "WITH updated AS ( \
                 UPDATE todos SET \
                     title = COALESCE($3, title), \
                     description = CASE WHEN $4 THEN $5 ELSE description END, \
                     completed = COALESCE($6, completed), \
                     due_date = CASE WHEN $7 THEN $8 ELSE due_date END, \
                     updated_at = NOW() \
                 WHERE id = $1 AND user_id = $2 \
                 RETURNING * \
             ) \
             SELECT updated.*, u.username AS owner_username \
             FROM updated JOIN users u ON u.id = updated.user_id",
        )
        .bind(id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.completed)
        .bind(changes.due_date.is_some())
        .bind(changes.due_date.flatten())
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_todo(&self, id: Uuid, owner_id: Uuid) -> ApiResult<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_visible_todos(
        &self,
        viewer_id: Uuid,
        page: Option<PageRequest>,
    ) -> ApiResult<VisibleTodos> {
        let todos: Vec<Todo> = sqlx::query_as(&format!(
            "SELECT t.*, u.username AS owner_username \
             FROM todos t JOIN users u ON u.id = t.user_id \
             WHERE t.user_id = $1 OR t.user_id IN ({FRIEND_IDS}) \
             ORDER BY t.created_at DESC, t.id \
             LIMIT $2 OFFSET $3"
        ))
        .bind(viewer_id)
        .bind(page.map(|p| i64::from(p.limit)))
        .bind(page.map(|p| p.offset()).unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;

        let total_count = match page {
            None => todos.len() as i64,
            Some(_) => {
                sqlx::query_scalar(&format!(
                    "SELECT COUNT(*) FROM todos t \
                     WHERE t.user_id = $1 OR t.user_id IN ({FRIEND_IDS})"
                ))
                .bind(viewer_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        Ok(VisibleTodos { todos, total_count })
    }

    async fn add_friend(&self, pair: FriendPair) -> ApiResult<bool> {
        let result = sqlx::query(
            "INSERT INTO friendships (user_low, user_high) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(pair.low())
        .bind(pair.high())
        .execute(&self.pool)
        .await
        .map_err(missing_user)?;
        Ok(result.rows_affected() == 1)
    }

    async fn remove_friend(&self, pair: FriendPair) -> ApiResult<()> {
        sqlx::query("DELETE FROM friendships WHERE user_low = $1 AND user_high = $2")
            .bind(pair.low())
            .bind(pair.high())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_friends(&self, user_id: Uuid) -> ApiResult<Vec<User>> {
        Ok(sqlx::query_as(&format!(
            "SELECT * FROM users WHERE id IN ({FRIEND_IDS}) ORDER BY username"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("luna"), "%luna%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[derive(Debug)]
    struct ViolatedConstraint(ErrorKind);

    impl std::fmt::Display for ViolatedConstraint {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    impl std::error::Error for ViolatedConstraint {}

    impl DatabaseError for ViolatedConstraint {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn violation(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ViolatedConstraint(kind)))
    }

    #[test]
    fn test_foreign_key_violation_is_missing_user() {
        let err = missing_user(violation(ErrorKind::ForeignKeyViolation));
        assert!(matches!(err, ApiError::NotFound("User not found")));

        let err = missing_user(violation(ErrorKind::UniqueViolation));
        assert!(matches!(err, ApiError::Database(_)));
    }

    #[test]
    fn test_missing_user_passes_other_errors_through() {
        let err = missing_user(sqlx::Error::RowNotFound);
        assert!(matches!(err, ApiError::Database(sqlx::Error::RowNotFound)));
        assert!(!is_foreign_key_violation(&sqlx::Error::PoolTimedOut));
    }
}
