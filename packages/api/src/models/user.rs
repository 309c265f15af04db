//! # User row
//!
//! [`User`] is the complete `users` row, loaded with [`sqlx::FromRow`]. It carries the
//! Argon2 `password_hash`, so it never leaves the server: [`User::to_info`] and
//! [`User::to_summary`] project it into the shared [`UserInfo`] / [`UserSummary`] types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use store::{UserInfo, UserSummary};
use uuid::Uuid;

/// Full user record from the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Convert to UserInfo for client consumption.
    pub fn to_info(&self) -> UserInfo {
        UserInfo {
            id: self.id.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }

    pub fn to_summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.to_string(),
            username: self.username.clone(),
        }
    }
}
