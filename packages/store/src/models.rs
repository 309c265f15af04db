//! # Shared models for todos, users and preferences
//!
//! These are the JSON shapes exchanged between the API server and its clients. They
//! are plain `Serialize + Deserialize` structs with camelCase field names, so the same
//! types are used to render responses on the server and to decode them on the client.
//!
//! | Struct | Represents |
//! |--------|-----------|
//! | [`TodoInfo`] | A todo as returned by the API, with its owner's id and username. |
//! | [`UserInfo`] | The signed-in user (never carries the password hash). |
//! | [`UserSummary`] | `id` + `username`, used for todo owners, friends and the user directory. |
//! | [`NewTodo`] | Request body for creating a todo. |
//! | [`TodoPatch`] | Partial update: omitted fields are untouched, `null` clears nullable ones. |
//! | [`TodoPage`] | One page of visible todos plus the totals needed for pagination. |
//! | [`Preferences`] / [`PreferencesUpdate`] | The two display flags and a partial write of them. |

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Id and username of a user, as shown next to a todo or in a friend list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

/// The authenticated user's public profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl UserInfo {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

/// A todo together with its owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInfo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    /// Serialized as `YYYY-MM-DD`.
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
}

impl TodoInfo {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user.id == user_id
    }
}

/// Body of `POST /todos`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw user input; validated by the server with [`parse_due_date`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl NewTodo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }
}

/// Body of `PATCH /todos/:id`.
///
/// The nullable fields are `Option<Option<_>>`: `None` means the key was absent,
/// `Some(None)` means it was sent as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.due_date.is_none()
    }

    /// Apply the patch locally, the way the server will.
    ///
    /// A due date that does not parse is left untouched here; the server rejects it.
    pub fn apply_to(&self, todo: &mut TodoInfo) {
        if let Some(title) = &self.title {
            todo.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            todo.description = description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = &self.due_date {
            match due_date.as_deref().map(str::trim) {
                None | Some("") => todo.due_date = None,
                Some(raw) => {
                    if let Some(parsed) = parse_due_date(raw) {
                        todo.due_date = Some(parsed);
                    }
                }
            }
        }
    }
}

/// One page of `GET /todos?page=&limit=`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPage {
    pub todos: Vec<TodoInfo>,
    pub total_count: i64,
    pub current_page: u32,
    pub total_pages: u32,
}

/// Per-user display flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub sort_by_due_date: bool,
    #[serde(rename = "hideCompletedUser")]
    pub hide_completed: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sort_by_due_date: true,
            hide_completed: false,
        }
    }
}

impl Preferences {
    /// Overwrite only the flags present in `update`.
    pub fn merged(self, update: &PreferencesUpdate) -> Self {
        Self {
            sort_by_due_date: update.sort_by_due_date.unwrap_or(self.sort_by_due_date),
            hide_completed: update.hide_completed.unwrap_or(self.hide_completed),
        }
    }
}

/// Body of `POST /preferences`. Values that are not booleans are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub sort_by_due_date: Option<bool>,
    #[serde(
        rename = "hideCompletedUser",
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub hide_completed: Option<bool>,
}

/// Parse a due date given either as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientBool {
    Bool(bool),
    Other(serde::de::IgnoredAny),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LenientBool::deserialize(deserializer)? {
        LenientBool::Bool(value) => Some(value),
        LenientBool::Other(_) => None,
    })
}
