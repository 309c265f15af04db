//! # LunaTODO HTTP client
//!
//! [`HttpBackend`] talks to the JSON API with `reqwest`, keeping the session cookie
//! (and the preference cookies) in its own cookie store. It implements
//! [`store::TodoBackend`], so a [`store::TodoBoard`] can run on top of it:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use client::{load_or_create_config, HttpBackend};
//! use store::{NewTodo, TodoBoard};
//!
//! let config = load_or_create_config(".")?;
//! let backend = HttpBackend::from_config(&config)?;
//! let me = backend.sign_in("luna", "hunter22").await?;
//!
//! let mut board = TodoBoard::new(backend, me.summary(), config.cache_ttl());
//! board.reload().await?;
//! board.add_todo(NewTodo::titled("Buy milk")).await?;
//! # Ok(())
//! # }
//! ```

mod config;

pub use config::{config_path, load_or_create_config, read_config};

use std::path::{Path, PathBuf};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{
    BackendError, BoardView, LunaTodoConfig, NewTodo, Panel, Preferences, PreferencesUpdate,
    TodoBackend, TodoInfo, TodoPage, TodoPatch, UserInfo, UserSummary,
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status; `message` is its `error` field.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to access {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid client config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to write client config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { status, message } => BackendError::with_status(status, message),
            other => BackendError::new(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct SignUp<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignIn<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &LunaTodoConfig) -> Result<Self, ClientError> {
        Self::new(config.server.url.clone())
    }

    /// A backend for the server named in the config file at `path`.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        Self::from_config(&read_config(path)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn checked(request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string(),
        };
        debug!(status = status.as_u16(), %message, "request rejected");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        Ok(Self::checked(request).await?.json().await?)
    }

    /// For endpoints whose success body is only a confirmation message.
    async fn send_unit(&self, request: RequestBuilder) -> Result<(), ClientError> {
        Self::checked(request).await?;
        Ok(())
    }

    pub async fn sign_up(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserInfo, ClientError> {
        let body = SignUp {
            username,
            email,
            password,
        };
        self.send(self.client.post(self.url("/auth/signup")).json(&body))
            .await
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<UserInfo, ClientError> {
        let body = SignIn {
            identifier: username,
            password,
        };
        self.send(self.client.post(self.url("/auth/signin")).json(&body))
            .await
    }

    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.send_unit(self.client.post(self.url("/auth/signout")))
            .await
    }

    pub async fn current_user(&self) -> Result<Option<UserInfo>, ClientError> {
        self.send(self.client.get(self.url("/auth/me"))).await
    }

    pub async fn search_users(&self, term: &str) -> Result<Vec<UserSummary>, ClientError> {
        self.send(
            self.client
                .get(self.url("/users"))
                .query(&[("search", term)]),
        )
        .await
    }

    pub async fn todo_page(&self, page: u32, limit: u32) -> Result<TodoPage, ClientError> {
        self.send(
            self.client
                .get(self.url("/todos"))
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }

    /// The server-side rendition of the board, using the stored preference cookies.
    pub async fn board(&self, panel: Panel) -> Result<BoardView, ClientError> {
        self.send(
            self.client
                .get(self.url("/todos/board"))
                .query(&[("panel", panel)]),
        )
        .await
    }
}

impl TodoBackend for HttpBackend {
    async fn list_todos(&self) -> Result<Vec<TodoInfo>, BackendError> {
        Ok(self.send(self.client.get(self.url("/todos"))).await?)
    }

    async fn create_todo(&self, todo: &NewTodo) -> Result<TodoInfo, BackendError> {
        Ok(self
            .send(self.client.post(self.url("/todos")).json(todo))
            .await?)
    }

    async fn update_todo(&self, id: &str, patch: &TodoPatch) -> Result<TodoInfo, BackendError> {
        Ok(self
            .send(self.client.patch(self.url(&format!("/todos/{id}"))).json(patch))
            .await?)
    }

    async fn delete_todo(&self, id: &str) -> Result<(), BackendError> {
        Ok(self
            .send_unit(self.client.delete(self.url(&format!("/todos/{id}"))))
            .await?)
    }

    async fn list_friends(&self) -> Result<Vec<UserSummary>, BackendError> {
        Ok(self.send(self.client.get(self.url("/friends"))).await?)
    }

    async fn add_friend(&self, username: &str) -> Result<(), BackendError> {
        Ok(self
            .send_unit(
                self.client
                    .post(self.url("/friends"))
                    .json(&json!({ "username": username })),
            )
            .await?)
    }

    async fn remove_friend(&self, friend_id: &str) -> Result<(), BackendError> {
        Ok(self
            .send_unit(
                self.client
                    .delete(self.url("/friends"))
                    .query(&[("friendId", friend_id)]),
            )
            .await?)
    }

    async fn get_preferences(&self) -> Result<Preferences, BackendError> {
        Ok(self.send(self.client.get(self.url("/preferences"))).await?)
    }

    async fn save_preferences(&self, update: &PreferencesUpdate) -> Result<(), BackendError> {
        Ok(self
            .send_unit(self.client.post(self.url("/preferences")).json(update))
            .await?)
    }
}
