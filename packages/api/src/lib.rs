//! # API crate — the LunaTODO HTTP JSON server
//!
//! Everything the server does lives here; the `web` binary only wires it to a socket.
//! [`router`] returns the complete axum router given an [`AppState`] and a session store.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | Argon2id password hashing, the session key and the [`Viewer`](auth::Viewer) extractor |
//! | [`db`] | The [`Datastore`](db::Datastore) trait with PostgreSQL and in-memory implementations |
//! | [`error`] | [`ApiError`] and its `{"error": ...}` response mapping |
//! | [`extract`] | `Json` / `Query` extractors that reject with [`ApiError`] |
//! | [`models`] | Database rows (`User`, `Todo`) and the canonical [`FriendPair`](models::FriendPair) |
//! | [`routes`] | Handlers and the router |
//! | [`settings`] | Layered server configuration (`lunatodo.toml`, `LUNATODO__*`) |
//!
//! ## Endpoints
//!
//! - **Auth**: `POST /auth/signup`, `POST /auth/signin`, `POST /auth/signout`, `GET /auth/me`
//! - **Todos**: `GET|POST /todos`, `PATCH|DELETE /todos/{id}`, `GET /todos/board`
//! - **Friends**: `GET|POST|DELETE /friends`, `GET /users`
//! - **Preferences**: `GET|POST /preferences`

pub mod auth;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod routes;
pub mod settings;

pub use error::{ApiError, ApiResult};
pub use routes::{router, AppState};
pub use settings::Settings;
