//! HTTP routes and the state they share.

mod auth;
mod friends;
mod preferences;
mod todos;
mod users;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};

use crate::db::Datastore;
use crate::settings::Settings;

pub use preferences::{preference_cookies, read_preferences};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Datastore>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: impl Datastore + 'static, settings: Settings) -> Self {
        Self {
            db: Arc::new(db),
            settings: Arc::new(settings),
        }
    }
}

/// `{"message": "..."}` confirmation body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> axum::Json<Self> {
        axum::Json(Self { message })
    }
}

/// Build the full API router, with sessions kept in `session_store`.
pub fn router<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session = &state.settings.session;
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(session.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(
            session.inactivity_days,
        )));

    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/me", get(auth::current_user))
        .route("/todos", get(todos::list).post(todos::create))
        .route("/todos/board", get(todos::board))
        .route("/todos/{id}", patch(todos::update).delete(todos::remove))
        .route(
            "/friends",
            get(friends::list).post(friends::add).delete(friends::remove),
        )
        .route("/users", get(users::search))
        .route(
            "/preferences",
            get(preferences::get_preferences).post(preferences::save_preferences),
        )
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
