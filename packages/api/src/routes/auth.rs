//! Sign-up, sign-in, sign-out and the current user.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use store::UserInfo;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use super::{AppState, Message};
use crate::auth::{
    establish_session, hash_password_blocking, verify_password_blocking,
    verify_unknown_user_blocking, SESSION_USER_ID_KEY,
};
use crate::db::NewUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// The username.
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let username = body.username.trim();
    let email = body.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() || body.password.trim().is_empty() {
        return Err(ApiError::validation(
            "Username, email and password are required",
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::validation("Invalid email address"));
    }

    let password_hash = hash_password_blocking(body.password).await?;
    let user = state
        .db
        .create_user(NewUser {
            username: username.to_string(),
            email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "user created");
    Ok((StatusCode::CREATED, Json(user.to_info())))
}

pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<SignInRequest>,
) -> ApiResult<Json<UserInfo>> {
    let identifier = body.identifier.trim();
    if identifier.is_empty() || body.password.is_empty() {
        return Err(ApiError::validation("Username and password are required"));
    }

    let Some(user) = state.db.find_user_by_username(identifier).await? else {
        verify_unknown_user_blocking(body.password).await?;
        warn!("sign-in rejected");
        return Err(ApiError::InvalidCredentials);
    };
    if !verify_password_blocking(body.password, user.password_hash.clone()).await? {
        warn!("sign-in rejected");
        return Err(ApiError::InvalidCredentials);
    }

    establish_session(&session, user.id).await?;
    info!(user_id = %user.id, "signed in");
    Ok(Json(user.to_info()))
}

pub async fn sign_out(session: Session) -> ApiResult<Json<Message>> {
    session.flush().await?;
    Ok(Message::new("Signed out"))
}

/// `null` when nobody is signed in.
pub async fn current_user(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Option<UserInfo>>> {
    let user_id: Option<String> = session.get(SESSION_USER_ID_KEY).await?;
    let Some(user_id) = user_id.and_then(|id| Uuid::parse_str(&id).ok()) else {
        return Ok(Json(None));
    };

    let user = state.db.find_user_by_id(user_id).await?;
    Ok(Json(user.map(|u| u.to_info())))
}
