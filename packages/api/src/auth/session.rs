//! Session gate.
//!
//! A signed-in session stores the user's id under [`SESSION_USER_ID_KEY`]. Handlers
//! that need an authenticated caller take a [`Viewer`] argument; extraction fails
//! with 401 when the session has no (valid) user id.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Key for storing user ID in session.
pub const SESSION_USER_ID_KEY: &str = "user_id";

/// The authenticated user making the request.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub id: Uuid,
    pub session: Session,
}

impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| ApiError::Internal(message.to_string()))?;

        let user_id: Option<String> = session.get(SESSION_USER_ID_KEY).await?;
        let id = user_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(ApiError::Unauthorized)?;

        Ok(Self { id, session })
    }
}

/// Bind `user_id` to the session, issuing a fresh session id first.
pub async fn establish_session(session: &Session, user_id: Uuid) -> ApiResult<()> {
    session.cycle_id().await?;
    session
        .insert(SESSION_USER_ID_KEY, user_id.to_string())
        .await?;
    Ok(())
}
