//! The viewer's friend list.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use store::UserSummary;
use tracing::info;
use uuid::Uuid;

use crate::auth::Viewer;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::models::FriendPair;

use super::{AppState, Message};

const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Deserialize)]
pub struct AddFriendRequest {
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFriendQuery {
    pub friend_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FriendAdded {
    pub message: &'static str,
    pub friend: UserSummary,
}

pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let friends = state.db.list_friends(viewer.id).await?;
    Ok(Json(friends.iter().map(|f| f.to_summary()).collect()))
}

pub async fn add(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiJson(body): ApiJson<AddFriendRequest>,
) -> ApiResult<Json<FriendAdded>> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    let friend = state
        .db
        .find_user_by_username(username)
        .await?
        .ok_or(ApiError::NotFound(USER_NOT_FOUND))?;
    let pair = FriendPair::new(viewer.id, friend.id)
        .ok_or_else(|| ApiError::validation("You cannot add yourself as a friend"))?;

    if !state.db.add_friend(pair).await? {
        return Err(ApiError::conflict("Already friends"));
    }

    info!(user_id = %viewer.id, friend_id = %friend.id, "friend added");
    Ok(Json(FriendAdded {
        message: "Friend added",
        friend: friend.to_summary(),
    }))
}

/// Removing someone who is not a friend succeeds without changing anything.
pub async fn remove(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<RemoveFriendQuery>,
) -> ApiResult<Json<Message>> {
    let raw = query
        .friend_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("friendId is required"))?;
    let friend_id = Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(USER_NOT_FOUND))?;

    if state.db.find_user_by_id(viewer.id).await?.is_none()
        || state.db.find_user_by_id(friend_id).await?.is_none()
    {
        return Err(ApiError::NotFound(USER_NOT_FOUND));
    }

    if let Some(pair) = FriendPair::new(viewer.id, friend_id) {
        state.db.remove_friend(pair).await?;
        info!(user_id = %viewer.id, friend_id = %friend_id, "friend removed");
    }
    Ok(Message::new("Friend removed"))
}
