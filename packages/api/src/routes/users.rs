//! People search, for finding friends.

use axum::{extract::State, Json};
use serde::Deserialize;
use store::UserSummary;

use crate::auth::Viewer;
use crate::error::ApiResult;
use crate::extract::ApiQuery;

use super::AppState;

const SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let term = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let users = state.db.search_users(viewer.id, term, SEARCH_LIMIT).await?;
    Ok(Json(users.iter().map(|u| u.to_summary()).collect()))
}
