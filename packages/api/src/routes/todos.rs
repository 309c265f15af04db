//! Todo CRUD plus the server-rendered board.
//!
//! Writes are ownership-scoped: a todo that exists but belongs to someone else is
//! reported exactly like one that does not exist.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use store::{parse_due_date, BoardView, NewTodo, Panel, TaskViews, TodoInfo, TodoPage, TodoPatch};
use uuid::Uuid;

use super::{read_preferences, AppState, Message};
use crate::auth::Viewer;
use crate::db::{self, PageRequest, TodoChanges};
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};

const TODO_NOT_FOUND: &str = "Todo not found";

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A bare array unless the caller asked for a page.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TodoListing {
    All(Vec<TodoInfo>),
    Page(TodoPage),
}

#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    #[serde(default)]
    pub panel: Panel,
}

fn todo_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(TODO_NOT_FOUND))
}

/// Blank input means "no date"; anything else must parse.
fn due_date(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_due_date(raw)
            .map(Some)
            .ok_or(ApiError::InvalidDueDate),
    }
}

fn description(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn page_request(query: &ListQuery, state: &AppState) -> ApiResult<Option<PageRequest>> {
    if query.page.is_none() && query.limit.is_none() {
        return Ok(None);
    }

    let limits = &state.settings.todos;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(limits.default_page_size);
    if page == 0 {
        return Err(ApiError::validation("page must be at least 1"));
    }
    if limit == 0 || limit > limits.max_page_size {
        return Err(ApiError::validation(format!(
            "limit must be between 1 and {}",
            limits.max_page_size
        )));
    }
    Ok(Some(PageRequest { page, limit }))
}

async fn visible_todos(
    state: &AppState,
    viewer: &Viewer,
    page: Option<PageRequest>,
) -> ApiResult<db::VisibleTodos> {
    if state.db.find_user_by_id(viewer.id).await?.is_none() {
        return Err(ApiError::NotFound("User not found"));
    }
    state.db.list_visible_todos(viewer.id, page).await
}

pub async fn list(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<TodoListing>> {
    let page = page_request(&query, &state)?;
    let visible = visible_todos(&state, &viewer, page).await?;
    let todos = visible.todos.iter().map(|t| t.to_info()).collect();

    Ok(Json(match page {
        None => TodoListing::All(todos),
        Some(page) => TodoListing::Page(TodoPage {
            todos,
            total_count: visible.total_count,
            current_page: page.page,
            total_pages: page.total_pages(visible.total_count),
        }),
    }))
}

pub async fn create(
    State(state): State<AppState>,
    viewer: Viewer,
    ApiJson(body): ApiJson<NewTodo>,
) -> ApiResult<(StatusCode, Json<TodoInfo>)> {
    let title = body.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let todo = state
        .db
        .create_todo(db::NewTodo {
            user_id: viewer.id,
            title: title.to_string(),
            description: description(body.description.as_deref()),
            due_date: due_date(body.due_date.as_deref())?,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(todo.to_info())))
}

pub async fn update(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TodoPatch>,
) -> ApiResult<Json<TodoInfo>> {
    let id = todo_id(&id)?;

    let title = match patch.title.as_deref().map(str::trim) {
        Some("") => return Err(ApiError::validation("Title cannot be empty")),
        title => title.map(str::to_string),
    };
    let changes = TodoChanges {
        title,
        description: patch.description.as_ref().map(|d| description(d.as_deref())),
        completed: patch.completed,
        due_date: patch
            .due_date
            .as_ref()
            .map(|d| due_date(d.as_deref()))
            .transpose()?,
    };

    state
        .db
        .update_todo(id, viewer.id, changes)
        .await?
        .map(|todo| Json(todo.to_info()))
        .ok_or(ApiError::NotFound(TODO_NOT_FOUND))
}

pub async fn remove(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<String>,
) -> ApiResult<Json<Message>> {
    let id = todo_id(&id)?;
    if !state.db.delete_todo(id, viewer.id).await? {
        return Err(ApiError::NotFound(TODO_NOT_FOUND));
    }
    Ok(Message::new("Todo deleted"))
}

/// My Tasks plus the selected panel, shaped by the preference cookies.
pub async fn board(
    State(state): State<AppState>,
    viewer: Viewer,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<BoardQuery>,
) -> ApiResult<Json<BoardView>> {
    let preferences = read_preferences(&headers);
    let visible = visible_todos(&state, &viewer, None).await?;
    let todos: Vec<TodoInfo> = visible.todos.iter().map(|t| t.to_info()).collect();

    let views = TaskViews::build(&todos, &viewer.id.to_string(), preferences);
    Ok(Json(views.into_board(query.panel, preferences)))
}
