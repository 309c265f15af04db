//! # Preference cookies
//!
//! Display preferences live only in cookies, one per flag:
//!
//! | Cookie | Field | Default |
//! |--------|-------|---------|
//! | `preference_sortByDueDate` | `sortByDueDate` | `true` |
//! | `preference_hideCompletedUser` | `hideCompletedUser` | `false` |
//!
//! Values are the literals `true` / `false`; anything else reads as the default.
//! Both endpoints work with or without a session.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::AppendHeaders,
    Json,
};
use serde::Serialize;
use store::{Preferences, PreferencesUpdate};
use tower_sessions::cookie::{Cookie, SameSite};

use super::AppState;
use crate::extract::ApiJson;
use crate::settings::PreferenceSettings;

pub const SORT_BY_DUE_DATE_COOKIE: &str = "preference_sortByDueDate";
pub const HIDE_COMPLETED_COOKIE: &str = "preference_hideCompletedUser";

#[derive(Debug, Serialize)]
pub struct PreferencesSaved {
    pub message: &'static str,
    pub preferences: Preferences,
}

/// Preferences from the request's `Cookie` headers, defaults filling the gaps.
pub fn read_preferences(headers: &HeaderMap) -> Preferences {
    let mut update = PreferencesUpdate::default();
    let cookies = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok);

    for cookie in cookies {
        let flag = cookie.value().parse::<bool>().ok();
        match cookie.name() {
            SORT_BY_DUE_DATE_COOKIE => update.sort_by_due_date = flag,
            HIDE_COMPLETED_COOKIE => update.hide_completed = flag,
            _ => {}
        }
    }
    Preferences::default().merged(&update)
}

/// `Set-Cookie` values for the flags present in `update`.
pub fn preference_cookies(
    update: &PreferencesUpdate,
    settings: &PreferenceSettings,
) -> Vec<String> {
    [
        (SORT_BY_DUE_DATE_COOKIE, update.sort_by_due_date),
        (HIDE_COMPLETED_COOKIE, update.hide_completed),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        let mut cookie = Cookie::build((name, value?.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true);
        if settings.cookie_max_age_days > 0 {
            cookie = cookie.max_age(time::Duration::days(settings.cookie_max_age_days));
        }
        Some(cookie.build().to_string())
    })
    .collect()
}

pub async fn get_preferences(headers: HeaderMap) -> Json<Preferences> {
    Json(read_preferences(&headers))
}

pub async fn save_preferences(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(update): ApiJson<PreferencesUpdate>,
) -> (
    AppendHeaders<Vec<(header::HeaderName, String)>>,
    Json<PreferencesSaved>,
) {
    let preferences = read_preferences(&headers).merged(&update);
    let cookies = preference_cookies(&update, &state.settings.preferences)
        .into_iter()
        .map(|cookie| (header::SET_COOKIE, cookie))
        .collect();

    (
        AppendHeaders(cookies),
        Json(PreferencesSaved {
            message: "Preferences saved",
            preferences,
        }),
    )
}
