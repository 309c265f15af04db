//! In-process test harness for the API router.

use std::collections::BTreeMap;

use api::{db::MemoryDatastore, router, AppState, Settings};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// One browser: a router plus the cookies it has been given.
pub struct TestClient {
    app: Router,
    cookies: BTreeMap<String, String>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl TestClient {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let state = AppState::new(MemoryDatastore::new(), settings);
        Self::for_router(router(state, MemoryStore::default()))
    }

    /// A second client sharing the same server, with an empty cookie jar.
    pub fn for_router(app: Router) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
        }
    }

    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub async fn request(
        &mut self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if !self.cookies.is_empty() {
            let jar = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, jar);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        for cookie in &set_cookies {
            self.store_cookie(cookie);
        }

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        if set_cookie.contains("Max-Age=0") || value.is_empty() {
            self.cookies.remove(name.trim());
        } else {
            self.cookies
                .insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Sign up and sign in as `username`, returning the new user's JSON.
    pub async fn register(&mut self, username: &str) -> Value {
        let signed_up = self
            .post(
                "/auth/signup",
                json!({
                    "username": username,
                    "email": format!("{username}@meow.test"),
                    "password": "hunter22",
                }),
            )
            .await;
        assert_eq!(signed_up.status, StatusCode::CREATED, "{:?}", signed_up.body);

        let signed_in = self
            .post(
                "/auth/signin",
                json!({ "identifier": username, "password": "hunter22" }),
            )
            .await;
        assert_eq!(signed_in.status, StatusCode::OK, "{:?}", signed_in.body);
        signed_up.body
    }

    pub async fn create_todo(&mut self, body: Value) -> Value {
        let created = self.post("/todos", body).await;
        assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
        created.body
    }
}

pub fn titles(todos: &Value) -> Vec<String> {
    todos
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}
