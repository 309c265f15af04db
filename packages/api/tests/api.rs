mod common;

use axum::http::{Method, StatusCode};
use common::{titles, TestClient};
use serde_json::json;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_requires_session() {
    let mut client = TestClient::new();
    for uri in ["/todos", "/friends", "/users", "/todos/board"] {
        let response = client.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body, json!({ "error": "Unauthorized" }));
    }

    let todo = "/todos/6f1c1a52-3d1b-4c57-9a53-0a3f4b7e2d10";
    let friend = "/friends?friendId=6f1c1a52-3d1b-4c57-9a53-0a3f4b7e2d10";
    let writes = [
        (Method::POST, "/todos", Some(json!({ "title": "sneaky" }))),
        (Method::PATCH, todo, Some(json!({ "completed": true }))),
        (Method::DELETE, todo, None),
        (Method::POST, "/friends", Some(json!({ "username": "luna" }))),
        (Method::DELETE, friend, None),
    ];
    for (method, uri, body) in writes {
        let label = format!("{method} {uri}");
        let response = client.request(method, uri, body).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{label}");
        assert_eq!(response.body, json!({ "error": "Unauthorized" }), "{label}");
    }
}

#[tokio::test]
async fn test_sign_up_validation_and_conflicts() {
    let mut client = TestClient::new();

    let missing = client
        .post("/auth/signup", json!({ "username": "luna", "password": "x" }))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let bad_email = client
        .post(
            "/auth/signup",
            json!({ "username": "luna", "email": "moon", "password": "x" }),
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);

    let created = client
        .post(
            "/auth/signup",
            json!({ "username": "luna", "email": "Luna@Meow.test", "password": "x" }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["username"], "luna");
    assert_eq!(created.body["email"], "luna@meow.test");
    assert!(created.body.get("password").is_none());
    assert!(created.body.get("passwordHash").is_none());
    assert!(created.body["createdAt"].is_string());

    let same_name = client
        .post(
            "/auth/signup",
            json!({ "username": "luna", "email": "other@meow.test", "password": "x" }),
        )
        .await;
    assert_eq!(same_name.status, StatusCode::CONFLICT);
    assert_eq!(same_name.body["error"], "Username already exists");

    let same_email = client
        .post(
            "/auth/signup",
            json!({ "username": "artemis", "email": "luna@meow.test", "password": "x" }),
        )
        .await;
    assert_eq!(same_email.status, StatusCode::CONFLICT);
    assert_eq!(same_email.body["error"], "Email already registered");
}

#[tokio::test]
async fn test_sign_in_does_not_reveal_which_part_was_wrong() {
    let mut client = TestClient::new();
    client.register("luna").await;

    let wrong_password = client
        .post(
            "/auth/signin",
            json!({ "identifier": "luna", "password": "nope" }),
        )
        .await;
    let no_such_user = client
        .post(
            "/auth/signin",
            json!({ "identifier": "nobody", "password": "hunter22" }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(no_such_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, no_such_user.body);
    assert_eq!(
        wrong_password.body,
        json!({ "error": "Invalid username or password" })
    );
}

async fn timed_sign_in(client: &mut TestClient, identifier: &str) -> Duration {
    let started = Instant::now();
    let response = client
        .post(
            "/auth/signin",
            json!({ "identifier": identifier, "password": "nope" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    started.elapsed()
}

#[tokio::test]
async fn test_unknown_user_sign_in_still_hashes() {
    let mut client = TestClient::new();
    client.register("luna").await;

    let wrong_password = timed_sign_in(&mut client, "luna").await;
    let no_such_user = timed_sign_in(&mut client, "nobody").await;
    assert!(
        no_such_user * 4 >= wrong_password,
        "unknown user took {no_such_user:?}, wrong password took {wrong_password:?}"
    );
}

#[tokio::test]
async fn test_current_user_follows_session() {
    let mut client = TestClient::new();
    assert_eq!(client.get("/auth/me").await.body, json!(null));

    let user = client.register("luna").await;
    let me = client.get("/auth/me").await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["id"], user["id"]);

    let signed_out = client.post("/auth/signout", json!({})).await;
    assert_eq!(signed_out.status, StatusCode::OK);
    assert_eq!(client.get("/auth/me").await.body, json!(null));
    assert_eq!(client.get("/todos").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_todo_lifecycle() {
    let mut client = TestClient::new();
    let user = client.register("luna").await;

    let empty = client.post("/todos", json!({ "title": "   " })).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.body["error"], "Title is required");

    let bad_date = client
        .post("/todos", json!({ "title": "X", "dueDate": "someday" }))
        .await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        bad_date.body["error"],
        "Invalid dueDate format. Please use a valid date string."
    );

    let todo = client
        .create_todo(json!({
            "title": " X ",
            "description": "scratch post",
            "dueDate": "2024-05-01T09:30:00Z",
        }))
        .await;
    assert_eq!(todo["title"], "X");
    assert_eq!(todo["completed"], false);
    assert_eq!(todo["dueDate"], "2024-05-01");
    assert_eq!(todo["user"]["id"], user["id"]);
    assert_eq!(todo["user"]["username"], "luna");
    let uri = format!("/todos/{}", todo["id"].as_str().unwrap());

    let done = client.patch(&uri, json!({ "completed": true })).await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.body["completed"], true);
    assert_eq!(done.body["description"], "scratch post");
    assert_eq!(done.body["dueDate"], "2024-05-01");

    let listed = client.get("/todos").await;
    assert_eq!(titles(&listed.body), ["X"]);
    assert_eq!(listed.body[0]["completed"], true);

    let cleared = client
        .patch(&uri, json!({ "dueDate": null, "description": "" }))
        .await;
    assert_eq!(cleared.body["dueDate"], json!(null));
    assert_eq!(cleared.body["description"], json!(null));
    assert_eq!(cleared.body["completed"], true);

    let blank_title = client.patch(&uri, json!({ "title": "" })).await;
    assert_eq!(blank_title.status, StatusCode::BAD_REQUEST);
    let bad_date = client.patch(&uri, json!({ "dueDate": "13/45" })).await;
    assert_eq!(bad_date.status, StatusCode::BAD_REQUEST);

    assert_eq!(client.delete(&uri).await.status, StatusCode::OK);
    let again = client.delete(&uri).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    assert_eq!(again.body["error"], "Todo not found");
    assert_eq!(client.get("/todos").await.body, json!([]));
}

#[tokio::test]
async fn test_other_users_todos_are_not_found() {
    let mut luna = TestClient::new();
    luna.register("luna").await;
    let todo = luna.create_todo(json!({ "title": "mine" })).await;
    let uri = format!("/todos/{}", todo["id"].as_str().unwrap());

    let mut artemis = TestClient::for_router(luna.router());
    artemis.register("artemis").await;

    let patched = artemis.patch(&uri, json!({ "completed": true })).await;
    assert_eq!(patched.status, StatusCode::NOT_FOUND);
    let deleted = artemis.delete(&uri).await;
    assert_eq!(deleted.status, StatusCode::NOT_FOUND);
    assert_eq!(patched.body, deleted.body);

    let not_a_uuid = artemis.delete("/todos/42").await;
    assert_eq!(not_a_uuid.status, StatusCode::NOT_FOUND);

    let untouched = luna.get("/todos").await;
    assert_eq!(untouched.body[0]["completed"], false);
}

#[tokio::test]
async fn test_friend_sees_todos_until_deleted() {
    let mut a = TestClient::new();
    a.register("A").await;
    let milk = a
        .create_todo(json!({ "title": "Buy milk", "dueDate": "2024-05-01" }))
        .await;

    let mut b = TestClient::for_router(a.router());
    let b_user = b.register("B").await;
    let added = b.post("/friends", json!({ "username": "A" })).await;
    assert_eq!(added.status, StatusCode::OK);
    assert_eq!(added.body["friend"]["username"], "A");

    let board = b.get("/todos/board?panel=friends").await;
    assert_eq!(board.status, StatusCode::OK);
    assert_eq!(board.body["panel"], "friends");
    assert_eq!(titles(&board.body["panelTasks"]), ["Buy milk"]);
    assert_eq!(board.body["panelTasks"][0]["user"]["username"], "A");
    assert_eq!(board.body["myTasks"], json!([]));

    let a_friends = a.get("/friends").await;
    assert_eq!(a_friends.body, json!([{ "id": b_user["id"], "username": "B" }]));

    let uri = format!("/todos/{}", milk["id"].as_str().unwrap());
    assert_eq!(a.delete(&uri).await.status, StatusCode::OK);
    assert_eq!(b.get("/todos").await.body, json!([]));
}

#[tokio::test]
async fn test_friend_edge_cases() {
    let mut luna = TestClient::new();
    let luna_user = luna.register("luna").await;
    let mut artemis = TestClient::for_router(luna.router());
    let artemis_user = artemis.register("artemis").await;

    let missing = luna.post("/friends", json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let myself = luna.post("/friends", json!({ "username": "luna" })).await;
    assert_eq!(myself.status, StatusCode::BAD_REQUEST);

    let unknown = luna.post("/friends", json!({ "username": "diana" })).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.body["error"], "User not found");

    assert_eq!(
        luna.post("/friends", json!({ "username": "artemis" }))
            .await
            .status,
        StatusCode::OK
    );
    let twice = artemis.post("/friends", json!({ "username": "luna" })).await;
    assert_eq!(twice.status, StatusCode::CONFLICT);
    assert_eq!(twice.body["error"], "Already friends");

    let seen_by_artemis = artemis.get("/friends").await;
    assert_eq!(seen_by_artemis.body[0]["id"], luna_user["id"]);

    let no_param = luna.delete("/friends").await;
    assert_eq!(no_param.status, StatusCode::BAD_REQUEST);

    let uri = format!("/friends?friendId={}", artemis_user["id"].as_str().unwrap());
    assert_eq!(luna.delete(&uri).await.status, StatusCode::OK);
    assert_eq!(luna.delete(&uri).await.status, StatusCode::OK);
    assert_eq!(luna.get("/friends").await.body, json!([]));
    assert_eq!(artemis.get("/friends").await.body, json!([]));

    let ghost = luna
        .delete("/friends?friendId=00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination() {
    let mut client = TestClient::new();
    client.register("luna").await;
    for title in ["one", "two", "three"] {
        client.create_todo(json!({ "title": title })).await;
    }

    let page = client.get("/todos?page=2&limit=2").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["totalCount"], 3);
    assert_eq!(page.body["currentPage"], 2);
    assert_eq!(page.body["totalPages"], 2);
    assert_eq!(page.body["todos"].as_array().unwrap().len(), 1);

    let default_limit = client.get("/todos?page=1").await;
    assert_eq!(default_limit.body["todos"].as_array().unwrap().len(), 3);
    assert_eq!(default_limit.body["totalPages"], 1);

    for uri in ["/todos?page=0", "/todos?limit=0", "/todos?limit=1000", "/todos?page=abc"] {
        let rejected = client.get(uri).await;
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(rejected.body["error"].is_string());
    }
}

#[tokio::test]
async fn test_preferences_round_trip_through_cookies() {
    let mut client = TestClient::new();

    let defaults = client.get("/preferences").await;
    assert_eq!(
        defaults.body,
        json!({ "sortByDueDate": true, "hideCompletedUser": false })
    );

    let saved = client
        .post(
            "/preferences",
            json!({ "hideCompletedUser": true, "sortByDueDate": "yes" }),
        )
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.set_cookies.len(), 1);
    assert!(saved.set_cookies[0].contains("Path=/"));
    assert!(saved.set_cookies[0].contains("SameSite=Lax"));
    assert_eq!(client.cookie("preference_hideCompletedUser"), Some("true"));

    let read_back = client.get("/preferences").await;
    assert_eq!(
        read_back.body,
        json!({ "sortByDueDate": true, "hideCompletedUser": true })
    );
}

#[tokio::test]
async fn test_board_applies_preferences() {
    let mut client = TestClient::new();
    client.register("luna").await;

    client
        .create_todo(json!({ "title": "later", "dueDate": "2024-03-01" }))
        .await;
    client.create_todo(json!({ "title": "whenever" })).await;
    client
        .create_todo(json!({ "title": "soon", "dueDate": "2024-01-01" }))
        .await;
    let done = client.create_todo(json!({ "title": "done" })).await;
    let uri = format!("/todos/{}", done["id"].as_str().unwrap());
    client.patch(&uri, json!({ "completed": true })).await;

    let board = client.get("/todos/board").await;
    assert_eq!(board.body["panel"], "friends");
    assert_eq!(
        titles(&board.body["myTasks"])[..2],
        ["soon".to_string(), "later".to_string()]
    );
    assert_eq!(board.body["myTasks"].as_array().unwrap().len(), 4);

    client
        .post("/preferences", json!({ "hideCompletedUser": true }))
        .await;
    let finished = client.get("/todos/board?panel=finished").await;
    assert_eq!(titles(&finished.body["myTasks"]), ["soon", "later", "whenever"]);
    assert_eq!(titles(&finished.body["panelTasks"]), ["done"]);
    assert_eq!(finished.body["preferences"]["hideCompletedUser"], true);

    let bad_panel = client.get("/todos/board?panel=everyone").await;
    assert_eq!(bad_panel.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_search_excludes_viewer() {
    let mut luna = TestClient::new();
    luna.register("luna").await;
    let mut other = TestClient::for_router(luna.router());
    other.register("Lunaria").await;
    let mut third = TestClient::for_router(luna.router());
    third.register("artemis").await;

    let found = luna.get("/users?search=LUN").await;
    assert_eq!(found.body.as_array().unwrap().len(), 1);
    assert_eq!(found.body[0]["username"], "Lunaria");

    let everyone = luna.get("/users").await;
    assert_eq!(everyone.body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_json_keeps_error_shape() {
    let mut client = TestClient::new();
    client.register("luna").await;

    let response = client
        .request(Method::POST, "/todos", Some(json!("not an object")))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}
