use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;
use common::{seed_example, setup_test_app, setup_test_db};

async fn post_grid(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn form_style_request() -> Value {
    // Browsers post every scalar as a string
    json!({
        "draw": "7",
        "start": "1",
        "length": "2",
        "search": { "value": "", "regex": "false" },
        "order": [{ "column": "1", "dir": "asc" }],
        "columns": [
            { "data": "name", "searchable": "true", "orderable": "true", "search": { "value": "" } },
            { "data": "age", "searchable": "true", "orderable": "true", "search": { "value": "" } }
        ]
    })
}

#[tokio::test]
async fn test_grid_endpoint_returns_envelope() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_example(&db).await.unwrap();
    let app = setup_test_app(db);

    let (status, body) = post_grid(app, "/api/v1/people/grid", form_style_request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "draw": 7,
            "recordsTotal": 3,
            "recordsFiltered": 3,
            "data": [
                {"indexColumn": 2, "name": "Cy", "age": 30},
                {"indexColumn": 3, "name": "Bob", "age": 40}
            ]
        })
    );
}

#[tokio::test]
async fn test_entity_grid_endpoint_includes_relation() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_example(&db).await.unwrap();
    let app = setup_test_app(db);

    let mut request = form_style_request();
    request["columns"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "data": "department", "searchable": "true", "orderable": "false", "search": { "value": "" } }));

    let (status, body) = post_grid(app, "/api/v1/people/grid/entity", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["department"], "");
    assert_eq!(body["data"][1]["department"], "Sales");
}

#[tokio::test]
async fn test_minimal_request_uses_defaults() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    seed_example(&db).await.unwrap();
    let app = setup_test_app(db);

    let (status, body) = post_grid(app, "/api/v1/people/grid", json!({ "draw": 1 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recordsTotal"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    // No request columns, but every registered column is still projected
    assert_eq!(body["data"][0]["indexColumn"], 1);
    assert!(body["data"][0].get("name").is_some());
}

#[tokio::test]
async fn test_store_error_is_reported_in_body() {
    let db = setup_test_db().await.expect("Failed to setup test database");
    let app = setup_test_app(db);

    let (status, body) = post_grid(app, "/api/v1/broken/grid", form_style_request()).await;

    assert_eq!(status, StatusCode::OK);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("An SQL error occurred"));
    assert!(body.get("data").is_none());
}
