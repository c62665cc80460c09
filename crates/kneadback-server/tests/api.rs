use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use kneadback_server::{router, AppState, IngestionService};
use kneadback_store::Store;
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with_limit(max_list_limit: i64) -> Router {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    router(AppState::new(IngestionService::new(store, max_list_limit)))
}

fn app() -> Router {
    app_with_limit(1000)
}

fn feedback(nps: i64, notes: &str) -> Value {
    json!({
        "product_model": "chair::Zen 3",
        "usage": { "mode": "neck", "intensity": 3, "heat_enabled": true, "duration_minutes": 15 },
        "ratings": { "relax": 4, "pain_relief": 4, "noise": 3, "heat_fit": 5 },
        "nps": nps,
        "notes": notes
    })
}

fn post_json(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/feedback")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn post_feedback_returns_stored_record() {
    let app = app();
    let (status, body) = send(&app, post_json(feedback(9, "  lovely  ").to_string())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], json!(1));
    assert!(body["submitted_at"].as_i64().expect("timestamp") > 0);
    assert_eq!(body["user_id"], json!("guest"));
    assert_eq!(body["usage"]["mode"], json!("neck"));
    assert_eq!(body["demographic"]["gender"], json!("undisclosed"));
    assert_eq!(body["notes"], json!("lovely"));

    let (_, second) = send(&app, post_json(feedback(7, "").to_string())).await;
    assert_eq!(second["id"], json!(2));
}

#[tokio::test]
async fn post_feedback_rejects_out_of_range_fields() {
    let app = app();
    let mut input = feedback(11, "");
    input["ratings"]["relax"] = json!(0);
    input["usage"]["duration_minutes"] = json!(200);

    let (status, body) = send(&app, post_json(input.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .map(|field| field["field"].as_str().expect("field name"))
        .collect();
    assert_eq!(fields, vec!["usage.duration_minutes", "ratings.relax", "nps"]);

    let (_, listed) = send(&app, get("/api/feedback")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn post_feedback_rejects_malformed_json() {
    let (status, body) = send(&app(), post_json("{\"nps\": ".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

fn field_names(body: &Value) -> Vec<&str> {
    body["fields"]
        .as_array()
        .expect("fields")
        .iter()
        .map(|field| field["field"].as_str().expect("field name"))
        .collect()
}

#[tokio::test]
async fn post_feedback_reports_type_errors_with_range_errors() {
    let app = app();
    let mut input = feedback(8, "");
    input["ratings"]["relax"] = json!(0);
    input["nps"] = json!("ten");

    let (status, body) = send(&app, post_json(input.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["ratings.relax", "nps"]);

    let mut input = feedback(8, "");
    input["ratings"]["noise"] = json!(3.5);
    input["usage"]["mode"] = json!(1);
    let (status, body) = send(&app, post_json(input.to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["usage.mode", "ratings.noise"]);

    let (_, listed) = send(&app, get("/api/feedback")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn post_feedback_rejects_non_object_body() {
    let (status, body) = send(&app(), post_json("[1, 2]".to_string())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["body"]);
}

#[tokio::test]
async fn get_feedback_by_id() {
    let app = app();
    let (_, created) = send(&app, post_json(feedback(9, "first").to_string())).await;

    let (status, body) = send(&app, get("/api/feedback/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, body) = send(&app, get("/api/feedback/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().expect("error").contains("2"));

    let (status, body) = send(&app, get("/api/feedback/zero")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(field_names(&body), vec!["id"]);

    let (status, _) = send(&app, get("/api/feedback/0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_feedback_returns_newest_first() {
    let app = app();
    for notes in ["A", "B", "C"] {
        let (status, _) = send(&app, post_json(feedback(8, notes).to_string())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, get("/api/feedback?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    let notes: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|record| record["notes"].as_str().expect("notes"))
        .collect();
    assert_eq!(notes, vec!["C", "B"]);
}

#[tokio::test]
async fn list_feedback_rejects_non_positive_limit() {
    let (status, body) = send(&app(), get("/api/feedback?limit=0")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], json!("limit"));
}

#[tokio::test]
async fn list_feedback_caps_limit() {
    let app = app_with_limit(2);
    for notes in ["A", "B", "C"] {
        send(&app, post_json(feedback(8, notes).to_string())).await;
    }
    let (status, body) = send(&app, get("/api/feedback?limit=100")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn insights_average_nps() {
    let app = app();
    let (_, empty) = send(&app, get("/api/insights")).await;
    assert_eq!(empty, json!({ "count": 0, "average_nps": 0.0, "top_issue": null }));

    for nps in [8, 6, 10] {
        send(&app, post_json(feedback(nps, "").to_string())).await;
    }
    let (status, body) = send(&app, get("/api/insights")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(3));
    assert_eq!(body["average_nps"], json!(8.0));
    assert_eq!(body["top_issue"], Value::Null);
}
