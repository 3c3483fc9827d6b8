//! End-to-end API tests over [`App::dispatch`], no socket involved.
//!
//! The app is wired exactly as production wires it, with the in-memory
//! store and the recording publisher swapped in at the ports.

use std::sync::Arc;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

use catalogd::config::Config;
use catalogd::events::{BufferPublisher, EventPublisher};
use catalogd::store::MemoryStore;
use catalogd::{App, Request, Response, handlers};

const IMAGE: &str = r#"{
    "title": "Image Elijah Baley",
    "url": "/images/1280/720/test-2260.jpeg",
    "slug": "/images/1280/720/test-2260",
    "publisher": "etf1"
}"#;

struct TestApi {
    app: App,
    events: Arc<BufferPublisher>,
    _statics: tempfile::TempDir,
}

fn api() -> TestApi {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>catalog</h1>").unwrap();
    std::fs::create_dir(dir.path().join("swagger")).unwrap();
    std::fs::write(dir.path().join("swagger/swagger.yaml"), "swagger: \"2.0\"\nhost: {{url}}\n")
        .unwrap();

    let mut config = Config::default();
    config.statics.dir = dir.path().to_path_buf();

    let events = Arc::new(BufferPublisher::new());
    let app = handlers::api(
        Arc::new(MemoryStore::new()),
        Arc::clone(&events) as Arc<dyn EventPublisher>,
        &config,
    );
    TestApi { app, events, _statics: dir }
}

fn request(method: Method, path_and_query: &str, body: &str) -> Request {
    Request::new(
        method,
        path_and_query.parse().unwrap(),
        HeaderMap::new(),
        Bytes::copy_from_slice(body.as_bytes()),
        ([127, 0, 0, 1], 3000).into(),
    )
}

async fn get(app: &App, path: &str) -> Response {
    app.dispatch(request(Method::GET, path, "")).await
}

async fn post(app: &App, path: &str, body: &str) -> Response {
    app.dispatch(request(Method::POST, path, body)).await
}

async fn put(app: &App, path: &str, body: &str) -> Response {
    app.dispatch(request(Method::PUT, path, body)).await
}

fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

// ── Listing ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn an_empty_catalog_lists_as_an_empty_array() {
    let t = api();
    let res = get(&t.app, "/v1/images").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(res.body().as_ref(), b"[]");
}

#[tokio::test]
async fn filters_narrow_the_listing() {
    let t = api();
    assert_eq!(post(&t.app, "/v1/images", IMAGE).await.status(), StatusCode::CREATED);
    assert_eq!(post(&t.app, "/v1/images", IMAGE).await.status(), StatusCode::CREATED);
    let arte = IMAGE.replace("etf1", "arte");
    assert_eq!(post(&t.app, "/v1/images", &arte).await.status(), StatusCode::CREATED);

    let res = get(&t.app, "/v1/images?publisher=$eq.etf1").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(&res).as_array().unwrap().len(), 2);

    let res = get(&t.app, "/v1/images?publisher=$eq.arte&expired_at=$null").await;
    assert_eq!(body_json(&res).as_array().unwrap().len(), 1);

    let res = get(&t.app, "/v1/images?publisher=$in.etf1,arte").await;
    assert_eq!(body_json(&res).as_array().unwrap().len(), 3);

    let res = get(&t.app, "/v1/images?publisher=$notnull").await;
    assert_eq!(body_json(&res).as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn a_bad_filter_rejects_the_whole_query() {
    let t = api();
    assert_eq!(post(&t.app, "/v1/images", IMAGE).await.status(), StatusCode::CREATED);

    let res = get(&t.app, "/v1/images?publisher=$eq.etf1&title=$bogus.x").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body().as_ref(), br#"{"error":"Query filter is not in its proper form"}"#);

    // No operator sigil at all.
    let res = get(&t.app, "/v1/images?publisher=etf1").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Round trip ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn an_image_round_trips_through_the_api() {
    let t = api();

    let created = post(&t.app, "/v1/images", IMAGE).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let record = body_json(&created);
    let id = record["id"].as_str().unwrap().to_owned();
    assert_eq!(record["publisher"], "etf1");
    assert_eq!(record["updated_at"], Value::Null);

    let fetched = get(&t.app, &format!("/v1/images/{id}")).await;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(&fetched), record);

    let replacement = IMAGE.replace("etf1", "arte");
    let updated = put(&t.app, &format!("/v1/images/{id}"), &replacement).await;
    assert_eq!(updated.status(), StatusCode::NO_CONTENT);
    assert!(updated.body().is_empty());

    let fetched = body_json(&get(&t.app, &format!("/v1/images/{id}")).await);
    assert_eq!(fetched["id"], id.as_str());
    assert_eq!(fetched["publisher"], "arte");
    assert_eq!(fetched["created_at"], record["created_at"]);
    assert_ne!(fetched["updated_at"], Value::Null);
}

// ── Client faults ────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_required_fields_are_named_in_the_envelope() {
    let t = api();
    let res = post(
        &t.app,
        "/v1/images",
        r#"{"title":"Image Elijah Baley","url":"/img-1.jpeg","slug":"/img-1"}"#,
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body().as_ref(),
        br#"{"error":"field validation failure","fields":[{"field_name":"publisher","error":"required"}]}"#
    );
}

#[tokio::test]
async fn an_unreadable_body_is_a_validation_failure() {
    let t = api();
    let res = post(&t.app, "/v1/images", "not json at all").await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body().as_ref(),
        br#"{"error":"field validation failure","fields":[{"field_name":"body","error":"malformed"}]}"#
    );
}

#[tokio::test]
async fn a_malformed_id_and_a_missing_entity_split_400_from_404() {
    let t = api();

    let res = get(&t.app, "/v1/images/42").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.body().as_ref(), br#"{"error":"ID is not in its proper form"}"#);

    let res = get(&t.app, "/v1/images/67e55044-10b1-426f-9247-bb680e5fe0c8").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body().as_ref(), br#"{"error":"Entity not found"}"#);
}

#[tokio::test]
async fn updating_an_absent_image_is_a_404() {
    let t = api();
    let res = put(&t.app, "/v1/images/67e55044-10b1-426f-9247-bb680e5fe0c8", IMAGE).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn a_known_path_under_the_wrong_method_is_a_405() {
    let t = api();

    let res = t.app.dispatch(request(Method::DELETE, "/v1/images", "")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.body().as_ref(), br#"{"error":"Method not allowed"}"#);

    let res = t
        .app
        .dispatch(request(Method::DELETE, "/v1/images/67e55044-10b1-426f-9247-bb680e5fe0c8", ""))
        .await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ── Events ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_creation_is_announced_once() {
    let t = api();
    let created = post(&t.app, "/v1/images", IMAGE).await;
    let id = body_json(&created)["id"].as_str().unwrap().to_owned();

    let events = t.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "image_created");
    let payload: Value = serde_json::from_slice(&events[0].1).unwrap();
    assert_eq!(payload["id"], id.as_str());
}

#[tokio::test]
async fn rejected_and_media_creations_are_not_announced() {
    let t = api();

    let res = post(&t.app, "/v1/images", r#"{"title":"only"}"#).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post(&t.app, "/v1/medias", IMAGE).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    assert!(t.events.events().is_empty());
}

// ── Medias ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn medias_are_a_separate_resource() {
    let t = api();
    assert_eq!(post(&t.app, "/v1/images", IMAGE).await.status(), StatusCode::CREATED);

    let res = get(&t.app, "/v1/medias").await;
    assert_eq!(res.body().as_ref(), b"[]");

    let created = post(&t.app, "/v1/medias", IMAGE).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let id = body_json(&created)["id"].as_str().unwrap().to_owned();

    let res = get(&t.app, &format!("/v1/medias/{id}")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = put(&t.app, &format!("/v1/medias/{id}"), &IMAGE.replace("etf1", "arte")).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

// ── Operations endpoints ─────────────────────────────────────────────────────

#[tokio::test]
async fn health_probes_answer_the_report_shape() {
    let t = api();

    let res = get(&t.app, "/v1/healthz").await;
    assert_eq!(res.status(), StatusCode::OK);
    let report = body_json(&res);
    assert_eq!(report["result"], true);
    assert_eq!(report["errors"], serde_json::json!([]));
    assert_eq!(report["version"], env!("CARGO_PKG_VERSION"));

    let res = get(&t.app, "/v1/readiness").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(&res)["result"], true);
}

#[tokio::test]
async fn the_api_document_advertises_the_configured_address() {
    let t = api();
    let res = get(&t.app, "/v1/swagger/swagger.yaml").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/yaml"));
    let body = std::str::from_utf8(res.body()).unwrap();
    assert!(body.contains("host: 127.0.0.1:3000"), "body: {body}");
}

// ── Fallback ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unrouted_paths_fall_through_to_statics() {
    let t = api();

    let res = get(&t.app, "/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body().as_ref(), b"<h1>catalog</h1>");

    let res = get(&t.app, "/missing.css").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(res.body().is_empty());
}
