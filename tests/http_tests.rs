use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tipsdash::server::{router, AppState};
use tipsdash::{CategoryColorTable, Dashboard, Dataset};
use tower::ServiceExt;

fn app() -> Router {
    let dashboard = Dashboard::start(
        "Tips Dashboard",
        Dataset::bundled().unwrap(),
        CategoryColorTable::tips_default(),
        10,
    )
    .unwrap();
    router(AppState::new(dashboard, 16))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, body.to_vec())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && bytes[0..8] == [137, 80, 78, 71, 13, 10, 26, 10]
}

#[tokio::test]
async fn test_index_page() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("<title>Tips Dashboard</title>"));
    assert!(html.contains("id=\"hue-scatter\""));
    assert!(html.contains("class=\"table_dataset\""));
}

#[tokio::test]
async fn test_healthz() {
    let (status, body) = get(app(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_table_max_rows() {
    let (status, body) = get(app(), "/api/table?max_rows=3").await;
    assert_eq!(status, StatusCode::OK);
    let grid: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(grid["rows"].as_array().unwrap().len(), 3);
    assert_eq!(grid["header"][0], "total_bill");

    // Negative counts render the header only
    let (_, body) = get(app(), "/api/table?max_rows=-1").await;
    let grid: Value = serde_json::from_slice(&body).unwrap();
    assert!(grid["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_controls() {
    let (status, body) = get(app(), "/api/controls").await;
    assert_eq!(status, StatusCode::OK);
    let controls: Value = serde_json::from_slice(&body).unwrap();
    let ids: Vec<&str> = controls
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["hue-scatter", "x-bar", "text-bar"]);
    assert_eq!(controls[2]["options"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_scatter_figure() {
    let (status, body) = get(app(), "/api/figures/scatter?hue=time").await;
    assert_eq!(status, StatusCode::OK);
    let figure: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(figure["data"][0]["name"], "Dinner");
    assert_eq!(figure["data"][0]["marker"]["color"], "#0059a3");
    assert_eq!(figure["layout"]["hovermode"], "closest");
}

#[tokio::test]
async fn test_bar_figure_defaults() {
    let (status, body) = get(app(), "/api/figures/bar").await;
    assert_eq!(status, StatusCode::OK);
    let figure: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(figure["data"][0]["type"], "bar");
    assert_eq!(figure["data"][0]["opacity"], 0.7);
    assert_eq!(figure["layout"]["xaxis"]["title"]["text"], "Sex");
    assert_eq!(figure["layout"]["legend"], json!({"x": 0.0, "y": 1.0}));
}

#[tokio::test]
async fn test_invalid_field_is_unprocessable() {
    let (status, body) = get(app(), "/api/figures/scatter?hue=colour").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error: Value = serde_json::from_slice(&body).unwrap();
    assert!(error["error"].as_str().unwrap().contains("colour"));
}

#[tokio::test]
async fn test_export_png() {
    let (status, body) = get(app(), "/api/export/scatter?hue=day&width=400&height=300").await;
    assert_eq!(status, StatusCode::OK);
    assert!(is_valid_png(&body));
}

#[tokio::test]
async fn test_export_errors() {
    let (status, _) = get(app(), "/api/export/pie").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(app(), "/api/export/bar?width=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_flow() {
    let app = app();

    let (status, created) = post_json(app.clone(), "/api/sessions", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = created["session_id"].as_str().unwrap().to_string();
    assert_eq!(created["selection"], json!({"hue": "sex", "x_field": "sex", "text_field": "sex"}));
    assert_eq!(created["figures"].as_array().unwrap().len(), 2);

    let uri = format!("/api/sessions/{}/controls/x-bar", session_id);
    let (status, changed) = post_json(app.clone(), &uri, json!({"value": "day"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(changed["selection"]["x_field"], "day");
    let updates = changed["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["chart"], "bar-plot");
    assert_eq!(updates[0]["figure"]["layout"]["xaxis"]["title"]["text"], "Day");

    // Rejected values leave the selection untouched
    let (status, _) = post_json(app.clone(), &uri, json!({"value": "size"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let uri = format!("/api/sessions/{}/controls/hue-scatter", session_id);
    let (_, changed) = post_json(app.clone(), &uri, json!({"value": "smoker"})).await;
    assert_eq!(changed["selection"]["x_field"], "day");
    assert_eq!(changed["updates"][0]["chart"], "scatter-plot");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/api/sessions/{}", session_id))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = post_json(app, &uri, json!({"value": "day"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_control_is_unprocessable() {
    let app = app();
    let (_, created) = post_json(app.clone(), "/api/sessions", json!({})).await;
    let uri = format!("/api/sessions/{}/controls/y-bar", created["session_id"].as_str().unwrap());
    let (status, error) = post_json(app, &uri, json!({"value": "sex"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"].as_str().unwrap().contains("y-bar"));
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let uri = format!("/api/sessions/{}/controls/x-bar", uuid::Uuid::new_v4());
    let (status, _) = post_json(app(), &uri, json!({"value": "day"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
