//! Integration tests for `HttpGateway` against a local axum backend.
//!
//! The backend records every topic, query-group, and filter call so the tests
//! can check the query-string and POST-body contract, then answers with small
//! fixed catalogs.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use evaldash_core::{
    ActiveFilterRequest, CascadeController, CatalogGateway, EndpointConfig, GatewayConfig,
    GatewayError, HttpGateway, TopicFilter,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Backend {
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn evaluation() -> Json<Value> {
    Json(json!({
        "name": "nightly",
        "metrics": { "P@10": { "v1": 0.5 }, "AP": { "v1": 0.4 } },
        "corpora": [],
        "generatedBy": "rre"
    }))
}

async fn metrics() -> Json<Vec<&'static str>> {
    Json(vec!["P@10", "AP"])
}

async fn versions() -> Json<Vec<&'static str>> {
    Json(vec!["v1"])
}

async fn corpora() -> Json<Vec<&'static str>> {
    Json(vec!["en", "fr"])
}

async fn topics(
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<String>> {
    let corpus = params.get("corpus").cloned().unwrap_or_default();
    backend.queries.lock().unwrap().push(params);
    Json(vec![format!("{corpus}-news")])
}

async fn query_groups(
    State(backend): State<Backend>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<String>> {
    let topic = params.get("topic").cloned().unwrap_or_default();
    backend.queries.lock().unwrap().push(params);
    Json(vec![format!("{topic}-qg")])
}

async fn filter(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    let metrics = body["metrics"].clone();
    backend.bodies.lock().unwrap().push(body);
    Json(json!({ "name": "filtered", "metrics": { "requested": metrics } }))
}

async fn unavailable() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn not_json() -> &'static str {
    "<html>oops</html>"
}

/// Start the backend on an ephemeral port and return its base URL.
async fn start_backend() -> (String, Backend) {
    let backend = Backend::default();
    let app = Router::new()
        .route("/evaluation", get(evaluation))
        .route("/metrics", get(metrics))
        .route("/versions", get(versions))
        .route("/corpora", get(corpora))
        .route("/topics", get(topics))
        .route("/queryGroups", get(query_groups))
        .route("/filter", post(filter))
        .route("/unavailable", get(unavailable))
        .route("/html", get(not_json))
        .with_state(backend.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), backend)
}

fn gateway(base_url: &str, endpoints: EndpointConfig) -> HttpGateway {
    HttpGateway::new(&GatewayConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        endpoints,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_lists_and_dataset() {
    let (base, _) = start_backend().await;
    let gw = gateway(&base, EndpointConfig::default());

    assert_eq!(gw.fetch_metrics().await.unwrap(), vec!["P@10", "AP"]);
    assert_eq!(gw.fetch_versions().await.unwrap(), vec!["v1"]);
    assert_eq!(gw.fetch_corpora().await.unwrap(), vec!["en", "fr"]);

    let data = gw.fetch_dataset().await.unwrap();
    assert_eq!(data.name.as_deref(), Some("nightly"));
    assert_eq!(data.metrics_count(), 2);
    assert_eq!(data.extra["generatedBy"], "rre");
}

#[tokio::test]
async fn test_topic_and_query_group_query_strings() {
    let (base, backend) = start_backend().await;
    let gw = gateway(&base, EndpointConfig::default());

    assert_eq!(gw.fetch_topics("en").await.unwrap(), vec!["en-news"]);
    assert_eq!(
        gw.fetch_query_groups("en", "sports & games").await.unwrap(),
        vec!["sports & games-qg"]
    );

    let queries = backend.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].get("corpus").map(String::as_str), Some("en"));
    assert_eq!(queries[1].get("corpus").map(String::as_str), Some("en"));
    assert_eq!(
        queries[1].get("topic").map(String::as_str),
        Some("sports & games")
    );
}

#[tokio::test]
async fn test_filter_posts_camel_case_body() {
    let (base, backend) = start_backend().await;
    let gw = gateway(&base, EndpointConfig::default());

    let request = ActiveFilterRequest {
        corpora: vec!["en".into()],
        topics: vec![TopicFilter {
            topic_name: "news".into(),
            corpus: "en".into(),
        }],
        metrics: vec!["AP".into()],
        ..ActiveFilterRequest::default()
    };
    let data = gw.filter(&request).await.unwrap();
    assert_eq!(data.name.as_deref(), Some("filtered"));
    assert_eq!(data.metrics["requested"], json!(["AP"]));

    let bodies = backend.bodies.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "corpora": ["en"],
            "topics": [{ "topicName": "news", "corpus": "en" }],
            "queryGroups": [],
            "metrics": ["AP"],
            "versions": []
        })]
    );
}

#[tokio::test]
async fn test_non_success_status_is_reported() {
    let (base, _) = start_backend().await;
    let gw = gateway(
        &base,
        EndpointConfig {
            corpora: "/unavailable".into(),
            ..EndpointConfig::default()
        },
    );

    let err = gw.fetch_corpora().await.unwrap_err();
    assert!(
        matches!(err, GatewayError::Status { status: 503, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_unexpected_body_is_decode_error() {
    let (base, _) = start_backend().await;
    let gw = gateway(
        &base,
        EndpointConfig {
            metrics: "/html".into(),
            ..EndpointConfig::default()
        },
    );

    let err = gw.fetch_metrics().await.unwrap_err();
    assert!(matches!(err, GatewayError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn test_absolute_endpoint_overrides_base() {
    let (base, _) = start_backend().await;
    let gw = gateway(
        "http://127.0.0.1:1",
        EndpointConfig {
            versions: format!("{base}/versions"),
            ..EndpointConfig::default()
        },
    );
    assert_eq!(gw.fetch_versions().await.unwrap(), vec!["v1"]);
}

#[tokio::test]
async fn test_controller_over_http() {
    let (base, backend) = start_backend().await;
    let controller = CascadeController::new(Arc::new(gateway(&base, EndpointConfig::default())));
    controller.activate().await;

    let request = controller.active_request().await;
    assert_eq!(request.corpora, vec!["en", "fr"]);
    assert_eq!(request.topics.len(), 2);
    assert_eq!(request.query_groups.len(), 2);

    controller.apply_filter().await.unwrap();
    let bodies = backend.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["queryGroups"].as_array().unwrap().len(), 2);
    assert_eq!(
        controller.dataset().read().await.data().unwrap().name.as_deref(),
        Some("filtered")
    );
}
