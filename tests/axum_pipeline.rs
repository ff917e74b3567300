use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Path;
use axum::extract::rejection::JsonRejection;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Json;
use faultline::adapter::{ErrorTranslationLayer, Failure};
use faultline::config::{CatalogConfig, PipelineConfig};
use faultline::prelude::*;
use serde_json::Value;
use std::io;
use std::sync::Arc;
use tower::{Layer, ServiceExt, service_fn};
use tower_http::trace::TraceLayer;

#[derive(Debug, thiserror::Error)]
#[error("order {0} is locked by job 88213 on worker-3")]
struct OrderLocked(u64);

const CATALOG: &str = r#"{
    "fallback": "GENERIC_SERVER_ERROR",
    "include_core_errors": true,
    "errors": [
        { "code": "NOT_FOUND", "message": "The resource was not found", "http_status": 404 },
        { "code": "ORDER_LOCKED", "message": "Order {order} is being processed", "http_status": 409 },
        { "code": "GENERIC_SERVER_ERROR", "message": "Something went wrong", "http_status": 500 }
    ]
}"#;

fn catalog() -> Arc<ErrorCatalog> {
    Arc::new(
        CatalogConfig::from_json_str(CATALOG)
            .unwrap()
            .into_catalog()
            .unwrap(),
    )
}

fn order_locked_listener() -> Arc<dyn Listener> {
    Arc::new(|error: &DynError, _: &RequestContext| {
        match error.downcast_ref::<OrderLocked>() {
            Some(locked) => ListenerOutcome::handled([
                ErrorRef::new("ORDER_LOCKED").with_arg("order", locked.0.to_string())
            ]),
            None => ListenerOutcome::NotHandled,
        }
    })
}

fn error_layer(config: &PipelineConfig) -> ErrorTranslationLayer {
    ErrorTranslationLayer::from_config(catalog(), vec![order_locked_listener()], config).unwrap()
}

async fn show_order(Path(id): Path<u64>) -> Result<String, Failure> {
    match id {
        1 => Ok("order 1".to_string()),
        7 => Err(OrderLocked(7).into()),
        13 => Err(io::Error::other("connection to 10.3.4.5:5432 refused").into()),
        42 => Err(ApiException::with_errors(["MISSING_FIELD", "GENERIC_SERVER_ERROR"]).into()),
        _ => Err(ApiException::new("NOT_FOUND")
            .with_log_message(format!("order {id} absent from shard 3"))
            .into()),
    }
}

async fn create_order(payload: Result<Json<Value>, JsonRejection>) -> Result<String, Failure> {
    let Json(order) = payload?;
    Ok(order.to_string())
}

async fn create_order_unchecked(Json(order): Json<Value>) -> String {
    order.to_string()
}

fn app(config: &PipelineConfig) -> Router {
    Router::new()
        .route("/orders/{id}", get(show_order))
        .route("/orders", post(create_order))
        .route("/orders/unchecked", post(create_order_unchecked))
        .layer(error_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn not_found_maps_to_catalog_error() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/orders/99"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

    let body = json_body(response).await;
    assert!(!body["error_id"].as_str().unwrap().is_empty());
    assert_eq!(
        body["errors"],
        serde_json::json!([{ "code": "NOT_FOUND", "message": "The resource was not found" }])
    );
    assert!(!body.to_string().contains("shard"));
}

#[tokio::test]
async fn successful_responses_pass_through() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/orders/1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"order 1");
}

#[tokio::test]
async fn unrecognised_failure_gets_generic_error() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/orders/13"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "GENERIC_SERVER_ERROR");
    assert_eq!(body["errors"][0]["message"], "Something went wrong");
    assert!(!body.to_string().contains("10.3.4.5"));
}

#[tokio::test]
async fn application_listener_renders_message_args() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/orders/7"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "ORDER_LOCKED");
    assert_eq!(body["errors"][0]["message"], "Order 7 is being processed");
    assert!(!body.to_string().contains("worker-3"));
}

#[tokio::test]
async fn highest_status_wins_and_all_errors_are_kept() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/orders/42"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    let codes: Vec<_> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(codes, vec!["MISSING_FIELD", "GENERIC_SERVER_ERROR"]);
}

#[tokio::test]
async fn correlation_header_becomes_error_id() {
    let request = Request::builder()
        .uri("/orders/99")
        .header("x-correlation-id", "corr-5521")
        .body(Body::empty())
        .unwrap();
    let response = app(&PipelineConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    let body = json_body(response).await;
    assert_eq!(body["error_id"], "corr-5521");
}

#[tokio::test]
async fn malformed_json_body() {
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"sku\": "))
        .unwrap();
    let response = app(&PipelineConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn missing_json_content_type() {
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .body(Body::from("{}"))
        .unwrap();
    let response = app(&PipelineConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn configured_contract_field_names() {
    let config = PipelineConfig::from_json_str(
        r#"{
            "content_type": "application/vnd.shop.error+json",
            "correlation_header": "x-request-id",
            "contract": { "error_id_field": "traceId", "errors_field": "problems" }
        }"#,
    )
    .unwrap();
    let request = Request::builder()
        .uri("/orders/99")
        .header("x-request-id", "req-1")
        .body(Body::empty())
        .unwrap();
    let response = app(&config).oneshot(request).await.unwrap();

    assert_eq!(response.headers()[CONTENT_TYPE], "application/vnd.shop.error+json");
    let body = json_body(response).await;
    assert_eq!(body["traceId"], "req-1");
    assert_eq!(body["problems"][0]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn inner_service_errors_are_translated() {
    let inner = service_fn(|_req: Request<Body>| async {
        Err::<Response, _>(HttpStatusException::new(503, "upstream pool exhausted"))
    });
    let service = error_layer(&PipelineConfig::default()).layer(inner);

    let response = service.oneshot(get_request("/anything")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "SERVICE_UNAVAILABLE");
    assert!(!body.to_string().contains("pool"));
}

#[tokio::test]
async fn unmatched_route_uses_error_contract() {
    let response = app(&PipelineConfig::default())
        .oneshot(get_request("/nowhere"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn wrong_method_uses_error_contract() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/orders/1")
        .body(Body::empty())
        .unwrap();
    let response = app(&PipelineConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn bare_extractor_rejection_uses_error_contract() {
    let request = Request::builder()
        .method("POST")
        .uri("/orders/unchecked")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"sku\": nope}"))
        .unwrap();
    let response = app(&PipelineConfig::default())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "GENERIC_BAD_REQUEST");
    assert!(!body.to_string().contains("expected"));
}

#[tokio::test]
async fn error_response_translation_can_be_disabled() {
    let layer = error_layer(&PipelineConfig::default()).with_error_response_translation(false);
    let app = Router::new()
        .route("/orders/{id}", get(show_order))
        .layer(layer);

    let response = app.oneshot(get_request("/nowhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[derive(Debug, Clone, Copy, ApiErrors)]
enum ShopError {
    #[api_error(status = 404, message = "Order was not found")]
    OrderNotFound,
    #[api_error(status = 500, message = "Something went wrong", fallback)]
    GenericServerError,
}

fn derived_app() -> Router {
    let catalog = Arc::new(ErrorCatalog::from_set::<ShopError>().unwrap());
    let layer = ErrorTranslationLayer::from_config(catalog, vec![], &PipelineConfig::default()).unwrap();
    Router::new()
        .route("/orders", post(create_order))
        .route(
            "/orders/{id}",
            get(|| async {
                Err::<String, Failure>(HttpStatusException::new(404, "no such order").into())
            }),
        )
        .layer(layer)
}

#[tokio::test]
async fn derived_catalog_serves_default_listener_codes() {
    let request = Request::builder()
        .method("POST")
        .uri("/orders")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{\"a\":"))
        .unwrap();
    let response = derived_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "MALFORMED_REQUEST");

    let response = derived_app().oneshot(get_request("/orders/5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["errors"][0]["code"], "NOT_FOUND");
}
