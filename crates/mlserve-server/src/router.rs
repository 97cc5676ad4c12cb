//! Route table built from an endpoint registry.
//!
//! Each endpoint gets:
//!
//! - `POST <rule>`: run the prediction function
//! - `GET <rule>/task_schema`: the declared schema (schema-bearing endpoints only)
//! - `GET <rule>/sample_payload`: an example request body
//! - `GET <rule>/payload_schema`: the request body shape
//!
//! plus the shared `GET /api/routes` and `GET /api/app_metadata` routes.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use mlserve_spec::{
    EndpointDetails, EndpointRegistry, MarshalError, PayloadSection, RouteInfo,
    APP_METADATA_PATH, ROUTES_PATH,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::error::ApiError;

/// Builds the router serving every endpoint of `registry`.
pub fn router(registry: Arc<EndpointRegistry>) -> Router {
    let mut app = Router::new()
        .route(ROUTES_PATH, get(list_routes))
        .route(APP_METADATA_PATH, get(app_metadata));

    for endpoint in registry.endpoints() {
        let endpoint = Arc::new(endpoint.clone());

        app = app
            .route(
                endpoint.rule(),
                post({
                    let endpoint = Arc::clone(&endpoint);
                    move |body: Bytes| run_task(endpoint, body)
                }),
            )
            .route(
                &endpoint.sample_payload_path(),
                get({
                    let endpoint = Arc::clone(&endpoint);
                    move || async move { Json(endpoint.sample_payload()) }
                }),
            )
            .route(
                &endpoint.payload_schema_path(),
                get({
                    let endpoint = Arc::clone(&endpoint);
                    move || async move { Json(endpoint.payload_schema()) }
                }),
            );

        if let Some(schema) = endpoint.task_schema().cloned() {
            app = app.route(
                &endpoint.task_schema_path(),
                get(move || async move { Json(schema) }),
            );
        }
    }

    app.with_state(registry)
}

/// Decodes the body, runs the handler on the blocking pool and encodes the
/// result.
async fn run_task(endpoint: Arc<EndpointDetails>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let rule = endpoint.rule().to_string();

    let raw: Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(rule = %rule, error = %e, "request body is not valid JSON");
        MarshalError::MalformedBody {
            section: PayloadSection::Body,
            found: format!("invalid JSON ({})", e),
        }
    })?;

    let request = endpoint.decode(&raw).map_err(|err| {
        warn!(rule = %rule, code = %err.code(), error = %err, "rejected request");
        err
    })?;

    debug!(rule = %rule, "running handler");
    let worker = Arc::clone(&endpoint);
    let outcome = tokio::task::spawn_blocking(move || worker.invoke(&request))
        .await
        .map_err(|join_err| MarshalError::HandlerFailure {
            rule: rule.clone(),
            message: join_err.to_string(),
        })
        .and_then(|result| result);

    match outcome {
        Ok(output) => {
            debug!(rule = %rule, output_type = %output.output_type(), "handler finished");
            Ok(Json(output.encode()))
        }
        Err(err) => {
            error!(rule = %rule, error = %err, "handler failed");
            Err(err.into())
        }
    }
}

async fn list_routes(State(registry): State<Arc<EndpointRegistry>>) -> Json<Vec<RouteInfo>> {
    Json(registry.routes())
}

async fn app_metadata(State(registry): State<Arc<EndpointRegistry>>) -> Json<Value> {
    match registry.app_metadata() {
        Some(metadata) => Json(json!(metadata)),
        None => Json(json!({"error": "App metadata not set"})),
    }
}
