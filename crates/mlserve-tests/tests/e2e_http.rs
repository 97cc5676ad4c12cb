//! End-to-end tests for the HTTP adapter.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mlserve-tests --test e2e_http
//! ```

use std::fs;
use std::sync::Arc;

use axum::http::StatusCode;
use mlserve_server::router;
use mlserve_spec::{decode_request, AppMetadata, EndpointRegistry};
use mlserve_tests::fixtures::score_schema;
use mlserve_tests::{fixture_registry, get, post_json, post_raw, INFERRED_RULE, SCORE_RULE, TITLES_RULE};
use pretty_assertions::assert_eq;
use serde_json::json;

fn app() -> axum::Router {
    router(fixture_registry())
}

#[tokio::test]
async fn test_range_violation_reports_key_and_bounds() {
    let body = json!({"inputs": {"t": {"text": "hi"}}, "parameters": {"p": 1.5}});
    let (status, value) = post_json(app(), SCORE_RULE, &body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["status"], "VALIDATION_ERROR");
    assert_eq!(
        value["details"],
        json!({"kind": "range_violation", "key": "p", "value": 1.5, "min": 0.0, "max": 1.0})
    );
}

#[tokio::test]
async fn test_range_bounds_accepted() {
    for p in [0.0, 1.0] {
        let body = json!({"inputs": {"t": {"text": "hi"}}, "parameters": {"p": p}});
        let (status, _) = post_json(app(), SCORE_RULE, &body).await;
        assert_eq!(status, StatusCode::OK, "bound {} rejected", p);
    }
}

#[tokio::test]
async fn test_parameter_key_mismatch() {
    let subset = json!({"inputs": {"t": {"text": "hi"}}, "parameters": {}});
    let (status, value) = post_json(app(), SCORE_RULE, &subset).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["details"]["kind"], "key_set_mismatch");
    assert_eq!(value["details"]["section"], "parameters");

    let superset = json!({"inputs": {"t": {"text": "hi"}}, "parameters": {"p": 0.2, "q": 1}});
    let (status, value) = post_json(app(), SCORE_RULE, &superset).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["details"]["received"], json!(["p", "q"]));
}

#[tokio::test]
async fn test_key_order_is_irrelevant() {
    let (status, _) = post_raw(
        app(),
        SCORE_RULE,
        r#"{"parameters": {"p": 0.7}, "inputs": {"t": {"text": "hi"}}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_sections() {
    let (status, value) = post_raw(app(), SCORE_RULE, "[1, 2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["details"]["kind"], "malformed_body");

    let body = json!({"inputs": [], "parameters": {"p": 0.5}});
    let (status, value) = post_json(app(), SCORE_RULE, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["details"]["section"], "inputs");
}

#[tokio::test]
async fn test_batch_outputs_keep_handler_titles() {
    let body = json!({
        "inputs": {"files": {"files": [{"path": "a.txt"}, {"path": "b.txt"}]}},
        "parameters": {"suffix": ".csv"}
    });
    let (status, value) = post_json(app(), TITLES_RULE, &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        value,
        json!({
            "output_type": "batchfile",
            "files": [
                {"output_type": "file", "file_type": "text", "path": "a.txt.csv", "title": "a.txt", "subtitle": null},
                {"output_type": "file", "file_type": "text", "path": "b.txt.csv", "title": "b.txt", "subtitle": null}
            ]
        })
    );
}

#[tokio::test]
async fn test_inferred_endpoint_over_http() {
    let body = json!({"inputs": {"text": {"text": "ab"}}, "parameters": {"count": 3}});
    let (status, value) = post_json(app(), INFERRED_RULE, &body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["value"], "abx3");

    let (status, _) = get(app(), &format!("{}/task_schema", INFERRED_RULE)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, sample) = get(app(), &format!("{}/sample_payload", INFERRED_RULE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sample["parameters"], json!({"count": 1}));
}

#[tokio::test]
async fn test_every_sample_payload_is_accepted() {
    let registry = fixture_registry();
    for endpoint in registry.endpoints() {
        let (_, sample) = get(app(), &endpoint.sample_payload_path()).await;
        let (status, value) = post_json(app(), endpoint.rule(), &sample).await;
        assert_eq!(status, StatusCode::OK, "{} rejected its sample: {}", endpoint.rule(), value);
    }
}

#[tokio::test]
async fn test_payload_schema_describes_closed_objects() {
    let (status, shape) = get(app(), &format!("{}/payload_schema", TITLES_RULE)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shape["additionalProperties"], json!(false));
    assert_eq!(shape["required"], json!(["inputs", "parameters"]));
    assert_eq!(
        shape["properties"]["inputs"]["properties"]["files"]["properties"]["files"]["minItems"],
        json!(1)
    );
}

#[tokio::test]
async fn test_routes_list_every_endpoint() {
    let (status, routes) = get(app(), "/api/routes").await;
    assert_eq!(status, StatusCode::OK);

    let rules: Vec<_> = routes
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["run_task"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(rules, vec![SCORE_RULE, TITLES_RULE, INFERRED_RULE]);
    assert_eq!(routes[0]["short_title"], "Score");
    assert!(routes[2].get("task_schema").is_none());
}

#[tokio::test]
async fn test_app_metadata_from_markdown_file() {
    let dir = tempfile::tempdir().unwrap();
    let info = dir.path().join("README.md");
    fs::write(&info, "# Scorer\nScores text.").unwrap();

    let mut registry = EndpointRegistry::new();
    registry.set_app_metadata(
        AppMetadata::new("Scorer", "Tests", "1.2.3", "")
            .info_from_file(&info)
            .unwrap(),
    );

    let (status, value) = get(router(Arc::new(registry)), "/api/app_metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["info"], "# Scorer\nScores text.");
    assert_eq!(value["version"], "1.2.3");
}

#[test]
fn test_decoded_payload_reserializes_to_itself() {
    let payload = json!({"inputs": {"t": {"text": "hello"}}, "parameters": {"p": 0.25}});
    let request = decode_request(&score_schema(), &payload).unwrap();
    assert_eq!(request.to_value().unwrap(), payload);
}
