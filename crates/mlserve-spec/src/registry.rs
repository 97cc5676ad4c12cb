//! Endpoint registry.
//!
//! The registry is built once before serving and then shared read-only by
//! the HTTP router and the CLI engine.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::decode::{decode_request, RequestBody};
use crate::error::{ErrorCode, MarshalError, ValidationError};
use crate::input::{InputType, InputValues};
use crate::output::ResponseBody;
use crate::parameter::{ParameterValues, ScalarKind};
use crate::sample::{payload_schema, sample_payload};
use crate::schema::{InputSchema, ParameterSchema, TaskSchema};

/// Route listing every endpoint.
pub const ROUTES_PATH: &str = "/api/routes";
/// Route returning the application metadata.
pub const APP_METADATA_PATH: &str = "/api/app_metadata";

// Characters the router reads as captures or wildcards.
const ROUTE_PATTERN_CHARS: [char; 4] = ['*', ':', '{', '}'];

/// A prediction function.
///
/// Implemented for every `Fn(&InputValues, &ParameterValues) -> anyhow::Result<ResponseBody>`
/// that is `Send + Sync`.
pub trait Handler: Send + Sync {
    fn call(&self, inputs: &InputValues, parameters: &ParameterValues) -> anyhow::Result<ResponseBody>;
}

impl<F> Handler for F
where
    F: Fn(&InputValues, &ParameterValues) -> anyhow::Result<ResponseBody> + Send + Sync,
{
    fn call(&self, inputs: &InputValues, parameters: &ParameterValues) -> anyhow::Result<ResponseBody> {
        self(inputs, parameters)
    }
}

/// Input keys and scalar parameter types of a handler registered without a
/// task schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerShape {
    inputs: Vec<(String, InputType)>,
    parameters: Vec<(String, ScalarKind)>,
}

impl HandlerShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an input.
    pub fn input(mut self, key: impl Into<String>, input_type: InputType) -> Self {
        self.inputs.push((key.into(), input_type));
        self
    }

    /// Declares a parameter.
    pub fn parameter(mut self, key: impl Into<String>, kind: ScalarKind) -> Self {
        self.parameters.push((key.into(), kind));
        self
    }

    /// Converts the shape into the schema used for decoding.
    ///
    /// Labels repeat the keys; parameters are unconstrained and have no
    /// default.
    pub fn to_task_schema(&self) -> TaskSchema {
        TaskSchema {
            inputs: self
                .inputs
                .iter()
                .map(|(key, input_type)| InputSchema::new(key.as_str(), key.as_str(), *input_type))
                .collect(),
            parameters: self
                .parameters
                .iter()
                .map(|(key, kind)| ParameterSchema::new(key.as_str(), key.as_str(), kind.descriptor()))
                .collect(),
        }
    }
}

/// One registered endpoint.
#[derive(Clone)]
pub struct EndpointDetails {
    rule: String,
    short_title: String,
    order: i64,
    task_schema: Option<TaskSchema>,
    schema: TaskSchema,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for EndpointDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointDetails")
            .field("rule", &self.rule)
            .field("short_title", &self.short_title)
            .field("order", &self.order)
            .field("task_schema", &self.task_schema)
            .finish_non_exhaustive()
    }
}

impl EndpointDetails {
    /// Creates an endpoint described by a task schema.
    ///
    /// The endpoint is served over HTTP and offered as a CLI subcommand.
    pub fn new(rule: impl Into<String>, task_schema: TaskSchema, handler: impl Handler + 'static) -> Self {
        Self {
            rule: rule.into(),
            short_title: String::new(),
            order: 0,
            task_schema: Some(task_schema.clone()),
            schema: task_schema,
            handler: Arc::new(handler),
        }
    }

    /// Creates an endpoint without a task schema.
    ///
    /// The endpoint is served over HTTP only; its payload is decoded against
    /// the schema inferred from `shape`.
    pub fn from_shape(rule: impl Into<String>, shape: HandlerShape, handler: impl Handler + 'static) -> Self {
        Self {
            rule: rule.into(),
            short_title: String::new(),
            order: 0,
            task_schema: None,
            schema: shape.to_task_schema(),
            handler: Arc::new(handler),
        }
    }

    /// Sets the short title shown in route listings and CLI help.
    pub fn short_title(mut self, short_title: impl Into<String>) -> Self {
        self.short_title = short_title.into();
        self
    }

    /// Sets the display order.
    pub fn order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn title(&self) -> &str {
        &self.short_title
    }

    pub fn display_order(&self) -> i64 {
        self.order
    }

    /// The declared task schema, if any.
    pub fn task_schema(&self) -> Option<&TaskSchema> {
        self.task_schema.as_ref()
    }

    /// The schema payloads are decoded against, declared or inferred.
    pub fn schema(&self) -> &TaskSchema {
        &self.schema
    }

    /// Returns true if the endpoint gets a CLI subcommand.
    pub fn is_cli_eligible(&self) -> bool {
        self.task_schema.is_some()
    }

    pub fn sample_payload(&self) -> RequestBody {
        sample_payload(&self.schema)
    }

    pub fn payload_schema(&self) -> Value {
        payload_schema(&self.schema)
    }

    /// Decodes a raw request body.
    pub fn decode(&self, body: &Value) -> Result<RequestBody, MarshalError> {
        decode_request(&self.schema, body)
    }

    /// Runs the handler on a decoded request.
    ///
    /// Handler errors and panics become [`MarshalError::HandlerFailure`].
    pub fn invoke(&self, request: &RequestBody) -> Result<ResponseBody, MarshalError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.handler.call(&request.inputs, &request.parameters)
        }));
        match outcome {
            Ok(Ok(body)) => Ok(body),
            Ok(Err(err)) => Err(MarshalError::HandlerFailure {
                rule: self.rule.clone(),
                message: format!("{err:#}"),
            }),
            Err(payload) => Err(MarshalError::HandlerFailure {
                rule: self.rule.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Decodes `body` and runs the handler.
    pub fn call(&self, body: &Value) -> Result<ResponseBody, MarshalError> {
        let request = self.decode(body)?;
        self.invoke(&request)
    }

    /// Path of the schema route.
    pub fn task_schema_path(&self) -> String {
        format!("{}/task_schema", self.rule)
    }

    /// Path of the sample payload route.
    pub fn sample_payload_path(&self) -> String {
        format!("{}/sample_payload", self.rule)
    }

    /// Path of the payload schema route.
    pub fn payload_schema_path(&self) -> String {
        format!("{}/payload_schema", self.rule)
    }

    /// Builds the route listing entry.
    pub fn route_info(&self) -> RouteInfo {
        let schema_bearing = self.is_cli_eligible();
        RouteInfo {
            run_task: self.rule.clone(),
            sample_payload: self.sample_payload_path(),
            payload_schema: self.payload_schema_path(),
            task_schema: schema_bearing.then(|| self.task_schema_path()),
            short_title: schema_bearing.then(|| self.short_title.clone()),
            order: schema_bearing.then_some(self.order),
        }
    }

    fn rule_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let rule = self.rule.as_str();
        if !rule.starts_with('/') {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRule,
                format!("rule '{}' must start with '/'", rule),
                "rule",
            ));
        }
        if rule.len() < 2 || rule.ends_with('/') {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRule,
                format!("rule '{}' must name a path and not end with '/'", rule),
                "rule",
            ));
        }
        if rule.chars().any(char::is_whitespace) {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRule,
                format!("rule '{}' must not contain whitespace", rule),
                "rule",
            ));
        }
        if rule.contains(ROUTE_PATTERN_CHARS) {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRule,
                format!("rule '{}' must not contain route pattern syntax", rule),
                "rule",
            ));
        }
        if rule == ROUTES_PATH || rule == APP_METADATA_PATH {
            errors.push(ValidationError::with_path(
                ErrorCode::InvalidRule,
                format!("rule '{}' is reserved", rule),
                "rule",
            ));
        }
        errors
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

/// One entry of the route listing.
///
/// Display fields are present only for schema-bearing endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub run_task: String,
    pub sample_payload: String,
    pub payload_schema: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

/// Descriptive metadata about the whole application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Markdown description.
    pub info: String,
    pub author: String,
    pub version: String,
    pub name: String,
}

impl AppMetadata {
    pub fn new(
        name: impl Into<String>,
        author: impl Into<String>,
        version: impl Into<String>,
        info: impl Into<String>,
    ) -> Self {
        Self {
            info: info.into(),
            author: author.into(),
            version: version.into(),
            name: name.into(),
        }
    }

    /// Replaces `info` with the contents of a markdown file.
    pub fn info_from_file(mut self, path: impl AsRef<Path>) -> std::io::Result<Self> {
        self.info = std::fs::read_to_string(path)?;
        Ok(self)
    }
}

/// The table of registered endpoints.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<EndpointDetails>,
    app_metadata: Option<AppMetadata>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an endpoint.
    ///
    /// Fails with [`MarshalError::DuplicateRoute`] if the rule is taken and
    /// with [`MarshalError::InvalidSchema`] if the rule or the schema is
    /// invalid.
    pub fn register(&mut self, endpoint: EndpointDetails) -> Result<(), MarshalError> {
        if self.endpoint(endpoint.rule()).is_some() {
            return Err(MarshalError::DuplicateRoute {
                rule: endpoint.rule.clone(),
            });
        }

        let mut errors = endpoint.rule_errors();
        errors.extend(endpoint.schema.validate().errors);
        if !errors.is_empty() {
            return Err(MarshalError::InvalidSchema {
                rule: endpoint.rule.clone(),
                errors,
            });
        }

        info!(
            rule = %endpoint.rule,
            inputs = endpoint.schema.inputs.len(),
            parameters = endpoint.schema.parameters.len(),
            cli = endpoint.is_cli_eligible(),
            "registered endpoint"
        );
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Endpoints in registration order.
    pub fn endpoints(&self) -> &[EndpointDetails] {
        &self.endpoints
    }

    pub fn endpoint(&self, rule: &str) -> Option<&EndpointDetails> {
        self.endpoints.iter().find(|e| e.rule == rule)
    }

    /// Endpoints that carry a task schema.
    pub fn cli_endpoints(&self) -> impl Iterator<Item = &EndpointDetails> {
        self.endpoints.iter().filter(|e| e.is_cli_eligible())
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.endpoints.iter().map(EndpointDetails::route_info).collect()
    }

    pub fn set_app_metadata(&mut self, metadata: AppMetadata) {
        self.app_metadata = Some(metadata);
    }

    pub fn app_metadata(&self) -> Option<&AppMetadata> {
        self.app_metadata.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::TextResponse;
    use crate::parameter::ParameterDescriptor;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn echo(inputs: &InputValues, _: &ParameterValues) -> anyhow::Result<ResponseBody> {
        let text = inputs.text("t").unwrap_or_default();
        Ok(TextResponse::new(text).into())
    }

    fn text_schema() -> TaskSchema {
        TaskSchema::builder()
            .input(InputSchema::new("t", "Text", InputType::Text))
            .build()
    }

    #[test]
    fn test_register_and_call() {
        let mut registry = EndpointRegistry::new();
        registry
            .register(EndpointDetails::new("/echo", text_schema(), echo).short_title("Echo"))
            .unwrap();

        let endpoint = registry.endpoint("/echo").unwrap();
        let out = endpoint
            .call(&json!({"inputs": {"t": {"text": "hi"}}, "parameters": {}}))
            .unwrap();
        assert_eq!(out, TextResponse::new("hi").into());
    }

    #[test]
    fn test_duplicate_route() {
        let mut registry = EndpointRegistry::new();
        registry
            .register(EndpointDetails::new("/echo", text_schema(), echo))
            .unwrap();
        let err = registry
            .register(EndpointDetails::new("/echo", text_schema(), echo))
            .unwrap_err();
        assert_eq!(err, MarshalError::DuplicateRoute { rule: "/echo".into() });
    }

    #[test]
    fn test_invalid_rule_and_schema_rejected() {
        let mut registry = EndpointRegistry::new();
        let bad_schema = TaskSchema::builder()
            .parameter(ParameterSchema::new("k", "K", ParameterDescriptor::ranged_int(3, 1, None)))
            .build();
        let err = registry
            .register(EndpointDetails::new("echo", bad_schema, echo))
            .unwrap_err();

        let MarshalError::InvalidSchema { rule, errors } = err else {
            panic!("expected InvalidSchema");
        };
        assert_eq!(rule, "echo");
        let codes: Vec<_> = errors.iter().map(|e| e.code).collect();
        assert_eq!(codes, vec![ErrorCode::InvalidRule, ErrorCode::InvertedRange]);
        assert!(registry.endpoints().is_empty());
    }

    #[test]
    fn test_route_pattern_rules_rejected() {
        let mut registry = EndpointRegistry::new();
        for rule in ["/a/*rest", "/a/:id", "/a/{id}", "/a}"] {
            let err = registry
                .register(EndpointDetails::new(rule, text_schema(), echo))
                .unwrap_err();
            let MarshalError::InvalidSchema { errors, .. } = err else {
                panic!("expected InvalidSchema for {}", rule);
            };
            assert_eq!(errors[0].code, ErrorCode::InvalidRule, "{}", rule);
        }
        assert!(registry.endpoints().is_empty());
    }

    #[test]
    fn test_reserved_rule_rejected() {
        let mut registry = EndpointRegistry::new();
        let err = registry
            .register(EndpointDetails::new(ROUTES_PATH, text_schema(), echo))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidSchema);
    }

    #[test]
    fn test_shape_endpoint_infers_schema() {
        let shape = HandlerShape::new()
            .input("t", InputType::Text)
            .parameter("n", ScalarKind::Int);
        let endpoint = EndpointDetails::from_shape("/plain", shape, echo);

        assert!(!endpoint.is_cli_eligible());
        assert!(endpoint.task_schema().is_none());
        assert_eq!(endpoint.schema().input_keys().collect::<Vec<_>>(), vec!["t"]);
        assert_eq!(
            endpoint.schema().parameter("n").map(|p| &p.value),
            Some(&ParameterDescriptor::int(None))
        );

        let sample = endpoint.sample_payload().to_value().unwrap();
        assert_eq!(sample["parameters"], json!({"n": 1}));
    }

    #[test]
    fn test_routes_listing() {
        let mut registry = EndpointRegistry::new();
        registry
            .register(
                EndpointDetails::new("/echo", text_schema(), echo)
                    .short_title("Echo")
                    .order(2),
            )
            .unwrap();
        registry
            .register(EndpointDetails::from_shape(
                "/plain",
                HandlerShape::new().input("t", InputType::Text),
                echo,
            ))
            .unwrap();

        let routes = serde_json::to_value(registry.routes()).unwrap();
        assert_eq!(
            routes,
            json!([
                {
                    "run_task": "/echo",
                    "sample_payload": "/echo/sample_payload",
                    "payload_schema": "/echo/payload_schema",
                    "task_schema": "/echo/task_schema",
                    "short_title": "Echo",
                    "order": 2
                },
                {
                    "run_task": "/plain",
                    "sample_payload": "/plain/sample_payload",
                    "payload_schema": "/plain/payload_schema"
                }
            ])
        );
        assert_eq!(registry.cli_endpoints().count(), 1);
    }

    #[test]
    fn test_handler_error_becomes_failure() {
        let failing = |_: &InputValues, _: &ParameterValues| -> anyhow::Result<ResponseBody> {
            anyhow::bail!("model not loaded")
        };
        let endpoint = EndpointDetails::new("/fail", text_schema(), failing);
        let err = endpoint
            .call(&json!({"inputs": {"t": {"text": "x"}}, "parameters": {}}))
            .unwrap_err();
        assert_eq!(
            err,
            MarshalError::HandlerFailure {
                rule: "/fail".into(),
                message: "model not loaded".into()
            }
        );
    }

    #[test]
    fn test_handler_panic_becomes_failure() {
        let panicking = |_: &InputValues, _: &ParameterValues| -> anyhow::Result<ResponseBody> {
            panic!("index out of bounds")
        };
        let endpoint = EndpointDetails::new("/panic", text_schema(), panicking);
        let err = endpoint
            .call(&json!({"inputs": {"t": {"text": "x"}}, "parameters": {}}))
            .unwrap_err();
        assert!(matches!(err, MarshalError::HandlerFailure { ref message, .. } if message.contains("index out of bounds")));
    }

    #[test]
    fn test_validation_runs_before_handler() {
        let panicking = |_: &InputValues, _: &ParameterValues| -> anyhow::Result<ResponseBody> {
            panic!("must not run")
        };
        let endpoint = EndpointDetails::new("/guarded", text_schema(), panicking);
        let err = endpoint
            .call(&json!({"inputs": {}, "parameters": {}}))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_app_metadata_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.md");
        std::fs::write(&path, "# Demo\nDoes things.").unwrap();

        let metadata = AppMetadata::new("Demo", "Someone", "0.1.0", "")
            .info_from_file(&path)
            .unwrap();
        assert_eq!(metadata.info, "# Demo\nDoes things.");

        let mut registry = EndpointRegistry::new();
        assert!(registry.app_metadata().is_none());
        registry.set_app_metadata(metadata.clone());
        assert_eq!(registry.app_metadata(), Some(&metadata));
    }
}
