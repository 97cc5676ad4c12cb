//! mlserve Marshalling Library
//!
//! This crate provides the types, schema validation and payload marshalling
//! shared by the mlserve HTTP server and the derived command-line interface.
//!
//! # Overview
//!
//! An endpoint is described by a [`TaskSchema`]: named inputs, each of one
//! [`InputType`], and named parameters, each with a [`ParameterDescriptor`].
//! The same schema is used to:
//!
//! - **Decode** untyped JSON payloads into [`InputValues`] and
//!   [`ParameterValues`], with exact key-set matching and range/enum checks
//! - **Describe** the endpoint through a sample payload and a payload schema
//! - **Derive** one CLI subcommand per endpoint (in `mlserve-cli`)
//!
//! Results are returned as a [`ResponseBody`], encoded on the wire with an
//! `output_type` discriminant.
//!
//! # Example
//!
//! ```
//! use mlserve_spec::{
//!     EndpointDetails, EndpointRegistry, InputSchema, InputType, InputValues,
//!     ParameterDescriptor, ParameterSchema, ParameterValues, ResponseBody, TaskSchema,
//!     TextResponse,
//! };
//! use serde_json::json;
//!
//! fn shout(inputs: &InputValues, params: &ParameterValues) -> anyhow::Result<ResponseBody> {
//!     let text = inputs.text("text").unwrap_or_default();
//!     let times = params.i64("times").unwrap_or(1) as usize;
//!     Ok(TextResponse::new(text.to_uppercase().repeat(times)).into())
//! }
//!
//! let schema = TaskSchema::builder()
//!     .input(InputSchema::new("text", "Text", InputType::Text))
//!     .parameter(ParameterSchema::new(
//!         "times",
//!         "Repetitions",
//!         ParameterDescriptor::ranged_int(1, 3, Some(1)),
//!     ))
//!     .build();
//!
//! let mut registry = EndpointRegistry::new();
//! registry
//!     .register(EndpointDetails::new("/shout", schema, shout).short_title("Shout"))
//!     .unwrap();
//!
//! let endpoint = registry.endpoint("/shout").unwrap();
//! let body = json!({"inputs": {"text": {"text": "hey"}}, "parameters": {"times": 2}});
//! let result = endpoint.call(&body).unwrap();
//! assert_eq!(result.encode()["value"], "HEYHEY");
//!
//! // Out of range values are rejected before the handler runs
//! let body = json!({"inputs": {"text": {"text": "hey"}}, "parameters": {"times": 9}});
//! assert!(endpoint.call(&body).unwrap_err().is_validation());
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error codes, schema validation results and [`MarshalError`]
//! - [`input`]: Input variants and decoded input values
//! - [`parameter`]: Parameter descriptors and decoded parameter values
//! - [`output`]: Output variants and their tagged encoding
//! - [`schema`]: Task schema types and self-validation
//! - [`decode`]: Payload validation and typed construction
//! - [`sample`]: Sample payloads and payload shapes
//! - [`path`]: Pathname well-formedness checks
//! - [`registry`]: Endpoint registry and handler trait
//! - [`templates`]: Ready-made schemas for common endpoints

pub mod decode;
pub mod error;
pub mod input;
pub mod output;
pub mod parameter;
pub mod path;
pub mod registry;
pub mod sample;
pub mod schema;
pub mod templates;

// Re-export commonly used types at the crate root
pub use decode::{decode_input, decode_inputs, decode_parameter, decode_parameters, decode_request, RequestBody};
pub use error::{ErrorCode, MarshalError, PayloadSection, ValidationError, ValidationResult};
pub use input::{
    BatchDirectoryInput, BatchFileInput, BatchTextInput, DirectoryInput, FileInput, Input,
    InputType, InputValues, TextInput,
};
pub use output::{
    BatchDirectoryResponse, BatchFileResponse, BatchTextResponse, DirectoryResponse, FileResponse,
    FileType, MarkdownResponse, OutputType, ResponseBody, TextResponse,
};
pub use parameter::{
    EnumVal, FloatRange, IntRange, ParameterDescriptor, ParameterType, ParameterValue,
    ParameterValues, ScalarKind,
};
pub use path::is_well_formed_path;
pub use registry::{
    AppMetadata, EndpointDetails, EndpointRegistry, Handler, HandlerShape, RouteInfo,
    APP_METADATA_PATH, ROUTES_PATH,
};
pub use sample::{payload_schema, sample_payload};
pub use schema::{InputSchema, ParameterSchema, TaskSchema, TaskSchemaBuilder};
