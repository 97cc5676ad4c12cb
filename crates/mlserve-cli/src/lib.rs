//! mlserve CLI library
//!
//! Derives a command-line interface from an [`EndpointRegistry`]: one
//! subcommand per endpoint that declares a task schema, one `--<key>` option
//! per input and parameter.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use clap::Command;
//! use mlserve_cli::{render, MlCli};
//! use mlserve_spec::{
//!     EndpointDetails, EndpointRegistry, InputSchema, InputType, InputValues, ParameterValues,
//!     ResponseBody, TaskSchema, TextResponse,
//! };
//!
//! fn reverse(inputs: &InputValues, _: &ParameterValues) -> anyhow::Result<ResponseBody> {
//!     let text = inputs.text("text").unwrap_or_default();
//!     Ok(TextResponse::new(text.chars().rev().collect::<String>()).into())
//! }
//!
//! let mut registry = EndpointRegistry::new();
//! let schema = TaskSchema::builder()
//!     .input(InputSchema::new("text", "Text", InputType::Text))
//!     .build();
//! registry
//!     .register(EndpointDetails::new("/text/reverse", schema, reverse))
//!     .unwrap();
//!
//! let cli = MlCli::new(Arc::new(registry), Command::new("demo"))
//!     .configure()
//!     .unwrap();
//! let matches = cli
//!     .try_get_matches_from(["demo", "text_reverse", "--text", "abc"])
//!     .unwrap();
//! let output = cli.bind(&matches).unwrap().unwrap().execute().unwrap();
//! assert_eq!(render(&output, false), "cba\n");
//! ```
//!
//! [`EndpointRegistry`]: mlserve_spec::EndpointRegistry

pub mod args;
pub mod demo;
pub mod engine;
pub mod logging;
pub mod print;

pub use demo::demo_registry;
pub use engine::{subcommand_name, ConfiguredCli, Invocation, MlCli};
pub use logging::{init_logging, LogHandle};
pub use print::render;
