//! Derivation of a clap command tree from an endpoint registry.
//!
//! The engine moves through three states:
//!
//! 1. [`MlCli`]: the registry and a base [`Command`], nothing derived yet
//! 2. [`ConfiguredCli`]: one subcommand per schema-bearing endpoint
//! 3. [`Invocation`]: a selected endpoint with decoded inputs and parameters
//!
//! [`Invocation::execute`] then runs the prediction function.

use std::collections::HashSet;
use std::ffi::OsString;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{ArgMatches, Command};
use mlserve_spec::{
    decode_inputs, decode_parameters, EndpointDetails, EndpointRegistry, ErrorCode, MarshalError,
    RequestBody, ResponseBody, TaskSchema, ValidationError,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::args;

/// Flag names clap reserves on every subcommand.
const RESERVED_FLAGS: &[&str] = &["help"];
// clap generates a `help` subcommand whenever subcommands exist.
const RESERVED_SUBCOMMANDS: &[&str] = &["help"];

/// Returns the subcommand name for a rule: leading `/` stripped, remaining
/// `/` replaced by `_`.
pub fn subcommand_name(rule: &str) -> String {
    rule.strip_prefix('/').unwrap_or(rule).replace('/', "_")
}

/// A registry waiting to be turned into subcommands.
pub struct MlCli {
    registry: Arc<EndpointRegistry>,
    command: Command,
}

impl MlCli {
    /// Creates an engine that adds subcommands to `command`.
    ///
    /// Subcommands already present on `command` are kept and take precedence
    /// over endpoint names.
    pub fn new(registry: Arc<EndpointRegistry>, command: Command) -> Self {
        Self { registry, command }
    }

    /// Adds one subcommand per schema-bearing endpoint.
    ///
    /// # Errors
    /// - [`MarshalError::NoCliEligibleEndpoints`] if no endpoint declares a
    ///   task schema
    /// - [`MarshalError::InvalidSchema`] with [`ErrorCode::FlagConflict`]
    ///   errors if an endpoint's keys or subcommand name cannot be expressed
    ///   on the command line
    pub fn configure(self) -> Result<ConfiguredCli, MarshalError> {
        let mut command = self.command;
        let mut taken: HashSet<String> = command
            .get_subcommands()
            .map(|sub| sub.get_name().to_string())
            .chain(RESERVED_SUBCOMMANDS.iter().map(|name| name.to_string()))
            .collect();
        let mut subcommands = Vec::new();

        for endpoint in self.registry.cli_endpoints() {
            let Some(schema) = endpoint.task_schema() else {
                continue;
            };

            let name = subcommand_name(endpoint.rule());
            let mut errors = flag_conflicts(schema);
            if !taken.insert(name.clone()) {
                errors.insert(
                    0,
                    ValidationError::with_path(
                        ErrorCode::FlagConflict,
                        format!("subcommand '{}' is already taken", name),
                        "rule",
                    ),
                );
            }
            if !errors.is_empty() {
                return Err(MarshalError::InvalidSchema {
                    rule: endpoint.rule().to_string(),
                    errors,
                });
            }

            command = command.subcommand(endpoint_command(&name, endpoint, schema));
            debug!(rule = %endpoint.rule(), subcommand = %name, "derived subcommand");
            subcommands.push(DerivedSubcommand {
                name,
                rule: endpoint.rule().to_string(),
            });
        }

        if subcommands.is_empty() {
            return Err(MarshalError::NoCliEligibleEndpoints);
        }

        Ok(ConfiguredCli {
            registry: self.registry,
            command,
            subcommands,
        })
    }
}

#[derive(Debug, Clone)]
struct DerivedSubcommand {
    name: String,
    rule: String,
}

/// A command tree with one subcommand per schema-bearing endpoint.
pub struct ConfiguredCli {
    registry: Arc<EndpointRegistry>,
    command: Command,
    subcommands: Vec<DerivedSubcommand>,
}

impl ConfiguredCli {
    /// The full command, including subcommands of the base command.
    pub fn command(&self) -> &Command {
        &self.command
    }

    /// Names of the derived subcommands, in registration order.
    pub fn subcommand_names(&self) -> impl Iterator<Item = &str> {
        self.subcommands.iter().map(|sub| sub.name.as_str())
    }

    /// Returns the rule behind a derived subcommand.
    pub fn rule_for(&self, name: &str) -> Option<&str> {
        self.subcommands
            .iter()
            .find(|sub| sub.name == name)
            .map(|sub| sub.rule.as_str())
    }

    /// Parses the process arguments, exiting with usage on failure.
    pub fn get_matches(&self) -> ArgMatches {
        self.command.clone().get_matches()
    }

    /// Parses `args` without exiting.
    pub fn try_get_matches_from<I, T>(&self, args: I) -> Result<ArgMatches, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        self.command.clone().try_get_matches_from(args)
    }

    /// Binds the selected subcommand to its endpoint.
    ///
    /// Returns `Ok(None)` when no subcommand was selected or the selected one
    /// belongs to the base command. Decoding failures are reported as clap
    /// usage errors for the subcommand.
    pub fn bind(&self, matches: &ArgMatches) -> Result<Option<Invocation>, clap::Error> {
        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(None);
        };
        let Some(endpoint) = self
            .rule_for(name)
            .and_then(|rule| self.registry.endpoint(rule))
        else {
            return Ok(None);
        };

        let request = bind_request(endpoint.schema(), sub_matches)
            .map_err(|err| self.usage_error(name, &err))?;

        Ok(Some(Invocation {
            endpoint: endpoint.clone(),
            request,
        }))
    }

    fn usage_error(&self, name: &str, err: &MarshalError) -> clap::Error {
        let mut command = self.command.clone();
        match command.find_subcommand_mut(name) {
            Some(sub) => sub.error(ErrorKind::ValueValidation, err),
            None => command.error(ErrorKind::ValueValidation, err),
        }
    }
}

/// A selected endpoint with its decoded request.
#[derive(Debug, Clone)]
pub struct Invocation {
    endpoint: EndpointDetails,
    request: RequestBody,
}

impl Invocation {
    pub fn rule(&self) -> &str {
        self.endpoint.rule()
    }

    pub fn request(&self) -> &RequestBody {
        &self.request
    }

    /// Runs the prediction function.
    pub fn execute(&self) -> Result<ResponseBody, MarshalError> {
        debug!(rule = %self.rule(), "running handler");
        self.endpoint.invoke(&self.request)
    }
}

fn endpoint_command(name: &str, endpoint: &EndpointDetails, schema: &TaskSchema) -> Command {
    let mut command = Command::new(name.to_string())
        .display_order(usize::try_from(endpoint.display_order()).unwrap_or(0))
        .args(schema.inputs.iter().map(args::input_arg))
        .args(schema.parameters.iter().map(args::parameter_arg));
    if !endpoint.title().is_empty() {
        command = command.about(endpoint.title().to_string());
    }
    command
}

/// Rebuilds the wire payload from parsed options and decodes it.
fn bind_request(schema: &TaskSchema, matches: &ArgMatches) -> Result<RequestBody, MarshalError> {
    let mut inputs = Map::new();
    for input in &schema.inputs {
        if let Some(value) = args::input_value(input, matches) {
            inputs.insert(input.key.clone(), value);
        }
    }

    let mut parameters = Map::new();
    for parameter in &schema.parameters {
        if let Some(value) = args::parameter_value(parameter, matches) {
            parameters.insert(parameter.key.clone(), value);
        }
    }

    Ok(RequestBody {
        inputs: decode_inputs(schema, &Value::Object(inputs))?,
        parameters: decode_parameters(schema, &Value::Object(parameters))?,
    })
}

/// Keys that cannot become distinct `--<key>` options.
fn flag_conflicts(schema: &TaskSchema) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let input_keys: HashSet<&str> = schema.input_keys().collect();

    let keys = schema
        .inputs
        .iter()
        .enumerate()
        .map(|(i, input)| (format!("inputs[{}].key", i), input.key.as_str()))
        .chain(
            schema
                .parameters
                .iter()
                .enumerate()
                .map(|(i, param)| (format!("parameters[{}].key", i), param.key.as_str())),
        );

    for (path, key) in keys {
        if RESERVED_FLAGS.contains(&key) {
            errors.push(ValidationError::with_path(
                ErrorCode::FlagConflict,
                format!("'--{}' is reserved by the CLI", key),
                path,
            ));
        } else if key.starts_with('-') || key.contains(char::is_whitespace) || key.contains('=') {
            errors.push(ValidationError::with_path(
                ErrorCode::FlagConflict,
                format!("'{}' cannot be used as a flag name", key),
                path,
            ));
        }
    }

    for (i, param) in schema.parameters.iter().enumerate() {
        if input_keys.contains(param.key.as_str()) {
            errors.push(ValidationError::with_path(
                ErrorCode::FlagConflict,
                format!("parameter '{}' has the same flag as an input", param.key),
                format!("parameters[{}].key", i),
            ));
        }
    }

    errors
}
