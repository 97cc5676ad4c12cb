//! Argument definitions derived from input and parameter schemas.
//!
//! Every schema entry becomes one `--<key>` option. Values are checked by
//! clap while parsing (paths, ranges, enum choices, numeric types) and read
//! back into the JSON shapes the HTTP adapter receives, so both transports
//! share the same decoder.

use clap::builder::{PossibleValue, PossibleValuesParser};
use clap::{value_parser, Arg, ArgAction, ArgMatches, ValueHint};
use mlserve_spec::path::path_syntax_errors;
use mlserve_spec::{
    FloatRange, InputSchema, InputType, IntRange, ParameterDescriptor, ParameterSchema,
    ParameterValue,
};
use serde_json::{json, Value};

/// Builds the option for one input.
///
/// Inputs are always required. Batch inputs take one or more values and may
/// be repeated.
pub fn input_arg(schema: &InputSchema) -> Arg {
    let arg = Arg::new(schema.key.clone())
        .long(schema.key.clone())
        .help(help_text(&schema.label, schema.subtitle.as_deref()))
        .required(true);

    let arg = if schema.input_type.is_batch() {
        arg.num_args(1..).action(ArgAction::Append)
    } else {
        arg.action(ArgAction::Set)
    };

    match schema.input_type {
        InputType::Text | InputType::TextArea | InputType::BatchText => arg.value_name("TEXT"),
        InputType::File | InputType::BatchFile => arg
            .value_name("PATH")
            .value_hint(ValueHint::FilePath)
            .value_parser(parse_path),
        InputType::Directory | InputType::BatchDirectory => arg
            .value_name("DIR")
            .value_hint(ValueHint::DirPath)
            .value_parser(parse_path),
    }
}

/// Builds the option for one parameter.
///
/// A declared default becomes the option's default; otherwise the option is
/// required.
pub fn parameter_arg(schema: &ParameterSchema) -> Arg {
    let arg = Arg::new(schema.key.clone())
        .long(schema.key.clone())
        .help(help_text(&schema.label, schema.subtitle.as_deref()))
        .action(ArgAction::Set);

    let arg = match &schema.value {
        ParameterDescriptor::Text { .. } => arg.value_name("TEXT"),
        ParameterDescriptor::Enum { enum_vals, .. } => {
            arg.value_parser(PossibleValuesParser::new(
                enum_vals
                    .iter()
                    .map(|val| PossibleValue::new(val.key.clone()).help(val.label.clone())),
            ))
        }
        ParameterDescriptor::Float { .. } => arg
            .value_name("FLOAT")
            .allow_negative_numbers(true)
            .value_parser(value_parser!(f64)),
        ParameterDescriptor::RangedFloat { range, .. } => {
            let range = *range;
            arg.value_name("FLOAT")
                .allow_negative_numbers(true)
                .value_parser(move |value: &str| parse_ranged_float(value, range))
        }
        ParameterDescriptor::Int { .. } => arg
            .value_name("INT")
            .allow_negative_numbers(true)
            .value_parser(parse_int),
        ParameterDescriptor::RangedInt { range, .. } => {
            let range = *range;
            arg.value_name("INT")
                .allow_negative_numbers(true)
                .value_parser(move |value: &str| parse_ranged_int(value, range))
        }
    };

    match schema.value.default_value() {
        Some(default) => arg.default_value(default_literal(&default)).required(false),
        None => arg.required(true),
    }
}

/// Reads a parsed input back into its wire shape.
///
/// Returns `None` when the option is absent.
pub fn input_value(schema: &InputSchema, matches: &ArgMatches) -> Option<Value> {
    let key = schema.key.as_str();
    let value = match schema.input_type {
        InputType::Text | InputType::TextArea => json!({ "text": matches.get_one::<String>(key)? }),
        InputType::File | InputType::Directory => json!({ "path": matches.get_one::<String>(key)? }),
        InputType::BatchText => json!({ "texts": elements(matches, key, "text")? }),
        InputType::BatchFile => json!({ "files": elements(matches, key, "path")? }),
        InputType::BatchDirectory => json!({ "directories": elements(matches, key, "path")? }),
    };
    Some(value)
}

/// Reads a parsed parameter back into its wire value.
///
/// Returns `None` when the option is absent and has no default.
pub fn parameter_value(schema: &ParameterSchema, matches: &ArgMatches) -> Option<Value> {
    let key = schema.key.as_str();
    let value = match &schema.value {
        ParameterDescriptor::Text { .. } | ParameterDescriptor::Enum { .. } => {
            json!(matches.get_one::<String>(key)?)
        }
        ParameterDescriptor::Float { .. } | ParameterDescriptor::RangedFloat { .. } => {
            json!(matches.get_one::<f64>(key)?)
        }
        ParameterDescriptor::Int { .. } | ParameterDescriptor::RangedInt { .. } => {
            json!(matches.get_one::<i64>(key)?)
        }
    };
    Some(value)
}

fn elements(matches: &ArgMatches, key: &str, field: &str) -> Option<Vec<Value>> {
    let values = matches.get_many::<String>(key)?;
    Some(values.map(|value| json!({ field: value })).collect())
}

fn help_text(label: &str, subtitle: Option<&str>) -> String {
    subtitle.unwrap_or(label).to_string()
}

/// Formats a default so that the option's own parser reads it back.
fn default_literal(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Text(s) | ParameterValue::Enum(s) => s.clone(),
        ParameterValue::Float(f) | ParameterValue::RangedFloat(f) => f.to_string(),
        ParameterValue::Int(i) | ParameterValue::RangedInt(i) => i.to_string(),
    }
}

fn parse_path(value: &str) -> Result<String, String> {
    let errors = path_syntax_errors(value);
    if errors.is_empty() {
        Ok(value.to_string())
    } else {
        Err(errors.join("; "))
    }
}

fn parse_ranged_float(value: &str, range: FloatRange) -> Result<f64, String> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if range.contains(parsed) {
        Ok(parsed)
    } else {
        Err(format!(
            "{} is not in the range [{}, {}]",
            parsed, range.min, range.max
        ))
    }
}

/// Parses an integer, accepting integral floats (`3.0`) as HTTP does.
fn parse_int(value: &str) -> Result<i64, String> {
    let trimmed = value.trim();
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return Ok(parsed);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
        .map(|f| f as i64)
        .ok_or_else(|| format!("'{}' is not an integer", value))
}

fn parse_ranged_int(value: &str, range: IntRange) -> Result<i64, String> {
    let parsed = parse_int(value)?;
    if range.contains(parsed) {
        Ok(parsed)
    } else {
        Err(format!(
            "{} is not in the range [{}, {}]",
            parsed, range.min, range.max
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::Command;
    use mlserve_spec::EnumVal;
    use pretty_assertions::assert_eq;

    fn command_with(args: impl IntoIterator<Item = Arg>) -> Command {
        Command::new("test").no_binary_name(true).args(args)
    }

    #[test]
    fn test_parse_ranged_float_bounds() {
        let range = FloatRange::new(0.0, 1.0);
        assert_eq!(parse_ranged_float("0", range), Ok(0.0));
        assert_eq!(parse_ranged_float("1.0", range), Ok(1.0));
        assert!(parse_ranged_float("1.5", range).is_err());
        assert!(parse_ranged_float("nan", range).is_err());
        assert!(parse_ranged_float("abc", range).is_err());
    }

    #[test]
    fn test_parse_ranged_int_bounds() {
        let range = IntRange::new(-2, 2);
        assert_eq!(parse_ranged_int("-2", range), Ok(-2));
        assert_eq!(parse_ranged_int("2", range), Ok(2));
        assert!(parse_ranged_int("3", range).is_err());
        assert!(parse_ranged_int("1.5", range).is_err());
    }

    #[test]
    fn test_int_accepts_integral_float() {
        assert_eq!(parse_int("3.0"), Ok(3));
        assert_eq!(parse_int("-4"), Ok(-4));
        assert!(parse_int("3.5").is_err());
        assert!(parse_int("inf").is_err());
        assert_eq!(parse_ranged_int("2.0", IntRange::new(0, 8)), Ok(2));

        let schema = ParameterSchema::new("n", "Count", ParameterDescriptor::int(None));
        let matches = command_with([parameter_arg(&schema)])
            .try_get_matches_from(["--n", "3.0"])
            .unwrap();
        assert_eq!(parameter_value(&schema, &matches), Some(json!(3)));
    }

    #[test]
    fn test_parse_path() {
        assert_eq!(parse_path("data/a.txt"), Ok("data/a.txt".to_string()));
        assert!(parse_path("").is_err());
        assert!(parse_path(&"x".repeat(300)).is_err());
    }

    #[test]
    fn test_default_literal_round_trips() {
        assert_eq!(default_literal(&ParameterValue::RangedFloat(0.5)), "0.5");
        assert_eq!(default_literal(&ParameterValue::Float(1.0)), "1");
        assert_eq!(default_literal(&ParameterValue::Int(-3)), "-3");
        assert_eq!(default_literal(&ParameterValue::Enum("upper".into())), "upper");
    }

    #[test]
    fn test_batch_input_reads_back_wire_shape() {
        let schema = InputSchema::new("files", "Files", InputType::BatchFile);
        let matches = command_with([input_arg(&schema)])
            .try_get_matches_from(["--files", "a.txt", "b.txt", "--files", "c.txt"])
            .unwrap();

        assert_eq!(
            input_value(&schema, &matches),
            Some(json!({"files": [{"path": "a.txt"}, {"path": "b.txt"}, {"path": "c.txt"}]}))
        );
    }

    #[test]
    fn test_scalar_inputs_read_back_wire_shape() {
        let text = InputSchema::new("t", "Text", InputType::TextArea);
        let dir = InputSchema::new("d", "Dir", InputType::Directory);
        let matches = command_with([input_arg(&text), input_arg(&dir)])
            .try_get_matches_from(["--t", "hello there", "--d", "out/"])
            .unwrap();

        assert_eq!(input_value(&text, &matches), Some(json!({"text": "hello there"})));
        assert_eq!(input_value(&dir, &matches), Some(json!({"path": "out/"})));
    }

    #[test]
    fn test_input_is_required() {
        let schema = InputSchema::new("t", "Text", InputType::Text);
        let err = command_with([input_arg(&schema)])
            .try_get_matches_from(Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parameter_default_applies() {
        let schema = ParameterSchema::new(
            "p",
            "Threshold",
            ParameterDescriptor::ranged_float(0.0, 1.0, Some(0.25)),
        );
        let matches = command_with([parameter_arg(&schema)])
            .try_get_matches_from(Vec::<String>::new())
            .unwrap();
        assert_eq!(parameter_value(&schema, &matches), Some(json!(0.25)));
    }

    #[test]
    fn test_parameter_without_default_is_required() {
        let schema = ParameterSchema::new("n", "Count", ParameterDescriptor::int(None));
        let err = command_with([parameter_arg(&schema)])
            .try_get_matches_from(Vec::<String>::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_negative_numbers_accepted() {
        let schema = ParameterSchema::new(
            "offset",
            "Offset",
            ParameterDescriptor::ranged_float(-1.0, 1.0, None),
        );
        let matches = command_with([parameter_arg(&schema)])
            .try_get_matches_from(["--offset", "-0.5"])
            .unwrap();
        assert_eq!(parameter_value(&schema, &matches), Some(json!(-0.5)));
    }

    #[test]
    fn test_enum_choices_enforced() {
        let schema = ParameterSchema::new(
            "case",
            "Case",
            ParameterDescriptor::enumeration(
                vec![EnumVal::new("upper", "Upper"), EnumVal::new("lower", "Lower")],
                Some("upper"),
            ),
        );
        let command = command_with([parameter_arg(&schema)]);

        let matches = command.clone().try_get_matches_from(["--case", "lower"]).unwrap();
        assert_eq!(parameter_value(&schema, &matches), Some(json!("lower")));

        let err = command.try_get_matches_from(["--case", "title"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_ranged_int_rejected_at_parse() {
        let schema = ParameterSchema::new(
            "depth",
            "Depth",
            ParameterDescriptor::ranged_int(0, 8, Some(1)),
        );
        let err = command_with([parameter_arg(&schema)])
            .try_get_matches_from(["--depth", "9"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_help_prefers_subtitle() {
        let schema = InputSchema::new("t", "Text", InputType::Text).with_subtitle("Text to score");
        let arg = input_arg(&schema);
        assert_eq!(arg.get_help().map(|h| h.to_string()), Some("Text to score".to_string()));
    }
}
