//! Output variant types and their tagged wire encoding.
//!
//! Every encoded output carries an `output_type` discriminant. Batch outputs
//! encode each element with its own discriminant, so an element can be read
//! back on its own.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::MarshalError;

/// Discriminant field name.
pub const OUTPUT_TYPE_FIELD: &str = "output_type";

/// File type hint attached to file outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Img,
    Csv,
    Json,
    Text,
    Audio,
    Video,
    Markdown,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Img => "img",
            FileType::Csv => "csv",
            FileType::Json => "json",
            FileType::Text => "text",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Markdown => "markdown",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A text result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextResponse {
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl TextResponse {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// A file produced by the prediction function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileResponse {
    pub file_type: FileType,
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl FileResponse {
    pub fn new(file_type: FileType, path: impl Into<String>) -> Self {
        Self {
            file_type,
            path: path.into(),
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// A directory produced by the prediction function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryResponse {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl DirectoryResponse {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A markdown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MarkdownResponse {
    pub value: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
}

impl MarkdownResponse {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            title: None,
            subtitle: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTextResponse {
    pub texts: Vec<TextResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchFileResponse {
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDirectoryResponse {
    pub directories: Vec<DirectoryResponse>,
}

/// The single result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Text(TextResponse),
    File(FileResponse),
    Directory(DirectoryResponse),
    Markdown(MarkdownResponse),
    BatchText(BatchTextResponse),
    BatchFile(BatchFileResponse),
    BatchDirectory(BatchDirectoryResponse),
}

/// Output kind, used as the `output_type` discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    Text,
    File,
    Directory,
    Markdown,
    BatchText,
    BatchFile,
    BatchDirectory,
}

impl OutputType {
    /// Returns the discriminant value.
    pub fn tag(&self) -> &'static str {
        match self {
            OutputType::Text => "text",
            OutputType::File => "file",
            OutputType::Directory => "directory",
            OutputType::Markdown => "markdown",
            OutputType::BatchText => "batchtext",
            OutputType::BatchFile => "batchfile",
            OutputType::BatchDirectory => "batchdirectory",
        }
    }

    /// Parses a discriminant value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(OutputType::Text),
            "file" => Some(OutputType::File),
            "directory" => Some(OutputType::Directory),
            "markdown" => Some(OutputType::Markdown),
            "batchtext" => Some(OutputType::BatchText),
            "batchfile" => Some(OutputType::BatchFile),
            "batchdirectory" => Some(OutputType::BatchDirectory),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl ResponseBody {
    /// Returns the output kind.
    pub fn output_type(&self) -> OutputType {
        match self {
            ResponseBody::Text(_) => OutputType::Text,
            ResponseBody::File(_) => OutputType::File,
            ResponseBody::Directory(_) => OutputType::Directory,
            ResponseBody::Markdown(_) => OutputType::Markdown,
            ResponseBody::BatchText(_) => OutputType::BatchText,
            ResponseBody::BatchFile(_) => OutputType::BatchFile,
            ResponseBody::BatchDirectory(_) => OutputType::BatchDirectory,
        }
    }

    /// Encodes the output into its tagged wire object.
    pub fn encode(&self) -> Value {
        match self {
            ResponseBody::Text(t) => encode_text(t),
            ResponseBody::File(f) => encode_file(f),
            ResponseBody::Directory(d) => encode_directory(d),
            ResponseBody::Markdown(m) => json!({
                OUTPUT_TYPE_FIELD: OutputType::Markdown.tag(),
                "value": m.value,
                "title": m.title,
                "subtitle": m.subtitle,
            }),
            ResponseBody::BatchText(b) => json!({
                OUTPUT_TYPE_FIELD: OutputType::BatchText.tag(),
                "texts": b.texts.iter().map(encode_text).collect::<Vec<_>>(),
            }),
            ResponseBody::BatchFile(b) => json!({
                OUTPUT_TYPE_FIELD: OutputType::BatchFile.tag(),
                "files": b.files.iter().map(encode_file).collect::<Vec<_>>(),
            }),
            ResponseBody::BatchDirectory(b) => json!({
                OUTPUT_TYPE_FIELD: OutputType::BatchDirectory.tag(),
                "directories": b.directories.iter().map(encode_directory).collect::<Vec<_>>(),
            }),
        }
    }

    /// Decodes a tagged wire object.
    ///
    /// The discriminant is read first; the remaining fields must match the
    /// selected variant exactly.
    pub fn decode(value: &Value) -> Result<Self, MarshalError> {
        let (output_type, mut fields) = split_tag(value, "output")?;
        let body = match output_type {
            OutputType::Text => ResponseBody::Text(from_fields(fields, "output")?),
            OutputType::File => ResponseBody::File(from_fields(fields, "output")?),
            OutputType::Directory => ResponseBody::Directory(from_fields(fields, "output")?),
            OutputType::Markdown => ResponseBody::Markdown(from_fields(fields, "output")?),
            OutputType::BatchText => {
                let items = take_list(&mut fields, "texts")?;
                let texts = decode_elements(&items, "texts", OutputType::Text, |v, path| {
                    from_fields(v, path)
                })?;
                ensure_consumed(&fields, "output")?;
                ResponseBody::BatchText(BatchTextResponse { texts })
            }
            OutputType::BatchFile => {
                let items = take_list(&mut fields, "files")?;
                let files = decode_elements(&items, "files", OutputType::File, |v, path| {
                    from_fields(v, path)
                })?;
                ensure_consumed(&fields, "output")?;
                ResponseBody::BatchFile(BatchFileResponse { files })
            }
            OutputType::BatchDirectory => {
                let items = take_list(&mut fields, "directories")?;
                let directories =
                    decode_elements(&items, "directories", OutputType::Directory, |v, path| {
                        from_fields(v, path)
                    })?;
                ensure_consumed(&fields, "output")?;
                ResponseBody::BatchDirectory(BatchDirectoryResponse { directories })
            }
        };
        Ok(body)
    }
}

impl From<TextResponse> for ResponseBody {
    fn from(value: TextResponse) -> Self {
        ResponseBody::Text(value)
    }
}

impl From<FileResponse> for ResponseBody {
    fn from(value: FileResponse) -> Self {
        ResponseBody::File(value)
    }
}

impl From<DirectoryResponse> for ResponseBody {
    fn from(value: DirectoryResponse) -> Self {
        ResponseBody::Directory(value)
    }
}

impl From<MarkdownResponse> for ResponseBody {
    fn from(value: MarkdownResponse) -> Self {
        ResponseBody::Markdown(value)
    }
}

impl From<BatchTextResponse> for ResponseBody {
    fn from(value: BatchTextResponse) -> Self {
        ResponseBody::BatchText(value)
    }
}

impl From<BatchFileResponse> for ResponseBody {
    fn from(value: BatchFileResponse) -> Self {
        ResponseBody::BatchFile(value)
    }
}

impl From<BatchDirectoryResponse> for ResponseBody {
    fn from(value: BatchDirectoryResponse) -> Self {
        ResponseBody::BatchDirectory(value)
    }
}

impl Serialize for ResponseBody {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.encode().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ResponseBody {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ResponseBody::decode(&value).map_err(serde::de::Error::custom)
    }
}

fn encode_text(t: &TextResponse) -> Value {
    json!({
        OUTPUT_TYPE_FIELD: OutputType::Text.tag(),
        "value": t.value,
        "title": t.title,
        "subtitle": t.subtitle,
    })
}

fn encode_file(f: &FileResponse) -> Value {
    json!({
        OUTPUT_TYPE_FIELD: OutputType::File.tag(),
        "file_type": f.file_type,
        "path": f.path,
        "title": f.title,
        "subtitle": f.subtitle,
    })
}

fn encode_directory(d: &DirectoryResponse) -> Value {
    json!({
        OUTPUT_TYPE_FIELD: OutputType::Directory.tag(),
        "path": d.path,
        "title": d.title,
        "subtitle": d.subtitle,
    })
}

/// Splits a tagged object into its discriminant and remaining fields.
fn split_tag(value: &Value, path: &str) -> Result<(OutputType, Map<String, Value>), MarshalError> {
    let Some(object) = value.as_object() else {
        return Err(MarshalError::field(
            OUTPUT_TYPE_FIELD,
            path,
            "output must be a JSON object",
        ));
    };
    let mut fields = object.clone();
    let tag = match fields.remove(OUTPUT_TYPE_FIELD) {
        Some(Value::String(tag)) => tag,
        Some(_) => {
            return Err(MarshalError::field(
                OUTPUT_TYPE_FIELD,
                format!("{path}.{OUTPUT_TYPE_FIELD}"),
                "output_type must be a string",
            ))
        }
        None => {
            return Err(MarshalError::field(
                OUTPUT_TYPE_FIELD,
                format!("{path}.{OUTPUT_TYPE_FIELD}"),
                "missing output_type discriminant",
            ))
        }
    };
    let output_type =
        OutputType::from_tag(&tag).ok_or(MarshalError::UnknownVariant { tag })?;
    Ok((output_type, fields))
}

fn from_fields<T: serde::de::DeserializeOwned>(
    fields: Map<String, Value>,
    path: &str,
) -> Result<T, MarshalError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| MarshalError::field(OUTPUT_TYPE_FIELD, path, e.to_string()))
}

fn take_list(fields: &mut Map<String, Value>, name: &str) -> Result<Vec<Value>, MarshalError> {
    match fields.remove(name) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(MarshalError::field(
            OUTPUT_TYPE_FIELD,
            format!("output.{name}"),
            "expected a list",
        )),
        None => Err(MarshalError::field(
            OUTPUT_TYPE_FIELD,
            format!("output.{name}"),
            "missing field",
        )),
    }
}

fn ensure_consumed(fields: &Map<String, Value>, path: &str) -> Result<(), MarshalError> {
    match fields.keys().next() {
        Some(extra) => Err(MarshalError::field(
            OUTPUT_TYPE_FIELD,
            format!("{path}.{extra}"),
            "unknown field",
        )),
        None => Ok(()),
    }
}

fn decode_elements<T>(
    items: &[Value],
    name: &str,
    expected: OutputType,
    decode: impl Fn(Map<String, Value>, &str) -> Result<T, MarshalError>,
) -> Result<Vec<T>, MarshalError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("output.{name}[{i}]");
            let (output_type, fields) = split_tag(item, &path)?;
            if output_type != expected {
                return Err(MarshalError::field(
                    OUTPUT_TYPE_FIELD,
                    format!("{path}.{OUTPUT_TYPE_FIELD}"),
                    format!("expected '{}', got '{}'", expected, output_type),
                ));
            }
            decode(fields, &path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn all_variants() -> Vec<ResponseBody> {
        vec![
            TextResponse::new("hi").with_title("greeting").into(),
            FileResponse::new(FileType::Img, "out.png")
                .with_title("in.png")
                .with_subtitle("resized")
                .into(),
            DirectoryResponse::new("/tmp/out").into(),
            MarkdownResponse::new("# Report").with_title("summary").into(),
            BatchTextResponse {
                texts: vec![TextResponse::new("a"), TextResponse::new("b").with_title("t")],
            }
            .into(),
            BatchFileResponse {
                files: vec![FileResponse::new(FileType::Csv, "a.csv")],
            }
            .into(),
            BatchDirectoryResponse {
                directories: vec![DirectoryResponse::new("/a"), DirectoryResponse::new("/b")],
            }
            .into(),
        ]
    }

    #[test]
    fn test_text_wire_format() {
        let body: ResponseBody = TextResponse::new("processed").with_title("text.txt").into();
        assert_eq!(
            body.encode(),
            json!({
                "output_type": "text",
                "value": "processed",
                "title": "text.txt",
                "subtitle": null
            })
        );
    }

    #[test]
    fn test_batch_elements_keep_their_discriminant() {
        let body: ResponseBody = BatchFileResponse {
            files: vec![FileResponse::new(FileType::Img, "x.img").with_title("a")],
        }
        .into();
        assert_eq!(
            body.encode(),
            json!({
                "output_type": "batchfile",
                "files": [{
                    "output_type": "file",
                    "file_type": "img",
                    "path": "x.img",
                    "title": "a",
                    "subtitle": null
                }]
            })
        );
    }

    #[test]
    fn test_round_trip_every_variant() {
        for body in all_variants() {
            let decoded = ResponseBody::decode(&body.encode()).unwrap();
            assert_eq!(decoded, body);
        }
    }

    #[test]
    fn test_serde_goes_through_encode() {
        for body in all_variants() {
            let text = serde_json::to_string(&body).unwrap();
            let parsed: ResponseBody = serde_json::from_str(&text).unwrap();
            assert_eq!(parsed, body);
        }
    }

    #[test]
    fn test_unknown_discriminant() {
        let err = ResponseBody::decode(&json!({"output_type": "video", "path": "x"})).unwrap_err();
        assert_eq!(
            err,
            MarshalError::UnknownVariant {
                tag: "video".into()
            }
        );
    }

    #[test]
    fn test_missing_optional_fields_decode_as_none() {
        let body = ResponseBody::decode(&json!({"output_type": "directory", "path": "/x"})).unwrap();
        assert_eq!(body, DirectoryResponse::new("/x").into());
    }

    #[test]
    fn test_mismatched_batch_element_rejected() {
        let err = ResponseBody::decode(&json!({
            "output_type": "batchtext",
            "texts": [{"output_type": "markdown", "value": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(err, MarshalError::FieldValidation { ref field, .. } if field == "output.texts[0].output_type"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ResponseBody::decode(&json!({
            "output_type": "text",
            "value": "x",
            "colour": "red"
        }))
        .unwrap_err();
        assert!(matches!(err, MarshalError::FieldValidation { .. }));
    }
}
