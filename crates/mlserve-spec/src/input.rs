//! Input variant types.
//!
//! The wire form of an input carries no discriminant: which variant a value
//! decodes into is decided by the `input_type` declared in the task schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Input kind declared by an [`InputSchema`](crate::schema::InputSchema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// A single file path.
    File,
    /// A single directory path.
    Directory,
    /// A short piece of text.
    Text,
    /// A long piece of text (rendered as a text area).
    TextArea,
    /// One or more file paths.
    BatchFile,
    /// One or more pieces of text.
    BatchText,
    /// One or more directory paths.
    BatchDirectory,
}

impl InputType {
    /// Returns the input type as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::File => "file",
            InputType::Directory => "directory",
            InputType::Text => "text",
            InputType::TextArea => "textarea",
            InputType::BatchFile => "batchfile",
            InputType::BatchText => "batchtext",
            InputType::BatchDirectory => "batchdirectory",
        }
    }

    /// Returns all input types.
    pub fn all() -> &'static [InputType] {
        &[
            InputType::File,
            InputType::Directory,
            InputType::Text,
            InputType::TextArea,
            InputType::BatchFile,
            InputType::BatchText,
            InputType::BatchDirectory,
        ]
    }

    /// Checks if this kind accepts one or more values.
    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            InputType::BatchFile | InputType::BatchText | InputType::BatchDirectory
        )
    }

    /// Checks if values of this kind are filesystem paths.
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            InputType::File
                | InputType::Directory
                | InputType::BatchFile
                | InputType::BatchDirectory
        )
    }
}

impl std::fmt::Display for InputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextInput {
    pub text: String,
}

/// A file path. Existence is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileInput {
    pub path: String,
}

/// A directory path. Existence is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryInput {
    pub path: String,
}

/// A non-empty batch of texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchTextInput {
    pub texts: Vec<TextInput>,
}

/// A non-empty batch of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFileInput {
    pub files: Vec<FileInput>,
}

/// A non-empty batch of directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchDirectoryInput {
    pub directories: Vec<DirectoryInput>,
}

/// A decoded input value.
///
/// Serializes to the bare wire shape (no discriminant), which is exactly what
/// a client sends for the matching `input_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Input {
    Text(TextInput),
    TextArea(TextInput),
    File(FileInput),
    Directory(DirectoryInput),
    BatchText(BatchTextInput),
    BatchFile(BatchFileInput),
    BatchDirectory(BatchDirectoryInput),
}

impl Input {
    /// Returns the input kind this value was decoded as.
    pub fn input_type(&self) -> InputType {
        match self {
            Input::Text(_) => InputType::Text,
            Input::TextArea(_) => InputType::TextArea,
            Input::File(_) => InputType::File,
            Input::Directory(_) => InputType::Directory,
            Input::BatchText(_) => InputType::BatchText,
            Input::BatchFile(_) => InputType::BatchFile,
            Input::BatchDirectory(_) => InputType::BatchDirectory,
        }
    }

    /// Builds a batch of texts.
    pub fn batch_text<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Input::BatchText(BatchTextInput {
            texts: texts
                .into_iter()
                .map(|text| TextInput { text: text.into() })
                .collect(),
        })
    }

    /// Builds a batch of files.
    pub fn batch_file<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Input::BatchFile(BatchFileInput {
            files: paths
                .into_iter()
                .map(|path| FileInput { path: path.into() })
                .collect(),
        })
    }

    /// Builds a batch of directories.
    pub fn batch_directory<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Input::BatchDirectory(BatchDirectoryInput {
            directories: paths
                .into_iter()
                .map(|path| DirectoryInput { path: path.into() })
                .collect(),
        })
    }
}

/// Decoded inputs keyed by schema key, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InputValues(IndexMap<String, Input>);

impl InputValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, input: Input) {
        self.0.insert(key.into(), input);
    }

    pub fn get(&self, key: &str) -> Option<&Input> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Input)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text of a `text` or `textarea` input.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            Input::Text(t) | Input::TextArea(t) => Some(&t.text),
            _ => None,
        }
    }

    /// Path of a `file` input.
    pub fn file(&self, key: &str) -> Option<&FileInput> {
        match self.get(key)? {
            Input::File(f) => Some(f),
            _ => None,
        }
    }

    /// Path of a `directory` input.
    pub fn directory(&self, key: &str) -> Option<&DirectoryInput> {
        match self.get(key)? {
            Input::Directory(d) => Some(d),
            _ => None,
        }
    }

    pub fn batch_text(&self, key: &str) -> Option<&[TextInput]> {
        match self.get(key)? {
            Input::BatchText(b) => Some(&b.texts),
            _ => None,
        }
    }

    pub fn batch_file(&self, key: &str) -> Option<&[FileInput]> {
        match self.get(key)? {
            Input::BatchFile(b) => Some(&b.files),
            _ => None,
        }
    }

    pub fn batch_directory(&self, key: &str) -> Option<&[DirectoryInput]> {
        match self.get(key)? {
            Input::BatchDirectory(b) => Some(&b.directories),
            _ => None,
        }
    }
}

impl FromIterator<(String, Input)> for InputValues {
    fn from_iter<T: IntoIterator<Item = (String, Input)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_input_type_serde_names() {
        for input_type in InputType::all() {
            let value = serde_json::to_value(input_type).unwrap();
            assert_eq!(value, json!(input_type.as_str()));
            let parsed: InputType = serde_json::from_value(value).unwrap();
            assert_eq!(parsed, *input_type);
        }
    }

    #[test]
    fn test_batch_and_path_flags() {
        assert!(InputType::BatchDirectory.is_batch());
        assert!(!InputType::TextArea.is_batch());
        assert!(InputType::BatchFile.is_path());
        assert!(!InputType::BatchText.is_path());
    }

    #[test]
    fn test_input_serializes_without_discriminant() {
        let input = Input::batch_file(["a.txt", "b.txt"]);
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"files": [{"path": "a.txt"}, {"path": "b.txt"}]})
        );

        let input = Input::TextArea(TextInput {
            text: "long".into(),
        });
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({"text": "long"}));
    }

    #[test]
    fn test_typed_accessors() {
        let mut values = InputValues::new();
        values.insert("t", Input::TextArea(TextInput { text: "hi".into() }));
        values.insert("dirs", Input::batch_directory(["/a", "/b"]));

        assert_eq!(values.text("t"), Some("hi"));
        assert_eq!(values.batch_directory("dirs").map(<[_]>::len), Some(2));
        assert!(values.batch_file("dirs").is_none());
        assert!(values.text("missing").is_none());
    }
}
