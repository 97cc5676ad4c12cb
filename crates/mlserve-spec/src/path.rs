//! Pathname well-formedness checks for file and directory inputs.
//!
//! Only syntax is checked. Paths name files on the machine running the
//! prediction function, so existence is never checked here.

/// Longest accepted single path component, in bytes.
pub const MAX_COMPONENT_LEN: usize = 255;

/// Checks if a path is syntactically well formed.
pub fn is_well_formed_path(path: &str) -> bool {
    path_syntax_errors(path).is_empty()
}

/// Returns a message for every syntax problem in `path`.
pub fn path_syntax_errors(path: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if path.is_empty() {
        errors.push("path cannot be empty".to_string());
        return errors;
    }

    if path.contains('\0') {
        errors.push("path must not contain NUL bytes".to_string());
    }

    if let Some(component) = path
        .split(['/', '\\'])
        .find(|c| c.len() > MAX_COMPONENT_LEN)
    {
        errors.push(format!(
            "path component is longer than {} bytes: '{}...'",
            MAX_COMPONENT_LEN,
            component.chars().take(16).collect::<String>()
        ));
    }

    errors
}
