//! Human-readable rendering of prediction outputs.
//!
//! Scalar outputs print their title (if any) on its own line followed by the
//! value or path. Batch outputs print one line per element.

use colored::Colorize;
use mlserve_spec::ResponseBody;

/// Renders `body` for a terminal.
///
/// With `color` off the output contains no escape codes.
pub fn render(body: &ResponseBody, color: bool) -> String {
    let mut out = String::new();
    match body {
        ResponseBody::Text(text) => {
            scalar(&mut out, text.title.as_deref(), text.subtitle.as_deref(), &text.value, color)
        }
        ResponseBody::Markdown(markdown) => scalar(
            &mut out,
            markdown.title.as_deref(),
            markdown.subtitle.as_deref(),
            &markdown.value,
            color,
        ),
        ResponseBody::File(file) => scalar(
            &mut out,
            file.title.as_deref(),
            file.subtitle.as_deref(),
            &file.path,
            color,
        ),
        ResponseBody::Directory(dir) => scalar(
            &mut out,
            dir.title.as_deref(),
            dir.subtitle.as_deref(),
            &dir.path,
            color,
        ),
        ResponseBody::BatchText(batch) => {
            for text in &batch.texts {
                entry(&mut out, text.title.as_deref(), &text.value, color);
            }
        }
        ResponseBody::BatchFile(batch) => {
            for file in &batch.files {
                entry(&mut out, file.title.as_deref(), &file.path, color);
            }
        }
        ResponseBody::BatchDirectory(batch) => {
            for dir in &batch.directories {
                entry(&mut out, dir.title.as_deref(), &dir.path, color);
            }
        }
    }
    out
}

fn scalar(out: &mut String, title: Option<&str>, subtitle: Option<&str>, value: &str, color: bool) {
    if let Some(title) = title {
        out.push_str(&heading(title, color));
        out.push('\n');
    }
    if let Some(subtitle) = subtitle {
        if color {
            out.push_str(&subtitle.dimmed().to_string());
        } else {
            out.push_str(subtitle);
        }
        out.push('\n');
    }
    out.push_str(value);
    out.push('\n');
}

fn entry(out: &mut String, title: Option<&str>, value: &str, color: bool) {
    if let Some(title) = title {
        out.push_str(&heading(&format!("{}:", title), color));
        out.push(' ');
    }
    out.push_str(value);
    out.push('\n');
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.cyan().bold().to_string()
    } else {
        text.to_string()
    }
}
