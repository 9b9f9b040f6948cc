//! Workflow-command output for the GitHub Actions log.
//!
//! These `::command::` lines are an opaque protocol consumed by the runner;
//! they drive log grouping, inline file annotations and problem-matcher
//! registration. Operator diagnostics go through `tracing` instead.

use std::path::Path;

use scm::AnnotationLevel;

/// Escaping for command message data, per the runner contract.
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Property values additionally escape `:` and `,`.
fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

fn issue(command: &str, properties: &[(&str, String)], message: &str) {
    let mut line = format!("::{command}");
    for (index, (key, value)) in properties.iter().enumerate() {
        line.push(if index == 0 { ' ' } else { ',' });
        line.push_str(key);
        line.push('=');
        line.push_str(&escape_property(value));
    }
    line.push_str("::");
    line.push_str(&escape_data(message));
    println!("{line}");
}

/// Open a collapsible log group.
pub fn group(name: &str) {
    issue("group", &[], name);
}

pub fn end_group() {
    issue("endgroup", &[], "");
}

/// Register a problem matcher definition with the runner.
pub fn add_matcher(path: &Path) {
    issue("add-matcher", &[], &path.display().to_string());
}

/// Unregister a problem matcher by owner.
pub fn remove_matcher(owner: &str) {
    issue("remove-matcher", &[("owner", owner.to_string())], "");
}

/// Emit an annotated log line for one diagnostic.
pub fn annotate(level: AnnotationLevel, file: &str, line: u32, col: u32, message: &str) {
    let command = match level {
        AnnotationLevel::Notice => "notice",
        AnnotationLevel::Warning => "warning",
        AnnotationLevel::Failure => "error",
    };
    let properties = [
        ("file", file.to_string()),
        ("line", line.to_string()),
        ("col", col.to_string()),
    ];
    issue(command, &properties, message);
}

/// Emit the failure message shown at the top of the run.
pub fn fail(message: &str) {
    issue("error", &[], message);
}
