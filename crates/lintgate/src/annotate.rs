//! Maps engine diagnostics to check-run annotations and a verdict.

use std::path::Path;

use scm::{AnnotationLevel, CheckAnnotation, Conclusion};

use crate::actions;
use crate::eslint::{LintMessage, LintReport, SEVERITY_ERROR, SEVERITY_WARNING};

/// The outcome of mapping one lint report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub conclusion: Conclusion,
    pub summary: String,
    pub annotations: Vec<CheckAnnotation>,
}

/// Map an engine severity code to an annotation level.
///
/// Severity 0 should not appear in a report since the engine only emits
/// warnings and errors, but an unknown code must not crash the run.
#[must_use]
pub fn level_for(severity: u8) -> AnnotationLevel {
    match severity {
        SEVERITY_ERROR => AnnotationLevel::Failure,
        SEVERITY_WARNING => AnnotationLevel::Warning,
        _ => AnnotationLevel::Notice,
    }
}

/// Rebase an engine-side absolute path onto the checkout root.
///
/// Paths outside the workspace are passed through untouched.
#[must_use]
pub fn relative_path(path: &str, workspace: &Path) -> String {
    Path::new(path)
        .strip_prefix(workspace)
        .map_or_else(|_| path.to_string(), |p| p.to_string_lossy().into_owned())
}

/// Build the conclusion, summary and annotation list for a report.
///
/// Annotations are derived 1:1 from diagnostics in engine-reported order;
/// warnings alone never fail the run.
#[must_use]
pub fn build_verdict(report: &LintReport, workspace: &Path) -> Verdict {
    let mut annotations = Vec::new();
    for file in &report.files {
        let path = relative_path(&file.file_path, workspace);
        for message in &file.messages {
            annotations.push(annotation_for(&path, message));
        }
    }

    let conclusion = if report.error_count > 0 {
        Conclusion::Failure
    } else {
        Conclusion::Success
    };
    let summary = format!(
        "{} error(s), {} warning(s) found",
        report.error_count, report.warning_count
    );

    Verdict {
        conclusion,
        summary,
        annotations,
    }
}

fn annotation_for(path: &str, message: &LintMessage) -> CheckAnnotation {
    let end_line = message.end_line.unwrap_or(message.line);
    let end_column = message.end_column.unwrap_or(message.column);
    // the checks API rejects column fields on multi-line spans
    let (start_column, end_column) = if message.line == end_line {
        (Some(message.column), Some(end_column))
    } else {
        (None, None)
    };

    CheckAnnotation {
        path: path.to_string(),
        start_line: message.line,
        end_line,
        start_column,
        end_column,
        annotation_level: level_for(message.severity),
        title: message.rule_id.clone(),
        message: message.message.clone(),
    }
}

/// Emit the grouped per-file diagnostic log, one group per file.
pub fn log_report(report: &LintReport, workspace: &Path) {
    for file in &report.files {
        if file.messages.is_empty() {
            continue;
        }
        let path = relative_path(&file.file_path, workspace);
        actions::group(&path);
        for message in &file.messages {
            let text = match &message.rule_id {
                Some(rule) => format!("{} ({rule})", message.message),
                None => message.message.clone(),
            };
            actions::annotate(
                level_for(message.severity),
                &path,
                message.line,
                message.column,
                &text,
            );
        }
        actions::end_group();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eslint::FileReport;

    fn message(severity: u8, line: u32) -> LintMessage {
        LintMessage {
            rule_id: Some("no-console".to_string()),
            severity,
            message: "Unexpected console statement.".to_string(),
            line,
            end_line: None,
            column: 5,
            end_column: None,
        }
    }

    fn report_with(messages: Vec<LintMessage>, errors: u32, warnings: u32) -> LintReport {
        LintReport::from_files(vec![FileReport {
            file_path: "/work/repo/src/a.ts".to_string(),
            messages,
            error_count: errors,
            warning_count: warnings,
        }])
    }

    #[test]
    fn severity_mapping() {
        assert_eq!(level_for(2), AnnotationLevel::Failure);
        assert_eq!(level_for(1), AnnotationLevel::Warning);
        assert_eq!(level_for(0), AnnotationLevel::Notice);
        assert_eq!(level_for(9), AnnotationLevel::Notice);
    }

    #[test]
    fn missing_end_positions_clamp_to_start() {
        let report = report_with(vec![message(2, 3)], 1, 0);
        let verdict = build_verdict(&report, Path::new("/work/repo"));

        let annotation = &verdict.annotations[0];
        assert_eq!(annotation.start_line, 3);
        assert_eq!(annotation.end_line, 3);
        assert_eq!(annotation.start_column, Some(5));
        assert_eq!(annotation.end_column, Some(5));
    }

    #[test]
    fn multi_line_span_drops_columns() {
        let mut long = message(2, 3);
        long.end_line = Some(6);
        let report = report_with(vec![long], 1, 0);
        let verdict = build_verdict(&report, Path::new("/work/repo"));

        let annotation = &verdict.annotations[0];
        assert_eq!(annotation.end_line, 6);
        assert_eq!(annotation.start_column, None);
        assert_eq!(annotation.end_column, None);
    }

    #[test]
    fn paths_are_rebased_onto_the_workspace() {
        let report = report_with(vec![message(1, 1)], 0, 1);
        let verdict = build_verdict(&report, Path::new("/work/repo"));
        assert_eq!(verdict.annotations[0].path, "src/a.ts");

        assert_eq!(
            relative_path("/elsewhere/src/a.ts", Path::new("/work/repo")),
            "/elsewhere/src/a.ts"
        );
    }

    #[test]
    fn warnings_alone_do_not_fail() {
        let report = report_with(vec![message(1, 1), message(1, 2)], 0, 2);
        let verdict = build_verdict(&report, Path::new("/work/repo"));
        assert_eq!(verdict.conclusion, Conclusion::Success);
        assert_eq!(verdict.summary, "0 error(s), 2 warning(s) found");
        assert_eq!(verdict.annotations.len(), 2);
    }

    #[test]
    fn errors_fail_the_run() {
        let report = report_with(
            vec![message(2, 1), message(2, 2), message(2, 3), message(1, 4)],
            3,
            1,
        );
        let verdict = build_verdict(&report, Path::new("/work/repo"));
        assert_eq!(verdict.conclusion, Conclusion::Failure);
        assert_eq!(verdict.summary, "3 error(s), 1 warning(s) found");
    }

    #[test]
    fn mapping_is_deterministic() {
        let report = report_with(vec![message(2, 1), message(1, 2)], 1, 1);
        let first = build_verdict(&report, Path::new("/work/repo"));
        let second = build_verdict(&report, Path::new("/work/repo"));
        assert_eq!(first.conclusion, second.conclusion);
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.annotations, second.annotations);
    }
}
