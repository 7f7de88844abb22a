use serde::Serialize;

use iab::process::validate::Validator;
use iab::validate::{ConstraintSet, Issue, IssueId, Severity, ValidationResult};

/// Top-level JSON report for one validated stream.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub input: String,
    pub frames_parsed: u32,
    /// Parse error that ended the frame loop early, if any. A clean end of
    /// stream leaves this unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    /// True when the issue cap stopped validation before the stream ended.
    pub issue_cap_exceeded: bool,
    pub summary: Vec<SetSummary>,
    /// Issues for the selected constraint set, dependency chain included.
    pub issues: Vec<IssueRecord>,
}

#[derive(Debug, Serialize)]
pub struct SetSummary {
    pub constraint_set: &'static str,
    pub result: String,
    pub error_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Serialize)]
pub struct IssueRecord {
    pub frame_index: u32,
    pub constraint_set: &'static str,
    pub severity: &'static str,
    pub code: &'static str,
    pub description: &'static str,
    pub element: String,
}

impl IssueRecord {
    fn from_issue(issue: &Issue) -> Self {
        Self {
            frame_index: issue.frame_index,
            constraint_set: issue.set.name(),
            severity: match issue.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            },
            code: issue.code.name(),
            description: issue.code.description(),
            element: issue_element(issue.id),
        }
    }
}

fn issue_element(id: IssueId) -> String {
    id.to_string()
}

/// Collates the per-set summaries and the selected set's issue list.
pub fn build_report(
    validator: &mut Validator,
    input: String,
    frames_parsed: u32,
    parse_error: Option<String>,
    issue_cap_exceeded: bool,
    selected: ConstraintSet,
) -> ValidationReport {
    let summary = ConstraintSet::ALL
        .into_iter()
        .map(|set| {
            let issues = validator.issues_single_set(set);
            SetSummary {
                constraint_set: set.name(),
                result: result_str(validator.result(set)),
                error_count: issues
                    .iter()
                    .filter(|i| i.severity == Severity::Error)
                    .count(),
                warning_count: issues
                    .iter()
                    .filter(|i| i.severity == Severity::Warning)
                    .count(),
            }
        })
        .collect();

    let issues = validator
        .issues(selected)
        .iter()
        .map(IssueRecord::from_issue)
        .collect();

    ValidationReport {
        input,
        frames_parsed,
        parse_error,
        issue_cap_exceeded,
        summary,
        issues,
    }
}

fn result_str(result: ValidationResult) -> String {
    result.to_string()
}
