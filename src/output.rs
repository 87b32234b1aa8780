//! @ai:module:intent Format check results for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_check_result, format_diagnostic, format_summary
//! @ai:module:depends_on checker, diagnostic
//! @ai:module:stateless true

use crate::checker::CheckResult;
use crate::diagnostic::{Diagnostic, Severity};
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

#[derive(Serialize)]
struct Report<'a> {
    files_checked: usize,
    functions_checked: usize,
    errors: usize,
    warnings: usize,
    aborted: bool,
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a CheckResult> for Report<'a> {
    fn from(result: &'a CheckResult) -> Self {
        Self {
            files_checked: result.files_checked,
            functions_checked: result.functions_checked,
            errors: result.errors(),
            warnings: result.warnings(),
            aborted: result.aborted,
            diagnostics: &result.diagnostics,
        }
    }
}

/// @ai:intent Format check results as a string
/// @ai:post text output holds one diagnostic per line and no summary
/// @ai:effects pure
pub fn format_check_result(result: &CheckResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&Report::from(result)).unwrap_or_default(),
        OutputFormat::JsonPretty => {
            serde_json::to_string_pretty(&Report::from(result)).unwrap_or_default()
        }
        OutputFormat::Text => result
            .diagnostics
            .iter()
            .map(format_diagnostic)
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// @ai:intent Render one diagnostic as `path:line: [category] message`
/// @ai:effects pure
pub fn format_diagnostic(diagnostic: &Diagnostic) -> String {
    let category = format!("[{}]", diagnostic.category);
    let category = match diagnostic.severity {
        Severity::Error => category.red().bold(),
        Severity::Warning => category.yellow().bold(),
        Severity::Info => category.blue(),
    };

    let location = format!(
        "{}:{}:",
        diagnostic.location.file.display(),
        diagnostic.location.line
    );

    format!("{} {} {}", location.dimmed(), category, diagnostic.message)
}

/// @ai:intent Human-readable totals for the end of a text report
/// @ai:effects pure
pub fn format_summary(result: &CheckResult) -> String {
    let mut output = format!(
        "Checked {} files, {} functions\n",
        result.files_checked, result.functions_checked
    );

    if result.aborted {
        output.push_str(&format!("{} run was cancelled\n", "ABORTED".red().bold()));
    }

    if result.passed() {
        output.push_str(&format!("{} No issues found\n", "OK".green().bold()));
    } else {
        output.push_str(&format!(
            "{} errors, {} warnings\n",
            result.errors().to_string().red().bold(),
            result.warnings().to_string().yellow()
        ));
    }

    output
}
