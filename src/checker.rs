//! @ai:module:intent Check Python files: discovery, parallel analysis and ordered merge
//! @ai:module:layer application
//! @ai:module:public_api check_source, check_file, check_paths, check_paths_with_cancel, discover_files, CheckResult
//! @ai:module:depends_on extractor, fieldlist, analyzer, config, diagnostic, error
//! @ai:module:stateless true

use crate::analyzer::analyze;
use crate::config::CheckConfig;
use crate::diagnostic::{Category, Diagnostic, DiagnosticKind, Severity};
use crate::docfield::FieldKind;
use crate::error::{Error, Result};
use crate::extractor::{extract_file, extract_source, ExtractedFunction};
use crate::fieldlist::parse_docstring;
use crate::signature::Location;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::{DirEntry, WalkDir};

const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];
const MODULE_SCOPE: &str = "<module>";

/// @ai:intent Result of checking a file or a set of files
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CheckResult {
    pub files_checked: usize,
    pub functions_checked: usize,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default)]
    pub aborted: bool,
}

impl CheckResult {
    /// @ai:intent Check if the run found nothing to report
    pub fn passed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// @ai:intent Merge another check result into this one
    pub fn merge(&mut self, other: CheckResult) {
        self.files_checked += other.files_checked;
        self.functions_checked += other.functions_checked;
        self.diagnostics.extend(other.diagnostics);
        self.aborted |= other.aborted;
    }

    /// @ai:intent Put diagnostics in report order: path, line, then per-function order
    /// @ai:post order does not depend on the order results were merged in
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then_with(|| a.function.cmp(&b.function))
                .then_with(|| a.cmp_within_function(b))
        });
    }
}

/// @ai:intent Diagnostics for one extracted function, including invalid reST
/// @ai:effects pure
pub fn check_function(function: &ExtractedFunction, config: &CheckConfig) -> Vec<Diagnostic> {
    if function.suppressed {
        return Vec::new();
    }

    let signature = &function.signature;
    let fields = function.docstring.as_deref().map(parse_docstring);
    let mut diagnostics = analyze(signature, fields.as_ref(), config);

    let first_parse_error = fields
        .as_ref()
        .and_then(|f| f.of_kind(FieldKind::ParseError).next());

    if let Some(field) = first_parse_error {
        if config.reports(Category::InvalidRest) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidRest {
                    line: field.body.clone(),
                },
                &signature.qualified_name,
                signature.location.clone(),
            ));
            diagnostics.sort_by(|a, b| a.cmp_within_function(b));
        }
    }

    diagnostics
}

/// @ai:intent Check Python source text that belongs to `path`
/// @ai:post a source that cannot be parsed yields one invalid-source diagnostic
/// @ai:effects pure
pub fn check_source(source: &str, path: &Path, config: &CheckConfig) -> CheckResult {
    check_extracted(extract_source(source, path, config), path, config, &AtomicBool::new(false))
}

/// @ai:intent Check a single Python file
/// @ai:effects fs:read
pub fn check_file(path: &Path, config: &CheckConfig) -> CheckResult {
    check_file_with_cancel(path, config, &AtomicBool::new(false))
}

fn check_file_with_cancel(path: &Path, config: &CheckConfig, cancel: &AtomicBool) -> CheckResult {
    tracing::debug!("Checking {}", path.display());
    check_extracted(extract_file(path, config), path, config, cancel)
}

fn check_extracted(
    extracted: Result<Vec<ExtractedFunction>>,
    path: &Path,
    config: &CheckConfig,
    cancel: &AtomicBool,
) -> CheckResult {
    let mut result = CheckResult {
        files_checked: 1,
        ..Default::default()
    };

    let functions = match extracted {
        Ok(functions) => functions,
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path.display(), e);
            if config.reports(Category::InvalidSource) {
                result.diagnostics.push(invalid_source(path, &e));
            }
            return result;
        }
    };

    for function in &functions {
        if cancel.load(Ordering::Relaxed) {
            result.aborted = true;
            break;
        }
        result.functions_checked += 1;
        result.diagnostics.extend(check_function(function, config));
    }

    result
}

fn invalid_source(path: &Path, error: &Error) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::InvalidSource {
            reason: error.to_string(),
        },
        MODULE_SCOPE,
        Location::new(path.to_path_buf(), error.line()),
    )
}

/// @ai:intent Expand the given paths into the Python files to check
/// @ai:post explicit file paths are kept; directories are walked for .py/.pyi files
/// @ai:post result is sorted and free of duplicates
/// @ai:effects fs:read
pub fn discover_files(paths: &[PathBuf], config: &CheckConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_skipped_entry(e, config))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if is_python_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn is_skipped_entry(entry: &DirEntry, config: &CheckConfig) -> bool {
    if config.is_excluded(entry.path()) {
        tracing::debug!("Excluded {}", entry.path().display());
        return true;
    }

    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.') || name == "__pycache__")
            .unwrap_or(false)
}

fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| PYTHON_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// @ai:intent Check all Python files under the given paths
/// @ai:effects fs:read
pub fn check_paths(paths: &[PathBuf], config: &CheckConfig) -> Result<CheckResult> {
    check_paths_with_cancel(paths, config, &AtomicBool::new(false))
}

/// @ai:intent Check files in parallel, stopping early once `cancel` is set
/// @ai:post diagnostics are sorted by path, line and per-function order
/// @ai:post `aborted` is set when cancellation skipped any work
/// @ai:effects fs:read
pub fn check_paths_with_cancel(
    paths: &[PathBuf],
    config: &CheckConfig,
    cancel: &AtomicBool,
) -> Result<CheckResult> {
    let files = discover_files(paths, config);
    tracing::info!("Discovered {} Python files", files.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs.unwrap_or(0))
        .build()?;

    let partials: Vec<CheckResult> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                if cancel.load(Ordering::Relaxed) {
                    CheckResult {
                        aborted: true,
                        ..Default::default()
                    }
                } else {
                    check_file_with_cancel(file, config, cancel)
                }
            })
            .collect()
    });

    let mut result = CheckResult::default();
    for partial in partials {
        result.merge(partial);
    }
    result.sort();

    if result.aborted {
        tracing::info!("Run cancelled after {} files", result.files_checked);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn categories(result: &CheckResult) -> Vec<(usize, Category)> {
        result
            .diagnostics
            .iter()
            .map(|d| (d.location.line, d.category))
            .collect()
    }

    #[test]
    fn test_check_source_reports_in_line_order() {
        let source = r#"
def documented(x: int) -> int:
    """Double a number.

    :param x: The number.
    :type x: int
    :returns: Twice x.
    :rtype: int
    """
    return 2 * x

def undocumented(x):
    return x

def drifted(a, b):
    """Drifted.

    :param b: Second.
    :param c: Removed.
    """
"#;
        let result = check_source(source, Path::new("mod.py"), &CheckConfig::default());

        assert_eq!(result.files_checked, 1);
        assert_eq!(result.functions_checked, 3);
        assert_eq!(
            categories(&result),
            vec![
                (12, Category::MissingDocstring),
                (15, Category::MissingParamDoc),
                (15, Category::UnknownParamDoc),
            ]
        );
        assert_eq!(result.diagnostics[1].subject(), Some("a"));
    }

    #[test]
    fn test_suppressed_function_is_skipped() {
        let source = "def f(x):  # noqa_doc\n    pass\n";
        let result = check_source(source, Path::new("mod.py"), &CheckConfig::default());

        assert_eq!(result.functions_checked, 1);
        assert!(result.passed());
    }

    #[test]
    fn test_invalid_rest_reported_once() {
        let source = "def f():\n    \"\"\"Doc.\n\n    :broken field\n    :also broken\n    \"\"\"\n";
        let result = check_source(source, Path::new("mod.py"), &CheckConfig::default());

        assert_eq!(categories(&result), vec![(1, Category::InvalidRest)]);
    }

    #[test]
    fn test_invalid_source_is_file_diagnostic() {
        let result = check_source("def f(:\n", Path::new("bad.py"), &CheckConfig::default());

        assert_eq!(result.files_checked, 1);
        assert_eq!(result.functions_checked, 0);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, Category::InvalidSource);
        assert_eq!(result.diagnostics[0].location.file, PathBuf::from("bad.py"));
    }

    #[test]
    fn test_ignored_categories_are_dropped() {
        let mut config = CheckConfig::default();
        config.ignore_categories.insert(Category::MissingDocstring);
        config.ignore_categories.insert(Category::InvalidSource);

        let result = check_source("def f(x):\n    pass\n", Path::new("mod.py"), &config);
        assert!(result.passed());

        let result = check_source("def f(:\n", Path::new("bad.py"), &config);
        assert!(result.passed());
    }

    #[test]
    fn test_unreadable_file_is_file_diagnostic() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.py");

        let result = check_file(&missing, &CheckConfig::default());

        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].category, Category::InvalidSource);
        assert_eq!(result.diagnostics[0].location.line, 0);
    }

    #[test]
    fn test_discover_files_skips_hidden_cache_and_excluded() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        for sub in ["pkg", ".venv", "__pycache__", "build"] {
            fs::create_dir(root.join(sub)).unwrap();
        }
        fs::write(root.join("pkg/a.py"), "").unwrap();
        fs::write(root.join("pkg/b.pyi"), "").unwrap();
        fs::write(root.join("pkg/readme.txt"), "").unwrap();
        fs::write(root.join(".venv/c.py"), "").unwrap();
        fs::write(root.join("__pycache__/d.py"), "").unwrap();
        fs::write(root.join("build/e.py"), "").unwrap();

        let config = CheckConfig {
            exclude: vec!["build".to_string()],
            ..Default::default()
        };
        let files = discover_files(&[root.to_path_buf(), root.join("pkg/a.py")], &config);

        assert_eq!(files, vec![root.join("pkg/a.py"), root.join("pkg/b.pyi")]);
    }

    #[test]
    fn test_check_paths_sorts_across_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.py"), "def g(y):\n    pass\n").unwrap();
        fs::write(dir.path().join("a.py"), "\n\ndef f(x):\n    pass\n").unwrap();

        let config = CheckConfig {
            jobs: Some(2),
            ..Default::default()
        };
        let result = check_paths(&[dir.path().to_path_buf()], &config).unwrap();

        let order: Vec<_> = result
            .diagnostics
            .iter()
            .map(|d| (d.location.file.clone(), d.location.line))
            .collect();
        assert_eq!(
            order,
            vec![(dir.path().join("a.py"), 3), (dir.path().join("b.py"), 1)]
        );
        assert_eq!(result.files_checked, 2);
        assert!(!result.aborted);
    }

    #[test]
    fn test_cancelled_run_is_marked_aborted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def f(x):\n    pass\n").unwrap();

        let cancel = AtomicBool::new(true);
        let result =
            check_paths_with_cancel(&[dir.path().to_path_buf()], &CheckConfig::default(), &cancel)
                .unwrap();

        assert!(result.aborted);
        assert_eq!(result.functions_checked, 0);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_merge_and_counts() {
        let mut total = check_source("def f(x):\n    pass\n", Path::new("a.py"), &CheckConfig::default());
        total.merge(check_source(
            "def g(a, b):\n    \"\"\"G.\n\n    :param b: B.\n    :param a: A.\n    \"\"\"\n",
            Path::new("b.py"),
            &CheckConfig::default(),
        ));

        assert_eq!(total.files_checked, 2);
        assert_eq!(total.functions_checked, 2);
        assert_eq!(total.errors(), 1);
        assert_eq!(total.warnings(), 1);
        assert!(!total.passed());
    }

    #[test]
    fn test_unicode_indented_docstring_checked_beside_clean_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "def f(x):\n    \"\"\"Doc.\n\n    :param x: X.\n   \u{a0}\n    \"\"\"\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("b.py"),
            "def g(y):\n    \"\"\"Grüße.\n\n    :param y: Ärger.\n    \"\"\"\n",
        )
        .unwrap();

        let result = check_paths(&[dir.path().to_path_buf()], &CheckConfig::default()).unwrap();

        assert_eq!(result.files_checked, 2);
        assert_eq!(result.functions_checked, 2);
        assert!(result.passed());
    }

    #[test]
    fn test_indented_roles_do_not_split_fields() {
        let source = r#"
def f(x: int) -> int:
    """Convert.

    :param x: Value, see
        :func:`other` for details.
    :type x:
        :class:`int`
    :returns: Result.
    :rtype: int
    """
"#;
        let result = check_source(source, Path::new("mod.py"), &CheckConfig::default());

        assert_eq!(result.diagnostics, Vec::new());
    }

    #[test]
    fn test_inline_param_type_with_type_field_is_clean() {
        let source = "def f(x: int):\n    \"\"\"F.\n\n    :param int x: X.\n    :type x: int\n    \"\"\"\n";
        let result = check_source(source, Path::new("mod.py"), &CheckConfig::default());

        assert!(result.passed());
    }
}
