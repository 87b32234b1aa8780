//! @ai:module:intent Configuration passed explicitly into analysis and orchestration
//! @ai:module:layer infrastructure
//! @ai:module:public_api CheckConfig, CONFIG_FILE_NAME
//! @ai:module:depends_on diagnostic, error
//! @ai:module:stateless true

use crate::diagnostic::{Category, Severity};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "rstdoc.toml";
pub const PYPROJECT_FILE_NAME: &str = "pyproject.toml";

/// @ai:intent Options controlling which inconsistencies are reported and how
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    pub ignore_categories: BTreeSet<Category>,
    pub require_rtype_for_none: bool,
    pub missing_rtype_severity: Severity,
    pub include_methods: bool,
    pub suppression_marker: String,
    pub exclude: Vec<String>,
    pub jobs: Option<usize>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            ignore_categories: BTreeSet::new(),
            require_rtype_for_none: false,
            missing_rtype_severity: Severity::Error,
            include_methods: true,
            suppression_marker: default_suppression_marker(),
            exclude: Vec::new(),
            jobs: None,
        }
    }
}

fn default_suppression_marker() -> String {
    "noqa_doc".to_string()
}

#[derive(Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: PyProjectTools,
}

#[derive(Deserialize, Default)]
struct PyProjectTools {
    rstdoc: Option<CheckConfig>,
}

impl CheckConfig {
    /// @ai:intent Check if diagnostics of a category should be reported
    pub fn reports(&self, category: Category) -> bool {
        !self.ignore_categories.contains(&category)
    }

    /// @ai:intent Load configuration from an `rstdoc.toml` file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = read_config(path)?;
        toml::from_str(&content).map_err(|e| config_error(path, e))
    }

    /// @ai:intent Load the `[tool.rstdoc]` table of a pyproject file, if present
    /// @ai:effects fs:read
    pub fn load_pyproject(path: &Path) -> Result<Option<Self>> {
        let content = read_config(path)?;
        let pyproject: PyProject = toml::from_str(&content).map_err(|e| config_error(path, e))?;
        Ok(pyproject.tool.rstdoc)
    }

    /// @ai:intent Find and load configuration for a run rooted at `dir`
    /// @ai:post falls back to defaults when no configuration file applies
    /// @ai:effects fs:read
    pub fn discover(dir: &Path) -> Result<Self> {
        let dedicated = dir.join(CONFIG_FILE_NAME);
        if dedicated.is_file() {
            tracing::debug!("Loading configuration from {}", dedicated.display());
            return Self::load(&dedicated);
        }

        let pyproject = dir.join(PYPROJECT_FILE_NAME);
        if pyproject.is_file() {
            if let Some(config) = Self::load_pyproject(&pyproject)? {
                tracing::debug!("Loading configuration from {}", pyproject.display());
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    /// @ai:intent Check if a discovered path should be skipped
    /// @ai:effects pure
    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| self.exclude.iter().any(|pattern| pattern == name))
            .unwrap_or(false)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: PathBuf::from(path),
        source: e,
    })
}

fn config_error(path: &Path, error: toml::de::Error) -> Error {
    Error::Config {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CheckConfig::default();
        assert!(config.reports(Category::MissingParamDoc));
        assert!(config.include_methods);
        assert_eq!(config.suppression_marker, "noqa_doc");
        assert_eq!(config.missing_rtype_severity, Severity::Error);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "ignore_categories = [\"type-doc-missing\", \"param-order-mismatch\"]\nmissing_rtype_severity = \"warning\"\n",
        )
        .unwrap();

        let config = CheckConfig::load(&path).unwrap();

        assert!(!config.reports(Category::TypeDocMissing));
        assert!(!config.reports(Category::ParamOrderMismatch));
        assert!(config.reports(Category::MissingReturnDoc));
        assert_eq!(config.missing_rtype_severity, Severity::Warning);
        assert!(config.include_methods);
    }

    #[test]
    fn test_unknown_category_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "ignore_categories = [\"spelling\"]\n").unwrap();

        let err = CheckConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_discover_prefers_dedicated_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "include_methods = false\n").unwrap();
        std::fs::write(
            dir.path().join(PYPROJECT_FILE_NAME),
            "[tool.rstdoc]\nrequire_rtype_for_none = true\n",
        )
        .unwrap();

        let config = CheckConfig::discover(dir.path()).unwrap();
        assert!(!config.include_methods);
        assert!(!config.require_rtype_for_none);
    }

    #[test]
    fn test_discover_reads_pyproject_table() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PYPROJECT_FILE_NAME),
            "[project]\nname = \"demo\"\n\n[tool.rstdoc]\nrequire_rtype_for_none = true\nexclude = [\"build\"]\n",
        )
        .unwrap();

        let config = CheckConfig::discover(dir.path()).unwrap();
        assert!(config.require_rtype_for_none);
        assert!(config.is_excluded(Path::new("project/build")));
        assert!(!config.is_excluded(Path::new("project/src")));
    }

    #[test]
    fn test_discover_without_files_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(CheckConfig::discover(dir.path()).unwrap(), CheckConfig::default());
    }
}
