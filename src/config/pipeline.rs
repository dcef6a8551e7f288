//! Academic pipeline configuration: student data location and shorthand rules

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Location of the student records
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    /// JSON file with student records. `~` is expanded; relative paths are
    /// resolved against the project directory.
    pub student_data: Option<String>,
}

impl DataConfig {
    /// Default data file inside a project
    pub fn default_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".ace").join("student_data.json")
    }

    /// Resolve the student data path for `project_dir`
    pub fn student_data_path(&self, project_dir: &Path) -> PathBuf {
        match self.student_data {
            Some(ref raw) => {
                let expanded = PathBuf::from(shellexpand::tilde(raw).as_ref());
                if expanded.is_absolute() {
                    expanded
                } else {
                    project_dir.join(expanded)
                }
            }
            None => Self::default_path(project_dir),
        }
    }
}

/// Extra query shorthand rules, applied after the built-in ones
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

/// One `pattern -> replacement` rule
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub pattern: String,
    pub replacement: String,
}
