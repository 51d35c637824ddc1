//! pyproject.toml `[tool.reqs]` fallback

use crate::toml::{finalize, with_file, ReqsToml};
use crate::ConfigResult;
use reqs_core::ReqsError;
use serde::Deserialize;

/// The parts of pyproject.toml reqs reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PyprojectToml {
    #[serde(default)]
    pub project: Option<ProjectTable>,

    #[serde(default)]
    pub tool: ToolTable,
}

/// `[project]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectTable {
    pub name: Option<String>,
}

/// `[tool]` table, other tools' settings ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolTable {
    #[serde(default)]
    pub reqs: Option<ReqsToml>,
}

impl PyprojectToml {
    /// Import name of the project itself (`my-pkg` imports as `my_pkg`)
    pub fn project_module(&self) -> Option<String> {
        self.project
            .as_ref()
            .and_then(|project| project.name.as_deref())
            .map(|name| name.to_ascii_lowercase().replace(|c: char| c == '-' || c == '.', "_"))
    }
}

/// Parse pyproject.toml content
pub fn parse_pyproject(content: &str) -> ConfigResult<PyprojectToml> {
    ::toml::from_str(content).map_err(|e| ReqsError::ConfigParse {
        file: "pyproject.toml".to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

/// Convert the `[tool.reqs]` table, if present, into reqs.toml settings
///
/// The project's own import name is added to the first-party list.
pub fn import_to_reqs_toml(pyproject: &PyprojectToml) -> ConfigResult<Option<ReqsToml>> {
    let Some(config) = pyproject.tool.reqs.clone() else {
        return Ok(None);
    };

    let mut config = finalize(config)?;
    if let Some(module) = pyproject.project_module() {
        if !config.audit.first_party.contains(&module) {
            config.audit.first_party.push(module);
        }
    }
    Ok(Some(config))
}

/// Load and parse pyproject.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<PyprojectToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReqsError::io(format!("Failed to read {}", path), e))?;

    parse_pyproject(&content).map_err(|e| with_file(e, path))
}
