//! Configuration layering, fallback logic, and environment overrides

use crate::toml::{ReqsToml, CONFIG_FILE_NAME};
use crate::ConfigResult;
use camino::{Utf8Path, Utf8PathBuf};
use reqs_core::{Level, ReqsError, RuleId};
use std::collections::HashMap;

const ENV_PREFIX: &str = "REQS_";
const ENV_LINT_PREFIX: &str = "REQS_LINT_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Global config file
    Global(Utf8PathBuf),
    /// Project reqs.toml file
    ProjectToml(Utf8PathBuf),
    /// `[tool.reqs]` in pyproject.toml (fallback)
    Pyproject(Utf8PathBuf),
    /// Environment variable
    Environment(String),
    /// CLI flag
    CommandLine,
    /// Nothing found, built-in defaults
    Defaults,
}

/// Merged configuration and the layers it came from
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ReqsToml,
    /// Where the project layer came from
    pub source: ConfigSource,
    /// Every layer that contributed, lowest priority first
    pub sources: Vec<ConfigSource>,
    /// Directory relative paths in the configuration resolve against
    pub root: Utf8PathBuf,
}

impl ConfigSource {
    /// Config file behind this source, if any
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            ConfigSource::Global(path)
            | ConfigSource::ProjectToml(path)
            | ConfigSource::Pyproject(path) => Some(path.as_path()),
            _ => None,
        }
    }
}

impl ResolvedConfig {
    /// Configured manifest path, resolved against the project root
    pub fn manifest_path(&self) -> Utf8PathBuf {
        self.resolve(self.config.manifest_path())
    }

    /// Configured audit roots, the project root when none are set
    pub fn audit_paths(&self) -> Vec<Utf8PathBuf> {
        if self.config.audit.paths.is_empty() {
            return vec![self.root.clone()];
        }
        self.config
            .audit
            .paths
            .iter()
            .map(|path| self.resolve(path))
            .collect()
    }

    fn resolve(&self, path: &str) -> Utf8PathBuf {
        let path = Utf8Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load every layer and merge them
    pub async fn load(&self, cli_overrides: HashMap<String, String>) -> ConfigResult<ResolvedConfig> {
        let mut sources = Vec::new();

        let global = self.load_global_config().await?;
        if global.is_some() {
            if let Some(path) = Self::global_config_path()? {
                sources.push(ConfigSource::Global(path));
            }
        }

        let (project, source) = self.load_project_config().await?;
        sources.push(source.clone());
        let root = source
            .path()
            .and_then(Utf8Path::parent)
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| self.cwd.clone());

        let env_overrides = ConfigLayering::collect_env_overrides();
        let mut env_keys: Vec<&String> = env_overrides
            .keys()
            .filter(|key| ConfigLayering::is_config_key(key))
            .collect();
        env_keys.sort();
        sources.extend(env_keys.into_iter().cloned().map(ConfigSource::Environment));
        if !cli_overrides.is_empty() {
            sources.push(ConfigSource::CommandLine);
        }

        let config = ConfigLayering::merge_configs(global, project, env_overrides, cli_overrides)?;

        Ok(ResolvedConfig {
            config,
            source,
            sources,
            root,
        })
    }

    /// Load project configuration with fallbacks
    pub async fn load_project_config(&self) -> ConfigResult<(ReqsToml, ConfigSource)> {
        // First, try to find reqs.toml
        let reqs_toml_path = self.resolve_config_path(CONFIG_FILE_NAME)?;
        if reqs_toml_path.exists() {
            let config = crate::toml::load_from_file(&reqs_toml_path).await?;
            return Ok((config, ConfigSource::ProjectToml(reqs_toml_path)));
        }

        // Fall back to [tool.reqs] in pyproject.toml
        let pyproject_path = self.resolve_config_path("pyproject.toml")?;
        if pyproject_path.exists() {
            let pyproject = crate::pyproject::load_from_file(&pyproject_path).await?;
            let imported = crate::pyproject::import_to_reqs_toml(&pyproject)
                .map_err(|e| crate::toml::with_file(e, &pyproject_path))?;
            if let Some(config) = imported {
                return Ok((config, ConfigSource::Pyproject(pyproject_path)));
            }
        }

        // No configuration found
        Ok((ReqsToml::default(), ConfigSource::Defaults))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> ConfigResult<Utf8PathBuf> {
        let mut current = self.cwd.as_path();

        loop {
            let config_path = current.join(filename);
            if config_path.exists() {
                return Ok(config_path);
            }

            // Move up one directory
            if let Some(parent) = current.parent() {
                current = parent;
            } else {
                // Reached filesystem root
                break;
            }
        }

        // Return path in current directory even if it doesn't exist
        Ok(self.cwd.join(filename))
    }

    /// Path of the per-user configuration file
    pub fn global_config_path() -> ConfigResult<Option<Utf8PathBuf>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };

        let config_dir = Utf8PathBuf::try_from(config_dir).map_err(|e| ReqsError::ConfigValidation {
            field: "config_dir".to_string(),
            reason: format!("Invalid config directory path: {}", e),
        })?;
        Ok(Some(config_dir.join("reqs").join("config.toml")))
    }

    /// Load global configuration
    pub async fn load_global_config(&self) -> ConfigResult<Option<ReqsToml>> {
        match Self::global_config_path()? {
            Some(path) if path.exists() => Ok(Some(Self::load_global_file(&path).await?)),
            _ => Ok(None),
        }
    }

    /// Load a global config file, anchoring its relative paths to its directory
    pub async fn load_global_file(path: &Utf8Path) -> ConfigResult<ReqsToml> {
        let mut config = crate::toml::load_from_file(path).await?;
        if let Some(dir) = path.parent() {
            ConfigLayering::anchor_paths(&mut config, dir);
        }
        Ok(config)
    }
}

impl ConfigLayering {
    /// Merge multiple configuration layers
    ///
    /// Priority, lowest first: global, project, environment, command line.
    pub fn merge_configs(
        global_config: Option<ReqsToml>,
        project_config: ReqsToml,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<ReqsToml> {
        let mut merged = project_config;

        // Apply global config as base (if present)
        if let Some(global) = global_config {
            if merged.manifest.is_none() {
                merged.manifest = global.manifest;
            }

            for (rule, level) in global.lint {
                merged.lint.entry(rule).or_insert(level);
            }

            let audit = &mut merged.audit;
            if audit.paths.is_empty() {
                audit.paths = global.audit.paths;
            }
            for (module, distribution) in global.audit.aliases {
                audit.aliases.entry(module).or_insert(distribution);
            }
            extend_unique(&mut audit.exclude, global.audit.exclude);
            extend_unique(&mut audit.first_party, global.audit.first_party);
            extend_unique(&mut audit.ignore, global.audit.ignore);
        }

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        crate::toml::validate_config(&merged)?;
        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(config: &mut ReqsToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "REQS_MANIFEST" => {
                    config.manifest = Some(value.clone());
                },
                "REQS_AUDIT_PATHS" => {
                    config.audit.paths = split_list(value);
                },
                key => {
                    if let Some(rule) = key.strip_prefix(ENV_LINT_PREFIX) {
                        let (rule, level) = parse_rule_level(key, rule, value)?;
                        config.set_level(rule, level);
                    }
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    ///
    /// Keys are `manifest`, `audit.paths` and `lint.<rule>`.
    fn apply_cli_overrides(config: &mut ReqsToml, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "manifest" => {
                    config.manifest = Some(value.clone());
                },
                "audit.paths" => {
                    config.audit.paths = split_list(value);
                },
                key => {
                    let rule = key.strip_prefix("lint.").ok_or_else(|| ReqsError::ConfigValidation {
                        field: key.to_string(),
                        reason: "Unknown command-line override".to_string(),
                    })?;
                    let (rule, level) = parse_rule_level(key, rule, value)?;
                    config.set_level(rule, level);
                },
            }
        }

        Ok(())
    }

    /// Make the relative `manifest` and `audit.paths` of a layer absolute
    pub fn anchor_paths(config: &mut ReqsToml, dir: &Utf8Path) {
        let anchor = |path: &mut String| {
            if Utf8Path::new(path.as_str()).is_relative() {
                *path = dir.join(path.as_str()).into_string();
            }
        };
        if let Some(manifest) = config.manifest.as_mut() {
            anchor(manifest);
        }
        config.audit.paths.iter_mut().for_each(anchor);
    }

    /// Environment variable that changes configuration
    pub fn is_config_key(key: &str) -> bool {
        matches!(key, "REQS_MANIFEST" | "REQS_AUDIT_PATHS") || key.starts_with(ENV_LINT_PREFIX)
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_rule_level(field: &str, rule: &str, level: &str) -> ConfigResult<(RuleId, Level)> {
    let invalid = |reason: String| ReqsError::ConfigValidation {
        field: field.to_string(),
        reason,
    };
    let rule = rule.parse::<RuleId>().map_err(|e| invalid(e.to_string()))?;
    let level = level.parse::<Level>().map_err(|e| invalid(e.to_string()))?;
    Ok((rule, level))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn extend_unique(target: &mut Vec<String>, extra: Vec<String>) {
    for item in extra {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
