//! reqs.toml configuration parsing and serialization

use crate::ConfigResult;
use reqs_core::{Level, PackageName, ReqsError, RuleId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use toml_edit::{value, Array, DocumentMut, Item, Table};

/// File searched for when locating project configuration
pub const CONFIG_FILE_NAME: &str = "reqs.toml";

/// Manifest checked when nothing else is configured
pub const DEFAULT_MANIFEST: &str = "requirements.txt";

/// Complete reqs.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReqsToml {
    /// Manifest path, relative to the directory holding the config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    /// Lint rule levels keyed by rule id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lint: BTreeMap<String, Level>,

    /// Import audit settings
    #[serde(default, skip_serializing_if = "AuditSection::is_empty")]
    pub audit: AuditSection,
}

/// `[audit]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AuditSection {
    /// Source roots to scan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    /// Glob patterns of files to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Import names that belong to the project itself
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub first_party: Vec<String>,

    /// Import names never reported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,

    /// Import name to distribution name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, String>,
}

impl ReqsToml {
    pub fn manifest_path(&self) -> &str {
        self.manifest.as_deref().unwrap_or(DEFAULT_MANIFEST)
    }

    /// Configured level for a rule, or its default
    pub fn level(&self, rule: RuleId) -> Level {
        self.lint
            .get(rule.as_str())
            .copied()
            .unwrap_or_else(|| rule.default_level())
    }

    /// Level of every rule
    pub fn levels(&self) -> BTreeMap<RuleId, Level> {
        RuleId::ALL
            .into_iter()
            .map(|rule| (rule, self.level(rule)))
            .collect()
    }

    pub fn set_level(&mut self, rule: RuleId, level: Level) {
        self.lint.insert(rule.as_str().to_string(), level);
    }
}

impl AuditSection {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
            && self.exclude.is_empty()
            && self.first_party.is_empty()
            && self.ignore.is_empty()
            && self.aliases.is_empty()
    }
}

/// Parse TOML string to ReqsToml configuration
pub fn parse_reqs_toml(content: &str) -> ConfigResult<ReqsToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<DocumentMut>()
        .map_err(|e| config_parse(format!("TOML syntax error: {}", e)))?;

    // Then parse with serde for type safety
    let config: ReqsToml = ::toml::from_str(content)
        .map_err(|e| config_parse(format!("TOML parsing error: {}", e)))?;

    finalize(config)
}

/// Validate a parsed configuration and canonicalize its rule keys
pub(crate) fn finalize(mut config: ReqsToml) -> ConfigResult<ReqsToml> {
    let mut lint = BTreeMap::new();
    for (key, level) in std::mem::take(&mut config.lint) {
        let rule: RuleId = key.parse().map_err(|e| ReqsError::ConfigValidation {
            field: format!("lint.{}", key),
            reason: format!("{}; known rules: {}", e, known_rules()),
        })?;
        lint.insert(rule.as_str().to_string(), level);
    }
    config.lint = lint;

    validate_config(&config)?;
    Ok(config)
}

/// Serialize ReqsToml to TOML string
pub fn serialize_reqs_toml(config: &ReqsToml) -> ConfigResult<String> {
    ::toml::to_string_pretty(config)
        .map_err(|e| config_parse(format!("TOML serialization error: {}", e)))
}

/// Validate configuration values
pub fn validate_config(config: &ReqsToml) -> ConfigResult<()> {
    if let Some(manifest) = &config.manifest {
        if manifest.trim().is_empty() {
            return Err(ReqsError::ConfigValidation {
                field: "manifest".to_string(),
                reason: "Manifest path must not be empty".to_string(),
            });
        }
    }

    for key in config.lint.keys() {
        if key.parse::<RuleId>().is_err() {
            return Err(ReqsError::ConfigValidation {
                field: format!("lint.{}", key),
                reason: format!("Unknown lint rule; known rules: {}", known_rules()),
            });
        }
    }

    for pattern in &config.audit.exclude {
        glob::Pattern::new(pattern).map_err(|e| ReqsError::ConfigValidation {
            field: "audit.exclude".to_string(),
            reason: format!("Invalid glob pattern '{}': {}", pattern, e),
        })?;
    }

    for (module, distribution) in &config.audit.aliases {
        if module.is_empty() || !module.split('.').all(is_identifier) {
            return Err(ReqsError::ConfigValidation {
                field: "audit.aliases".to_string(),
                reason: format!("'{}' is not a Python module name", module),
            });
        }
        if !PackageName::is_valid(distribution) {
            return Err(ReqsError::ConfigValidation {
                field: format!("audit.aliases.{}", module),
                reason: format!("'{}' is not a valid package name", distribution),
            });
        }
    }

    Ok(())
}

/// Load and parse reqs.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<ReqsToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ReqsError::io(format!("Failed to read {}", path), e))?;

    parse_reqs_toml(&content).map_err(|e| with_file(e, path))
}

/// Commented starting configuration written by `reqs init`
pub fn default_config_document() -> String {
    let mut doc = DocumentMut::new();
    doc["manifest"] = value(DEFAULT_MANIFEST);

    let mut lint = Table::new();
    lint.decor_mut()
        .set_prefix("\n# Rule levels: \"allow\", \"warn\" or \"deny\"\n");
    for rule in RuleId::ALL {
        lint[rule.as_str()] = value(rule.default_level().to_string());
    }
    doc.insert("lint", Item::Table(lint));

    let mut audit = Table::new();
    audit
        .decor_mut()
        .set_prefix("\n# Source roots scanned by `reqs audit`\n");
    let mut paths = Array::new();
    paths.push(".");
    audit["paths"] = value(paths);
    audit["exclude"] = value(Array::new());
    doc.insert("audit", Item::Table(audit));

    doc.to_string()
}

/// Point a config error at the file it came from
pub(crate) fn with_file(error: ReqsError, path: &camino::Utf8Path) -> ReqsError {
    match error {
        ReqsError::ConfigParse { message, .. } => ReqsError::ConfigParse {
            file: path.to_string(),
            message,
        },
        ReqsError::ConfigValidation { field, reason } => ReqsError::ConfigValidation {
            field,
            reason: format!("{} (in {})", reason, path),
        },
        other => other,
    }
}

fn config_parse(message: String) -> ReqsError {
    ReqsError::ConfigParse {
        file: CONFIG_FILE_NAME.to_string(),
        message,
    }
}

fn known_rules() -> String {
    RuleId::ALL
        .iter()
        .map(RuleId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_reqs_toml("").unwrap();
        assert_eq!(config, ReqsToml::default());
        assert_eq!(config.manifest_path(), "requirements.txt");
        assert_eq!(config.level(RuleId::FloatingRevision), Level::Deny);
        assert_eq!(config.level(RuleId::Unpinned), Level::Allow);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
manifest = "requirements/dev.txt"

[lint]
floating-revision = "deny"
unpinned = "warn"
partial_hashes = "allow"

[audit]
paths = ["scripts", "tests"]
exclude = ["**/build/**"]
first-party = ["tests"]

[audit.aliases]
boa = "titanoboa"
"#;

        let config = parse_reqs_toml(toml).unwrap();
        assert_eq!(config.manifest_path(), "requirements/dev.txt");
        assert_eq!(config.level(RuleId::Unpinned), Level::Warn);
        assert_eq!(config.level(RuleId::PartialHashes), Level::Allow);
        assert!(config.lint.contains_key("partial-hashes"));
        assert_eq!(config.audit.paths, vec!["scripts", "tests"]);
        assert_eq!(config.audit.first_party, vec!["tests"]);
        assert_eq!(config.audit.aliases.get("boa").map(String::as_str), Some("titanoboa"));
    }

    #[test]
    fn test_unknown_rule_is_rejected() {
        let err = parse_reqs_toml("[lint]\nno-such-rule = \"deny\"\n").unwrap_err();
        match err {
            ReqsError::ConfigValidation { field, reason } => {
                assert_eq!(field, "lint.no-such-rule");
                assert!(reason.contains("floating-revision"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        let err = parse_reqs_toml("[lint]\nunpinned = \"error\"\n").unwrap_err();
        assert!(matches!(err, ReqsError::ConfigParse { .. }));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_reqs_toml("[lint\nunpinned = \"warn\"\n").unwrap_err();
        match err {
            ReqsError::ConfigParse { file, message } => {
                assert_eq!(file, "reqs.toml");
                assert!(message.starts_with("TOML syntax error"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_audit_settings() {
        assert!(parse_reqs_toml("[audit]\nexclude = [\"[\"]\n").is_err());
        assert!(parse_reqs_toml("[audit.aliases]\nyaml = \"py yaml\"\n").is_err());
        assert!(parse_reqs_toml("[audit.aliases]\n\"1bad\" = \"pyyaml\"\n").is_err());
        assert!(parse_reqs_toml("manifest = \"  \"\n").is_err());
    }

    #[test]
    fn test_default_document_parses() {
        let document = default_config_document();
        assert!(document.contains("# Rule levels"));

        let config = parse_reqs_toml(&document).unwrap();
        assert_eq!(config.manifest_path(), DEFAULT_MANIFEST);
        for rule in RuleId::ALL {
            assert_eq!(config.lint.get(rule.as_str()), Some(&rule.default_level()));
        }
        assert_eq!(config.audit.paths, vec!["."]);
    }

    #[tokio::test]
    async fn test_load_from_file_names_the_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = camino::Utf8PathBuf::try_from(temp_dir.path().join("reqs.toml")).unwrap();
        tokio::fs::write(&path, "manifest = 3\n").await.unwrap();

        match load_from_file(&path).await.unwrap_err() {
            ReqsError::ConfigParse { file, .. } => assert_eq!(file, path.as_str()),
            other => panic!("unexpected error: {other}"),
        }
    }

    fn level_strategy() -> impl Strategy<Value = Level> {
        prop_oneof![Just(Level::Allow), Just(Level::Warn), Just(Level::Deny)]
    }

    proptest! {
        #[test]
        fn levels_survive_serialization(levels in prop::collection::vec(level_strategy(), 6)) {
            let mut config = ReqsToml::default();
            for (rule, level) in RuleId::ALL.into_iter().zip(levels) {
                config.set_level(rule, level);
            }

            let text = serialize_reqs_toml(&config).unwrap();
            let parsed = parse_reqs_toml(&text).unwrap();
            prop_assert_eq!(parsed.levels(), config.levels());
        }
    }
}
