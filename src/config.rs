//! Classifier configuration.
//!
//! A configuration file extends the built-in pattern table with site-specific
//! error shapes and tunes how deep wrapped errors are unwrapped. Files are TOML;
//! every key can be overridden from the environment.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::classify::{ApiAvailability, UnavailabilityPattern, MAX_CAUSE_DEPTH};
use crate::error::ClassifierError;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "APIREADY";

/// One extra pattern supplied by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Identifier reported when the pattern fires
    pub name: String,
    /// Regular expression matched against the root cause's message
    pub regex: String,
    /// What failure this pattern recognizes
    #[serde(default)]
    pub description: String,
}

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Whether the built-in table comes before the configured patterns
    #[serde(default = "default_include_builtin")]
    pub include_builtin: bool,
    /// Maximum number of `source()` hops followed to reach the root cause
    #[serde(default = "default_max_cause_depth")]
    pub max_cause_depth: usize,
    /// Patterns appended after the built-in table
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
}

fn default_include_builtin() -> bool {
    true
}

fn default_max_cause_depth() -> usize {
    MAX_CAUSE_DEPTH
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            include_builtin: default_include_builtin(),
            max_cause_depth: default_max_cause_depth(),
            patterns: Vec::new(),
        }
    }
}

impl ClassifierConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables prefixed with `APIREADY__` override file values,
    /// e.g. `APIREADY__MAX_CAUSE_DEPTH=8`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file does not exist
    /// - The configuration file cannot be parsed
    /// - The path is not valid UTF-8
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use apiready::config::ClassifierConfig;
    ///
    /// let classifier = ClassifierConfig::load("apiready.toml")?.build()?;
    /// # Ok::<(), apiready::ClassifierError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ClassifierError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ClassifierError::FileNotFound(path_str.to_string()));
        }

        tracing::debug!(path = path_str, "loading classifier configuration");

        let config = Config::builder()
            .add_source(File::new(path_str, FileFormat::Toml))
            .add_source(env_overrides())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ClassifierError> {
        let config = Config::builder().add_source(env_overrides()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a TOML string, without environment overrides.
    pub fn from_toml_str(contents: &str) -> Result<Self, ClassifierError> {
        let config = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Build a classifier from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifierError::InvalidPattern`] for the first configured
    /// pattern that does not compile.
    pub fn build(&self) -> Result<ApiAvailability, ClassifierError> {
        let mut classifier = if self.include_builtin {
            ApiAvailability::new()
        } else {
            ApiAvailability::with_patterns(Vec::new())
        };

        for pattern in &self.patterns {
            classifier.add_pattern(UnavailabilityPattern::new(
                pattern.name.as_str(),
                &pattern.regex,
                pattern.description.as_str(),
            )?);
        }

        let classifier = classifier.with_max_cause_depth(self.max_cause_depth);
        tracing::debug!(
            patterns = classifier.pattern_count(),
            custom = self.patterns.len(),
            max_cause_depth = classifier.max_cause_depth(),
            "built classifier"
        );
        Ok(classifier)
    }

    /// Describe an existing classifier as a self-contained configuration.
    ///
    /// Every pattern, built-in or not, is listed explicitly and
    /// `include_builtin` is off, so building the result reproduces the table.
    pub fn describe(classifier: &ApiAvailability) -> Self {
        Self {
            include_builtin: false,
            max_cause_depth: classifier.max_cause_depth(),
            patterns: classifier
                .patterns()
                .iter()
                .map(|pattern| PatternConfig {
                    name: pattern.name().to_string(),
                    regex: pattern.regex().as_str().to_string(),
                    description: pattern.description().to_string(),
                })
                .collect(),
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ClassifierError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ClassifierError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert!(config.include_builtin);
        assert_eq!(config.max_cause_depth, MAX_CAUSE_DEPTH);
        assert!(config.patterns.is_empty());
    }

    #[test]
    fn test_from_toml_str_defaults() {
        let config = ClassifierConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClassifierConfig::default());
    }

    #[test]
    fn test_from_toml_str_with_patterns() {
        let toml_str = r#"
            include_builtin = false
            max_cause_depth = 4

            [[patterns]]
            name = "gateway-reset"
            regex = 'read: connection reset by peer'
            description = "load balancer resetting connections"

            [[patterns]]
            name = "no-route"
            regex = 'connect: no route to host'
        "#;

        let config = ClassifierConfig::from_toml_str(toml_str).unwrap();
        assert!(!config.include_builtin);
        assert_eq!(config.max_cause_depth, 4);
        assert_eq!(config.patterns.len(), 2);
        assert_eq!(config.patterns[0].name, "gateway-reset");
        assert_eq!(config.patterns[1].description, "");
    }

    #[test]
    fn test_build_appends_after_builtin() {
        let config = ClassifierConfig {
            patterns: vec![PatternConfig {
                name: "gateway-reset".to_string(),
                regex: "read: connection reset by peer".to_string(),
                description: String::new(),
            }],
            ..ClassifierConfig::default()
        };

        let classifier = config.build().unwrap();
        assert_eq!(
            classifier.pattern_count(),
            ApiAvailability::builtin().pattern_count() + 1
        );
        assert_eq!(
            classifier.patterns().last().map(|p| p.name()),
            Some("gateway-reset")
        );
        assert!(classifier.matches_message("read: connection reset by peer"));
    }

    #[test]
    fn test_build_without_builtin() {
        let config = ClassifierConfig {
            include_builtin: false,
            ..ClassifierConfig::default()
        };

        let classifier = config.build().unwrap();
        assert_eq!(classifier.pattern_count(), 0);
        assert!(!classifier.matches_message("Get https://api.x.io/api/v1/nodes: EOF"));
    }

    #[test]
    fn test_build_rejects_invalid_pattern() {
        let config = ClassifierConfig {
            patterns: vec![PatternConfig {
                name: "broken".to_string(),
                regex: "(unclosed".to_string(),
                description: String::new(),
            }],
            ..ClassifierConfig::default()
        };

        let err = config.build().unwrap_err();
        assert!(matches!(err, ClassifierError::InvalidPattern { .. }));
    }

    #[test]
    fn test_describe_reproduces_table() {
        let described = ClassifierConfig::describe(ApiAvailability::builtin());
        assert!(!described.include_builtin);
        assert_eq!(
            described.patterns.len(),
            ApiAvailability::builtin().pattern_count()
        );

        let rebuilt = described.build().unwrap();
        let names: Vec<_> = rebuilt.patterns().iter().map(|p| p.name()).collect();
        let expected: Vec<_> = ApiAvailability::builtin()
            .patterns()
            .iter()
            .map(|p| p.name())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_to_toml_parses_back() {
        let described = ClassifierConfig::describe(ApiAvailability::builtin());
        let rendered = described.to_toml().unwrap();

        assert!(rendered.contains("[[patterns]]"));
        assert_eq!(ClassifierConfig::from_toml_str(&rendered).unwrap(), described);
    }

    #[test]
    fn test_to_json() {
        let rendered = ClassifierConfig::default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["include_builtin"], serde_json::Value::Bool(true));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ClassifierConfig::load("/nonexistent/apiready.toml").unwrap_err();
        assert!(matches!(err, ClassifierError::FileNotFound(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [[patterns]]
            name = "no-route"
            regex = 'connect: no route to host'
            "#
        )
        .unwrap();

        let config = ClassifierConfig::load(file.path()).unwrap();
        assert!(config.include_builtin);
        assert_eq!(config.patterns.len(), 1);
        assert_eq!(config.patterns[0].regex, "connect: no route to host");
    }

    #[test]
    fn test_load_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_cause_depth = [").unwrap();

        let err = ClassifierConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }
}
