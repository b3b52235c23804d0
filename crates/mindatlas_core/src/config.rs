//! Layered runtime settings.
//!
//! Built-in defaults, then an optional TOML file, then `MINDATLAS__*`
//! environment variables (`MINDATLAS__GRAPH__HUB_COUNT=7`).

use crate::ai::gateway::PATTERN_MIN_ARTIFACTS;
use crate::model::artifact::{is_hex_color, PLACEHOLDER_COLOR};
use crate::repo::artifact_repo::ARTIFACTS_LIMIT_MAX;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "MINDATLAS";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_FILE_STEM: &str = "mindatlas";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphSettings {
    /// Artifacts loaded into a snapshot.
    pub load_limit: u32,
    pub page_size: u32,
    pub hub_count: usize,
    /// Snapshot size needed before hidden-connection discovery runs.
    pub hidden_connection_min_artifacts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrichmentSettings {
    pub placeholder_color: String,
    /// Most recent artifacts offered to the connection-suggestion flow.
    pub suggestion_context: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InsightSettings {
    pub pattern_min_artifacts: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

impl LoggingSettings {
    pub fn resolved_level(&self) -> &str {
        self.level
            .as_deref()
            .unwrap_or_else(|| crate::logging::default_log_level())
    }

    /// Configured directory, or `<tmp>/mindatlas/logs`.
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("mindatlas").join("logs"))
    }
}

/// Complete settings tree.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AtlasConfig {
    pub graph: GraphSettings,
    pub enrichment: EnrichmentSettings,
    pub insight: InsightSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug)]
pub enum ConfigLoadError {
    Source(config::ConfigError),
    Invalid(String),
}

impl Display for ConfigLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source(err) => write!(f, "{err}"),
            Self::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Source(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<config::ConfigError> for ConfigLoadError {
    fn from(value: config::ConfigError) -> Self {
        Self::Source(value)
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            graph: GraphSettings {
                load_limit: 50,
                page_size: 15,
                hub_count: 5,
                hidden_connection_min_artifacts: 6,
            },
            enrichment: EnrichmentSettings {
                placeholder_color: PLACEHOLDER_COLOR.to_string(),
                suggestion_context: 10,
            },
            insight: InsightSettings {
                pattern_min_artifacts: PATTERN_MIN_ARTIFACTS,
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl AtlasConfig {
    /// Loads defaults, `./mindatlas.toml` if present, then process env.
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_from(None, None)
    }

    /// Loads with an explicit file (required when given) and an optional
    /// environment map standing in for the process environment.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigLoadError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("graph.load_limit", i64::from(defaults.graph.load_limit))?
            .set_default("graph.page_size", i64::from(defaults.graph.page_size))?
            .set_default("graph.hub_count", defaults.graph.hub_count as i64)?
            .set_default(
                "graph.hidden_connection_min_artifacts",
                defaults.graph.hidden_connection_min_artifacts as i64,
            )?
            .set_default(
                "enrichment.placeholder_color",
                defaults.enrichment.placeholder_color.clone(),
            )?
            .set_default(
                "enrichment.suggestion_context",
                defaults.enrichment.suggestion_context as i64,
            )?
            .set_default(
                "insight.pattern_min_artifacts",
                defaults.insight.pattern_min_artifacts as i64,
            )?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_FILE_STEM).required(false)),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);
        let loaded: Self = builder.add_source(environment).build()?.try_deserialize()?;

        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.graph.load_limit == 0 || self.graph.page_size == 0 {
            return Err(ConfigLoadError::Invalid(
                "graph.load_limit and graph.page_size must be positive".into(),
            ));
        }
        if self.graph.hub_count == 0 {
            return Err(ConfigLoadError::Invalid(
                "graph.hub_count must be positive".into(),
            ));
        }
        if !is_hex_color(&self.enrichment.placeholder_color) {
            return Err(ConfigLoadError::Invalid(format!(
                "enrichment.placeholder_color `{}` is not #rrggbb",
                self.enrichment.placeholder_color
            )));
        }
        // One extra row is fetched so the enriched artifact itself can be skipped.
        if self.enrichment.suggestion_context >= ARTIFACTS_LIMIT_MAX as usize {
            return Err(ConfigLoadError::Invalid(format!(
                "enrichment.suggestion_context must be below {ARTIFACTS_LIMIT_MAX}"
            )));
        }
        if self.insight.pattern_min_artifacts < PATTERN_MIN_ARTIFACTS {
            return Err(ConfigLoadError::Invalid(format!(
                "insight.pattern_min_artifacts must be at least {PATTERN_MIN_ARTIFACTS}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn defaults_load_without_file_or_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindatlas.toml");
        std::fs::write(&path, "").unwrap();

        let loaded = AtlasConfig::load_from(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded, AtlasConfig::default());
    }

    #[test]
    fn file_then_env_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[graph]\nhub_count = 3\npage_size = 20").unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        let loaded = AtlasConfig::load_from(
            Some(&path),
            env(&[("MINDATLAS__GRAPH__HUB_COUNT", "7")]),
        )
        .unwrap();

        assert_eq!(loaded.graph.hub_count, 7);
        assert_eq!(loaded.graph.page_size, 20);
        assert_eq!(loaded.graph.load_limit, 50);
        assert_eq!(loaded.logging.resolved_level(), "warn");
    }

    #[test]
    fn unset_logging_level_falls_back_to_build_default() {
        let settings = LoggingSettings::default();
        assert_eq!(
            settings.resolved_level(),
            crate::logging::default_log_level()
        );
        assert!(settings.resolved_dir().ends_with("mindatlas/logs"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");
        std::fs::write(&path, "[enrichment]\nplaceholder_color = \"grey\"\n").unwrap();
        assert!(matches!(
            AtlasConfig::load_from(Some(&path), env(&[])),
            Err(ConfigLoadError::Invalid(_))
        ));

        std::fs::write(&path, "[enrichment]\nsuggestion_context = 200\n").unwrap();
        assert!(matches!(
            AtlasConfig::load_from(Some(&path), env(&[])),
            Err(ConfigLoadError::Invalid(_))
        ));

        std::fs::write(&path, "[insight]\npattern_min_artifacts = 3\n").unwrap();
        assert!(matches!(
            AtlasConfig::load_from(Some(&path), env(&[])),
            Err(ConfigLoadError::Invalid(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AtlasConfig::load_from(Some(&dir.path().join("absent.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigLoadError::Source(_))));
    }
}
