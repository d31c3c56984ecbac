use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SurveyError};

/// Names of the columns the pipeline reads and writes, after header
/// normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub comment: String,
    pub service_type: String,
    pub location: String,
    pub call_duration: String,
    pub region: String,
    pub sentiment: String,
    pub cleaned_comment: String,
    pub cluster: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            comment: "comentarios".into(),
            service_type: "tipo_de_servico".into(),
            location: "localizacao".into(),
            call_duration: "duracao_media_das_chamadas".into(),
            region: "region".into(),
            sentiment: "sentiment".into(),
            cleaned_comment: "cleaned_comment".into(),
            cluster: "cluster".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Comments are cut to this many characters before reaching the oracle.
    pub max_chars: usize,
    /// Characters of the comment quoted when a scoring failure is logged.
    pub preview_chars: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            preview_chars: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Clusters per service group.
    pub n_clusters: usize,
    /// Vocabulary cap for each group's TF-IDF vectorizer.
    pub max_vocab: usize,
    pub seed: u64,
    pub max_iter: usize,
    /// K-means restarts; the run with the lowest inertia wins.
    pub n_init: usize,
    pub tolerance: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            max_vocab: 500,
            seed: 7,
            max_iter: 300,
            n_init: 10,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_words: usize,
    pub examples: usize,
    pub example_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_words: 5,
            examples: 2,
            example_chars: 150,
        }
    }
}

/// Full pipeline configuration. Every field has a default, so a config file
/// only needs the keys it overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub columns: ColumnNames,
    pub sentiment: SentimentConfig,
    pub clustering: ClusterConfig,
    pub report: ReportConfig,
}

impl SurveyConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.clustering.n_clusters == 0 {
            return Err(SurveyError::Configuration(
                "clustering.n_clusters must be at least 1".into(),
            ));
        }
        if self.clustering.max_vocab == 0 {
            return Err(SurveyError::Configuration(
                "clustering.max_vocab must be at least 1".into(),
            ));
        }
        if self.sentiment.max_chars == 0 {
            return Err(SurveyError::Configuration(
                "sentiment.max_chars must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a config from a JSON string.
pub fn parse_config(json: &str) -> Result<SurveyConfig> {
    serde_json::from_str(json)
        .map_err(|e| SurveyError::Configuration(format!("failed to parse config: {e}")))
}

/// Load a config from a file path.
pub fn load_config(path: &Path) -> Result<SurveyConfig> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        SurveyError::Configuration(format!("failed to read '{}': {e}", path.display()))
    })?;
    parse_config(&json)
}

/// Resolve the configuration using this order:
///
/// 1. `explicit` path (a failure here is fatal)
/// 2. `$SURVEY_CONFIG` env var (path to JSON file)
/// 3. `$XDG_CONFIG_HOME/survey/config.json` (or `~/.config/survey/config.json`)
/// 4. Built-in defaults
///
/// Steps 2 and 3 fall through with a warning when the file is unreadable.
pub fn resolve_config(explicit: Option<&Path>) -> Result<SurveyConfig> {
    if let Some(path) = explicit {
        let config = load_config(path)?;
        config.validate()?;
        return Ok(config);
    }

    let candidates = std::env::var("SURVEY_CONFIG")
        .ok()
        .map(PathBuf::from)
        .into_iter()
        .chain(xdg_config_path().filter(|p| p.exists()));

    for path in candidates {
        match load_config(&path).and_then(|c| c.validate().map(|_| c)) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded survey config");
                return Ok(config);
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring config file"),
        }
    }

    Ok(SurveyConfig::default())
}

fn xdg_config_path() -> Option<PathBuf> {
    let config_home = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })?;
    Some(config_home.join("survey/config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let c = SurveyConfig::default();
        assert_eq!(c.clustering.n_clusters, 3);
        assert_eq!(c.clustering.max_vocab, 500);
        assert_eq!(c.sentiment.max_chars, 1000);
        assert_eq!(c.sentiment.preview_chars, 30);
        assert_eq!(c.columns.comment, "comentarios");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = parse_config(r#"{"clustering": {"n_clusters": 5}}"#).unwrap();
        assert_eq!(c.clustering.n_clusters, 5);
        assert_eq!(c.clustering.max_vocab, 500);
        assert_eq!(c.columns.service_type, "tipo_de_servico");
    }

    #[test]
    fn zero_clusters_rejected() {
        let c = parse_config(r#"{"clustering": {"n_clusters": 0}}"#).unwrap();
        assert!(matches!(c.validate(), Err(SurveyError::Configuration(_))));
    }

    #[test]
    fn bad_json_is_configuration_error() {
        assert!(matches!(
            parse_config("{not json"),
            Err(SurveyError::Configuration(_))
        ));
    }

    #[test]
    fn explicit_missing_file_is_fatal() {
        let result = resolve_config(Some(Path::new("/nonexistent/survey.json")));
        assert!(result.is_err());
    }
}
