//! Tailoring configuration.
//!
//! Loaded from YAML (JSON is valid YAML), every field optional:
//!
//! ```yaml
//! strategy: middle_out
//! chars_per_token: 4
//! reserved_completion_tokens: 4096
//! context_windows:
//!   my-local-model: 32768
//! ```

use crate::budget::counter::{HeuristicTokenCounter, SharedTokenCounter, DEFAULT_CHARS_PER_TOKEN};
use crate::budget::limits::ContextWindowRegistry;
use crate::budget::strategy::{StrategyKind, TailoringStrategy};
use crate::budget::types::TokenBudget;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorConfig {
    pub strategy: StrategyKind,
    pub chars_per_token: usize,
    /// Tokens kept free for the completion; derived from the window when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_completion_tokens: Option<u32>,
    /// Context window overrides registered on top of the built-in table
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub context_windows: HashMap<String, u32>,
}

impl Default for TailorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            reserved_completion_tokens: None,
            context_windows: HashMap::new(),
        }
    }
}

impl TailorConfig {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load configuration from `path`. A missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml_str(&content)?;
        tracing::info!(
            "Loaded tailoring config from {:?} (strategy {}, {} window overrides)",
            path,
            config.strategy,
            config.context_windows.len()
        );
        Ok(config)
    }

    /// Registry with the built-in windows plus this config's overrides.
    pub fn build_registry(&self) -> ContextWindowRegistry {
        let registry = ContextWindowRegistry::with_defaults();
        for (name, size) in &self.context_windows {
            registry.register(name.clone(), *size);
        }
        registry
    }

    pub fn build_counter(&self) -> SharedTokenCounter {
        Arc::new(HeuristicTokenCounter::new(self.chars_per_token))
    }

    pub fn build_strategy(&self, counter: SharedTokenCounter) -> Box<dyn TailoringStrategy> {
        self.strategy.build(counter)
    }

    pub fn budget_for(&self, registry: &ContextWindowRegistry, model: &str) -> TokenBudget {
        TokenBudget::resolve(registry, model, self.reserved_completion_tokens)
    }
}

/// Get the default configuration file path.
///
/// Returns `~/.context-tailor/config.yaml`, or a path relative to the current
/// directory when no home directory is known.
pub fn default_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".context-tailor").join("config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(TailorConfig::from_yaml_str("").unwrap(), TailorConfig::default());
        assert_eq!(TailorConfig::from_yaml_str("{}").unwrap(), TailorConfig::default());
    }

    #[test]
    fn parses_full_yaml() {
        let config = TailorConfig::from_yaml_str(
            "strategy: middle_out\nchars_per_token: 3\nreserved_completion_tokens: 2048\ncontext_windows:\n  local-llm: 32768\n",
        )
        .unwrap();

        assert_eq!(config.strategy, StrategyKind::MiddleOut);
        assert_eq!(config.chars_per_token, 3);
        assert_eq!(config.reserved_completion_tokens, Some(2048));
        assert_eq!(config.context_windows.get("local-llm"), Some(&32_768));
    }

    #[test]
    fn accepts_json() {
        let config = TailorConfig::from_yaml_str(r#"{"strategy": "tail_out"}"#).unwrap();
        assert_eq!(config.strategy, StrategyKind::TailOut);
        assert_eq!(config.chars_per_token, DEFAULT_CHARS_PER_TOKEN);
    }

    #[test]
    fn rejects_unknown_strategy() {
        let err = TailorConfig::from_yaml_str("strategy: sideways").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_reach_registry_and_budget() {
        let mut config = TailorConfig::default();
        config.context_windows.insert("local-llm".into(), 10_000);
        config.reserved_completion_tokens = Some(1_000);

        let registry = config.build_registry();
        assert_eq!(registry.resolve("local-llm"), 10_000);

        let budget = config.budget_for(&registry, "local-llm");
        assert_eq!(budget.max_output_tokens, 1_000);
        assert_eq!(budget.available_input_tokens(), 10_000 - 1_000 - 100);
    }

    #[test]
    fn builds_configured_strategy() {
        let config = TailorConfig {
            strategy: StrategyKind::TailOut,
            ..TailorConfig::default()
        };
        let strategy = config.build_strategy(config.build_counter());
        assert_eq!(strategy.name(), "tail_out");
    }

    #[tokio::test]
    async fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strategy: head_out\nchars_per_token: 2").unwrap();

        let config = TailorConfig::load(file.path()).await.unwrap();
        assert_eq!(config.strategy, StrategyKind::HeadOut);
        assert_eq!(config.chars_per_token, 2);
    }

    #[tokio::test]
    async fn load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = TailorConfig::load(dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(config, TailorConfig::default());
    }

    #[test]
    fn default_path_is_under_home() {
        assert!(default_config_path().ends_with(".context-tailor/config.yaml"));
    }
}
