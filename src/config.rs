use crate::job::{DEFAULT_LIMIT, DEFAULT_TIMEOUT_SECS, SearchInputs};
use crate::query::{RuleSet, SearchType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "lucky";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Interpretation used when the command line does not pick one
    #[serde(default)]
    pub default_search_type: SearchType,

    /// Result limit per query unless `count:` overrides it
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Per-query timeout unless `timeout:` overrides it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Rule chains applied by the expander, by rule name
    #[serde(default = "default_rule_chains")]
    pub rule_chains: Vec<Vec<String>>,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_rule_chains() -> Vec<Vec<String>> {
    vec![vec!["unquote_patterns".to_string()]]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_search_type: SearchType::default(),
            default_limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            rule_chains: default_rule_chains(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    /// Load config from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Resolve the configured rule chains
    pub fn rule_set(&self) -> Result<RuleSet> {
        RuleSet::from_names(&self.rule_chains).context("Invalid rule_chains in config")
    }

    /// Search inputs for `query` using the configured limits
    pub fn search_inputs(&self, query: &str, search_type: SearchType) -> SearchInputs {
        SearchInputs::new(query, search_type)
            .with_limit(self.default_limit)
            .with_timeout_secs(self.timeout_secs)
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{"default_search_type": "regex", "default_limit": 7}"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_search_type, SearchType::Regex);
        assert_eq!(config.default_limit, 7);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.rule_chains, default_rule_chains());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = AppConfig {
            rule_chains: vec![
                vec!["unquote_patterns".to_string()],
                vec!["regexp_patterns".to_string()],
            ],
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
        assert_eq!(config.rule_set().unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_unknown_rule_is_an_error() {
        let config = AppConfig {
            rule_chains: vec![vec!["bogus".to_string()]],
            ..Default::default()
        };
        let err = config.rule_set().unwrap_err();
        assert!(format!("{:#}", err).contains("unknown rule 'bogus'"));
    }

    #[test]
    fn test_search_inputs_use_config_limits() {
        let config = AppConfig {
            default_limit: 3,
            timeout_secs: 9,
            ..Default::default()
        };
        let inputs = config.search_inputs("foo", SearchType::Regex);
        assert_eq!((inputs.limit, inputs.timeout_secs), (3, 9));
        assert_eq!(inputs.search_type, SearchType::Regex);
    }
}
