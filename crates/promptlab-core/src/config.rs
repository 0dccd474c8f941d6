use crate::errors::ConfigError;
use crate::filter::TagMatch;
use crate::providers::ProviderKind;
use crate::storage::BackendKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_CONFIG_PATH: &str = "promptlab.yaml";
pub const DEFAULT_DB_PATH: &str = ".promptlab/promptlab.db";

pub const ENV_OLLAMA_URL: &str = "PROMPTLAB_OLLAMA_URL";
pub const ENV_STORE: &str = "PROMPTLAB_STORE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub filter: FilterSettings,
    #[serde(default = "default_models")]
    pub models: Vec<ModelInfo>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            store: StoreSettings::default(),
            inference: InferenceSettings::default(),
            defaults: Defaults::default(),
            filter: FilterSettings::default(),
            models: default_models(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InferenceSettings {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl InferenceSettings {
    pub fn url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_url())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Defaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub system_prompt: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: String::new(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_temperature() -> f64 {
    0.9
}

fn default_max_tokens() -> u32 {
    305
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterSettings {
    #[serde(default)]
    pub tag_match: TagMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub param_size: String,
    #[serde(default)]
    pub quant: String,
}

fn default_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo {
            name: "llama3.2:3b".into(),
            description: "Fast small model for quick iterations".into(),
            param_size: "3B".into(),
            quant: "Q4_K_M".into(),
        },
        ModelInfo {
            name: "mistral:7b".into(),
            description: "Stronger reasoning, good comparison target".into(),
            param_size: "7B".into(),
            quant: "Q4_K_M".into(),
        },
    ]
}

impl LabConfig {
    /// Applies environment overrides; `get` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, get: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = get(ENV_OLLAMA_URL).filter(|v| !v.trim().is_empty()) {
            self.inference.base_url = Some(url);
        }
        if let Some(v) = get(ENV_STORE) {
            self.store.backend = BackendKind::parse(&v)
                .ok_or_else(|| ConfigError(format!("{}: unknown store backend '{}'", ENV_STORE, v)))?;
        }
        Ok(())
    }

    pub fn knows_model(&self, name: &str) -> bool {
        self.models.iter().any(|m| m.name == name)
    }

    /// Closest catalog entry for a misspelled model name.
    pub fn suggest_model(&self, name: &str) -> Option<&str> {
        self.models
            .iter()
            .map(|m| (m.name.as_str(), strsim::jaro_winkler(&m.name, name)))
            .filter(|(_, sim)| *sim >= 0.8)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n)
    }
}

pub fn load_config(path: &Path, strict: bool) -> Result<LabConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);
    let mut cfg: LabConfig = serde_ignored::deserialize(deserializer, |p| {
        ignored_keys.insert(p.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful: Vec<&String> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();
    if !meaningful.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "unknown fields detected in strict mode: {:?} (file: {})",
                meaningful,
                path.display()
            )));
        }
        tracing::warn!(event = "config.unknown_fields", fields = ?meaningful, file = %path.display());
    }

    if cfg.version == 0 {
        cfg.version = SUPPORTED_CONFIG_VERSION;
    }
    if cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if cfg.models.is_empty() {
        return Err(ConfigError("config lists no models".into()));
    }

    normalize_paths(&mut cfg, path);
    Ok(cfg)
}

/// Missing file means defaults; a present but broken file is an error.
pub fn load_or_default(path: &Path, strict: bool) -> Result<LabConfig, ConfigError> {
    if path.exists() {
        load_config(path, strict)
    } else {
        Ok(LabConfig::default())
    }
}

fn normalize_paths(cfg: &mut LabConfig, config_path: &Path) {
    if cfg.store.path.is_relative() && cfg.store.path.as_os_str() != ":memory:" {
        if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            cfg.store.path = dir.join(&cfg.store.path);
        }
    }
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(
        path,
        r#"configVersion: 1
store:
  backend: sqlite
  path: .promptlab/promptlab.db
inference:
  provider: ollama
  base_url: "http://127.0.0.1:11434"
defaults:
  model: "llama3.2:3b"
  temperature: 0.9
  max_tokens: 305
  system_prompt: ""
filter:
  tag_match: selected
models:
  - name: "llama3.2:3b"
    description: "Fast small model for quick iterations"
    param_size: "3B"
    quant: "Q4_K_M"
  - name: "mistral:7b"
    description: "Stronger reasoning, good comparison target"
    param_size: "7B"
    quant: "Q4_K_M"
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses_to_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("promptlab.yaml");
        write_sample_config(&path)?;

        let cfg = load_config(&path, true)?;
        let mut expected = LabConfig::default();
        expected.inference.base_url = Some("http://127.0.0.1:11434".into());
        expected.store.path = dir.path().join(DEFAULT_DB_PATH);
        assert_eq!(cfg, expected);
        Ok(())
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = LabConfig::default();
        cfg.apply_env(|k| match k {
            ENV_OLLAMA_URL => Some("http://gpu-box:11434".into()),
            ENV_STORE => Some("file".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.inference.url(), "http://gpu-box:11434");
        assert_eq!(cfg.store.backend, BackendKind::File);

        let err = cfg
            .apply_env(|k| (k == ENV_STORE).then(|| "redis".to_string()))
            .unwrap_err();
        assert!(err.0.contains("redis"));
    }

    #[test]
    fn test_suggest_model() {
        let cfg = LabConfig::default();
        assert_eq!(cfg.suggest_model("llama3.2:3"), Some("llama3.2:3b"));
        assert_eq!(cfg.suggest_model("mistral:7"), Some("mistral:7b"));
        assert_eq!(cfg.suggest_model("zzzz"), None);
        assert!(cfg.knows_model("mistral:7b"));
    }

    #[test]
    fn test_default_urls_follow_provider() {
        let mut s = InferenceSettings::default();
        assert_eq!(s.url(), crate::providers::DEFAULT_OLLAMA_URL);
        s.provider = ProviderKind::Proxy;
        assert_eq!(s.url(), crate::providers::DEFAULT_PROXY_URL);
    }
}
