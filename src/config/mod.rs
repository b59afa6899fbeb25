// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for Notewise

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::i18n::Language;

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "NOTEWISE_API_KEY";

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Root directory of the note vault
    #[serde(default = "default_vault_path")]
    pub vault_path: String,

    /// Provider used for suggestions
    #[serde(default)]
    pub api_provider: Provider,

    /// Connection settings per provider
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Folder patterns never offered as destinations
    #[serde(default)]
    pub ignored_folders: Vec<String>,

    /// Prompt template; the built-in one is used when empty
    #[serde(default)]
    pub custom_prompt: String,

    /// Print the prompt instead of sending it
    #[serde(default)]
    pub dev_mode: bool,

    #[serde(default = "Language::detect")]
    pub language: Language,

    #[serde(default)]
    pub rules: RuleConfig,

    #[serde(default = "default_history_path")]
    pub history_path: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    DeepSeek,
    OpenAI,
    Kimi,
    Custom,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    #[serde(rename = "DeepSeek", default = "default_deepseek")]
    pub deepseek: ProviderConfig,
    #[serde(rename = "OpenAI", default = "default_openai")]
    pub openai: ProviderConfig,
    #[serde(rename = "Kimi", default = "default_kimi")]
    pub kimi: ProviderConfig,
    #[serde(rename = "Custom", default)]
    pub custom: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RuleConfig {
    /// Only rename notes with placeholder titles such as "Untitled"
    #[serde(default)]
    pub preserve_custom_titles: bool,
}

// Default value functions
fn default_vault_path() -> String { ".".to_string() }
fn default_history_path() -> String { "notewise_history.jsonl".to_string() }
fn default_timeout() -> u64 { 120 }

fn provider(model_name: &str, base_url: &str) -> ProviderConfig {
    ProviderConfig {
        api_key: String::new(),
        model_name: model_name.to_string(),
        base_url: base_url.to_string(),
    }
}

fn default_deepseek() -> ProviderConfig { provider("deepseek-chat", "https://api.deepseek.com") }
fn default_openai() -> ProviderConfig { provider("gpt-4o-mini", "https://api.openai.com") }
fn default_kimi() -> ProviderConfig { provider("kimi-k2-turbo-preview", "https://api.moonshot.cn") }

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            deepseek: default_deepseek(),
            openai: default_openai(),
            kimi: default_kimi(),
            custom: ProviderConfig::default(),
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenAI => &self.openai,
            Provider::Kimi => &self.kimi,
            Provider::Custom => &self.custom,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            api_provider: Provider::default(),
            providers: ProvidersConfig::default(),
            ignored_folders: Vec::new(),
            custom_prompt: String::new(),
            dev_mode: false,
            language: Language::detect(),
            rules: RuleConfig::default(),
            history_path: default_history_path(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::NotewiseError::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings of the selected provider, with the API key taken from
    /// `NOTEWISE_API_KEY` when that is set
    pub fn current_provider(&self) -> ProviderConfig {
        let mut config = self.providers.get(self.api_provider).clone();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = key;
            }
        }
        config
    }

    pub fn is_api_configured(&self) -> bool {
        let provider = self.current_provider();
        !provider.api_key.trim().is_empty() && !provider.base_url.trim().is_empty()
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        let provider = self.providers.get(self.api_provider);
        if provider.model_name.trim().is_empty() {
            return Err(crate::NotewiseError::Config(format!(
                "No model configured for provider {:?}",
                self.api_provider
            )));
        }
        if provider.base_url.trim().is_empty() {
            return Err(crate::NotewiseError::Config(format!(
                "No base URL configured for provider {:?}",
                self.api_provider
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::NotewiseError::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"api_provider": "Kimi", "ignored_folders": ["archive", "**/temp"], "language": "zh"}"#,
        )
        .unwrap();
        assert_eq!(config.api_provider, Provider::Kimi);
        assert_eq!(config.providers.get(Provider::Kimi).model_name, "kimi-k2-turbo-preview");
        assert_eq!(config.ignored_folders, vec!["archive", "**/temp"]);
        assert_eq!(config.language, Language::Zh);
        assert_eq!(config.timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_provider_needs_url() {
        let config = AppConfig {
            api_provider: Provider::Custom,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = AppConfig::default();
        config.ignored_folders = vec!["templates".to_string()];
        config.rules.preserve_custom_titles = true;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.ignored_folders, vec!["templates"]);
        assert!(loaded.rules.preserve_custom_titles);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.api_provider, Provider::DeepSeek);
        assert_eq!(config.history_path, "notewise_history.jsonl");
    }
}
