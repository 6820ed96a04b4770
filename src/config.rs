use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::context::dictionary::DEFAULT_API_BASE;
use crate::session::controller::SessionSettings;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_feedback_delay_ms")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_boss_word_count")]
    pub boss_word_count: usize,
    #[serde(default = "default_auto_speak")]
    pub auto_speak: bool,
    #[serde(default = "default_lookups_enabled")]
    pub lookups_enabled: bool,
    #[serde(default = "default_dictionary_api_base")]
    pub dictionary_api_base: String,
    #[serde(default = "default_lookup_timeout_secs")]
    pub lookup_timeout_secs: u64,
    #[serde(default = "default_cache_lookups")]
    pub cache_lookups: bool,
}

fn default_theme() -> String {
    "ember".to_string()
}
fn default_feedback_delay_ms() -> u64 {
    2400
}
fn default_boss_word_count() -> usize {
    12
}
fn default_auto_speak() -> bool {
    true
}
fn default_lookups_enabled() -> bool {
    true
}
fn default_dictionary_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}
fn default_lookup_timeout_secs() -> u64 {
    10
}
fn default_cache_lookups() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            feedback_delay_ms: default_feedback_delay_ms(),
            boss_word_count: default_boss_word_count(),
            auto_speak: default_auto_speak(),
            lookups_enabled: default_lookups_enabled(),
            dictionary_api_base: default_dictionary_api_base(),
            lookup_timeout_secs: default_lookup_timeout_secs(),
            cache_lookups: default_cache_lookups(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("spelldrill")
            .join("config.toml")
    }

    /// Clamp values a hand-edited file could get wrong.
    pub fn normalize(&mut self) {
        if self.boss_word_count == 0 {
            self.boss_word_count = default_boss_word_count();
        }
        if self.lookup_timeout_secs == 0 {
            self.lookup_timeout_secs = default_lookup_timeout_secs();
        }
        if self.dictionary_api_base.trim().is_empty() {
            self.dictionary_api_base = default_dictionary_api_base();
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            feedback_delay: Duration::from_millis(self.feedback_delay_ms),
            boss_word_count: self.boss_word_count,
            auto_speak: self.auto_speak,
        }
    }
}
