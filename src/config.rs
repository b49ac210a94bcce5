// File: ./src/config.rs
use crate::dialect::{DialectProfile, Profiles, Rule};
use crate::engine::{DEFAULT_HIDDEN_CLASS, EngineOptions};
use crate::selector::Selector;
use crate::visibility::DEFAULT_STORAGE_KEY;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment override for the config directory (used by tests).
pub const CONFIG_DIR_ENV: &str = "GTF_CONFIG_DIR";

/// Partial replacement for one dialect's selector data.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileOverride {
    pub container: Option<Selector>,
    pub item: Option<Selector>,
    pub rules: Option<Vec<Rule>>,
}

impl ProfileOverride {
    fn apply(&self, mut profile: DialectProfile) -> DialectProfile {
        if let Some(container) = &self.container {
            profile.container = container.clone();
        }
        if let Some(item) = &self.item {
            profile.item = item.clone();
        }
        if let Some(rules) = &self.rules {
            profile.rules = rules.clone();
        }
        profile
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Storage namespace; one file per namespace in the data dir.
    pub namespace: String,
    pub storage_key: String,
    pub hidden_class: String,
    pub legacy: ProfileOverride,
    pub current: ProfileOverride,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: "sync".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            hidden_class: DEFAULT_HIDDEN_CLASS.to_string(),
            legacy: ProfileOverride::default(),
            current: ProfileOverride::default(),
        }
    }
}

impl Config {
    pub fn get_path() -> Option<PathBuf> {
        // ISOLATION: Check env var first
        if let Ok(dir) = env::var(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join("config.toml"));
        }
        ProjectDirs::from("com", "gtf", "timeline-filter").map(|p| p.config_dir().join("config.toml"))
    }

    /// Loads the user config. A missing file means defaults.
    pub fn load() -> Result<Self> {
        match Self::get_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn profiles(&self) -> Profiles {
        Profiles {
            legacy: self.legacy.apply(DialectProfile::legacy()),
            current: self.current.apply(DialectProfile::current()),
        }
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            hidden_class: self.hidden_class.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.profiles(), Profiles::default());
    }

    #[test]
    fn overrides_replace_only_what_they_name() {
        let config: Config = toml::from_str(
            r#"
            hidden_class = "my-hidden"

            [current]
            container = "[data-testid=\"issue-viewer\"]"

            [[legacy.rules]]
            category = "reviews"
            predicate = { has = "[id*=\"pullrequestreview-\"]" }
            "#,
        )
        .unwrap();
        let profiles = config.profiles();

        assert_eq!(config.engine_options().hidden_class, "my-hidden");
        assert_eq!(config.storage_key, "gtfShow");
        assert_eq!(
            profiles.current.container,
            Selector::parse("[data-testid=issue-viewer]").unwrap()
        );
        assert_eq!(profiles.current.item, DialectProfile::current().item);
        assert_eq!(
            profiles.legacy.categories(),
            vec![Category::Reviews, Category::Others]
        );
    }

    #[test]
    fn invalid_selector_is_reported_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[legacy]\nitem = \".a .b\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("parsing config"));
    }
}
