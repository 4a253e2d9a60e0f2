// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::features::{CategoryPolicy, ColumnNaming};
use crate::route::MapConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Column naming as written in the config file: either a preset name or a
/// full table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamingSetting {
    Preset(NamingPreset),
    Custom(ColumnNaming),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPreset {
    Generic,
    Bts,
}

impl Default for NamingSetting {
    fn default() -> Self {
        NamingSetting::Preset(NamingPreset::Generic)
    }
}

impl NamingSetting {
    pub fn resolve(&self) -> ColumnNaming {
        match self {
            NamingSetting::Preset(NamingPreset::Generic) => ColumnNaming::generic(),
            NamingSetting::Preset(NamingPreset::Bts) => ColumnNaming::bts(),
            NamingSetting::Custom(naming) => naming.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub airports_path: PathBuf,
    /// XGBoost JSON model. Without one, predictions come from a coin flip.
    pub model_path: Option<PathBuf>,
    /// JSON array of column names; takes precedence over `columns`.
    pub schema_path: Option<PathBuf>,
    pub columns: Option<Vec<String>>,
    pub naming: NamingSetting,
    pub category_policy: CategoryPolicy,
    pub placeholder_seed: Option<u64>,
    pub map: MapConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            airports_path: PathBuf::from("data/airports.csv"),
            model_path: None,
            schema_path: None,
            columns: None,
            naming: NamingSetting::default(),
            category_policy: CategoryPolicy::default(),
            placeholder_seed: None,
            map: MapConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join("config.json")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        // Relative paths in the file are relative to the file itself.
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        log::debug!("[Config] Loaded config from: {}", path.display());
        Ok(config)
    }

    /// An explicit path must exist; the per-user default is optional.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.airports_path);
        if let Some(p) = self.model_path.as_mut() {
            fix(p);
        }
        if let Some(p) = self.schema_path.as_mut() {
            fix(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"naming": "bts", "category_policy": "strict", "map": {"zoom": 4.0}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.naming.resolve(), ColumnNaming::bts());
        assert_eq!(config.category_policy, CategoryPolicy::Strict);
        assert_eq!(config.map.zoom, 4.0);
        assert_eq!(config.map.pitch, 50.0);
        assert_eq!(config.airports_path, dir.path().join("data/airports.csv"));
        assert!(config.model_path.is_none());
    }

    #[test]
    fn test_custom_naming_table() {
        let json = r#"{"naming": {"carrier_prefix": "airline_", "origin_prefix": "from_"}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let naming = config.naming.resolve();
        assert_eq!(naming.carrier_prefix, "airline_");
        assert_eq!(naming.origin_prefix, "from_");
        // unspecified fields fall back to the generic names
        assert_eq!(naming.day_of_month, "day");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            airports_path: dir.path().join("airports.csv"),
            model_path: Some(dir.path().join("xgb_model.json")),
            columns: Some(vec!["year".to_string(), "month".to_string()]),
            placeholder_seed: Some(7),
            ..AppConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempdir().unwrap();
        assert!(AppConfig::load_or_default(Some(&dir.path().join("missing.json"))).is_err());
    }
}
