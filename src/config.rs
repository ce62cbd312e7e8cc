use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::report::StateCategory;

/// Central configuration for scansheet: everything the core logic treats
/// as externally supplied: paths, the per-category fill colors and the
/// profile-name → nmap-argument-template table. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub output_dir: PathBuf,
    pub scan_dir: PathBuf,
    pub nmap_path: PathBuf,
    pub output_suffix: String,
    pub colors: ColorTable,
    pub profiles: BTreeMap<String, Vec<String>>,
}

/// RRGGBB hex fill color per state category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorTable {
    pub open: String,
    pub closed: String,
    pub filtered: String,
    pub undefined: String,
    pub default: String,
}

impl ColorTable {
    pub fn hex_for(&self, category: StateCategory) -> &str {
        match category {
            StateCategory::Open => &self.open,
            StateCategory::Closed => &self.closed,
            StateCategory::Filtered => &self.filtered,
            StateCategory::Undefined => &self.undefined,
            StateCategory::Default => &self.default,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("open", &self.open),
            ("closed", &self.closed),
            ("filtered", &self.filtered),
            ("undefined", &self.undefined),
            ("default", &self.default),
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        let profiles: BTreeMap<String, Vec<String>> = [
            ("ping", vec!["-sn"]),
            ("regular", vec![]),
            ("quick", vec!["-T4", "-F"]),
            ("quick-plus", vec!["-sV", "-T4", "-O", "-F", "--version-light"]),
            ("quick-traceroute", vec!["-sn", "--traceroute"]),
            ("intense", vec!["-T4", "-A", "-v"]),
            ("intense-udp", vec!["-sS", "-sU", "-T4", "-A", "-v"]),
            ("intense-all-tcp", vec!["-p", "1-65535", "-T4", "-A", "-v"]),
            ("intense-no-ping", vec!["-T4", "-A", "-v", "-Pn"]),
            (
                "slow-comprehensive",
                vec![
                    "-sS", "-sU", "-T4", "-A", "-v", "-PE", "-PP", "-PS80,443",
                    "-PA3389", "-PU40125", "-PY", "-g", "53",
                ],
            ),
        ]
        .into_iter()
        .map(|(name, args)| {
            (
                name.to_string(),
                args.into_iter().map(str::to_string).collect(),
            )
        })
        .collect();

        Self {
            output_dir: PathBuf::from("reports"),
            scan_dir: PathBuf::from("scans"),
            nmap_path: PathBuf::from("nmap"),
            output_suffix: "_report.xlsx".to_string(),
            colors: ColorTable {
                open: "90EE90".to_string(),
                closed: "FFCCCB".to_string(),
                filtered: "FFFFE0".to_string(),
                undefined: "D3D3D3".to_string(),
                default: "FFFFFF".to_string(),
            },
            profiles,
        }
    }
}

impl Config {
    /// Load configuration from the standard config directory, creating it
    /// with defaults on first use.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path();

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to the standard config directory.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the path to the config file.
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("scansheet");
        path.push("config.json");
        path
    }

    /// Validate configuration settings.
    pub fn validate(&self) -> Result<()> {
        for (name, hex) in self.colors.entries() {
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(anyhow::anyhow!(
                    "color '{name}' must be a 6-digit RRGGBB hex string, got '{hex}'"
                ));
            }
        }

        if self.profiles.is_empty() {
            return Err(anyhow::anyhow!("profile table must not be empty"));
        }

        if self.output_suffix.is_empty() {
            return Err(anyhow::anyhow!("output_suffix must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.output_suffix, deserialized.output_suffix);
        assert_eq!(config.colors.open, deserialized.colors.open);
        assert_eq!(config.profiles.len(), deserialized.profiles.len());
    }

    #[test]
    fn test_color_lookup_covers_every_category() {
        let config = Config::default();
        assert_eq!(config.colors.hex_for(StateCategory::Open), "90EE90");
        assert_eq!(config.colors.hex_for(StateCategory::Closed), "FFCCCB");
        assert_eq!(config.colors.hex_for(StateCategory::Filtered), "FFFFE0");
        assert_eq!(config.colors.hex_for(StateCategory::Undefined), "D3D3D3");
        assert_eq!(config.colors.hex_for(StateCategory::Default), "FFFFFF");
    }

    #[test]
    fn test_malformed_color_fails_validation() {
        let mut config = Config::default();
        config.colors.open = "greenish".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_known_profiles_present() {
        let config = Config::default();
        assert!(config.profiles.contains_key("ping"));
        assert!(config.profiles.contains_key("intense"));
        assert_eq!(config.profiles["regular"], Vec::<String>::new());
    }
}
