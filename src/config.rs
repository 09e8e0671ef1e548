//! Configuration loader and validator for the pet profile dashboard.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::collector::{CollectorSettings, DEFAULT_CAP, DEFAULT_PAGE_SIZE, PAGE_DELAY};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub shopify: Shopify,
    #[serde(default)]
    pub collector: Collector,
    #[serde(default)]
    pub dashboard: Dashboard,
}

/// Admin API access.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shopify {
    /// `my-shop.myshopify.com`
    pub shop: String,
    pub access_token: String,
    pub api_version: String,
    #[serde(default = "default_namespace")]
    pub metafield_namespace: String,
}

/// Collection tunables and the remote query strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Collector {
    /// `null` disables the cap.
    #[serde(default = "default_cap")]
    pub cap: Option<usize>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub source: Source,
}

/// Which remote collection to page through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// The shop's customer list, optionally narrowed by a search query.
    Customers {
        #[serde(default)]
        query: Option<String>,
    },
    /// Members of a customer segment, by id or by exact name.
    Segment {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

/// Merchant display settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dashboard {
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default = "default_true")]
    pub show_pet_age: bool,
    #[serde(default = "default_true")]
    pub show_pet_weight: bool,
}

fn default_namespace() -> String {
    "custom".to_string()
}

fn default_cap() -> Option<usize> {
    Some(DEFAULT_CAP)
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_heading() -> String {
    "Pet profiles".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Collector {
    fn default() -> Self {
        Self {
            cap: default_cap(),
            page_size: default_page_size(),
            source: Source::default(),
        }
    }
}

impl Default for Source {
    fn default() -> Self {
        Source::Customers { query: None }
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            show_pet_age: true,
            show_pet_weight: true,
        }
    }
}

impl Collector {
    pub fn settings(&self) -> CollectorSettings {
        CollectorSettings {
            cap: self.cap,
            page_size: self.page_size,
            page_delay: PAGE_DELAY,
        }
    }
}

impl Config {
    /// Replace the access token from `SHOPIFY_ACCESS_TOKEN` when set.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("SHOPIFY_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                self.shopify.access_token = token;
            }
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.shopify.shop.trim().is_empty() {
        return Err(ConfigError::Invalid("shopify.shop must be non-empty"));
    }
    if cfg.shopify.access_token.trim().is_empty() {
        return Err(ConfigError::Invalid("shopify.access_token must be non-empty"));
    }
    if cfg.shopify.api_version.trim().is_empty() {
        return Err(ConfigError::Invalid("shopify.api_version must be non-empty"));
    }
    if cfg.shopify.metafield_namespace.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "shopify.metafield_namespace must be non-empty",
        ));
    }

    // page_size above the API ceiling is clamped at collection time
    if cfg.collector.page_size == 0 {
        return Err(ConfigError::Invalid("collector.page_size must be > 0"));
    }
    if let Source::Segment { id, name } = &cfg.collector.source {
        let has_id = id.as_deref().is_some_and(|v| !v.trim().is_empty());
        let has_name = name.as_deref().is_some_and(|v| !v.trim().is_empty());
        if !has_id && !has_name {
            return Err(ConfigError::Invalid(
                "collector.source segment needs a non-empty id or name",
            ));
        }
    }

    if cfg.dashboard.heading.trim().is_empty() {
        return Err(ConfigError::Invalid("dashboard.heading must be non-empty"));
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"shopify:
  shop: "your-shop.myshopify.com"
  access_token: "YOUR_ADMIN_API_ACCESS_TOKEN"
  api_version: "2024-10"
  metafield_namespace: "custom"

collector:
  cap: 1000
  page_size: 100
  source:
    kind: segment
    name: "Pet owners"

dashboard:
  heading: "Pet profiles"
  show_pet_age: true
  show_pet_weight: true
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(
            cfg.collector.source,
            Source::Segment {
                id: None,
                name: Some("Pet owners".into())
            }
        );
    }

    #[test]
    fn defaults_fill_optional_sections() {
        let cfg: Config = serde_yaml::from_str(
            r#"shopify:
  shop: "s.myshopify.com"
  access_token: "t"
  api_version: "2024-10"
"#,
        )
        .unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.shopify.metafield_namespace, "custom");
        assert_eq!(cfg.collector.cap, Some(1000));
        assert_eq!(cfg.collector.page_size, 100);
        assert_eq!(cfg.collector.source, Source::Customers { query: None });
        assert!(cfg.dashboard.show_pet_age);
        assert!(cfg.dashboard.show_pet_weight);
    }

    #[test]
    fn null_cap_disables_limit() {
        let cfg: Config = serde_yaml::from_str(
            r#"shopify:
  shop: "s.myshopify.com"
  access_token: "t"
  api_version: "2024-10"
collector:
  cap: null
  page_size: 500
"#,
        )
        .unwrap();
        validate(&cfg).unwrap();
        let settings = cfg.collector.settings();
        assert_eq!(settings.cap, None);
        assert_eq!(settings.page_size, 500);
    }

    #[test]
    fn invalid_shopify_fields() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.shopify.access_token = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("access_token")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.shopify.shop = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.shopify.metafield_namespace = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_collector_fields() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.collector.page_size = 0;
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("page_size")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.collector.source = Source::Segment {
            id: Some("".into()),
            name: None,
        };
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_dashboard_heading() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.dashboard.heading = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.shopify.api_version, "2024-10");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let td = tempdir().unwrap();
        let err = load(Some(&td.path().join("absent.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
