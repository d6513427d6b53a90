use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

pub const API_URL_ENV: &str = "CREWDESK_API_URL";
pub const API_KEY_ENV: &str = "CREWDESK_API_KEY";

const DEFAULT_CURRENCY: &str = "A$";

/// Resolved runtime configuration. Built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  /// Currency symbol used when formatting budgets and salaries
  pub currency: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// Base URL; always ends with '/' so endpoints join underneath it
  pub base_url: Url,
  /// Subscription key sent with every request; empty when unset
  pub api_key: String,
}

/// On-disk config file. Every field is optional; the environment can
/// supply or override the API settings.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
  #[serde(default)]
  api: FileApiConfig,
  title: Option<String>,
  currency: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileApiConfig {
  url: Option<String>,
}

impl Config {
  /// Load configuration from file and environment.
  ///
  /// File search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./crewdesk.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/crewdesk/config.yaml
  ///
  /// The file is optional. `CREWDESK_API_URL` overrides `api.url` and
  /// `CREWDESK_API_KEY` supplies the subscription key.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let file = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => FileConfig::default(),
    };

    Self::resolve(
      file,
      std::env::var(API_URL_ENV).ok(),
      std::env::var(API_KEY_ENV).ok(),
    )
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("crewdesk.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("crewdesk").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<FileConfig> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn resolve(file: FileConfig, env_url: Option<String>, env_key: Option<String>) -> Result<Self> {
    let raw_url = env_url
      .filter(|u| !u.trim().is_empty())
      .or(file.api.url)
      .ok_or_else(|| {
        eyre!(
          "No API base URL configured. Set {} or api.url in ~/.config/crewdesk/config.yaml",
          API_URL_ENV
        )
      })?;

    Ok(Self {
      api: ApiConfig {
        base_url: normalize_base_url(&raw_url)?,
        api_key: env_key.unwrap_or_default(),
      },
      title: file.title,
      currency: file
        .currency
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
    })
  }

  /// Host shown in the header
  pub fn api_host(&self) -> &str {
    self.api.base_url.host_str().unwrap_or("")
  }
}

/// Parse the base URL and make sure its path ends with '/'
pub fn normalize_base_url(raw: &str) -> Result<Url> {
  let mut url =
    Url::parse(raw.trim()).map_err(|e| eyre!("Invalid API base URL {:?}: {}", raw, e))?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(yaml: &str) -> FileConfig {
    serde_yaml::from_str(yaml).unwrap()
  }

  #[test]
  fn test_file_only() {
    let file = parse("api:\n  url: https://staff.example.com/api\ntitle: Crew\n");
    let config = Config::resolve(file, None, None).unwrap();

    assert_eq!(config.api.base_url.as_str(), "https://staff.example.com/api/");
    assert_eq!(config.api.api_key, "");
    assert_eq!(config.title.as_deref(), Some("Crew"));
    assert_eq!(config.currency, "A$");
    assert_eq!(config.api_host(), "staff.example.com");
  }

  #[test]
  fn test_env_overrides_file() {
    let file = parse("api:\n  url: https://old.example.com/\ncurrency: \"€\"\n");
    let config = Config::resolve(
      file,
      Some("https://new.example.com/v2/".to_string()),
      Some("secret".to_string()),
    )
    .unwrap();

    assert_eq!(config.api.base_url.as_str(), "https://new.example.com/v2/");
    assert_eq!(config.api.api_key, "secret");
    assert_eq!(config.currency, "€");
  }

  #[test]
  fn test_missing_url_is_an_error() {
    assert!(Config::resolve(FileConfig::default(), None, Some("k".to_string())).is_err());
    assert!(Config::resolve(FileConfig::default(), Some("  ".to_string()), None).is_err());
  }

  #[test]
  fn test_invalid_url_is_an_error() {
    assert!(normalize_base_url("not a url").is_err());
  }
}
