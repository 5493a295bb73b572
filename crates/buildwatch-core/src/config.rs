//! Configuration file loading and validation.
//!
//! One versioned YAML file, loaded once at startup and passed by reference
//! into every component. All operational knobs live here: tracked
//! environments, directory roots, poll interval, webhook endpoint, external
//! tool paths and HTTP settings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Configuration file names to search for in the working directory
const CONFIG_FILE_NAMES: &[&str] = &["buildwatch.yaml", "buildwatch.yml"];

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WatchConfig {
    /// Config schema version; currently always 1
    #[serde(default = "default_version")]
    pub version: u32,

    /// Environments to track, polled in listed order
    pub environments: Vec<EnvironmentConfig>,

    /// Scratch root for downloads and staging (wiped every pass)
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Permanent publish root holding snapshot history and current pointers
    #[serde(default = "default_publish_dir")]
    pub publish_dir: PathBuf,

    /// Public base URL the publish root is served under (used in notifications)
    pub public_base_url: Option<String>,

    /// Seconds to sleep between full passes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Webhook endpoint for change notifications; omit to disable
    pub webhook_url: Option<String>,

    /// External tool executables
    #[serde(default)]
    pub tools: ToolsConfig,

    /// HTTP client settings
    #[serde(default)]
    pub network: NetworkConfig,
}

/// One tracked deployment environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EnvironmentConfig {
    /// Display name; lowercased for path segments
    pub name: String,

    /// App-settings endpoint returning the build descriptor document
    pub app_settings_url: String,
}

/// Paths to the external tool executables the extraction step shells out to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolsConfig {
    /// Asset-bundle parser: `<exe> <bundle-root> <out-dir>`
    pub asset_extractor: Option<PathBuf>,

    /// Native metadata dumper: `<exe> --bin ... --metadata ... --layout class ...`
    pub metadata_dumper: Option<PathBuf>,

    /// Installer unpacker: `<exe> <installer> <out-dir>`
    pub launcher_unpacker: Option<PathBuf>,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_version() -> u32 {
    1
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("temp")
}

fn default_publish_dir() -> PathBuf {
    PathBuf::from("publish")
}

fn default_poll_interval() -> u64 {
    300
}

fn default_http_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    format!("buildwatch/{}", env!("CARGO_PKG_VERSION"))
}

impl WatchConfig {
    /// Load configuration from the specified path, or search the working
    /// directory for `buildwatch.yaml` / `buildwatch.yml`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, content) = match path {
            Some(p) => {
                let content = fs::read_to_string(p).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::config_not_found(p.display().to_string())
                    } else {
                        Error::Io(e)
                    }
                })?;
                (p.to_path_buf(), content)
            }
            None => Self::find_config()?,
        };

        let config: WatchConfig = serde_yaml_ng::from_str(&content)?;
        config.validate().map_err(|e| match e {
            Error::InvalidConfig { message } => Error::invalid_config(format!(
                "{}: {}",
                path.display(),
                message
            )),
            other => other,
        })?;
        Ok(config)
    }

    fn find_config() -> Result<(PathBuf, String)> {
        for name in CONFIG_FILE_NAMES {
            let candidate = PathBuf::from(name);
            if candidate.is_file() {
                let content = fs::read_to_string(&candidate)?;
                return Ok((candidate, content));
            }
        }
        Err(Error::config_not_found(CONFIG_FILE_NAMES.join(" or ")))
    }

    /// Validate option values beyond what serde can express.
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(Error::invalid_config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        if self.environments.is_empty() {
            return Err(Error::invalid_config("no environments configured"));
        }
        for env in &self.environments {
            if env.name.trim().is_empty() {
                return Err(Error::invalid_config("environment with empty name"));
            }
            Url::parse(&env.app_settings_url).map_err(|e| {
                Error::invalid_config(format!(
                    "environment '{}': bad app-settings-url: {}",
                    env.name, e
                ))
            })?;
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::invalid_config("poll-interval-secs must be nonzero"));
        }
        if let Some(url) = &self.webhook_url {
            Url::parse(url)
                .map_err(|e| Error::invalid_config(format!("bad webhook-url: {}", e)))?;
        }
        if let Some(url) = &self.public_base_url {
            Url::parse(url)
                .map_err(|e| Error::invalid_config(format!("bad public-base-url: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
environments:
  - name: Production
    app-settings-url: https://game.example.com/app/init
  - name: Testing
    app-settings-url: https://test.example.com/app/init
"#
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: WatchConfig = serde_yaml_ng::from_str(minimal_yaml()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.environments.len(), 2);
        assert_eq!(config.poll_interval_secs, 300);
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
        assert!(config.webhook_url.is_none());
        assert!(config.tools.metadata_dumper.is_none());
    }

    #[test]
    fn rejects_empty_environments() {
        let config: WatchConfig = serde_yaml_ng::from_str(
            "environments: []\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_urls() {
        let yaml = r#"
environments:
  - name: Production
    app-settings-url: not-a-url
"#;
        let config: WatchConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let yaml = format!("{}poll-interval-secs: 0\n", minimal_yaml());
        let config: WatchConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
version: 1
environments:
  - name: Production
    app-settings-url: https://game.example.com/app/init
temp-dir: /var/tmp/buildwatch
publish-dir: /srv/www/builds
public-base-url: https://builds.example.com
poll-interval-secs: 600
webhook-url: https://hooks.example.com/T000/B000
tools:
  asset-extractor: /opt/tools/assetrip
  metadata-dumper: /opt/tools/ilspector
  launcher-unpacker: /opt/tools/unpacker
network:
  http-timeout-secs: 60
  user-agent: buildwatch-test
"#;
        let config: WatchConfig = serde_yaml_ng::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.network.http_timeout_secs, 60);
        assert_eq!(
            config.tools.launcher_unpacker.as_deref(),
            Some(Path::new("/opt/tools/unpacker"))
        );
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://builds.example.com")
        );
    }
}
