//! Build descriptor source.
//!
//! Each tracked environment exposes an app-settings endpoint returning an XML
//! document advertising the current client and launcher builds:
//!
//! ```text
//! <AppSettings>
//!   <BuildId>game-win-64</BuildId>
//!   <BuildHash>a1c8d9ae2a2508dcc3994b33dd6a803a</BuildHash>
//!   <BuildVersion>a9cb33d6944a7f8bbf7181c71cc932f1</BuildVersion>
//!   <BuildCDN>https://cdn.example.com/build-release/</BuildCDN>
//!   <LauncherBuildId>Game-Installer</LauncherBuildId>
//!   ...
//! </AppSettings>
//! ```
//!
//! Descriptors are produced fresh on every poll and never persisted; the raw
//! document is kept so the pipeline can archive it alongside the snapshot.

use buildwatch_core::config::{EnvironmentConfig, NetworkConfig};
use buildwatch_core::{BuildDescriptor, BuildType, Error, Result};
use tracing::debug;

/// The parsed app-settings response for one environment: the raw document
/// plus one descriptor per build type.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Raw XML as served, archived into the snapshot
    pub raw_xml: String,

    /// Client build descriptor
    pub client: BuildDescriptor,

    /// Launcher build descriptor
    pub launcher: BuildDescriptor,
}

impl AppSettings {
    /// Descriptor for the given build type.
    pub fn descriptor(&self, build_type: BuildType) -> &BuildDescriptor {
        match build_type {
            BuildType::Client => &self.client,
            BuildType::Launcher => &self.launcher,
        }
    }
}

/// Fetches build descriptors for tracked environments.
pub struct SourceMonitor {
    client: reqwest::Client,
}

impl SourceMonitor {
    /// Create a monitor with the configured HTTP settings.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(std::time::Duration::from_secs(network.http_timeout_secs))
            .build()
            .map_err(|e| Error::source(format!("building HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch and parse the app-settings document for one environment.
    pub async fn fetch(&self, env: &EnvironmentConfig) -> Result<AppSettings> {
        debug!(url = %env.app_settings_url, "fetching app settings");

        let response = self
            .client
            .get(&env.app_settings_url)
            .send()
            .await
            .map_err(|e| Error::source(format!("requesting {}: {}", env.app_settings_url, e)))?;

        if !response.status().is_success() {
            return Err(Error::source(format!(
                "{} returned {}",
                env.app_settings_url,
                response.status()
            )));
        }

        let raw_xml = response
            .text()
            .await
            .map_err(|e| Error::source(format!("reading response body: {}", e)))?;

        parse_app_settings(&env.name, &raw_xml)
    }
}

/// Parse an app-settings document into per-type descriptors.
///
/// Missing elements become empty fields; an empty `BuildHash` simply means
/// the build type has no active build and the gate will skip it.
pub fn parse_app_settings(environment: &str, raw_xml: &str) -> Result<AppSettings> {
    let doc = roxmltree::Document::parse(raw_xml)
        .map_err(|e| Error::source(format!("parsing app settings: {}", e)))?;
    let root = doc.root_element();
    if root.tag_name().name() != "AppSettings" {
        return Err(Error::source(format!(
            "unexpected root element <{}>",
            root.tag_name().name()
        )));
    }

    let text = |name: &str| -> String {
        root.children()
            .find(|n| n.is_element() && n.tag_name().name() == name)
            .and_then(|n| n.text())
            .unwrap_or_default()
            .trim()
            .to_string()
    };

    let client = BuildDescriptor {
        environment: environment.to_string(),
        build_type: BuildType::Client,
        build_id: text("BuildId"),
        build_hash: text("BuildHash"),
        build_version: text("BuildVersion"),
        cdn_base_url: text("BuildCDN"),
    };
    let launcher = BuildDescriptor {
        environment: environment.to_string(),
        build_type: BuildType::Launcher,
        build_id: text("LauncherBuildId"),
        build_hash: text("LauncherBuildHash"),
        build_version: text("LauncherBuildVersion"),
        cdn_base_url: text("LauncherBuildCDN"),
    };

    Ok(AppSettings {
        raw_xml: raw_xml.to_string(),
        client,
        launcher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<AppSettings>
  <BuildId>game-win-64</BuildId>
  <BuildHash>a1c8d9ae2a2508dcc3994b33dd6a803a</BuildHash>
  <BuildVersion>a9cb33d6944a7f8bbf7181c71cc932f11ed85ba3</BuildVersion>
  <BuildCDN>https://cdn.example.com/build-release/</BuildCDN>
  <LauncherBuildId>Game-Installer</LauncherBuildId>
  <LauncherBuildHash>d554e291899750f9d36c750798e85646</LauncherBuildHash>
  <LauncherBuildVersion>386777c109b1f7385ab1636bc7e82a1d</LauncherBuildVersion>
  <LauncherBuildCDN>https://cdn.example.com/launcher-release/</LauncherBuildCDN>
</AppSettings>"#;

    #[test]
    fn parses_both_build_types() {
        let settings = parse_app_settings("Production", SAMPLE).unwrap();

        assert_eq!(settings.client.build_id, "game-win-64");
        assert_eq!(
            settings.client.build_hash,
            "a1c8d9ae2a2508dcc3994b33dd6a803a"
        );
        assert_eq!(settings.client.build_type, BuildType::Client);

        assert_eq!(settings.launcher.build_id, "Game-Installer");
        assert_eq!(
            settings.launcher.cdn_base_url,
            "https://cdn.example.com/launcher-release/"
        );
        assert_eq!(settings.launcher.environment, "Production");
    }

    #[test]
    fn missing_launcher_fields_become_empty() {
        let xml = r#"<AppSettings>
  <BuildId>game-win-64</BuildId>
  <BuildHash>abc</BuildHash>
  <BuildVersion>v</BuildVersion>
  <BuildCDN>https://cdn.example.com/</BuildCDN>
</AppSettings>"#;
        let settings = parse_app_settings("Testing", xml).unwrap();
        assert!(!settings.launcher.has_build());
        assert!(settings.client.has_build());
    }

    #[test]
    fn rejects_unexpected_document() {
        assert!(parse_app_settings("Production", "<Error>down</Error>").is_err());
        assert!(parse_app_settings("Production", "not xml at all").is_err());
    }

    #[tokio::test]
    async fn fetches_from_http_endpoint() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/init"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE))
            .mount(&server)
            .await;

        let env = EnvironmentConfig {
            name: "Testing".to_string(),
            app_settings_url: format!("{}/app/init", server.uri()),
        };
        let monitor = SourceMonitor::new(&NetworkConfig::default()).unwrap();
        let settings = monitor.fetch(&env).await.unwrap();

        assert_eq!(settings.client.build_id, "game-win-64");
        assert_eq!(settings.raw_xml, SAMPLE);
    }

    #[tokio::test]
    async fn server_error_is_a_source_error() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/app/init"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let env = EnvironmentConfig {
            name: "Testing".to_string(),
            app_settings_url: format!("{}/app/init", server.uri()),
        };
        let monitor = SourceMonitor::new(&NetworkConfig::default()).unwrap();
        assert!(monitor.fetch(&env).await.is_err());
    }
}
