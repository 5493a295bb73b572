//! Change notifications.
//!
//! Best-effort webhook delivery of a human-readable change summary. No
//! configured endpoint means notifications are silently skipped; delivery
//! failures are logged and never fail the run: publication has already
//! succeeded by the time the notifier runs.

use buildwatch_core::config::NetworkConfig;
use buildwatch_core::{BuildDescriptor, DiffSummary};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Webhook payload describing one published build.
#[derive(Debug, Serialize)]
pub struct Notification<'a> {
    pub environment: &'a str,
    pub build_type: String,
    pub build_hash: &'a str,
    /// Extracted version when available, upstream version otherwise
    pub version: &'a str,
    /// Public URL of the published snapshot, when a public base is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Change counts versus the previous snapshot; absent on first publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffSummary>,
}

/// Best-effort webhook notifier.
pub struct Notifier {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(network: &NetworkConfig, webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(std::time::Duration::from_secs(network.http_timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            webhook_url,
        }
    }

    /// Deliver a change notice. Never returns an error; failures are logged.
    pub async fn notify(
        &self,
        descriptor: &BuildDescriptor,
        extracted_version: Option<&str>,
        public_url: Option<String>,
        diff: Option<DiffSummary>,
    ) {
        let Some(webhook_url) = &self.webhook_url else {
            debug!("no webhook configured, skipping notification");
            return;
        };

        let version = extracted_version.unwrap_or(&descriptor.build_version);
        let payload = Notification {
            environment: &descriptor.environment,
            build_type: descriptor.build_type.to_string(),
            build_hash: &descriptor.build_hash,
            version,
            url: public_url,
            diff,
        };

        match self.client.post(webhook_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(
                    environment = %descriptor.environment,
                    build_type = %descriptor.build_type,
                    "notification delivered"
                );
            }
            Ok(response) => {
                warn!(status = %response.status(), "notification rejected");
            }
            Err(e) => {
                warn!(error = %e, "notification delivery failed");
            }
        }
    }
}
