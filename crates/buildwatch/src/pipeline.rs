//! Per-pair pipeline execution.
//!
//! One `(environment, build type)` pair runs gate, fetch, extraction,
//! archiving, diffing and publication in order. Every run is independent:
//! a failure aborts that pair's run before any published state changes and
//! the next pair proceeds untouched.

use std::sync::Arc;

use buildwatch_core::config::WatchConfig;
use buildwatch_core::fsutil::{reset_dir, write_with_parents};
use buildwatch_core::tools::LauncherUnpacker;
use buildwatch_core::{
    BuildType, DiffSummary, GateDecision, Layout, PublishedState, Result, SkipReason, SnapshotId,
};
use buildwatch_extract::{
    ExtractionCoordinator, SubprocessAssetExtractor, SubprocessDumper, SubprocessUnpacker,
};
use buildwatch_fetch::AssetDownloader;
use buildwatch_publish::{archive_snapshot, diff_trees, promote, store_in_history, Notifier};
use buildwatch_source::{gate, AppSettings, SourceMonitor};
use tracing::{error, info, info_span, warn, Instrument};

/// Raw app-settings document archived alongside the extraction products.
pub const APP_SETTINGS_FILENAME: &str = "app_settings.xml";

/// Build hash marker archived with every snapshot.
pub const BUILD_HASH_FILENAME: &str = "build_hash.txt";

/// What one pair's run produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// The gate declined the build; nothing was touched.
    Skipped(SkipReason),

    /// A new snapshot was stored and promoted to current.
    Published {
        snapshot_id: SnapshotId,
        diff: Option<DiffSummary>,
    },
}

/// Wires the pipeline stages together for repeated runs.
pub struct Pipeline {
    layout: Layout,
    downloader: AssetDownloader,
    unpacker: Option<Arc<dyn LauncherUnpacker>>,
    coordinator: ExtractionCoordinator,
    notifier: Notifier,
    public_base_url: Option<String>,
}

impl Pipeline {
    /// Build the pipeline from configuration, wiring up the configured
    /// external tools.
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        let unpacker: Option<Arc<dyn LauncherUnpacker>> = config
            .tools
            .launcher_unpacker
            .as_ref()
            .map(|exe| Arc::new(SubprocessUnpacker::new(exe)) as Arc<dyn LauncherUnpacker>);

        let coordinator = ExtractionCoordinator::new(
            config
                .tools
                .asset_extractor
                .as_ref()
                .map(|exe| Arc::new(SubprocessAssetExtractor::new(exe)) as _),
            config
                .tools
                .metadata_dumper
                .as_ref()
                .map(|exe| Arc::new(SubprocessDumper::new(exe)) as _),
        );

        Ok(Self {
            layout: Layout::new(&config.temp_dir, &config.publish_dir),
            downloader: AssetDownloader::new(&config.network)?,
            unpacker,
            coordinator,
            notifier: Notifier::new(&config.network, config.webhook_url.clone()),
            public_base_url: config.public_base_url.clone(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Run the pipeline for every `(environment, build type)` pair in the
    /// configured order, fetching each environment's app settings once.
    pub async fn run_pass(&self, monitor: &SourceMonitor, config: &WatchConfig) {
        for env in &config.environments {
            let settings = match monitor.fetch(env).await {
                Ok(settings) => settings,
                Err(e) => {
                    error!(environment = %env.name, error = %e, "app settings unavailable");
                    continue;
                }
            };

            for build_type in BuildType::ALL {
                let span = info_span!("pair", environment = %env.name, build_type = %build_type);
                match self.run_pair(&settings, build_type).instrument(span).await {
                    Ok(RunOutcome::Skipped(reason)) => {
                        info!(environment = %env.name, build_type = %build_type, %reason, "skipped");
                    }
                    Ok(RunOutcome::Published { snapshot_id, .. }) => {
                        info!(
                            environment = %env.name,
                            build_type = %build_type,
                            snapshot = %snapshot_id,
                            "published"
                        );
                    }
                    Err(e) => {
                        error!(
                            environment = %env.name,
                            build_type = %build_type,
                            error = %e,
                            "run failed, published state untouched"
                        );
                    }
                }
            }
        }
    }

    /// Run one pair end to end: gate, fetch, extract, archive, diff,
    /// store, promote, notify.
    pub async fn run_pair(
        &self,
        settings: &AppSettings,
        build_type: BuildType,
    ) -> Result<RunOutcome> {
        let descriptor = settings.descriptor(build_type);
        let paths = self.layout.pair(&descriptor.environment, build_type);

        let last = PublishedState::load(&paths.publish_dir)?;
        match gate::decide(descriptor, last.as_ref()) {
            GateDecision::Skip(reason) => return Ok(RunOutcome::Skipped(reason)),
            GateDecision::Proceed => {}
        }
        info!(build_hash = %descriptor.build_hash, "new build detected");

        reset_dir(&paths.files_dir)?;
        reset_dir(&paths.work_dir)?;

        write_with_parents(&paths.work_dir.join(APP_SETTINGS_FILENAME), &settings.raw_xml)?;
        write_with_parents(
            &paths.work_dir.join(BUILD_HASH_FILENAME),
            &descriptor.build_hash,
        )?;

        let acquired = buildwatch_fetch::acquire(
            &self.downloader,
            self.unpacker.as_deref(),
            descriptor,
            &paths.files_dir,
        )
        .await?;
        info!(strategy = ?acquired.strategy, "assets acquired");

        let extraction = self.coordinator.run(&acquired.root, &paths.work_dir).await?;

        let snapshot = archive_snapshot(
            descriptor,
            extraction.version.clone(),
            &acquired.root,
            &paths.work_dir,
            &paths.snapshot_dir,
        )?;

        let diff = match &last {
            Some(state) => {
                let previous = state.snapshot_dir(&paths.publish_dir);
                if previous.is_dir() {
                    match diff_trees(&previous, &snapshot.root) {
                        Ok(summary) => Some(summary),
                        Err(e) => {
                            warn!(error = %e, "diff failed, publishing without a summary");
                            None
                        }
                    }
                } else {
                    warn!(snapshot = %state.snapshot_id, "previous snapshot missing from history");
                    None
                }
            }
            None => None,
        };

        store_in_history(&snapshot, &paths.publish_dir)?;
        promote(&snapshot, &paths.publish_dir)?;

        let public_url = self.public_base_url.as_ref().map(|base| {
            format!(
                "{}/{}/{}/{}",
                base.trim_end_matches('/'),
                build_type.as_segment(),
                descriptor.environment.to_lowercase(),
                snapshot.id
            )
        });
        self.notifier
            .notify(descriptor, extraction.version.as_deref(), public_url, diff)
            .await;

        Ok(RunOutcome::Published {
            snapshot_id: snapshot.id,
            diff,
        })
    }
}
