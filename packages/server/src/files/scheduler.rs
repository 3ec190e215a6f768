use std::sync::Arc;
use std::time::Duration;

use common::cdn::CdnInvalidator;
use common::storage::BlobStore;
use sea_orm::DatabaseConnection;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info};

use super::FileError;
use super::collector::CollectorRegistry;
use super::gc::{GcReport, run_gc};
use crate::config::GcConfig;

/// Everything one garbage collection run needs, shared by the periodic task
/// and the admin trigger.
#[derive(Clone)]
pub struct GarbageCollector {
    db: DatabaseConnection,
    collectors: Arc<CollectorRegistry>,
    blob_store: Arc<dyn BlobStore>,
    cdn: Arc<dyn CdnInvalidator>,
    config: GcConfig,
}

impl GarbageCollector {
    pub fn new(
        db: DatabaseConnection,
        collectors: Arc<CollectorRegistry>,
        blob_store: Arc<dyn BlobStore>,
        cdn: Arc<dyn CdnInvalidator>,
        config: GcConfig,
    ) -> Self {
        Self {
            db,
            collectors,
            blob_store,
            cdn,
            config,
        }
    }

    pub fn config(&self) -> &GcConfig {
        &self.config
    }

    pub async fn run_once(&self) -> Result<GcReport, FileError> {
        run_gc(
            &self.db,
            &self.collectors,
            self.blob_store.as_ref(),
            self.cdn.as_ref(),
            &self.config,
        )
        .await
    }
}

/// Run orphan file collection as a background task.
///
/// The first run happens one full interval after startup. Runs are
/// sequential; a slow run delays the next tick instead of overlapping it.
pub async fn run_file_gc(gc: GarbageCollector) {
    let period = Duration::from_secs(gc.config.interval_secs.max(1));

    info!(
        interval_secs = gc.config.interval_secs,
        grace_hours = gc.config.grace_hours,
        collectors = gc.collectors.len(),
        "Starting file garbage collector"
    );

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if let Err(e) = gc.run_once().await {
            error!(error = %e, "File garbage collection failed");
        }
    }
}
