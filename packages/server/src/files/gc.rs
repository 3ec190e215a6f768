use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use common::cdn::CdnInvalidator;
use common::storage::{BlobStore, cdn_path};
use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::FileError;
use super::collector::CollectorRegistry;
use super::store::{FileRecordStore, IN_CLAUSE_BATCH};
use crate::config::GcConfig;
use crate::entity::file_record;

/// Summary of one garbage collection run.
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct GcReport {
    /// The run stopped before querying because no file is referenced anywhere.
    pub skipped: bool,
    /// Distinct file ids reported in use.
    pub used: usize,
    /// Collectors that failed and were left out of `used`.
    pub failed_collectors: Vec<String>,
    /// Unreferenced files older than the grace period.
    pub candidates: usize,
    pub delete_batches: usize,
    pub remote_deleted: usize,
    pub remote_failed: usize,
    pub invalidation_batches: usize,
    pub rows_deleted: u64,
    /// Ids deleted remotely whose rows could not be removed.
    pub drifted: Vec<i64>,
}

/// Finds unreferenced files that are past the grace period.
pub struct OrphanResolver<'a, C: ConnectionTrait> {
    conn: &'a C,
    batch_size: usize,
}

impl<'a, C: ConnectionTrait> OrphanResolver<'a, C> {
    pub fn new(conn: &'a C, batch_size: usize) -> Self {
        Self {
            conn,
            batch_size: batch_size.max(1),
        }
    }

    /// Records created before `threshold` that are not in `used`.
    ///
    /// `used` is split into `NOT IN` lists of at most `batch_size` ids. A record
    /// is unused only if every chunk's query returns it.
    pub async fn resolve(
        &self,
        used: &HashSet<i64>,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<file_record::Model>, DbErr> {
        if used.is_empty() {
            return Ok(Vec::new());
        }

        let mut used: Vec<i64> = used.iter().copied().collect();
        used.sort_unstable();

        let store = FileRecordStore::new(self.conn);
        let mut candidates: Option<BTreeMap<i64, file_record::Model>> = None;

        for chunk in used.chunks(self.batch_size) {
            let unused = store.query_unused(chunk, threshold).await?;
            candidates = Some(match candidates {
                None => unused.into_iter().map(|m| (m.id, m)).collect(),
                Some(mut current) => {
                    let keep: HashSet<i64> = unused.iter().map(|m| m.id).collect();
                    current.retain(|id, _| keep.contains(id));
                    current
                }
            });

            if candidates.as_ref().is_some_and(|c| c.is_empty()) {
                break;
            }
        }

        Ok(candidates.unwrap_or_default().into_values().collect())
    }
}

/// Deletes candidate files from the blob store, the CDN and the database,
/// in that order.
///
/// Rows are deleted only for keys the blob store confirmed. Keys that fail
/// stay in both places and come back as candidates on the next run.
pub struct DeletionPipeline<'a, C: ConnectionTrait> {
    conn: &'a C,
    blob_store: &'a dyn BlobStore,
    cdn: &'a dyn CdnInvalidator,
}

impl<'a, C: ConnectionTrait> DeletionPipeline<'a, C> {
    pub fn new(conn: &'a C, blob_store: &'a dyn BlobStore, cdn: &'a dyn CdnInvalidator) -> Self {
        Self {
            conn,
            blob_store,
            cdn,
        }
    }

    pub async fn run(&self, candidates: &[file_record::Model], report: &mut GcReport) {
        if candidates.is_empty() {
            return;
        }

        let ids_by_key: HashMap<&str, i64> = candidates
            .iter()
            .map(|m| (m.storage_key.as_str(), m.id))
            .collect();
        let keys: Vec<String> = candidates.iter().map(|m| m.storage_key.clone()).collect();

        let confirmed = self.delete_remote(&keys, &ids_by_key, report).await;
        if confirmed.is_empty() {
            warn!(candidates = candidates.len(), "No remote deletions confirmed");
            return;
        }

        self.invalidate(&confirmed, report).await;

        let ids: Vec<i64> = confirmed
            .iter()
            .filter_map(|key| ids_by_key.get(key.as_str()).copied())
            .collect();
        self.delete_rows(&ids, report).await;
    }

    async fn delete_remote(
        &self,
        keys: &[String],
        ids_by_key: &HashMap<&str, i64>,
        report: &mut GcReport,
    ) -> Vec<String> {
        let batch_size = self.blob_store.batch_delete_limit().max(1);
        let mut confirmed = Vec::with_capacity(keys.len());

        for (batch, chunk) in keys.chunks(batch_size).enumerate() {
            report.delete_batches += 1;
            match self.blob_store.batch_delete(chunk).await {
                Ok(outcome) => {
                    for failure in &outcome.errors {
                        warn!(
                            key = %failure.key,
                            code = %failure.code,
                            message = %failure.message,
                            "Remote delete failed, keeping record"
                        );
                    }
                    report.remote_failed += outcome.errors.len();

                    // Only keys we asked for can be confirmed.
                    let accepted: Vec<String> = outcome
                        .deleted
                        .into_iter()
                        .filter(|key| ids_by_key.contains_key(key.as_str()))
                        .collect();
                    debug!(
                        batch,
                        requested = chunk.len(),
                        deleted = accepted.len(),
                        "Remote batch deleted"
                    );
                    report.remote_deleted += accepted.len();
                    confirmed.extend(accepted);
                }
                Err(e) => {
                    error!(batch, keys = chunk.len(), error = %e, "Remote batch delete failed");
                    report.remote_failed += chunk.len();
                }
            }
        }

        confirmed
    }

    async fn invalidate(&self, confirmed: &[String], report: &mut GcReport) {
        if !self.cdn.is_enabled() {
            debug!("CDN not configured, skipping invalidation");
            return;
        }

        let paths: Vec<String> = confirmed.iter().map(|key| cdn_path(key)).collect();
        let batch_size = self.cdn.max_paths_per_call().max(1);

        for chunk in paths.chunks(batch_size) {
            report.invalidation_batches += 1;
            match self.cdn.invalidate(chunk).await {
                Ok(id) => {
                    info!(invalidation_id = %id, paths = chunk.len(), "CDN invalidation created")
                }
                Err(e) => error!(paths = chunk.len(), error = %e, "CDN invalidation failed"),
            }
        }
    }

    /// Deletes rows one `IN` chunk at a time so a failed chunk only drifts
    /// its own ids; later chunks are still attempted.
    async fn delete_rows(&self, ids: &[i64], report: &mut GcReport) {
        let store = FileRecordStore::new(self.conn);

        for chunk in ids.chunks(IN_CLAUSE_BATCH) {
            match store.bulk_delete(chunk).await {
                Ok(deleted) => {
                    if deleted < chunk.len() as u64 {
                        warn!(
                            expected = chunk.len(),
                            deleted,
                            "Fewer file records deleted than confirmed"
                        );
                    }
                    report.rows_deleted += deleted;
                }
                Err(e) => {
                    error!(
                        ids = ?chunk,
                        error = %e,
                        "Consistency drift: objects deleted remotely but records remain"
                    );
                    report.drifted.extend_from_slice(chunk);
                }
            }
        }
    }
}

/// One full collection run: collect, resolve, delete.
#[instrument(skip_all)]
pub async fn run_gc<C: ConnectionTrait>(
    conn: &C,
    collectors: &CollectorRegistry,
    blob_store: &dyn BlobStore,
    cdn: &dyn CdnInvalidator,
    config: &GcConfig,
) -> Result<GcReport, FileError> {
    let outcome = collectors.collect_all().await;
    let mut report = GcReport {
        used: outcome.used.len(),
        failed_collectors: outcome.failed,
        ..GcReport::default()
    };

    if outcome.used.is_empty() {
        warn!("No used file ids collected, skipping garbage collection");
        report.skipped = true;
        return Ok(report);
    }

    let threshold = Utc::now() - chrono::Duration::hours(config.grace_hours);
    let candidates = OrphanResolver::new(conn, config.query_batch_size)
        .resolve(&outcome.used, threshold)
        .await?;
    report.candidates = candidates.len();

    if candidates.is_empty() {
        info!(used = report.used, "No unused files to delete");
        return Ok(report);
    }

    info!(candidates = candidates.len(), %threshold, "Deleting unused files");
    DeletionPipeline::new(conn, blob_store, cdn)
        .run(&candidates, &mut report)
        .await;

    info!(
        candidates = report.candidates,
        remote_deleted = report.remote_deleted,
        remote_failed = report.remote_failed,
        rows_deleted = report.rows_deleted,
        drifted = report.drifted.len(),
        "Garbage collection finished"
    );
    Ok(report)
}
