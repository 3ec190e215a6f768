//! File references embedded in markdown bodies.
//!
//! Bodies reference uploads with directives of the form
//! `::file[id=<number> ...]::`. Only the numeric id matters here.

use std::collections::BTreeSet;

use sea_orm::{ConnectionTrait, TransactionSession, TransactionTrait};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::FileError;
use super::mapping::{self, FileRole, OwnerRef};
use super::store::FileRecordStore;

const DIRECTIVE: &str = "::file[id=";

/// Ids to map and unmap to move an owner from one body to another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ContentDiff {
    pub to_add: BTreeSet<i64>,
    pub to_remove: BTreeSet<i64>,
}

impl ContentDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Every file id referenced by `text`. Malformed ids are skipped.
pub fn extract_references(text: &str) -> BTreeSet<i64> {
    let mut ids = BTreeSet::new();
    if text.trim().is_empty() {
        return ids;
    }

    let mut rest = text;
    while let Some(pos) = rest.find(DIRECTIVE) {
        rest = &rest[pos + DIRECTIVE.len()..];
        let digits_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..digits_len];

        if digits.is_empty() {
            warn!("Skipping file directive without a numeric id");
            continue;
        }
        match digits.parse::<i64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(e) => warn!(raw = digits, error = %e, "Skipping unparseable file id"),
        }
        rest = &rest[digits_len..];
    }
    ids
}

/// `to_add = new - old`, `to_remove = old - new`.
pub fn compute_diff(old: &BTreeSet<i64>, new: &BTreeSet<i64>) -> ContentDiff {
    ContentDiff {
        to_add: new.difference(old).copied().collect(),
        to_remove: old.difference(new).copied().collect(),
    }
}

/// Apply a diff to the owner's `content` mappings.
///
/// `to_add` is validated before anything changes. Removal and insertion commit
/// together.
#[instrument(skip(conn, diff), fields(%owner, add = diff.to_add.len(), remove = diff.to_remove.len()))]
pub async fn apply_diff<C>(conn: &C, owner: OwnerRef, diff: &ContentDiff) -> Result<(), FileError>
where
    C: ConnectionTrait + TransactionTrait,
{
    if diff.is_empty() {
        return Ok(());
    }

    let to_add: Vec<i64> = diff.to_add.iter().copied().collect();
    let to_remove: Vec<i64> = diff.to_remove.iter().copied().collect();

    let txn = conn.begin().await?;
    FileRecordStore::new(&txn)
        .require_all("apply_diff", &to_add)
        .await?;
    mapping::remove_in(&txn, owner, &to_remove, Some(FileRole::Content)).await?;
    mapping::insert_multi(&txn, owner, &to_add, FileRole::Content).await?;
    txn.commit().await?;

    info!("Applied content reference diff");
    Ok(())
}

/// Reconcile the owner's `content` mappings with the references in `body`.
#[instrument(skip(conn, body), fields(%owner))]
pub async fn sync_content<C>(conn: &C, owner: OwnerRef, body: &str) -> Result<ContentDiff, FileError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let current: BTreeSet<i64> = mapping::MappingService::new(conn)
        .file_ids(owner, FileRole::Content)
        .await?
        .into_iter()
        .collect();
    let diff = compute_diff(&current, &extract_references(body));
    apply_diff(conn, owner, &diff).await?;
    Ok(diff)
}
