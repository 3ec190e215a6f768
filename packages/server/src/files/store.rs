use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

use super::FileError;
use crate::entity::file_record;

/// Upper bound on ids bound into a single `IN (...)` list.
pub const IN_CLAUSE_BATCH: usize = 1000;

/// Metadata captured after a successful remote upload.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub original_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub size: i64,
}

/// Persistence for file metadata rows.
pub struct FileRecordStore<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> FileRecordStore<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Insert a record for an object that now exists in the blob store.
    pub async fn create(&self, new: NewFileRecord) -> Result<file_record::Model, DbErr> {
        let model = file_record::ActiveModel {
            original_name: Set(new.original_name),
            storage_key: Set(new.storage_key),
            content_type: Set(new.content_type),
            size: Set(new.size),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let saved = model.insert(self.conn).await?;
        info!(file_id = saved.id, storage_key = %saved.storage_key, "Saved file record");
        Ok(saved)
    }

    pub async fn find(&self, id: i64) -> Result<file_record::Model, FileError> {
        file_record::Entity::find_by_id(id)
            .one(self.conn)
            .await?
            .ok_or(FileError::NotFound(id))
    }

    pub async fn find_many(&self, ids: &[i64]) -> Result<Vec<file_record::Model>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        file_record::Entity::find()
            .filter(file_record::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(file_record::Column::Id)
            .all(self.conn)
            .await
    }

    /// Number of the given (distinct) ids that exist.
    pub async fn exists_all(&self, ids: &[i64]) -> Result<u64, DbErr> {
        let distinct: BTreeSet<i64> = ids.iter().copied().collect();
        if distinct.is_empty() {
            return Ok(0);
        }
        file_record::Entity::find()
            .filter(file_record::Column::Id.is_in(distinct))
            .count(self.conn)
            .await
    }

    /// Fail with [`FileError::Validation`] unless every id exists.
    pub async fn require_all(&self, operation: &'static str, ids: &[i64]) -> Result<(), FileError> {
        let distinct: BTreeSet<i64> = ids.iter().copied().collect();
        if distinct.is_empty() {
            return Ok(());
        }

        let matched = self.exists_all(ids).await?;
        if matched == distinct.len() as u64 {
            return Ok(());
        }

        let existing: BTreeSet<i64> = file_record::Entity::find()
            .select_only()
            .column(file_record::Column::Id)
            .filter(file_record::Column::Id.is_in(distinct.iter().copied()))
            .into_tuple::<i64>()
            .all(self.conn)
            .await?
            .into_iter()
            .collect();
        let missing: Vec<i64> = distinct.difference(&existing).copied().collect();

        tracing::warn!(
            operation,
            requested = distinct.len(),
            matched,
            ?missing,
            "Referenced files not found"
        );
        Err(FileError::Validation { operation, missing })
    }

    /// Records created before `threshold` whose id is not in `used_ids`.
    ///
    /// An empty `used_ids` returns nothing: an empty "used" set almost always
    /// means a collector failed, and answering "everything" would delete every
    /// file in the system.
    pub async fn query_unused(
        &self,
        used_ids: &[i64],
        threshold: DateTime<Utc>,
    ) -> Result<Vec<file_record::Model>, DbErr> {
        if used_ids.is_empty() {
            tracing::warn!("query_unused called with an empty used set, returning nothing");
            return Ok(Vec::new());
        }

        let unused = file_record::Entity::find()
            .filter(file_record::Column::CreatedAt.lt(threshold))
            .filter(file_record::Column::Id.is_not_in(used_ids.iter().copied()))
            .order_by_asc(file_record::Column::Id)
            .all(self.conn)
            .await?;

        debug!(
            used = used_ids.len(),
            unused = unused.len(),
            %threshold,
            "Queried unused files"
        );
        Ok(unused)
    }

    /// Delete rows by id. Callers must already hold remote delete confirmation
    /// for every id.
    pub async fn bulk_delete(&self, ids: &[i64]) -> Result<u64, DbErr> {
        let mut deleted = 0;
        for chunk in ids.chunks(IN_CLAUSE_BATCH) {
            let result = file_record::Entity::delete_many()
                .filter(file_record::Column::Id.is_in(chunk.iter().copied()))
                .exec(self.conn)
                .await?;
            deleted += result.rows_affected;
        }
        Ok(deleted)
    }
}
