use std::fmt;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::FileError;
use super::store::FileRecordStore;
use crate::entity::file_mapping;

/// Domain that owns mapping rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OwnerKind {
    Post,
    User,
}

impl OwnerKind {
    pub const ALL: [OwnerKind; 2] = [OwnerKind::Post, OwnerKind::User];

    pub fn as_str(self) -> &'static str {
        match self {
            OwnerKind::Post => "post",
            OwnerKind::User => "user",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An owner row in some domain, identified by numeric id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerRef {
    pub kind: OwnerKind,
    pub id: i64,
}

impl OwnerRef {
    pub fn post(id: i64) -> Self {
        Self {
            kind: OwnerKind::Post,
            id,
        }
    }

    pub fn user(id: i64) -> Self {
        Self {
            kind: OwnerKind::User,
            id,
        }
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Purpose of a file within its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Thumbnail,
    Content,
    ProfileImage,
}

impl FileRole {
    pub fn as_str(self) -> &'static str {
        match self {
            FileRole::Thumbnail => "thumbnail",
            FileRole::Content => "content",
            FileRole::ProfileImage => "profile_image",
        }
    }

    /// Singleton roles hold at most one mapping per owner.
    pub fn is_singleton(self) -> bool {
        !matches!(self, FileRole::Content)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate-and-register operations on `file_mapping`.
///
/// Every write that introduces file ids first checks them against the record
/// store; a missing id fails the call before anything is written.
pub struct MappingService<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait + TransactionTrait> MappingService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// Replace the owner's single file for `role`.
    pub async fn set_singleton_mapping(
        &self,
        owner: OwnerRef,
        file_id: i64,
        role: FileRole,
    ) -> Result<(), FileError> {
        if !role.is_singleton() {
            return Err(FileError::RoleMismatch {
                operation: "set_singleton_mapping",
                role,
                expected: "singleton",
            });
        }

        let txn = self.conn.begin().await?;

        FileRecordStore::new(&txn)
            .require_all("set_singleton_mapping", &[file_id])
            .await?;

        let removed = file_mapping::Entity::delete_many()
            .filter(file_mapping::Column::OwnerType.eq(owner.kind.as_str()))
            .filter(file_mapping::Column::OwnerId.eq(owner.id))
            .filter(file_mapping::Column::Role.eq(role.as_str()))
            .exec(&txn)
            .await?
            .rows_affected;

        file_mapping::ActiveModel {
            owner_type: Set(owner.kind.as_str().to_string()),
            owner_id: Set(owner.id),
            file_id: Set(file_id),
            role: Set(role.as_str().to_string()),
            display_order: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(%owner, %role, file_id, replaced = removed, "Set singleton file mapping");
        Ok(())
    }

    /// Append one mapping per id, in input order. Ids are not deduplicated.
    pub async fn set_multi_mapping(
        &self,
        owner: OwnerRef,
        file_ids: &[i64],
        role: FileRole,
    ) -> Result<(), FileError> {
        if role.is_singleton() {
            return Err(FileError::RoleMismatch {
                operation: "set_multi_mapping",
                role,
                expected: "multi-valued",
            });
        }
        if file_ids.is_empty() {
            return Ok(());
        }

        let txn = self.conn.begin().await?;
        FileRecordStore::new(&txn)
            .require_all("set_multi_mapping", file_ids)
            .await?;
        insert_multi(&txn, owner, file_ids, role).await?;
        txn.commit().await?;

        info!(%owner, %role, count = file_ids.len(), "Added file mappings");
        Ok(())
    }

    /// Delete the owner's mappings to any of `file_ids`, across roles.
    pub async fn remove_mappings(&self, owner: OwnerRef, file_ids: &[i64]) -> Result<u64, FileError> {
        let removed = remove_in(self.conn, owner, file_ids, None).await?;
        debug!(%owner, removed, "Removed file mappings");
        Ok(removed)
    }

    /// Delete every mapping the owner has, typically when the owner itself is deleted.
    pub async fn clear_all_mappings(&self, owner: OwnerRef) -> Result<u64, FileError> {
        let removed = file_mapping::Entity::delete_many()
            .filter(file_mapping::Column::OwnerType.eq(owner.kind.as_str()))
            .filter(file_mapping::Column::OwnerId.eq(owner.id))
            .exec(self.conn)
            .await?
            .rows_affected;
        info!(%owner, removed, "Cleared file mappings");
        Ok(removed)
    }

    /// File ids mapped to the owner under `role`, in display order.
    pub async fn file_ids(&self, owner: OwnerRef, role: FileRole) -> Result<Vec<i64>, FileError> {
        let ids = file_mapping::Entity::find()
            .select_only()
            .column(file_mapping::Column::FileId)
            .filter(file_mapping::Column::OwnerType.eq(owner.kind.as_str()))
            .filter(file_mapping::Column::OwnerId.eq(owner.id))
            .filter(file_mapping::Column::Role.eq(role.as_str()))
            .order_by_asc(file_mapping::Column::DisplayOrder)
            .order_by_asc(file_mapping::Column::Id)
            .into_tuple::<i64>()
            .all(self.conn)
            .await?;
        Ok(ids)
    }

    pub async fn singleton_file_id(
        &self,
        owner: OwnerRef,
        role: FileRole,
    ) -> Result<Option<i64>, FileError> {
        Ok(self.file_ids(owner, role).await?.into_iter().next())
    }
}

/// Insert rows for `file_ids` continuing after the owner's highest display order.
pub(crate) async fn insert_multi<C: ConnectionTrait>(
    conn: &C,
    owner: OwnerRef,
    file_ids: &[i64],
    role: FileRole,
) -> Result<(), FileError> {
    if file_ids.is_empty() {
        return Ok(());
    }

    let current_max: Option<Option<i32>> = file_mapping::Entity::find()
        .select_only()
        .column_as(file_mapping::Column::DisplayOrder.max(), "max_order")
        .filter(file_mapping::Column::OwnerType.eq(owner.kind.as_str()))
        .filter(file_mapping::Column::OwnerId.eq(owner.id))
        .filter(file_mapping::Column::Role.eq(role.as_str()))
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?;
    let start = current_max.flatten().map_or(0, |m| m + 1);

    let now = Utc::now();
    let rows = file_ids
        .iter()
        .enumerate()
        .map(|(i, &file_id)| file_mapping::ActiveModel {
            owner_type: Set(owner.kind.as_str().to_string()),
            owner_id: Set(owner.id),
            file_id: Set(file_id),
            role: Set(role.as_str().to_string()),
            display_order: Set(Some(start + i as i32)),
            created_at: Set(now),
            ..Default::default()
        });

    file_mapping::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Delete the owner's rows pointing at `file_ids`, optionally restricted to one role.
pub(crate) async fn remove_in<C: ConnectionTrait>(
    conn: &C,
    owner: OwnerRef,
    file_ids: &[i64],
    role: Option<FileRole>,
) -> Result<u64, FileError> {
    if file_ids.is_empty() {
        return Ok(0);
    }

    let mut query = file_mapping::Entity::delete_many()
        .filter(file_mapping::Column::OwnerType.eq(owner.kind.as_str()))
        .filter(file_mapping::Column::OwnerId.eq(owner.id))
        .filter(file_mapping::Column::FileId.is_in(file_ids.iter().copied()));
    if let Some(role) = role {
        query = query.filter(file_mapping::Column::Role.eq(role.as_str()));
    }

    Ok(query.exec(conn).await?.rows_affected)
}
