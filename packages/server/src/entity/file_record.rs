use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for one uploaded object, independent of any owner.
///
/// Rows are never updated in place; they are inserted by the upload endpoint and
/// removed only by the orphan deletion pipeline.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Filename as uploaded.
    pub original_name: String,

    /// Object key in the blob store.
    #[sea_orm(unique)]
    pub storage_key: String,

    pub content_type: String,

    /// Size in bytes.
    pub size: i64,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
