use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Join row linking an owner to a file under a role.
///
/// Owner and file are referenced by id only. Singleton roles keep at most one
/// row per `(owner_type, owner_id, role)`, enforced by delete-then-insert.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file_mapping")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Owning domain (e.g. "post", "user").
    pub owner_type: String,

    #[sea_orm(indexed)]
    pub owner_id: i64,

    #[sea_orm(indexed)]
    pub file_id: i64,

    /// Role of the file for its owner (e.g. "thumbnail", "content").
    pub role: String,

    pub display_order: Option<i32>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
