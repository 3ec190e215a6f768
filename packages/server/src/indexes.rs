use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::file_mapping;

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Singleton replacement and role lookups:
    // DELETE FROM file_mapping WHERE owner_type = ? AND owner_id = ? AND role = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_file_mapping_owner_role")
        .table(file_mapping::Entity)
        .col(file_mapping::Column::OwnerType)
        .col(file_mapping::Column::OwnerId)
        .col(file_mapping::Column::Role)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_file_mapping_owner_role exists"),
        Err(e) => warn!("Failed to create index idx_file_mapping_owner_role: {}", e),
    }

    Ok(())
}
