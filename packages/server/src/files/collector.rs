use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect};
use tracing::{debug, error, info};

use super::mapping::OwnerKind;
use crate::entity::file_mapping;

/// Reports the set of file ids one owning domain currently references.
///
/// Return an empty set, never an error, when nothing is referenced. An error
/// means "unknown", and the registry leaves that domain out of the union.
#[async_trait]
pub trait UsageCollector: Send + Sync {
    fn name(&self) -> &str;

    async fn collect(&self) -> anyhow::Result<HashSet<i64>>;
}

/// Union of every collector's ids for one run.
#[derive(Debug, Default)]
pub struct CollectOutcome {
    pub used: HashSet<i64>,
    /// Names of collectors whose `collect` failed.
    pub failed: Vec<String>,
}

/// Fixed list of collectors assembled at startup.
pub struct CollectorRegistry {
    collectors: Vec<Arc<dyn UsageCollector>>,
}

impl CollectorRegistry {
    pub fn new(collectors: Vec<Arc<dyn UsageCollector>>) -> Self {
        Self { collectors }
    }

    /// One [`MappingCollector`] per owning domain.
    pub fn for_mappings(db: &DatabaseConnection) -> Self {
        let collectors = OwnerKind::ALL
            .into_iter()
            .map(|kind| {
                Arc::new(MappingCollector::new(db.clone(), kind)) as Arc<dyn UsageCollector>
            })
            .collect();
        Self::new(collectors)
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Run every collector concurrently and wait for all of them.
    pub async fn collect_all(&self) -> CollectOutcome {
        let results = join_all(self.collectors.iter().map(|c| async move {
            let result = c.collect().await;
            (c.name().to_string(), result)
        }))
        .await;

        let mut outcome = CollectOutcome::default();
        for (name, result) in results {
            match result {
                Ok(ids) => {
                    debug!(collector = %name, count = ids.len(), "Collected used file ids");
                    outcome.used.extend(ids);
                }
                Err(e) => {
                    error!(collector = %name, error = %e, "Usage collector failed, skipping");
                    outcome.failed.push(name);
                }
            }
        }

        info!(
            collectors = self.collectors.len(),
            failed = outcome.failed.len(),
            used = outcome.used.len(),
            "Collected used file ids"
        );
        outcome
    }
}

/// Collects the distinct file ids mapped by one owner domain.
pub struct MappingCollector {
    db: DatabaseConnection,
    kind: OwnerKind,
    name: String,
}

impl MappingCollector {
    pub fn new(db: DatabaseConnection, kind: OwnerKind) -> Self {
        Self {
            db,
            kind,
            name: format!("{kind}_mappings"),
        }
    }
}

#[async_trait]
impl UsageCollector for MappingCollector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn collect(&self) -> anyhow::Result<HashSet<i64>> {
        let ids: Vec<i64> = file_mapping::Entity::find()
            .select_only()
            .column(file_mapping::Column::FileId)
            .distinct()
            .filter(file_mapping::Column::OwnerType.eq(self.kind.as_str()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().collect())
    }
}
