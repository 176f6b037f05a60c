use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{MaintenanceError, MaintenanceRecord};

/// Persistence for maintenance records.
///
/// Implementations must keep "at most one enabled record" true even when
/// called concurrently: `start` ends the active record and inserts the new
/// one as a single atomic step.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Most recently started record, active or not.
    async fn latest(&self) -> Result<Option<MaintenanceRecord>, MaintenanceError>;

    /// End the active record (if any) at `record.started_at` and store
    /// `record` as the new active one. Returns the record that was ended.
    async fn start(
        &self,
        record: MaintenanceRecord,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError>;

    /// End the active record in place. `None` when nothing was active.
    async fn end_active(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError>;
}

#[async_trait]
impl<R> MaintenanceRepository for Arc<R>
where
    R: MaintenanceRepository + ?Sized,
{
    async fn latest(&self) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        (**self).latest().await
    }

    async fn start(
        &self,
        record: MaintenanceRecord,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        (**self).start(record).await
    }

    async fn end_active(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        (**self).end_active(at).await
    }
}

/// In-memory record history for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMaintenanceRepository {
    records: RwLock<Vec<MaintenanceRecord>>,
}

impl InMemoryMaintenanceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history, oldest first.
    pub fn records(&self) -> Vec<MaintenanceRecord> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn end_active_locked(
        records: &mut [MaintenanceRecord],
        at: DateTime<Utc>,
    ) -> Option<MaintenanceRecord> {
        let mut ended = None;
        for record in records.iter_mut().filter(|r| r.enabled) {
            record.end(at);
            ended = Some(record.clone());
        }
        ended
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryMaintenanceRepository {
    async fn latest(&self) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned())
    }

    async fn start(
        &self,
        record: MaintenanceRecord,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        let ended = Self::end_active_locked(&mut records, record.started_at);
        records.push(record);
        Ok(ended)
    }

    async fn end_active(
        &self,
        at: DateTime<Utc>,
    ) -> Result<Option<MaintenanceRecord>, MaintenanceError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Self::end_active_locked(&mut records, at))
    }
}
