use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::{
    InMemoryMaintenanceRepository, MaintenanceError, MaintenanceRecord, MaintenanceRepository,
    MaintenanceStatus, ToggleMaintenance,
};

/// Owned maintenance switch shared by every request.
///
/// Reads never touch the repository: `is_enabled` is an atomic load and
/// `status` clones a cached view. Toggles are serialized by an async mutex,
/// write through to the repository first, and only then publish the new
/// state, so a failed write leaves the switch unchanged.
pub struct MaintenanceState {
    repository: Arc<dyn MaintenanceRepository>,
    enabled: AtomicBool,
    current: RwLock<MaintenanceStatus>,
    toggle_lock: Mutex<()>,
}

impl MaintenanceState {
    /// Hydrate the switch from the repository's latest record.
    pub async fn load(
        repository: Arc<dyn MaintenanceRepository>,
    ) -> Result<Self, MaintenanceError> {
        let status = repository
            .latest()
            .await?
            .map(|r| r.status())
            .unwrap_or_default();

        if status.enabled {
            tracing::warn!(message = %status.message, "maintenance window active at startup");
        }

        Ok(Self {
            repository,
            enabled: AtomicBool::new(status.enabled),
            current: RwLock::new(status),
            toggle_lock: Mutex::new(()),
        })
    }

    /// Fresh, disabled switch over an empty in-memory repository.
    pub fn in_memory() -> Self {
        Self {
            repository: Arc::new(InMemoryMaintenanceRepository::new()),
            enabled: AtomicBool::new(false),
            current: RwLock::new(MaintenanceStatus::disabled()),
            toggle_lock: Mutex::new(()),
        }
    }

    /// Hot-path predicate evaluated for every request.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn status(&self) -> MaintenanceStatus {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn toggle(
        &self,
        cmd: ToggleMaintenance,
    ) -> Result<MaintenanceStatus, MaintenanceError> {
        cmd.validate()?;
        let _guard = self.toggle_lock.lock().await;

        if cmd.enabled {
            let record = MaintenanceRecord::open(cmd.message, cmd.actor.clone(), cmd.occurred_at);
            let window = record.id;
            let status = record.status();

            if let Some(prev) = self.repository.start(record).await? {
                tracing::info!(previous = %prev.id, "maintenance window superseded");
            }
            self.publish(status.clone());
            tracing::info!(%window, actor = %cmd.actor, "maintenance enabled");
            Ok(status)
        } else {
            match self.repository.end_active(cmd.occurred_at).await? {
                Some(ended) => {
                    let status = ended.status();
                    self.publish(status.clone());
                    tracing::info!(window = %ended.id, actor = %cmd.actor, "maintenance disabled");
                    Ok(status)
                }
                None => {
                    // Nothing active in the repository, though this instance
                    // may still hold a window that was ended elsewhere.
                    let status = match self.repository.latest().await? {
                        Some(latest) if !latest.enabled => latest.status(),
                        _ => MaintenanceStatus::disabled(),
                    };
                    self.publish(status.clone());
                    tracing::debug!(actor = %cmd.actor, "maintenance already disabled");
                    Ok(status)
                }
            }
        }
    }

    /// Re-read the latest record and publish it.
    ///
    /// Needed when several instances share one repository: a window opened
    /// or ended by another instance only becomes visible here on refresh.
    pub async fn refresh(&self) -> Result<MaintenanceStatus, MaintenanceError> {
        let _guard = self.toggle_lock.lock().await;
        let status = self
            .repository
            .latest()
            .await?
            .map(|r| r.status())
            .unwrap_or_default();

        if status.enabled != self.is_enabled() {
            tracing::info!(enabled = status.enabled, "maintenance switched by another instance");
        }
        self.publish(status.clone());
        Ok(status)
    }

    fn publish(&self, status: MaintenanceStatus) {
        let enabled = status.enabled;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = status;
        self.enabled.store(enabled, Ordering::Release);
    }
}
