use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{DomainError, Username};

/// Longest maintenance message accepted from the toggle endpoint.
pub const MAX_MESSAGE_LEN: usize = 1000;

/// One maintenance window.
///
/// # Invariants
/// - At most one record in a repository has `enabled = true`.
/// - A record is opened enabled and may only transition to ended; it is
///   never re-enabled. A new window is a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: Uuid,
    pub enabled: bool,
    pub message: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Username,
}

impl MaintenanceRecord {
    /// Open a new, active window.
    pub fn open(message: impl Into<String>, created_by: Username, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            enabled: true,
            message: message.into(),
            started_at: now,
            ended_at: None,
            updated_at: now,
            created_by,
        }
    }

    /// End this window in place. Ending an already ended record is a no-op.
    pub fn end(&mut self, now: DateTime<Utc>) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.ended_at = Some(now);
        self.updated_at = now;
    }

    pub fn status(&self) -> MaintenanceStatus {
        MaintenanceStatus {
            enabled: self.enabled,
            message: self.message.clone(),
            started_at: Some(self.started_at),
            updated_at: Some(self.updated_at),
        }
    }
}

/// Public view of the maintenance switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    pub enabled: bool,
    pub message: String,
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl MaintenanceStatus {
    /// Status reported when no window has ever been opened.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            message: String::new(),
            started_at: None,
            updated_at: None,
        }
    }
}

impl Default for MaintenanceStatus {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Command to switch maintenance on or off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleMaintenance {
    pub enabled: bool,
    pub message: String,
    pub actor: Username,
    pub occurred_at: DateTime<Utc>,
}

impl ToggleMaintenance {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(DomainError::validation(format!(
                "maintenance message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }
        if self.message.chars().any(|c| c.is_control() && c != '\n') {
            return Err(DomainError::validation(
                "maintenance message must not contain control characters",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn admin() -> Username {
        Username::parse("alice").unwrap()
    }

    #[test]
    fn ending_a_record_stamps_end_and_update_once() {
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 22, 0, 0).unwrap();
        let mut record = MaintenanceRecord::open("upgrade", admin(), t0);
        assert!(record.enabled);
        assert_eq!(record.ended_at, None);

        record.end(t0 + Duration::hours(1));
        assert!(!record.enabled);
        assert_eq!(record.ended_at, Some(t0 + Duration::hours(1)));

        record.end(t0 + Duration::hours(2));
        assert_eq!(record.ended_at, Some(t0 + Duration::hours(1)));
        assert_eq!(record.updated_at, t0 + Duration::hours(1));
    }

    #[test]
    fn status_view_uses_camel_case() {
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 22, 0, 0).unwrap();
        let status = MaintenanceRecord::open("upgrade", admin(), t0).status();
        let json = serde_json::to_value(status).unwrap();

        assert_eq!(json["enabled"], true);
        assert_eq!(json["message"], "upgrade");
        assert!(json.get("startedAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn toggle_message_is_bounded() {
        let cmd = ToggleMaintenance {
            enabled: true,
            message: "x".repeat(MAX_MESSAGE_LEN + 1),
            actor: admin(),
            occurred_at: Utc::now(),
        };
        assert!(cmd.validate().is_err());

        let ok = ToggleMaintenance {
            message: "Back at 23:00\nThanks".to_string(),
            ..cmd
        };
        assert!(ok.validate().is_ok());
    }
}
