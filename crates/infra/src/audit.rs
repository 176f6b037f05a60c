//! Audit trail for security-relevant actions (login, logout, maintenance).

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use atelier_core::Username;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Login,
    Logout,
    MaintenanceEnabled,
    MaintenanceDisabled,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
            AuditAction::MaintenanceEnabled => "maintenance_enabled",
            AuditAction::MaintenanceDisabled => "maintenance_disabled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub actor: Username,
    pub action: AuditAction,
    pub occurred_at: DateTime<Utc>,
    pub detail: Option<String>,
}

impl AuditEntry {
    pub fn new(actor: Username, action: AuditAction, occurred_at: DateTime<Utc>) -> Self {
        Self {
            actor,
            action,
            occurred_at,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Destination for audit entries. Recording must not fail the request.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

impl<S> AuditSink for Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, entry: AuditEntry) {
        (**self).record(entry)
    }
}

/// Emits audit entries as structured `tracing` events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        tracing::info!(
            target: "audit",
            actor = %entry.actor,
            action = entry.action.as_str(),
            occurred_at = %entry.occurred_at.to_rfc3339(),
            detail = entry.detail.as_deref().unwrap_or(""),
            "audit"
        );
    }
}

/// Keeps entries in memory (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_keeps_entries_in_order() {
        let sink = InMemoryAuditSink::new();
        let bob = Username::parse("bob").unwrap();
        let now = Utc::now();

        sink.record(AuditEntry::new(bob.clone(), AuditAction::Login, now));
        sink.record(AuditEntry::new(bob.clone(), AuditAction::Logout, now).with_detail("explicit"));

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, AuditAction::Login);
        assert_eq!(entries[1].detail.as_deref(), Some("explicit"));
    }

    #[test]
    fn entries_serialize_with_snake_case_actions() {
        let entry = AuditEntry::new(
            Username::parse("alice").unwrap(),
            AuditAction::MaintenanceEnabled,
            Utc::now(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["action"], "maintenance_enabled");
        assert_eq!(json["actor"], "alice");
    }
}
