/// Audit trail for security-relevant actions.
///
/// Session events (signup, login, refresh, logout) and attendance mutations
/// are recorded as structured tracing records so operators can reconstruct
/// who did what, when.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
    /// Action label (SIGNUP, LOGIN, REFRESH, LOGOUT, CHECKIN, ...)
    pub action: String,
    /// Resource kind (user, event, person, cell, task)
    pub resource_type: String,
    pub resource_id: Option<String>,
    /// Account that performed the action, when known
    pub user_id: Option<String>,
    /// SUCCESS or FAILURE
    pub status: String,
    pub message: String,
}

impl AuditLog {
    pub fn new(
        action: impl Into<String>,
        resource_type: impl Into<String>,
        status: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            log_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action: action.into(),
            resource_type: resource_type.into(),
            resource_id: None,
            user_id: None,
            status: status.into(),
            message: message.into(),
        }
    }

    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn record(&self) {
        if self.status == "FAILURE" {
            tracing::warn!(
                log_id = %self.log_id,
                action = %self.action,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                user_id = ?self.user_id,
                status = %self.status,
                message = %self.message,
                "Audit log entry"
            );
        } else {
            tracing::info!(
                log_id = %self.log_id,
                action = %self.action,
                resource_type = %self.resource_type,
                resource_id = ?self.resource_id,
                user_id = ?self.user_id,
                status = %self.status,
                message = %self.message,
                "Audit log entry"
            );
        }
    }
}
