use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeaveCategory;

pub type LeaveTypeId = Uuid;

/// A kind of leave. Every approval or accrual of a request of this type
/// consumes `quota` days from the matching category balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: LeaveTypeId,
    pub name: LeaveCategory,
    pub quota: i64,
    /// Stored for reporting; no rule reads it yet.
    pub carryover_allowed: bool,
    pub created_at: DateTime<Utc>,
}

impl LeaveType {
    pub fn new(name: LeaveCategory, quota: i64, carryover_allowed: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            quota,
            carryover_allowed,
            created_at: Utc::now(),
        }
    }

    pub fn category(&self) -> LeaveCategory {
        self.name
    }
}
