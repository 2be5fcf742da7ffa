use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{EmployeeId, LeaveTypeId};

pub type LeaveRequestId = Uuid;

/// Lifecycle of a leave request.
///
/// `Pending` is the initial state. `Pending -> Approved -> Accrued` consumes
/// balance on each step; `Pending -> Rejected` consumes nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Accrued,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "Pending",
            LeaveStatus::Approved => "Approved",
            LeaveStatus::Rejected => "Rejected",
            LeaveStatus::Accrued => "Accrued",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(LeaveStatus::Pending),
            "Approved" => Some(LeaveStatus::Approved),
            "Rejected" => Some(LeaveStatus::Rejected),
            "Accrued" => Some(LeaveStatus::Accrued),
            _ => None,
        }
    }
}

impl std::fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub employee_id: EmployeeId,
    pub leave_type_id: LeaveTypeId,
    /// First day of leave (inclusive)
    pub start_date: NaiveDate,
    /// Last day of leave (inclusive)
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn new(
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id,
            leave_type_id,
            start_date,
            end_date,
            status: LeaveStatus::Pending,
            reason,
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == LeaveStatus::Pending
    }

    /// Boundary-inclusive intersection with the window `[start, end]`.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Find a request of the same employee that blocks `[start, end]`.
/// Rejected requests never block.
pub fn find_overlap(
    existing: &[LeaveRequest],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<&LeaveRequest> {
    existing
        .iter()
        .filter(|r| r.status != LeaveStatus::Rejected)
        .find(|r| r.overlaps(start, end))
}
