use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{EmployeeId, LeaveCategory, LeaveRequestId, LeaveStatus};

/// Leave history of one employee, one entry per stored request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveReport {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub entries: Vec<LeaveReportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveReportEntry {
    pub request_id: LeaveRequestId,
    pub leave_type: LeaveCategory,
    pub quota: i64,
    /// Current balance of the request's category, not the balance at request time
    pub remaining_balance: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub reason: String,
}

impl fmt::Display for LeaveReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Leave Request ID: {}", self.request_id)?;
        writeln!(f, "Leave Type: {}", self.leave_type)?;
        writeln!(f, "Quota: {}", self.quota)?;
        writeln!(f, "Remaining Balance: {}", self.remaining_balance)?;
        writeln!(f, "Start Date: {}", self.start_date.format("%Y-%m-%d"))?;
        writeln!(f, "End Date: {}", self.end_date.format("%Y-%m-%d"))?;
        writeln!(f, "Status: {}", self.status)?;
        write!(f, "Reason: {}", self.reason)
    }
}

impl fmt::Display for LeaveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
