use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{LeaveCategory, LeaveStatus};

/// Coarse classification of an [`AppError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input.
    InvalidPayload,
    /// A referenced record is absent, or a listing would be empty.
    NotFound,
    /// A business rule refused the operation.
    Error,
    /// The database failed.
    Storage,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Employee email already registered: {0}")]
    EmailTaken(String),

    #[error("Leave type already exists for category {0}")]
    LeaveTypeAlreadyExists(LeaveCategory),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    #[error("Leave type not found: {0}")]
    LeaveTypeNotFound(String),

    #[error("Leave request not found: {0}")]
    LeaveRequestNotFound(String),

    #[error("No {0} found")]
    NothingFound(&'static str),

    #[error("No leave requests found for employee {0}")]
    NoLeaveRequestsForEmployee(String),

    #[error("Leave type {leave_type_id} of leave request {request_id} not found")]
    ReportLeaveTypeMissing {
        request_id: String,
        leave_type_id: String,
    },

    #[error("Insufficient {category} balance: balance {balance}, required {required}")]
    InsufficientBalance {
        category: LeaveCategory,
        balance: i64,
        required: i64,
    },

    #[error("Leave request overlaps existing request {existing_id} ({start} to {end})")]
    OverlappingRequest {
        existing_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Leave request already approved: {0}")]
    AlreadyApproved(String),

    #[error("Leave already accrued for request: {0}")]
    AlreadyAccrued(String),

    #[error("Leave request {0} must be approved before accrual")]
    NotApproved(String),

    #[error("Cannot {action} leave request {request_id} in status {status}")]
    InvalidTransition {
        request_id: String,
        status: LeaveStatus,
        action: &'static str,
    },

    #[error("Cannot cancel leave request {request_id}: already {status}")]
    CannotCancel {
        request_id: String,
        status: LeaveStatus,
    },

    #[error("Employee {employee_id} has {pending} pending leave request(s)")]
    PendingRequestsExist { employee_id: String, pending: i64 },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidPayload(_)
            | AppError::EmailTaken(_)
            | AppError::LeaveTypeAlreadyExists(_)
            | AppError::InvalidDateRange { .. } => ErrorKind::InvalidPayload,

            AppError::EmployeeNotFound(_)
            | AppError::LeaveTypeNotFound(_)
            | AppError::LeaveRequestNotFound(_)
            | AppError::NothingFound(_)
            | AppError::NoLeaveRequestsForEmployee(_)
            | AppError::ReportLeaveTypeMissing { .. } => ErrorKind::NotFound,

            AppError::InsufficientBalance { .. }
            | AppError::OverlappingRequest { .. }
            | AppError::AlreadyApproved(_)
            | AppError::AlreadyAccrued(_)
            | AppError::NotApproved(_)
            | AppError::InvalidTransition { .. }
            | AppError::CannotCancel { .. }
            | AppError::PendingRequestsExist { .. } => ErrorKind::Error,

            AppError::Database(_) => ErrorKind::Storage,
        }
    }
}
