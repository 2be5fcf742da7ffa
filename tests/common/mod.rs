// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use leavebook::application::{LeaveService, NewLeaveRequest};
use leavebook::domain::{Employee, LeaveCategory, LeaveRequest, LeaveType};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LeaveService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LeaveService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Register an employee with a valid phone number.
pub async fn hire(service: &LeaveService, name: &str, email: &str) -> Result<Employee> {
    Ok(service
        .create_employee(name.into(), email.into(), "+14155552671".into())
        .await?)
}

pub async fn leave_type(
    service: &LeaveService,
    category: LeaveCategory,
    quota: i64,
) -> Result<LeaveType> {
    Ok(service.create_leave_type(category, quota, false).await?)
}

/// File a leave request for the given inclusive date range.
pub async fn request(
    service: &LeaveService,
    employee: &Employee,
    leave_type: &LeaveType,
    start: &str,
    end: &str,
) -> Result<LeaveRequest> {
    Ok(service
        .create_leave_request(NewLeaveRequest {
            employee_id: employee.id,
            leave_type_id: leave_type.id,
            start_date: parse_date(start),
            end_date: parse_date(end),
            reason: "Personal time".into(),
        })
        .await?)
}

/// Current balance of one category, read back from the store.
pub async fn balance(
    service: &LeaveService,
    employee: &Employee,
    category: LeaveCategory,
) -> Result<i64> {
    let employee = service.get_employee(employee.id).await?;
    Ok(employee.leave_balances.get(category))
}
