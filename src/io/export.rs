use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{AppError, ErrorKind, LeaveService};
use crate::domain::{Employee, LeaveRequest, LeaveType};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub employees: Vec<Employee>,
    pub leave_types: Vec<LeaveType>,
    pub leave_requests: Vec<LeaveRequest>,
}

/// Exporter for converting leave records to various formats
pub struct Exporter<'a> {
    service: &'a LeaveService,
}

/// Listings report an empty store as `NotFound`; an export just writes nothing.
fn or_empty<T>(result: Result<Vec<T>, AppError>) -> Result<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LeaveService) -> Self {
        Self { service }
    }

    /// Export employees and their balances to CSV format
    pub async fn export_employees_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let employees = or_empty(self.service.get_employees().await)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "email",
            "phone",
            "annual",
            "sick",
            "maternity",
            "paternity",
            "unpaid",
            "created_at",
        ])?;

        for employee in &employees {
            let b = &employee.leave_balances;
            csv_writer.write_record(&[
                employee.id.to_string(),
                employee.name.clone(),
                employee.email.clone(),
                employee.phone.clone(),
                b.annual.to_string(),
                b.sick.to_string(),
                b.maternity.to_string(),
                b.paternity.to_string(),
                b.unpaid.to_string(),
                employee.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(employees.len())
    }

    /// Export leave types to CSV format
    pub async fn export_leave_types_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let leave_types = or_empty(self.service.get_leave_types().await)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "name", "quota", "carryover_allowed", "created_at"])?;

        for leave_type in &leave_types {
            csv_writer.write_record(&[
                leave_type.id.to_string(),
                leave_type.name.as_str().to_string(),
                leave_type.quota.to_string(),
                leave_type.carryover_allowed.to_string(),
                leave_type.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(leave_types.len())
    }

    /// Export leave requests to CSV format
    pub async fn export_leave_requests_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let requests = or_empty(self.service.get_leave_requests().await)?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "employee_id",
            "leave_type_id",
            "start_date",
            "end_date",
            "status",
            "reason",
            "created_at",
        ])?;

        for request in &requests {
            csv_writer.write_record(&[
                request.id.to_string(),
                request.employee_id.to_string(),
                request.leave_type_id.to_string(),
                request.start_date.format("%Y-%m-%d").to_string(),
                request.end_date.format("%Y-%m-%d").to_string(),
                request.status.as_str().to_string(),
                request.reason.clone(),
                request.created_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(requests.len())
    }

    /// Export all three collections as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            employees: or_empty(self.service.get_employees().await)?,
            leave_types: or_empty(self.service.get_leave_types().await)?,
            leave_requests: or_empty(self.service.get_leave_requests().await)?,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
