use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    find_overlap, is_valid_email, is_valid_phone, Employee, EmployeeId, LeaveCategory,
    LeaveRequest, LeaveRequestId, LeaveStatus, LeaveType, LeaveTypeId,
};
use crate::storage::{EmployeeRepository, LeaveRequestRepository, LeaveTypeRepository, Store};

use super::{AppError, LeaveReport, LeaveReportEntry};

/// Application service providing every leave-management operation.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// Mutations take `write_lock` for their whole check-then-write sequence, so
/// balance and overlap checks never interleave within one service instance.
/// Separate processes sharing a database file are not serialised.
pub struct LeaveService {
    employees: EmployeeRepository,
    leave_types: LeaveTypeRepository,
    leave_requests: LeaveRequestRepository,
    write_lock: Mutex<()>,
}

/// Input for a new leave request
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: EmployeeId,
    pub leave_type_id: LeaveTypeId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

impl LeaveService {
    /// Create a new leave service backed by the given store.
    pub fn new(store: Store) -> Self {
        Self {
            employees: store.employees(),
            leave_types: store.leave_types(),
            leave_requests: store.leave_requests(),
            write_lock: Mutex::new(()),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = Store::init(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = Store::connect(&db_url).await?;
        Ok(Self::new(store))
    }

    // ========================
    // Employee operations
    // ========================

    /// Register a new employee with default leave balances.
    pub async fn create_employee(
        &self,
        name: String,
        email: String,
        phone: String,
    ) -> Result<Employee, AppError> {
        if name.trim().is_empty() || email.trim().is_empty() || phone.trim().is_empty() {
            debug!("rejecting employee: missing field");
            return Err(AppError::InvalidPayload(
                "name, email and phone are required".to_string(),
            ));
        }
        if !is_valid_email(&email) {
            debug!(%email, "rejecting employee: malformed email");
            return Err(AppError::InvalidPayload(format!(
                "invalid email format: {}",
                email
            )));
        }

        let _guard = self.write_lock.lock().await;

        if self.employees.find_by_email(&email).await?.is_some() {
            debug!(%email, "rejecting employee: email taken");
            return Err(AppError::EmailTaken(email));
        }
        if !is_valid_phone(&phone) {
            debug!(%phone, "rejecting employee: malformed phone");
            return Err(AppError::InvalidPayload(format!(
                "invalid phone number format: {}",
                phone
            )));
        }

        let employee = Employee::new(name, email, phone);
        self.employees.save(&employee).await?;

        info!(employee_id = %employee.id, email = %employee.email, "employee created");
        Ok(employee)
    }

    /// Get an employee by ID.
    pub async fn get_employee(&self, id: EmployeeId) -> Result<Employee, AppError> {
        self.employees
            .get(id)
            .await?
            .ok_or_else(|| AppError::EmployeeNotFound(id.to_string()))
    }

    /// List all employees. An empty store is reported as `NotFound`.
    pub async fn get_employees(&self) -> Result<Vec<Employee>, AppError> {
        let employees = self.employees.list().await?;
        if employees.is_empty() {
            return Err(AppError::NothingFound("employees"));
        }
        Ok(employees)
    }

    /// Delete an employee and all of their leave requests.
    /// Refused while any of their requests is still pending.
    pub async fn delete_employee(&self, id: EmployeeId) -> Result<String, AppError> {
        let _guard = self.write_lock.lock().await;

        let employee = self.get_employee(id).await?;

        let pending = self
            .leave_requests
            .count_for_employee(id, LeaveStatus::Pending)
            .await?;
        if pending > 0 {
            debug!(employee_id = %id, pending, "refusing to delete employee");
            return Err(AppError::PendingRequestsExist {
                employee_id: id.to_string(),
                pending,
            });
        }

        let removed = self.employees.delete_cascade(id).await?;

        info!(employee_id = %id, removed_requests = removed, "employee deleted");
        Ok(format!("Employee {} deleted successfully", employee.name))
    }

    // ========================
    // Leave type operations
    // ========================

    /// Register a leave type. One leave type per category.
    pub async fn create_leave_type(
        &self,
        name: LeaveCategory,
        quota: i64,
        carryover_allowed: bool,
    ) -> Result<LeaveType, AppError> {
        if quota <= 0 {
            debug!(%name, quota, "rejecting leave type: bad quota");
            return Err(AppError::InvalidPayload(format!(
                "quota must be positive, got {}",
                quota
            )));
        }

        let _guard = self.write_lock.lock().await;

        if self.leave_types.find_by_category(name).await?.is_some() {
            return Err(AppError::LeaveTypeAlreadyExists(name));
        }

        let leave_type = LeaveType::new(name, quota, carryover_allowed);
        self.leave_types.save(&leave_type).await?;

        info!(leave_type_id = %leave_type.id, category = %name, quota, "leave type created");
        Ok(leave_type)
    }

    pub async fn get_leave_type(&self, id: LeaveTypeId) -> Result<LeaveType, AppError> {
        self.leave_types
            .get(id)
            .await?
            .ok_or_else(|| AppError::LeaveTypeNotFound(id.to_string()))
    }

    pub async fn get_leave_type_by_category(
        &self,
        category: LeaveCategory,
    ) -> Result<LeaveType, AppError> {
        self.leave_types
            .find_by_category(category)
            .await?
            .ok_or_else(|| AppError::LeaveTypeNotFound(category.to_string()))
    }

    pub async fn get_leave_types(&self) -> Result<Vec<LeaveType>, AppError> {
        let leave_types = self.leave_types.list().await?;
        if leave_types.is_empty() {
            return Err(AppError::NothingFound("leave types"));
        }
        Ok(leave_types)
    }

    // ========================
    // Leave request operations
    // ========================

    /// File a new pending leave request.
    pub async fn create_leave_request(
        &self,
        input: NewLeaveRequest,
    ) -> Result<LeaveRequest, AppError> {
        let _guard = self.write_lock.lock().await;

        let employee = self.get_employee(input.employee_id).await?;
        let leave_type = self.get_leave_type(input.leave_type_id).await?;

        let category = leave_type.category();
        let balance = employee.leave_balances.get(category);
        if !employee.leave_balances.covers(category, leave_type.quota) {
            debug!(employee_id = %employee.id, %category, balance, "insufficient balance");
            return Err(AppError::InsufficientBalance {
                category,
                balance,
                required: leave_type.quota,
            });
        }

        // Checked before overlap so a reversed range is never reported as a clash.
        if input.start_date > input.end_date {
            return Err(AppError::InvalidDateRange {
                start: input.start_date,
                end: input.end_date,
            });
        }

        let existing = self.leave_requests.list_for_employee(employee.id).await?;
        if let Some(clash) = find_overlap(&existing, input.start_date, input.end_date) {
            debug!(employee_id = %employee.id, clash = %clash.id, "overlapping leave request");
            return Err(AppError::OverlappingRequest {
                existing_id: clash.id.to_string(),
                start: clash.start_date,
                end: clash.end_date,
            });
        }

        let request = LeaveRequest::new(
            employee.id,
            leave_type.id,
            input.start_date,
            input.end_date,
            input.reason,
        );
        self.leave_requests.save(&request).await?;

        info!(
            request_id = %request.id,
            employee_id = %employee.id,
            %category,
            start = %request.start_date,
            end = %request.end_date,
            "leave request created"
        );
        Ok(request)
    }

    pub async fn get_leave_request(&self, id: LeaveRequestId) -> Result<LeaveRequest, AppError> {
        self.leave_requests
            .get(id)
            .await?
            .ok_or_else(|| AppError::LeaveRequestNotFound(id.to_string()))
    }

    pub async fn get_leave_requests(&self) -> Result<Vec<LeaveRequest>, AppError> {
        let requests = self.leave_requests.list().await?;
        if requests.is_empty() {
            return Err(AppError::NothingFound("leave requests"));
        }
        Ok(requests)
    }

    pub async fn get_employee_leave_requests(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let requests = self.leave_requests.list_for_employee(employee_id).await?;
        if requests.is_empty() {
            return Err(AppError::NoLeaveRequestsForEmployee(employee_id.to_string()));
        }
        Ok(requests)
    }

    /// Approve a pending request, deducting the leave type's quota.
    pub async fn approve_leave_request(&self, id: LeaveRequestId) -> Result<String, AppError> {
        let _guard = self.write_lock.lock().await;

        let request = self.get_leave_request(id).await?;
        match request.status {
            LeaveStatus::Pending => {}
            LeaveStatus::Approved => return Err(AppError::AlreadyApproved(id.to_string())),
            status => {
                return Err(AppError::InvalidTransition {
                    request_id: id.to_string(),
                    status,
                    action: "approve",
                });
            }
        }

        let mut employee = self.get_employee(request.employee_id).await?;
        let leave_type = self.get_leave_type(request.leave_type_id).await?;

        let category = leave_type.category();
        let balance = employee.leave_balances.get(category);
        if !employee.leave_balances.covers(category, leave_type.quota) {
            return Err(AppError::InsufficientBalance {
                category,
                balance,
                required: leave_type.quota,
            });
        }

        let remaining = employee
            .leave_balances
            .deduct(category, leave_type.quota);
        self.leave_requests
            .settle(id, LeaveStatus::Approved, employee.id, &employee.leave_balances)
            .await?;

        info!(
            request_id = %id,
            employee_id = %employee.id,
            %category,
            remaining,
            "leave request approved"
        );
        Ok(format!("Leave request {} approved successfully", id))
    }

    /// Accrue an approved request. The quota is deducted again on top of the
    /// deduction taken at approval, without a balance check.
    pub async fn accrue_leave(&self, id: LeaveRequestId) -> Result<String, AppError> {
        let _guard = self.write_lock.lock().await;

        let request = self.get_leave_request(id).await?;
        match request.status {
            LeaveStatus::Approved => {}
            LeaveStatus::Accrued => return Err(AppError::AlreadyAccrued(id.to_string())),
            _ => return Err(AppError::NotApproved(id.to_string())),
        }

        let mut employee = self.get_employee(request.employee_id).await?;
        let leave_type = self.get_leave_type(request.leave_type_id).await?;

        let category = leave_type.category();
        let remaining = employee
            .leave_balances
            .deduct(category, leave_type.quota);
        self.leave_requests
            .settle(id, LeaveStatus::Accrued, employee.id, &employee.leave_balances)
            .await?;

        info!(
            request_id = %id,
            employee_id = %employee.id,
            %category,
            remaining,
            "leave accrued"
        );
        Ok(format!("Leave accrued successfully for request {}", id))
    }

    /// Reject a pending request. Balances are untouched and the record is kept.
    pub async fn reject_leave_request(&self, id: LeaveRequestId) -> Result<String, AppError> {
        let _guard = self.write_lock.lock().await;

        let request = self.get_leave_request(id).await?;
        if !request.is_pending() {
            return Err(AppError::InvalidTransition {
                request_id: id.to_string(),
                status: request.status,
                action: "reject",
            });
        }

        self.leave_requests
            .update_status(id, LeaveStatus::Rejected)
            .await?;

        info!(request_id = %id, "leave request rejected");
        Ok(format!("Leave request {} rejected", id))
    }

    /// Cancel (delete) any request that is not currently Approved.
    pub async fn cancel_leave_request(&self, id: LeaveRequestId) -> Result<String, AppError> {
        let _guard = self.write_lock.lock().await;

        let request = self.get_leave_request(id).await?;
        if request.status == LeaveStatus::Approved {
            return Err(AppError::CannotCancel {
                request_id: id.to_string(),
                status: request.status,
            });
        }

        self.leave_requests.delete(id).await?;

        info!(request_id = %id, status = %request.status, "leave request cancelled");
        Ok(format!("Leave request {} cancelled successfully", id))
    }

    // ========================
    // Reporting
    // ========================

    /// Build the leave report of one employee.
    pub async fn leave_report(&self, employee_id: EmployeeId) -> Result<LeaveReport, AppError> {
        let requests = self.get_employee_leave_requests(employee_id).await?;
        let employee = self.get_employee(employee_id).await?;

        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            let leave_type = self
                .leave_types
                .get(request.leave_type_id)
                .await?
                .ok_or_else(|| AppError::ReportLeaveTypeMissing {
                    request_id: request.id.to_string(),
                    leave_type_id: request.leave_type_id.to_string(),
                })?;

            entries.push(LeaveReportEntry {
                request_id: request.id,
                leave_type: leave_type.name,
                quota: leave_type.quota,
                remaining_balance: employee.leave_balances.get(leave_type.category()),
                start_date: request.start_date,
                end_date: request.end_date,
                status: request.status,
                reason: request.reason,
            });
        }

        Ok(LeaveReport {
            employee_id: employee.id,
            employee_name: employee.name,
            entries,
        })
    }

    /// Render the leave report of one employee as text.
    pub async fn generate_leave_report(&self, employee_id: EmployeeId) -> Result<String, AppError> {
        Ok(self.leave_report(employee_id).await?.to_string())
    }
}
