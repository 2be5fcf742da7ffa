use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Employee, EmployeeId, LeaveBalances, LeaveCategory, LeaveRequest, LeaveRequestId,
    LeaveStatus, LeaveType, LeaveTypeId,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const EMPLOYEE_COLUMNS: &str = "id, name, email, phone, balance_annual, balance_sick, \
     balance_maternity, balance_paternity, balance_unpaid, created_at";

const LEAVE_TYPE_COLUMNS: &str = "id, name, quota, carryover_allowed, created_at";

const LEAVE_REQUEST_COLUMNS: &str =
    "id, employee_id, leave_type_id, start_date, end_date, status, reason, created_at";

/// Owns the connection pool and hands out one repository per record collection.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn leave_types(&self) -> LeaveTypeRepository {
        LeaveTypeRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn leave_requests(&self) -> LeaveRequestRepository {
        LeaveRequestRepository {
            pool: self.pool.clone(),
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    // Fixed width so lexical order in SQL matches chronological order.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str, what: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid {} timestamp", what))?
        .with_timezone(&Utc))
}

fn parse_date(s: &str, what: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid {}", what))
}

// ========================
// Employees
// ========================

/// Persists employees and their leave balances.
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Save a new employee.
    pub async fn save(&self, employee: &Employee) -> Result<()> {
        let b = &employee.leave_balances;
        sqlx::query(
            r#"
            INSERT INTO employees (id, name, email, phone, balance_annual, balance_sick, balance_maternity, balance_paternity, balance_unpaid, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(employee.id.to_string())
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(b.annual)
        .bind(b.sick)
        .bind(b.maternity)
        .bind(b.paternity)
        .bind(b.unpaid)
        .bind(format_timestamp(employee.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save employee")?;
        Ok(())
    }

    /// Get an employee by ID.
    pub async fn get(&self, id: EmployeeId) -> Result<Option<Employee>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM employees WHERE id = ?",
            EMPLOYEE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch employee")?;

        row.as_ref().map(Self::row_to_employee).transpose()
    }

    /// Get an employee by email (exact match).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM employees WHERE email = ?",
            EMPLOYEE_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch employee by email")?;

        row.as_ref().map(Self::row_to_employee).transpose()
    }

    /// List all employees in creation order.
    pub async fn list(&self) -> Result<Vec<Employee>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM employees ORDER BY created_at, rowid",
            EMPLOYEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list employees")?;

        rows.iter().map(Self::row_to_employee).collect()
    }

    /// Delete an employee together with every leave request that references it.
    pub async fn delete_cascade(&self, id: EmployeeId) -> Result<u64> {
        let id_str = id.to_string();
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let removed = sqlx::query("DELETE FROM leave_requests WHERE employee_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete employee leave requests")?
            .rows_affected();

        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete employee")?;

        tx.commit().await.context("Failed to commit employee deletion")?;
        Ok(removed)
    }

    fn row_to_employee(row: &SqliteRow) -> Result<Employee> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Employee {
            id: Uuid::parse_str(&id_str).context("Invalid employee ID")?,
            name: row.get("name"),
            email: row.get("email"),
            phone: row.get("phone"),
            leave_balances: LeaveBalances {
                annual: row.get("balance_annual"),
                sick: row.get("balance_sick"),
                maternity: row.get("balance_maternity"),
                paternity: row.get("balance_paternity"),
                unpaid: row.get("balance_unpaid"),
            },
            created_at: parse_timestamp(&created_at_str, "created_at")?,
        })
    }
}

// ========================
// Leave types
// ========================

/// Persists leave types. Leave types are never updated or deleted.
#[derive(Clone)]
pub struct LeaveTypeRepository {
    pool: SqlitePool,
}

impl LeaveTypeRepository {
    pub async fn save(&self, leave_type: &LeaveType) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_types (id, name, quota, carryover_allowed, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(leave_type.id.to_string())
        .bind(leave_type.name.as_str())
        .bind(leave_type.quota)
        .bind(leave_type.carryover_allowed)
        .bind(format_timestamp(leave_type.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save leave type")?;
        Ok(())
    }

    pub async fn get(&self, id: LeaveTypeId) -> Result<Option<LeaveType>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leave_types WHERE id = ?",
            LEAVE_TYPE_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch leave type")?;

        row.as_ref().map(Self::row_to_leave_type).transpose()
    }

    pub async fn find_by_category(&self, category: LeaveCategory) -> Result<Option<LeaveType>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leave_types WHERE name = ?",
            LEAVE_TYPE_COLUMNS
        ))
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch leave type by category")?;

        row.as_ref().map(Self::row_to_leave_type).transpose()
    }

    pub async fn list(&self) -> Result<Vec<LeaveType>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM leave_types ORDER BY created_at, rowid",
            LEAVE_TYPE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list leave types")?;

        rows.iter().map(Self::row_to_leave_type).collect()
    }

    fn row_to_leave_type(row: &SqliteRow) -> Result<LeaveType> {
        let id_str: String = row.get("id");
        let name_str: String = row.get("name");
        let created_at_str: String = row.get("created_at");

        Ok(LeaveType {
            id: Uuid::parse_str(&id_str).context("Invalid leave type ID")?,
            name: LeaveCategory::from_str(&name_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid leave category: {}", name_str))?,
            quota: row.get("quota"),
            carryover_allowed: row.get::<i32, _>("carryover_allowed") != 0,
            created_at: parse_timestamp(&created_at_str, "created_at")?,
        })
    }
}

// ========================
// Leave requests
// ========================

/// Persists leave requests and applies status changes.
#[derive(Clone)]
pub struct LeaveRequestRepository {
    pool: SqlitePool,
}

impl LeaveRequestRepository {
    pub async fn save(&self, request: &LeaveRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_requests (id, employee_id, leave_type_id, start_date, end_date, status, reason, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.employee_id.to_string())
        .bind(request.leave_type_id.to_string())
        .bind(request.start_date.format(DATE_FORMAT).to_string())
        .bind(request.end_date.format(DATE_FORMAT).to_string())
        .bind(request.status.as_str())
        .bind(&request.reason)
        .bind(format_timestamp(request.created_at))
        .execute(&self.pool)
        .await
        .context("Failed to save leave request")?;
        Ok(())
    }

    pub async fn get(&self, id: LeaveRequestId) -> Result<Option<LeaveRequest>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM leave_requests WHERE id = ?",
            LEAVE_REQUEST_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch leave request")?;

        row.as_ref().map(Self::row_to_leave_request).transpose()
    }

    /// List all leave requests in creation order.
    pub async fn list(&self) -> Result<Vec<LeaveRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM leave_requests ORDER BY created_at, rowid",
            LEAVE_REQUEST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list leave requests")?;

        rows.iter().map(Self::row_to_leave_request).collect()
    }

    /// List leave requests of one employee in creation order.
    pub async fn list_for_employee(&self, employee_id: EmployeeId) -> Result<Vec<LeaveRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM leave_requests WHERE employee_id = ? ORDER BY created_at, rowid",
            LEAVE_REQUEST_COLUMNS
        ))
        .bind(employee_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list leave requests for employee")?;

        rows.iter().map(Self::row_to_leave_request).collect()
    }

    /// Count requests of one employee in the given status.
    pub async fn count_for_employee(
        &self,
        employee_id: EmployeeId,
        status: LeaveStatus,
    ) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) as count FROM leave_requests WHERE employee_id = ? AND status = ?",
        )
        .bind(employee_id.to_string())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to count leave requests")?;

        Ok(row.get("count"))
    }

    /// Set the status of a request without touching any balance.
    pub async fn update_status(&self, id: LeaveRequestId, status: LeaveStatus) -> Result<()> {
        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update leave request status")?;
        Ok(())
    }

    /// Move a request to `status` and store the employee's new balances in a
    /// single transaction.
    pub async fn settle(
        &self,
        id: LeaveRequestId,
        status: LeaveStatus,
        employee_id: EmployeeId,
        balances: &LeaveBalances,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE employees
            SET balance_annual = ?, balance_sick = ?, balance_maternity = ?, balance_paternity = ?, balance_unpaid = ?
            WHERE id = ?
            "#,
        )
        .bind(balances.annual)
        .bind(balances.sick)
        .bind(balances.maternity)
        .bind(balances.paternity)
        .bind(balances.unpaid)
        .bind(employee_id.to_string())
        .execute(&mut *tx)
        .await
        .context("Failed to update leave balances")?;

        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to update leave request status")?;

        tx.commit().await.context("Failed to commit leave settlement")?;
        Ok(())
    }

    pub async fn delete(&self, id: LeaveRequestId) -> Result<()> {
        sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete leave request")?;
        Ok(())
    }

    fn row_to_leave_request(row: &SqliteRow) -> Result<LeaveRequest> {
        let id_str: String = row.get("id");
        let employee_id_str: String = row.get("employee_id");
        let leave_type_id_str: String = row.get("leave_type_id");
        let start_str: String = row.get("start_date");
        let end_str: String = row.get("end_date");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(LeaveRequest {
            id: Uuid::parse_str(&id_str).context("Invalid leave request ID")?,
            employee_id: Uuid::parse_str(&employee_id_str).context("Invalid employee ID")?,
            leave_type_id: Uuid::parse_str(&leave_type_id_str)
                .context("Invalid leave type ID")?,
            start_date: parse_date(&start_str, "start_date")?,
            end_date: parse_date(&end_str, "end_date")?,
            status: LeaveStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid leave status: {}", status_str))?,
            reason: row.get("reason"),
            created_at: parse_timestamp(&created_at_str, "created_at")?,
        })
    }
}
