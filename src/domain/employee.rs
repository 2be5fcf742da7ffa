use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LeaveBalances;

pub type EmployeeId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub leave_balances: LeaveBalances,
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// New employee with the default balance in every category.
    pub fn new(name: String, email: String, phone: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            leave_balances: LeaveBalances::default(),
            created_at: Utc::now(),
        }
    }
}
