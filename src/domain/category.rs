use serde::{Deserialize, Serialize};

/// Days every employee starts with in each leave category.
pub const DEFAULT_LEAVE_BALANCE: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveCategory {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Unpaid,
}

impl LeaveCategory {
    pub const ALL: [LeaveCategory; 5] = [
        LeaveCategory::Annual,
        LeaveCategory::Sick,
        LeaveCategory::Maternity,
        LeaveCategory::Paternity,
        LeaveCategory::Unpaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveCategory::Annual => "annual",
            LeaveCategory::Sick => "sick",
            LeaveCategory::Maternity => "maternity",
            LeaveCategory::Paternity => "paternity",
            LeaveCategory::Unpaid => "unpaid",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "annual" => Some(LeaveCategory::Annual),
            "sick" => Some(LeaveCategory::Sick),
            "maternity" => Some(LeaveCategory::Maternity),
            "paternity" => Some(LeaveCategory::Paternity),
            "unpaid" => Some(LeaveCategory::Unpaid),
            _ => None,
        }
    }

    /// Display label, e.g. "Annual".
    pub fn label(&self) -> &'static str {
        match self {
            LeaveCategory::Annual => "Annual",
            LeaveCategory::Sick => "Sick",
            LeaveCategory::Maternity => "Maternity",
            LeaveCategory::Paternity => "Paternity",
            LeaveCategory::Unpaid => "Unpaid",
        }
    }
}

impl std::fmt::Display for LeaveCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Remaining days per leave category for one employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalances {
    pub annual: i64,
    pub sick: i64,
    pub maternity: i64,
    pub paternity: i64,
    pub unpaid: i64,
}

impl Default for LeaveBalances {
    fn default() -> Self {
        Self::uniform(DEFAULT_LEAVE_BALANCE)
    }
}

impl LeaveBalances {
    pub fn uniform(days: i64) -> Self {
        Self {
            annual: days,
            sick: days,
            maternity: days,
            paternity: days,
            unpaid: days,
        }
    }

    pub fn get(&self, category: LeaveCategory) -> i64 {
        match category {
            LeaveCategory::Annual => self.annual,
            LeaveCategory::Sick => self.sick,
            LeaveCategory::Maternity => self.maternity,
            LeaveCategory::Paternity => self.paternity,
            LeaveCategory::Unpaid => self.unpaid,
        }
    }

    fn slot_mut(&mut self, category: LeaveCategory) -> &mut i64 {
        match category {
            LeaveCategory::Annual => &mut self.annual,
            LeaveCategory::Sick => &mut self.sick,
            LeaveCategory::Maternity => &mut self.maternity,
            LeaveCategory::Paternity => &mut self.paternity,
            LeaveCategory::Unpaid => &mut self.unpaid,
        }
    }

    pub fn covers(&self, category: LeaveCategory, days: i64) -> bool {
        self.get(category) >= days
    }

    /// Subtract `days` from a category. No floor is applied; the caller
    /// decides whether a negative result is acceptable.
    pub fn deduct(&mut self, category: LeaveCategory, days: i64) -> i64 {
        let slot = self.slot_mut(category);
        *slot -= days;
        *slot
    }
}
