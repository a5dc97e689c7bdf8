//! Control lifecycle status
//!
//! Global invariants enforced:
//! - Status is a pure function of (control dates, implemented flag, today)
//! - `implemented` overrides every date-based state
//! - Single implementation shared by validation, aggregation and reporting

use crate::dates::parse_iso_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days before the planned end at which a control becomes near-due
pub const NEAR_DUE_WINDOW_DAYS: i64 = 30;

/// Stored control status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlStatus {
    OnTime,
    NearDue,
    Overdue,
}

impl ControlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlStatus::OnTime => "on-time",
            ControlStatus::NearDue => "near-due",
            ControlStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a display layer shows for the control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusDisplay {
    Implemented,
    Pending,
    OnTime,
    NearDue,
    Overdue,
}

impl StatusDisplay {
    pub fn label(&self) -> &'static str {
        match self {
            StatusDisplay::Implemented => "Implementado",
            StatusDisplay::Pending => "Pendente",
            StatusDisplay::OnTime => "No Prazo",
            StatusDisplay::NearDue => "Próximo do Vencimento",
            StatusDisplay::Overdue => "Atrasado",
        }
    }
}

/// Inputs to the status calculation
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusInput<'a> {
    pub implemented: bool,
    /// `YYYY-MM-DD` or empty
    pub planned_end_date: &'a str,
}

/// Status evaluated for a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: ControlStatus,
    pub display: StatusDisplay,
    /// Days from today to the planned end (negative when late);
    /// `None` when implemented or no planned end is set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

impl StatusReport {
    /// Lateness magnitude in days (only for overdue controls)
    pub fn days_overdue(&self) -> Option<i64> {
        match (self.status, self.days_remaining) {
            (ControlStatus::Overdue, Some(days)) => Some(-days),
            _ => None,
        }
    }
}

/// Compute a control's status as of `today`
///
/// Transitions:
/// - implemented -> on-time (Implemented)
/// - no planned end -> on-time (Pending)
/// - days_remaining < 0 -> overdue
/// - 0 <= days_remaining <= 30 -> near-due
/// - days_remaining > 30 -> on-time
pub fn compute_control_status(input: &StatusInput<'_>, today: NaiveDate) -> StatusReport {
    if input.implemented {
        return StatusReport {
            status: ControlStatus::OnTime,
            display: StatusDisplay::Implemented,
            days_remaining: None,
        };
    }

    // Unparseable dates are treated as not set; the validator rejects them on write
    let Some(planned_end) = parse_iso_date(input.planned_end_date) else {
        return StatusReport {
            status: ControlStatus::OnTime,
            display: StatusDisplay::Pending,
            days_remaining: None,
        };
    };

    let days_remaining = (planned_end - today).num_days();
    let (status, display) = if days_remaining < 0 {
        (ControlStatus::Overdue, StatusDisplay::Overdue)
    } else if days_remaining <= NEAR_DUE_WINDOW_DAYS {
        (ControlStatus::NearDue, StatusDisplay::NearDue)
    } else {
        (ControlStatus::OnTime, StatusDisplay::OnTime)
    };

    StatusReport {
        status,
        display,
        days_remaining: Some(days_remaining),
    }
}
