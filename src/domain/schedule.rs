use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Affiliates without a follow-up for this long are flagged as neglected.
pub const NEGLECTED_AFTER_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Critical,
    Overdue,
    DueToday,
    Upcoming,
    Ok,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Critical => "critical",
            DueStatus::Overdue => "overdue",
            DueStatus::DueToday => "due_today",
            DueStatus::Upcoming => "upcoming",
            DueStatus::Ok => "ok",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Overdue by more than this many days is critical.
    pub critical_after_days: i64,
    /// Due within this many days is upcoming.
    pub upcoming_within_days: i64,
}

pub const FOLLOWUP: Thresholds = Thresholds {
    critical_after_days: 14,
    upcoming_within_days: 3,
};

pub const ONBOARDING_DEADLINE: Thresholds = Thresholds {
    critical_after_days: 0,
    upcoming_within_days: 3,
};

pub const PTO_EXPIRATION: Thresholds = Thresholds {
    critical_after_days: 0,
    upcoming_within_days: 30,
};

pub fn classify(target: Option<NaiveDate>, today: NaiveDate, thresholds: &Thresholds) -> DueStatus {
    let Some(target) = target else {
        return DueStatus::Ok;
    };

    let days_until = (target - today).num_days();
    if days_until < 0 {
        let days_overdue = -days_until;
        if days_overdue > thresholds.critical_after_days {
            DueStatus::Critical
        } else {
            DueStatus::Overdue
        }
    } else if days_until == 0 {
        DueStatus::DueToday
    } else if days_until <= thresholds.upcoming_within_days {
        DueStatus::Upcoming
    } else {
        DueStatus::Ok
    }
}

pub fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}
