use crate::domain::schedule::{classify, DueStatus, PTO_EXPIRATION};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most recent ledger rows returned by the history view.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccrualType {
    Annual,
    Monthly,
    PerPayPeriod,
    None,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationType {
    None,
    EndOfYear,
    Anniversary,
    DaysAfterGrant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Initial,
    Adjustment,
    Accrual,
    Used,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtoPolicy {
    pub id: Uuid,
    pub name: String,
    pub accrual_type: AccrualType,
    #[serde(default)]
    pub accrual_amount: f64,
    #[serde(default)]
    pub max_balance: Option<f64>,
    pub expiration_type: ExpirationType,
    #[serde(default)]
    pub expiration_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtoBalance {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub policy_id: Option<Uuid>,
    pub balance: f64,
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PtoTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub balance_after: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Ledger row as written; the store assigns `id`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewPtoTransaction {
    pub user_id: Uuid,
    pub amount: f64,
    pub balance_after: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PtoError {
    #[error("amount must be a non-zero number")]
    InvalidAmount,
    #[error("description is required")]
    MissingDescription,
    #[error("no PTO balance for user {0}")]
    NoBalance(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentPlan {
    pub transaction: NewPtoTransaction,
    pub new_balance: f64,
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn plan_adjustment(
    user_id: Uuid,
    current_balance: f64,
    amount: f64,
    kind: TransactionType,
    description: &str,
    actor: Option<Uuid>,
) -> Result<AdjustmentPlan, PtoError> {
    if !amount.is_finite() || amount == 0.0 {
        return Err(PtoError::InvalidAmount);
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(PtoError::MissingDescription);
    }

    let amount = round_hundredths(amount);
    let new_balance = round_hundredths(current_balance + amount);

    Ok(AdjustmentPlan {
        transaction: NewPtoTransaction {
            user_id,
            amount,
            balance_after: new_balance,
            kind,
            description: description.to_string(),
            created_by: actor,
            created_at: Utc::now(),
        },
        new_balance,
    })
}

/// Accrual for one period of the policy's cadence, capped at `max_balance`.
pub fn accrual_for_period(policy: &PtoPolicy, current_balance: f64) -> f64 {
    if policy.accrual_type == AccrualType::None || policy.accrual_amount <= 0.0 {
        return 0.0;
    }
    let amount = match policy.max_balance {
        Some(max) => policy.accrual_amount.min(max - current_balance).max(0.0),
        None => policy.accrual_amount,
    };
    round_hundredths(amount)
}

fn anniversary_in(year: i32, hire_date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, hire_date.month(), hire_date.day())
        // Feb 29 hires roll over on Feb 28 in non-leap years.
        .or_else(|| NaiveDate::from_ymd_opt(year, hire_date.month(), 28))
        .unwrap_or(hire_date)
}

pub fn expiration_date(
    policy: &PtoPolicy,
    grant_date: NaiveDate,
    hire_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    match policy.expiration_type {
        ExpirationType::None => None,
        ExpirationType::EndOfYear => NaiveDate::from_ymd_opt(grant_date.year(), 12, 31),
        ExpirationType::Anniversary => {
            let hire = hire_date.unwrap_or(grant_date);
            let this_year = anniversary_in(grant_date.year(), hire);
            if this_year > grant_date {
                Some(this_year)
            } else {
                Some(anniversary_in(grant_date.year() + 1, hire))
            }
        }
        ExpirationType::DaysAfterGrant => {
            let days = Duration::try_days(policy.expiration_days.unwrap_or(365))?;
            grant_date.checked_add_signed(days)
        }
    }
}

pub fn expiration_status(balance: &PtoBalance, today: NaiveDate) -> DueStatus {
    if balance.balance <= 0.0 {
        return DueStatus::Ok;
    }
    classify(balance.expires_on, today, &PTO_EXPIRATION)
}

/// Gap between the balance row and the newest ledger entry, when they
/// disagree. Both are written by separate calls so they can drift.
pub fn ledger_drift(balance: &PtoBalance, transactions: &[PtoTransaction]) -> Option<f64> {
    let newest = transactions
        .iter()
        .filter(|t| t.user_id == balance.user_id)
        .max_by_key(|t| t.created_at)?;
    let drift = round_hundredths(balance.balance - newest.balance_after);
    (drift.abs() >= 0.01).then_some(drift)
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceView {
    pub balance: PtoBalance,
    pub policy_name: Option<String>,
    pub expiration_status: DueStatus,
    pub ledger_drift: Option<f64>,
}
