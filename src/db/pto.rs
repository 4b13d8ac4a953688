use super::{PTO_BALANCES, PTO_POLICIES, PTO_TRANSACTIONS};
use crate::domain::models::User;
use crate::domain::pto::{
    accrual_for_period, expiration_date, plan_adjustment, NewPtoTransaction, PtoBalance, PtoError, PtoPolicy,
    PtoTransaction, TransactionType, HISTORY_LIMIT,
};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, update_rows, Direction, Query, RestStore};
use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

pub async fn load_policies(store: &dyn RestStore) -> Result<Vec<PtoPolicy>> {
    let rows = fetch_rows(
        store,
        PTO_POLICIES,
        &Query::new().select("*").order("name", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

pub async fn find_policy(store: &dyn RestStore, id: Uuid) -> Result<Option<PtoPolicy>> {
    Ok(fetch_one(store, PTO_POLICIES, Query::new().select("*").eq("id", id)).await?)
}

pub async fn load_balances(store: &dyn RestStore) -> Result<Vec<PtoBalance>> {
    Ok(fetch_rows(store, PTO_BALANCES, &Query::new().select("*")).await?)
}

pub async fn find_balance(store: &dyn RestStore, user_id: Uuid) -> Result<Option<PtoBalance>> {
    Ok(fetch_one(store, PTO_BALANCES, Query::new().select("*").eq("user_id", user_id)).await?)
}

/// Newest first, capped at [`HISTORY_LIMIT`] rows.
pub async fn history(store: &dyn RestStore, user_id: Uuid) -> Result<Vec<PtoTransaction>> {
    let rows = fetch_rows(
        store,
        PTO_TRANSACTIONS,
        &Query::new()
            .select("*")
            .eq("user_id", user_id)
            .order("created_at", Direction::Desc)
            .limit(HISTORY_LIMIT),
    )
    .await?;
    Ok(rows)
}

/// Newest ledger rows across all users, for drift checks on the admin view.
pub async fn recent_transactions(store: &dyn RestStore, limit: usize) -> Result<Vec<PtoTransaction>> {
    let rows = fetch_rows(
        store,
        PTO_TRANSACTIONS,
        &Query::new()
            .select("*")
            .order("created_at", Direction::Desc)
            .limit(limit),
    )
    .await?;
    Ok(rows)
}

#[derive(Serialize)]
struct BalancePatch {
    balance: f64,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub transaction: PtoTransaction,
    pub balance: PtoBalance,
}

/// Writes the ledger row, then the balance row. The two calls are not
/// atomic: when the balance write fails the ledger row stays behind and the
/// error names it.
pub async fn adjust_balance(
    store: &dyn RestStore,
    user_id: Uuid,
    amount: f64,
    kind: TransactionType,
    description: &str,
    actor: Option<Uuid>,
) -> Result<AdjustmentOutcome> {
    let current = find_balance(store, user_id)
        .await?
        .ok_or(PtoError::NoBalance(user_id))?;

    let plan = plan_adjustment(user_id, current.balance, amount, kind, description, actor)?;

    let transaction: PtoTransaction = insert_row(store, PTO_TRANSACTIONS, &plan.transaction).await?;

    let patch = BalancePatch {
        balance: plan.new_balance,
        updated_at: Utc::now(),
    };
    let updated: Vec<PtoBalance> =
        match update_rows(store, PTO_BALANCES, &Query::new().eq("id", current.id), &patch).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(
                    "PTO ledger entry {} written for user {} but balance update failed: {}",
                    transaction.id,
                    user_id,
                    e
                );
                return Err(anyhow!(
                    "balance update failed after ledger entry {}: {e}",
                    transaction.id
                ));
            }
        };

    let balance = updated
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("balance row {} disappeared during update", current.id))?;

    tracing::info!(
        "PTO {:?} for user {}: {:+} -> {}",
        kind,
        user_id,
        transaction.amount,
        balance.balance
    );

    Ok(AdjustmentOutcome { transaction, balance })
}

#[derive(Serialize)]
struct BalanceRow {
    user_id: Uuid,
    policy_id: Uuid,
    balance: f64,
    expires_on: Option<NaiveDate>,
    updated_at: DateTime<Utc>,
}

/// Attaches `policy` to the user's balance (creating it if needed), resets
/// the balance to `initial_balance` and records an `initial` ledger row.
pub async fn assign_policy(
    store: &dyn RestStore,
    user: &User,
    policy: &PtoPolicy,
    initial_balance: f64,
    today: NaiveDate,
    actor: Option<Uuid>,
) -> Result<AdjustmentOutcome> {
    if !initial_balance.is_finite() || initial_balance < 0.0 {
        return Err(PtoError::InvalidAmount.into());
    }

    let row = BalanceRow {
        user_id: user.id,
        policy_id: policy.id,
        balance: initial_balance,
        expires_on: expiration_date(policy, today, user.hire_date),
        updated_at: Utc::now(),
    };

    let previous = find_balance(store, user.id).await?;
    let balance: PtoBalance = match &previous {
        Some(existing) => update_rows::<PtoBalance, _>(
            store,
            PTO_BALANCES,
            &Query::new().eq("id", existing.id),
            &row,
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("balance row {} disappeared during update", existing.id))?,
        None => insert_row(store, PTO_BALANCES, &row).await?,
    };

    let previous_amount = previous.map(|b| b.balance).unwrap_or(0.0);
    let entry = NewPtoTransaction {
        user_id: user.id,
        amount: initial_balance - previous_amount,
        balance_after: initial_balance,
        kind: TransactionType::Initial,
        description: format!("Assigned policy {}", policy.name),
        created_by: actor,
        created_at: Utc::now(),
    };
    let transaction: PtoTransaction = match insert_row(store, PTO_TRANSACTIONS, &entry).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(
                "Policy {} assigned to user {} but ledger insert failed: {}",
                policy.id,
                user.id,
                e
            );
            return Err(e.into());
        }
    };

    Ok(AdjustmentOutcome { transaction, balance })
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct AccrualRun {
    pub credited: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Credits one accrual period to every balance on `policy`. Failures are
/// logged and counted; the run continues with the next balance.
pub async fn run_accrual(store: &dyn RestStore, policy: &PtoPolicy, actor: Option<Uuid>) -> Result<AccrualRun> {
    let balances: Vec<PtoBalance> = fetch_rows(
        store,
        PTO_BALANCES,
        &Query::new().select("*").eq("policy_id", policy.id),
    )
    .await?;

    let mut run = AccrualRun::default();
    for balance in balances {
        let amount = accrual_for_period(policy, balance.balance);
        if amount <= 0.0 {
            run.skipped += 1;
            continue;
        }
        let description = format!("{} accrual", policy.name);
        match adjust_balance(store, balance.user_id, amount, TransactionType::Accrual, &description, actor).await {
            Ok(_) => run.credited += 1,
            Err(e) => {
                run.failed += 1;
                tracing::error!("Accrual failed for user {}: {}", balance.user_id, e);
            }
        }
    }

    tracing::info!(
        "Accrual for policy {}: {} credited, {} skipped, {} failed",
        policy.name,
        run.credited,
        run.skipped,
        run.failed
    );
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UserRole;
    use crate::domain::pto::{AccrualType, ExpirationType};
    use crate::postgrest::memory::MemoryStore;
    use serde_json::json;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Rae".into(),
            email: None,
            department: Some("disputes".into()),
            role: UserRole::Member,
            hire_date: NaiveDate::from_ymd_opt(2022, 9, 1),
        }
    }

    fn policy() -> PtoPolicy {
        PtoPolicy {
            id: Uuid::new_v4(),
            name: "Standard".into(),
            accrual_type: AccrualType::Monthly,
            accrual_amount: 8.0,
            max_balance: Some(20.0),
            expiration_type: ExpirationType::Anniversary,
            expiration_days: None,
        }
    }

    #[tokio::test]
    async fn bonus_adjustment_writes_ledger_and_balance() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .seed(PTO_BALANCES, vec![json!({ "user_id": user_id, "balance": 10.0 })])
            .await;

        let outcome = adjust_balance(&store, user_id, 2.5, TransactionType::Adjustment, "bonus", None)
            .await
            .unwrap();
        assert_eq!(outcome.transaction.amount, 2.5);
        assert_eq!(outcome.transaction.balance_after, 12.5);
        assert_eq!(outcome.balance.balance, 12.5);

        let stored = find_balance(&store, user_id).await.unwrap().unwrap();
        assert_eq!(stored.balance, 12.5);
        let ledger = history(&store, user_id).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].kind, TransactionType::Adjustment);
    }

    #[tokio::test]
    async fn failed_balance_write_leaves_ledger_row() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .seed(PTO_BALANCES, vec![json!({ "user_id": user_id, "balance": 10.0 })])
            .await;
        store.fail_writes_to(PTO_BALANCES).await;

        let err = adjust_balance(&store, user_id, -1.0, TransactionType::Used, "sick day", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ledger entry"));
        assert_eq!(store.rows(PTO_TRANSACTIONS).await.len(), 1);
        assert_eq!(find_balance(&store, user_id).await.unwrap().unwrap().balance, 10.0);
    }

    #[tokio::test]
    async fn adjusting_missing_balance_is_a_pto_error() {
        let store = MemoryStore::new();
        let err = adjust_balance(&store, Uuid::new_v4(), 1.0, TransactionType::Adjustment, "x", None)
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<PtoError>(), Some(PtoError::NoBalance(_))));
    }

    #[tokio::test]
    async fn assigning_policy_creates_balance_and_initial_entry() {
        let store = MemoryStore::new();
        let u = user();
        let p = policy();
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let outcome = assign_policy(&store, &u, &p, 16.0, today, None).await.unwrap();
        assert_eq!(outcome.balance.balance, 16.0);
        assert_eq!(outcome.balance.policy_id, Some(p.id));
        assert_eq!(outcome.balance.expires_on, NaiveDate::from_ymd_opt(2024, 9, 1));
        assert_eq!(outcome.transaction.kind, TransactionType::Initial);
        assert_eq!(outcome.transaction.amount, 16.0);

        // Reassigning updates the same balance row and logs the difference.
        let again = assign_policy(&store, &u, &p, 10.0, today, None).await.unwrap();
        assert_eq!(again.balance.id, outcome.balance.id);
        assert_eq!(again.transaction.amount, -6.0);
        assert_eq!(store.rows(PTO_BALANCES).await.len(), 1);
    }

    #[tokio::test]
    async fn accrual_run_caps_and_skips_full_balances() {
        let store = MemoryStore::new();
        let p = policy();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store
            .seed(
                PTO_BALANCES,
                vec![
                    json!({ "user_id": a, "policy_id": p.id, "balance": 15.0 }),
                    json!({ "user_id": b, "policy_id": p.id, "balance": 20.0 }),
                ],
            )
            .await;

        let run = run_accrual(&store, &p, None).await.unwrap();
        assert_eq!(run.credited, 1);
        assert_eq!(run.skipped, 1);
        assert_eq!(find_balance(&store, a).await.unwrap().unwrap().balance, 20.0);
    }
}
