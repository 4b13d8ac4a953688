use crate::db;
use crate::domain::models::User;
use crate::domain::pto::{
    expiration_status, ledger_drift, BalanceView, PtoBalance, PtoError, PtoPolicy, PtoTransaction,
    TransactionType,
};
use crate::state::SharedState;
use crate::web::session::UserSession;
use crate::web::internal;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Ledger rows scanned when reconciling every balance at once.
const DRIFT_SCAN_LIMIT: usize = 1000;

#[derive(Serialize)]
pub struct MyPto {
    pub balance: Option<BalanceView>,
    pub history: Vec<PtoTransaction>,
}

#[derive(Serialize)]
pub struct TeamBalance {
    pub user: User,
    pub balance: Option<BalanceView>,
}

#[derive(Serialize)]
pub struct PtoOverview {
    pub policies: Vec<PtoPolicy>,
    pub balances: Vec<TeamBalance>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustPayload {
    pub user_id: Uuid,
    pub amount: f64,
    pub description: String,
    #[serde(default = "default_adjustment", rename = "type")]
    pub kind: TransactionType,
}

fn default_adjustment() -> TransactionType {
    TransactionType::Adjustment
}

#[derive(Debug, Deserialize)]
pub struct AssignPayload {
    pub user_id: Uuid,
    pub policy_id: Uuid,
    pub initial_balance: f64,
}

pub fn router(state: SharedState) -> Router {
    Router::new().route("/", get(my_pto)).with_state(state)
}

pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(overview))
        .route("/adjust", post(adjust))
        .route("/assign", post(assign))
        .route("/policies/:id/accrue", post(accrue))
        .route("/users/:id/history", get(user_history))
        .with_state(state)
}

fn view(
    balance: &PtoBalance,
    policies: &[PtoPolicy],
    transactions: &[PtoTransaction],
    today: NaiveDate,
) -> BalanceView {
    BalanceView {
        balance: balance.clone(),
        policy_name: balance
            .policy_id
            .and_then(|id| policies.iter().find(|p| p.id == id))
            .map(|p| p.name.clone()),
        expiration_status: expiration_status(balance, today),
        ledger_drift: ledger_drift(balance, transactions),
    }
}

fn pto_status(e: anyhow::Error) -> StatusCode {
    match e.downcast_ref::<PtoError>() {
        Some(PtoError::NoBalance(user_id)) => {
            tracing::warn!("No PTO balance for user {}", user_id);
            StatusCode::NOT_FOUND
        }
        Some(err) => {
            tracing::warn!("Rejected PTO change: {}", err);
            StatusCode::BAD_REQUEST
        }
        None => {
            tracing::error!("PTO write failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn my_pto(session: UserSession, State(state): State<SharedState>) -> Result<Json<MyPto>, StatusCode> {
    let user_id = session.user.id;
    let (balance, history, policies) = futures::try_join!(
        db::pto::find_balance(&session.rest, user_id),
        db::pto::history(&session.rest, user_id),
        db::pto::load_policies(&session.rest),
    )
    .map_err(internal("Failed to load PTO"))?;

    let today = state.today();
    Ok(Json(MyPto {
        balance: balance.map(|b| view(&b, &policies, &history, today)),
        history,
    }))
}

async fn overview(session: UserSession, State(state): State<SharedState>) -> Result<Json<PtoOverview>, StatusCode> {
    session.require_admin()?;
    let (users, balances, policies, transactions) = futures::try_join!(
        db::get_all_users(&session.rest),
        db::pto::load_balances(&session.rest),
        db::pto::load_policies(&session.rest),
        db::pto::recent_transactions(&session.rest, DRIFT_SCAN_LIMIT),
    )
    .map_err(internal("Failed to load PTO overview"))?;

    let today = state.today();
    let balances = users
        .into_iter()
        .map(|user| {
            let balance = balances
                .iter()
                .find(|b| b.user_id == user.id)
                .map(|b| view(b, &policies, &transactions, today));
            TeamBalance { user, balance }
        })
        .collect();

    Ok(Json(PtoOverview { policies, balances }))
}

async fn adjust(
    session: UserSession,
    Json(payload): Json<AdjustPayload>,
) -> Result<Json<db::pto::AdjustmentOutcome>, StatusCode> {
    session.require_admin()?;
    let outcome = db::pto::adjust_balance(
        &session.rest,
        payload.user_id,
        payload.amount,
        payload.kind,
        &payload.description,
        Some(session.user.id),
    )
    .await
    .map_err(pto_status)?;
    Ok(Json(outcome))
}

async fn assign(
    session: UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<db::pto::AdjustmentOutcome>, StatusCode> {
    session.require_admin()?;
    let (user, policy) = futures::try_join!(
        db::find_user_by_id(&session.rest, payload.user_id),
        db::pto::find_policy(&session.rest, payload.policy_id),
    )
    .map_err(internal("Failed to load policy assignment"))?;
    let user = user.ok_or(StatusCode::NOT_FOUND)?;
    let policy = policy.ok_or(StatusCode::NOT_FOUND)?;

    let outcome = db::pto::assign_policy(
        &session.rest,
        &user,
        &policy,
        payload.initial_balance,
        state.today(),
        Some(session.user.id),
    )
    .await
    .map_err(pto_status)?;
    tracing::info!("Policy {} assigned to {} by {}", policy.name, user.id, session.user.id);
    Ok(Json(outcome))
}

async fn accrue(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<db::pto::AccrualRun>, StatusCode> {
    session.require_admin()?;
    let policy = db::pto::find_policy(&session.rest, id)
        .await
        .map_err(internal("Failed to load PTO policy"))?
        .ok_or(StatusCode::NOT_FOUND)?;
    let run = db::pto::run_accrual(&session.rest, &policy, Some(session.user.id))
        .await
        .map_err(internal("Failed to run accrual"))?;
    Ok(Json(run))
}

async fn user_history(session: UserSession, Path(id): Path<Uuid>) -> Result<Json<Vec<PtoTransaction>>, StatusCode> {
    session.require_admin()?;
    let history = db::pto::history(&session.rest, id)
        .await
        .map_err(internal("Failed to load PTO history"))?;
    Ok(Json(history))
}
