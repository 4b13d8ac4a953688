use super::{AFFILIATES, FOLLOWUPS};
use crate::domain::affiliates::{Affiliate, AffiliateInput, Followup, FollowupInput};
use crate::postgrest::{fetch_one, fetch_rows, insert_row, update_rows, Direction, Query, RestStore};
use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

pub async fn load_affiliates(store: &dyn RestStore) -> Result<Vec<Affiliate>> {
    let rows = fetch_rows(
        store,
        AFFILIATES,
        &Query::new().select("*").order("name", Direction::Asc),
    )
    .await?;
    Ok(rows)
}

pub async fn find_affiliate(store: &dyn RestStore, id: Uuid) -> Result<Option<Affiliate>> {
    Ok(fetch_one(store, AFFILIATES, Query::new().select("*").eq("id", id)).await?)
}

pub async fn load_followups(store: &dyn RestStore, affiliate_id: Uuid) -> Result<Vec<Followup>> {
    let rows = fetch_rows(
        store,
        FOLLOWUPS,
        &Query::new()
            .select("*")
            .eq("affiliate_id", affiliate_id)
            .order("date", Direction::Desc),
    )
    .await?;
    Ok(rows)
}

pub async fn create_affiliate(store: &dyn RestStore, input: &AffiliateInput) -> Result<Affiliate> {
    Ok(insert_row(store, AFFILIATES, input).await?)
}

pub async fn update_affiliate(
    store: &dyn RestStore,
    id: Uuid,
    input: &AffiliateInput,
) -> Result<Option<Affiliate>> {
    let rows: Vec<Affiliate> = update_rows(store, AFFILIATES, &Query::new().eq("id", id), input).await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_affiliate(store: &dyn RestStore, id: Uuid) -> Result<()> {
    store.delete(FOLLOWUPS, &Query::new().eq("affiliate_id", id)).await?;
    store.delete(AFFILIATES, &Query::new().eq("id", id)).await?;
    Ok(())
}

#[derive(Serialize)]
struct FollowupRow<'a> {
    affiliate_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    method: &'a str,
    notes: Option<&'a str>,
    next_followup_date: Option<NaiveDate>,
}

#[derive(Serialize)]
struct FollowupDates {
    last_followup_date: NaiveDate,
    next_followup_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoggedFollowup {
    pub followup: Followup,
    pub affiliate: Affiliate,
}

/// Appends the follow-up, then moves the affiliate's last/next dates.
/// An older follow-up logged late does not move `last_followup_date` back.
pub async fn log_followup(
    store: &dyn RestStore,
    affiliate: &Affiliate,
    user_id: Uuid,
    input: &FollowupInput,
) -> Result<LoggedFollowup> {
    let row = FollowupRow {
        affiliate_id: affiliate.id,
        user_id,
        date: input.date,
        method: input.method.trim(),
        notes: input.notes.as_deref(),
        next_followup_date: input.next_followup_date,
    };
    let followup: Followup = insert_row(store, FOLLOWUPS, &row).await?;

    // A late-logged older follow-up moves neither date.
    let is_latest = affiliate
        .last_followup_date
        .map_or(true, |previous| input.date >= previous);
    let patch = if is_latest {
        FollowupDates {
            last_followup_date: input.date,
            next_followup_date: input.next_followup_date,
        }
    } else {
        FollowupDates {
            last_followup_date: affiliate.last_followup_date.unwrap_or(input.date),
            next_followup_date: affiliate.next_followup_date,
        }
    };
    let updated: Vec<Affiliate> =
        update_rows(store, AFFILIATES, &Query::new().eq("id", affiliate.id), &patch).await?;
    let affiliate = updated
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("affiliate {} disappeared during follow-up", affiliate.id))?;

    Ok(LoggedFollowup { followup, affiliate })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Counter {
    Lead,
    Sale,
}

#[derive(Serialize)]
struct LeadCount {
    leads_count: i64,
}

#[derive(Serialize)]
struct SaleCount {
    sold_count: i64,
}

/// Read-modify-write on the counter; concurrent bumps can lose one.
async fn bump(store: &dyn RestStore, affiliate: &Affiliate, counter: Counter) -> Result<Affiliate> {
    let filter = Query::new().eq("id", affiliate.id);
    let rows: Vec<Affiliate> = match counter {
        Counter::Lead => {
            let patch = LeadCount { leads_count: affiliate.leads_count + 1 };
            update_rows(store, AFFILIATES, &filter, &patch).await?
        }
        Counter::Sale => {
            let patch = SaleCount { sold_count: affiliate.sold_count + 1 };
            update_rows(store, AFFILIATES, &filter, &patch).await?
        }
    };
    rows.into_iter()
        .next()
        .ok_or_else(|| anyhow!("affiliate {} disappeared during update", affiliate.id))
}

pub async fn record_lead(store: &dyn RestStore, affiliate: &Affiliate) -> Result<Affiliate> {
    bump(store, affiliate, Counter::Lead).await
}

pub async fn record_sale(store: &dyn RestStore, affiliate: &Affiliate) -> Result<Affiliate> {
    bump(store, affiliate, Counter::Sale).await
}
