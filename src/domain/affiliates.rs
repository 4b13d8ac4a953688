use crate::domain::schedule::{classify, days_since, DueStatus, FOLLOWUP, NEGLECTED_AFTER_DAYS};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub leads_count: i64,
    #[serde(default)]
    pub sold_count: i64,
    #[serde(default)]
    pub last_followup_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_followup_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Followup {
    pub id: Uuid,
    pub affiliate_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub method: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub next_followup_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FollowupInput {
    pub date: NaiveDate,
    pub method: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub next_followup_date: Option<NaiveDate>,
}

impl FollowupInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.method.trim().is_empty() {
            return Err("method is required");
        }
        if self.next_followup_date.is_some_and(|next| next < self.date) {
            return Err("next follow-up cannot precede the follow-up date");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AffiliateInput {
    pub name: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    #[serde(default)]
    pub next_followup_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AffiliateInput {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        Ok(())
    }
}

pub fn followup_status(affiliate: &Affiliate, today: NaiveDate) -> DueStatus {
    classify(affiliate.next_followup_date, today, &FOLLOWUP)
}

pub fn is_neglected(affiliate: &Affiliate, today: NaiveDate) -> bool {
    affiliate
        .last_followup_date
        .map(|last| days_since(last, today) >= NEGLECTED_AFTER_DAYS)
        .unwrap_or(true)
}

pub fn conversion_rate(affiliate: &Affiliate) -> f64 {
    if affiliate.leads_count <= 0 {
        return 0.0;
    }
    (affiliate.sold_count as f64 / affiliate.leads_count as f64 * 1000.0).round() / 10.0
}

pub fn matches_search(affiliate: &Affiliate, text: &str) -> bool {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    affiliate.name.to_lowercase().contains(&needle)
        || affiliate
            .company
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&needle))
}

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateRow {
    pub affiliate: Affiliate,
    pub status: DueStatus,
    pub neglected: bool,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffiliateBoard {
    pub rows: Vec<AffiliateRow>,
    pub status_counts: BTreeMap<&'static str, usize>,
    pub neglected: usize,
    pub total_leads: i64,
    pub total_sold: i64,
}

/// Rows sorted by severity, then soonest next follow-up, then name.
pub fn board(affiliates: &[Affiliate], today: NaiveDate, search: Option<&str>) -> AffiliateBoard {
    let mut rows: Vec<AffiliateRow> = affiliates
        .iter()
        .filter(|a| search.map(|s| matches_search(a, s)).unwrap_or(true))
        .map(|a| AffiliateRow {
            affiliate: a.clone(),
            status: followup_status(a, today),
            neglected: is_neglected(a, today),
            conversion_rate: conversion_rate(a),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.status
            .cmp(&b.status)
            .then_with(|| {
                // Rows without a next date go last within their status.
                match (a.affiliate.next_followup_date, b.affiliate.next_followup_date) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                }
            })
            .then_with(|| a.affiliate.name.cmp(&b.affiliate.name))
    });

    let mut status_counts = BTreeMap::new();
    for row in &rows {
        *status_counts.entry(row.status.as_str()).or_insert(0) += 1;
    }

    AffiliateBoard {
        neglected: rows.iter().filter(|r| r.neglected).count(),
        total_leads: rows.iter().map(|r| r.affiliate.leads_count).sum(),
        total_sold: rows.iter().map(|r| r.affiliate.sold_count).sum(),
        status_counts,
        rows,
    }
}
