//! Payments leaderboard: per-consultant totals, calendar buckets and the
//! Fast Start / Fast Middle / Fast Finish incentive periods.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: Uuid,
    #[serde(default)]
    pub consultant_id: Option<Uuid>,
    pub consultant_name: String,
    #[serde(default)]
    pub client_name: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub doc_fee: f64,
    #[serde(default)]
    pub doc_fee_collected_on: Option<NaiveDate>,
    pub sale_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SalesPeriod {
    /// Days 1-10.
    Fs,
    /// Days 11-20.
    Fm,
    /// Day 21 to month end.
    Ff,
}

impl SalesPeriod {
    pub const ALL: [SalesPeriod; 3] = [SalesPeriod::Fs, SalesPeriod::Fm, SalesPeriod::Ff];

    pub fn label(&self) -> &'static str {
        match self {
            SalesPeriod::Fs => "Fast Start",
            SalesPeriod::Fm => "Fast Middle",
            SalesPeriod::Ff => "Fast Finish",
        }
    }
}

pub fn period_of(date: NaiveDate) -> SalesPeriod {
    match date.day() {
        1..=10 => SalesPeriod::Fs,
        11..=20 => SalesPeriod::Fm,
        _ => SalesPeriod::Ff,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub consultant_id: Option<Uuid>,
    pub consultant_name: String,
    pub total: f64,
    pub count: usize,
}

/// Ranked by total, then deal count, then name.
pub fn leaderboard<'a, I>(sales: I) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a Sale>,
{
    let mut totals: HashMap<String, LeaderboardEntry> = HashMap::new();
    for sale in sales {
        let key = sale
            .consultant_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| sale.consultant_name.to_lowercase());
        let entry = totals.entry(key).or_insert_with(|| LeaderboardEntry {
            rank: 0,
            consultant_id: sale.consultant_id,
            consultant_name: sale.consultant_name.clone(),
            total: 0.0,
            count: 0,
        });
        entry.total += sale.amount;
        entry.count += 1;
    }

    let mut entries: Vec<LeaderboardEntry> = totals.into_values().collect();
    entries.sort_by(|a, b| {
        b.total
            .partial_cmp(&a.total)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.count.cmp(&a.count))
            .then_with(|| a.consultant_name.cmp(&b.consultant_name))
    });
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = idx + 1;
        entry.total = round_cents(entry.total);
    }
    entries
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct Bucket {
    pub total: f64,
    pub count: usize,
}

impl Bucket {
    fn add(&mut self, amount: f64) {
        self.total = round_cents(self.total + amount);
        self.count += 1;
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct Buckets {
    pub today: Bucket,
    pub month_to_date: Bucket,
    pub year_to_date: Bucket,
    pub prior_year_to_date: Bucket,
    pub fast_start: Bucket,
    pub fast_middle: Bucket,
    pub fast_finish: Bucket,
}

pub fn buckets(sales: &[Sale], today: NaiveDate) -> Buckets {
    let mut out = Buckets::default();
    let cutoff = (today.month(), today.day());

    for sale in sales {
        let date = sale.sale_date;
        if date > today {
            continue;
        }
        if date == today {
            out.today.add(sale.amount);
        }
        if date.year() == today.year() {
            out.year_to_date.add(sale.amount);
            if date.month() == today.month() {
                out.month_to_date.add(sale.amount);
                match period_of(date) {
                    SalesPeriod::Fs => out.fast_start.add(sale.amount),
                    SalesPeriod::Fm => out.fast_middle.add(sale.amount),
                    SalesPeriod::Ff => out.fast_finish.add(sale.amount),
                }
            }
        } else if date.year() == today.year() - 1 && (date.month(), date.day()) <= cutoff {
            out.prior_year_to_date.add(sale.amount);
        }
    }
    out
}

pub fn in_month(sale: &Sale, today: NaiveDate) -> bool {
    sale.sale_date.year() == today.year()
        && sale.sale_date.month() == today.month()
        && sale.sale_date <= today
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct DocFeeSummary {
    pub count: usize,
    pub total: f64,
}

/// Sales whose doc fee was collected on the day the sale was generated.
pub fn same_day_doc_fees<'a, I>(sales: I) -> DocFeeSummary
where
    I: IntoIterator<Item = &'a Sale>,
{
    let mut summary = DocFeeSummary::default();
    for sale in sales {
        if sale.doc_fee > 0.0 && sale.doc_fee_collected_on == Some(sale.sale_date) {
            summary.count += 1;
            summary.total = round_cents(summary.total + sale.doc_fee);
        }
    }
    summary
}

/// Operations-director profit share. No bonus on a loss.
pub fn doo_bonus(net_profit: f64, percentage: f64) -> f64 {
    if net_profit <= 0.0 || percentage <= 0.0 {
        return 0.0;
    }
    round_cents(net_profit * percentage / 100.0)
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodLeaderboard {
    pub period: SalesPeriod,
    pub label: &'static str,
    pub leaders: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentsSnapshot {
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,
    pub buckets: Buckets,
    pub month_leaderboard: Vec<LeaderboardEntry>,
    pub year_leaderboard: Vec<LeaderboardEntry>,
    pub periods: Vec<PeriodLeaderboard>,
    pub same_day_doc_fees: DocFeeSummary,
}

/// Earliest sale date the snapshot needs: January 1st of the prior year.
pub fn snapshot_window_start(today: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(today.year() - 1, 1, 1).unwrap_or(today)
}

pub fn build_snapshot(sales: &[Sale], today: NaiveDate) -> PaymentsSnapshot {
    let month: Vec<&Sale> = sales.iter().filter(|s| in_month(s, today)).collect();
    let year = sales
        .iter()
        .filter(|s| s.sale_date.year() == today.year() && s.sale_date <= today);

    let periods = SalesPeriod::ALL
        .iter()
        .map(|period| PeriodLeaderboard {
            period: *period,
            label: period.label(),
            leaders: leaderboard(month.iter().copied().filter(|s| period_of(s.sale_date) == *period)),
        })
        .collect();

    PaymentsSnapshot {
        generated_at: Utc::now(),
        as_of: today,
        buckets: buckets(sales, today),
        month_leaderboard: leaderboard(month.iter().copied()),
        year_leaderboard: leaderboard(year),
        periods,
        same_day_doc_fees: same_day_doc_fees(month.iter().copied()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(name: &str, amount: f64, sale_date: NaiveDate) -> Sale {
        Sale {
            id: Uuid::new_v4(),
            consultant_id: None,
            consultant_name: name.into(),
            client_name: None,
            amount,
            doc_fee: 0.0,
            doc_fee_collected_on: None,
            sale_date,
        }
    }

    #[test]
    fn every_day_of_a_month_lands_in_exactly_one_period() {
        for (year, month) in [(2024, 2), (2023, 2), (2024, 4), (2024, 12)] {
            let mut day = date(year, month, 1);
            while day.month() == month {
                let expected = match day.day() {
                    1..=10 => SalesPeriod::Fs,
                    11..=20 => SalesPeriod::Fm,
                    _ => SalesPeriod::Ff,
                };
                assert_eq!(period_of(day), expected, "{day}");
                day += Duration::days(1);
            }
        }
        assert_eq!(period_of(date(2024, 1, 10)), SalesPeriod::Fs);
        assert_eq!(period_of(date(2024, 1, 11)), SalesPeriod::Fm);
        assert_eq!(period_of(date(2024, 1, 20)), SalesPeriod::Fm);
        assert_eq!(period_of(date(2024, 1, 21)), SalesPeriod::Ff);
        assert_eq!(period_of(date(2024, 1, 31)), SalesPeriod::Ff);
    }

    #[test]
    fn leaderboard_ranks_by_total_then_count() {
        let d = date(2024, 6, 3);
        let sales = vec![
            sale("Ana", 500.0, d),
            sale("Ben", 300.0, d),
            sale("Ben", 200.0, d),
            sale("Cy", 900.0, d),
        ];
        let board = leaderboard(&sales);
        let order: Vec<(&str, usize)> = board.iter().map(|e| (e.consultant_name.as_str(), e.rank)).collect();
        assert_eq!(order, vec![("Cy", 1), ("Ben", 2), ("Ana", 3)]);
        assert_eq!(board[1].count, 2);
        assert_eq!(board, leaderboard(&sales));
    }

    #[test]
    fn calendar_buckets() {
        let today = date(2024, 6, 15);
        let sales = vec![
            sale("Ana", 100.0, today),
            sale("Ana", 50.0, date(2024, 6, 2)),
            sale("Ana", 25.0, date(2024, 6, 25)),
            sale("Ben", 70.0, date(2024, 3, 1)),
            sale("Ben", 40.0, date(2023, 6, 15)),
            sale("Ben", 10.0, date(2023, 6, 16)),
        ];
        let b = buckets(&sales, today);
        assert_eq!(b.today, Bucket { total: 100.0, count: 1 });
        assert_eq!(b.month_to_date, Bucket { total: 150.0, count: 2 });
        assert_eq!(b.year_to_date, Bucket { total: 220.0, count: 3 });
        assert_eq!(b.prior_year_to_date, Bucket { total: 40.0, count: 1 });
        assert_eq!(b.fast_start.total, 50.0);
        assert_eq!(b.fast_middle.total, 100.0);
        assert_eq!(b.fast_finish.count, 0);
    }

    #[test]
    fn same_day_doc_fee_detection() {
        let d = date(2024, 6, 5);
        let mut same = sale("Ana", 100.0, d);
        same.doc_fee = 99.0;
        same.doc_fee_collected_on = Some(d);
        let mut late = sale("Ben", 100.0, d);
        late.doc_fee = 99.0;
        late.doc_fee_collected_on = Some(d + Duration::days(1));
        let summary = same_day_doc_fees(&[same, late]);
        assert_eq!(summary, DocFeeSummary { count: 1, total: 99.0 });
    }

    #[test]
    fn doo_bonus_is_zero_on_losses() {
        assert_eq!(doo_bonus(12_345.0, 5.0), 617.25);
        assert_eq!(doo_bonus(-500.0, 5.0), 0.0);
    }

    #[test]
    fn snapshot_groups_current_month_into_periods() {
        let today = date(2024, 6, 22);
        let sales = vec![
            sale("Ana", 100.0, date(2024, 6, 1)),
            sale("Ben", 300.0, date(2024, 6, 12)),
            sale("Ana", 80.0, date(2024, 6, 21)),
            sale("Cy", 999.0, date(2024, 5, 30)),
        ];
        let snap = build_snapshot(&sales, today);
        assert_eq!(snap.month_leaderboard[0].consultant_name, "Ben");
        assert_eq!(snap.year_leaderboard[0].consultant_name, "Cy");
        assert_eq!(snap.periods.len(), 3);
        assert_eq!(snap.periods[0].leaders[0].consultant_name, "Ana");
        assert_eq!(snap.periods[2].leaders[0].total, 80.0);
        assert_eq!(snapshot_window_start(today), date(2023, 1, 1));
    }
}
