//! In-process table store used by tests in place of the hosted data API.

use super::query::{Direction, Op, Predicate};
use super::{PostgrestError, Query, RestStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    fail_writes_to: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, table: &str, rows: Vec<Value>) {
        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();
        for row in rows {
            entry.push(with_id(row));
        }
    }

    pub async fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .await
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Makes every subsequent write to `table` fail with HTTP 500.
    pub async fn fail_writes_to(&self, table: &str) {
        *self.fail_writes_to.write().await = Some(table.to_string());
    }

    async fn check_write(&self, table: &str) -> Result<(), PostgrestError> {
        if self.fail_writes_to.read().await.as_deref() == Some(table) {
            return Err(PostgrestError::Status {
                status: 500,
                body: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

fn with_id(row: Value) -> Value {
    match row {
        Value::Object(mut map) => {
            if !map.contains_key("id") {
                map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn as_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn compare(row: &Value, column: &str, op: Op, value: &str) -> bool {
    let Some(field) = as_text(row.get(column)) else {
        return false;
    };
    let ord = compare_text(&field, value);
    match op {
        Op::Eq => field == value || (ord == Ordering::Equal && field.parse::<f64>().is_ok()),
        Op::Gte => ord != Ordering::Less,
        Op::Lte => ord != Ordering::Greater,
    }
}

fn matches(row: &Value, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| match predicate {
        Predicate::Compare { column, op, value } => compare(row, column, *op, value),
        Predicate::In { column, values } => as_text(row.get(column))
            .map(|field| values.contains(&field))
            .unwrap_or(false),
    })
}

fn order_rows(rows: &mut [Value], ordering: &[(String, Direction)]) {
    rows.sort_by(|a, b| {
        for (column, direction) in ordering {
            let ord = match (as_text(a.get(column)), as_text(b.get(column))) {
                (Some(x), Some(y)) => compare_text(&x, &y),
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (None, None) => Ordering::Equal,
            };
            let ord = match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[async_trait]
impl RestStore for MemoryStore {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>, PostgrestError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, query.predicates()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        order_rows(&mut rows, query.ordering());
        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Vec<Value>, PostgrestError> {
        self.check_write(table).await?;
        let new_rows: Vec<Value> = match row {
            Value::Array(rows) => rows.into_iter().map(with_id).collect(),
            other => vec![with_id(other)],
        };
        let mut tables = self.tables.write().await;
        tables
            .entry(table.to_string())
            .or_default()
            .extend(new_rows.iter().cloned());
        Ok(new_rows)
    }

    async fn update(
        &self,
        table: &str,
        filter: &Query,
        patch: Value,
    ) -> Result<Vec<Value>, PostgrestError> {
        self.check_write(table).await?;
        if !filter.has_filters() {
            return Err(PostgrestError::Encode(format!(
                "refusing unfiltered write to {table}"
            )));
        }
        let patch: Map<String, Value> = match patch {
            Value::Object(map) => map,
            _ => return Err(PostgrestError::Encode("patch must be an object".into())),
        };
        let mut tables = self.tables.write().await;
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut() {
                if !matches(row, filter.predicates()) {
                    continue;
                }
                if let Value::Object(map) = row {
                    for (key, value) in &patch {
                        map.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filter: &Query) -> Result<(), PostgrestError> {
        self.check_write(table).await?;
        if !filter.has_filters() {
            return Err(PostgrestError::Encode(format!(
                "refusing unfiltered write to {table}"
            )));
        }
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !matches(row, filter.predicates()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn filters_orders_and_limits() {
        let store = MemoryStore::new();
        store
            .seed(
                "sales",
                vec![
                    json!({ "id": "1", "amount": 100, "day": "2024-03-02" }),
                    json!({ "id": "2", "amount": 900, "day": "2024-03-15" }),
                    json!({ "id": "3", "amount": 50, "day": "2024-04-01" }),
                ],
            )
            .await;

        let rows = store
            .select(
                "sales",
                &Query::new()
                    .gte("day", "2024-03-01")
                    .lte("day", "2024-03-31")
                    .order("amount", Direction::Desc)
                    .limit(1),
            )
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({ "id": "2", "amount": 900, "day": "2024-03-15" })]);
    }

    #[tokio::test]
    async fn update_merges_patch_into_matching_rows() {
        let store = MemoryStore::new();
        store
            .seed("pto_balances", vec![json!({ "id": "b1", "user_id": "u1", "balance": 10.0 })])
            .await;
        let updated = store
            .update(
                "pto_balances",
                &Query::new().eq("user_id", "u1"),
                json!({ "balance": 12.5 }),
            )
            .await
            .unwrap();
        assert_eq!(updated[0]["balance"], json!(12.5));
        assert_eq!(updated[0]["id"], json!("b1"));
    }

    #[tokio::test]
    async fn in_list_matches_any_value() {
        let store = MemoryStore::new();
        store
            .seed(
                "users",
                vec![
                    json!({ "id": "a", "department": "sales", "hire_date": null }),
                    json!({ "id": "b", "department": "ops", "hire_date": "2024-01-01" }),
                    json!({ "id": "c", "department": "it" }),
                ],
            )
            .await;
        let rows = store
            .select("users", &Query::new().in_list("department", ["sales", "ops"]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }
}
