use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Gte,
    Lte,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Gte => "gte",
            Op::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare { column: String, op: Op, value: String },
    In { column: String, values: Vec<String> },
}

/// PostgREST query: `select`, column predicates, `order` and `limit`.
///
/// ```ignore
/// Query::new()
///     .select("*")
///     .eq("user_id", user_id)
///     .order("created_at", Direction::Desc)
///     .limit(100)
/// // select=*&user_id=eq.<id>&order=created_at.desc&limit=100
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    select: Option<String>,
    predicates: Vec<Predicate>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    fn compare(mut self, column: &str, op: Op, value: impl Display) -> Self {
        self.predicates.push(Predicate::Compare {
            column: column.to_string(),
            op,
            value: value.to_string(),
        });
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.compare(column, Op::Eq, value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.compare(column, Op::Gte, value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.compare(column, Op::Lte, value)
    }

    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Display,
    {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Repeated calls add secondary sort keys.
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order.push((column.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[cfg(test)]
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    #[cfg(test)]
    pub fn ordering(&self) -> &[(String, Direction)] {
        &self.order
    }

    #[cfg(test)]
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn has_filters(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs: Vec<String> = Vec::new();

        if let Some(select) = &self.select {
            pairs.push(format!("select={}", urlencoding::encode(select)));
        }

        for predicate in &self.predicates {
            match predicate {
                Predicate::Compare { column, op, value } => {
                    pairs.push(format!(
                        "{}={}.{}",
                        urlencoding::encode(column),
                        op.as_str(),
                        urlencoding::encode(value)
                    ));
                }
                Predicate::In { column, values } => {
                    let list = values
                        .iter()
                        .map(|v| quote_list_value(v))
                        .collect::<Vec<_>>()
                        .join(",");
                    pairs.push(format!(
                        "{}=in.({})",
                        urlencoding::encode(column),
                        urlencoding::encode(&list)
                    ));
                }
            }
        }

        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(|(column, dir)| format!("{}.{}", column, dir.as_str()))
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(format!("order={}", urlencoding::encode(&order)));
        }

        if let Some(limit) = self.limit {
            pairs.push(format!("limit={limit}"));
        }

        pairs.join("&")
    }
}

// Values carrying list delimiters must be double-quoted inside `in.(...)`.
fn quote_list_value(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '(' | ')' | '"')) {
        format!("\"{}\"", value.replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
