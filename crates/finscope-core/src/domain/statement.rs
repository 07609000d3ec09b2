use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Granularity, Symbol, ValidationError};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The three statements shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    BalanceSheet,
    IncomeStatement,
    CashFlow,
}

impl StatementKind {
    pub const ALL: [Self; 3] = [Self::BalanceSheet, Self::IncomeStatement, Self::CashFlow];

    pub const fn title(self) -> &'static str {
        match self {
            Self::BalanceSheet => "Balance Sheet",
            Self::IncomeStatement => "Income Statement",
            Self::CashFlow => "Cash Flow",
        }
    }
}

impl Display for StatementKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// One fiscal period of a statement; `values` line up with the table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    #[serde(with = "iso_date")]
    pub period_end: Date,
    pub values: Vec<Option<f64>>,
}

/// A statement laid out with fiscal periods as rows and line items as columns.
///
/// Rows are ordered most recent period first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStatementTable")]
pub struct StatementTable {
    pub kind: StatementKind,
    columns: Vec<String>,
    rows: Vec<StatementRow>,
}

#[derive(Deserialize)]
struct RawStatementTable {
    kind: StatementKind,
    columns: Vec<String>,
    rows: Vec<StatementRow>,
}

impl TryFrom<RawStatementTable> for StatementTable {
    type Error = ValidationError;

    fn try_from(raw: RawStatementTable) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.columns, raw.rows)
    }
}

impl StatementTable {
    pub fn new(
        kind: StatementKind,
        columns: Vec<String>,
        mut rows: Vec<StatementRow>,
    ) -> Result<Self, ValidationError> {
        for row in &rows {
            if row.values.len() != columns.len() {
                return Err(ValidationError::StatementRowWidth {
                    period: row.period_end.to_string(),
                    expected: columns.len(),
                    actual: row.values.len(),
                });
            }
        }
        rows.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        rows.dedup_by_key(|row| row.period_end);

        Ok(Self {
            kind,
            columns,
            rows,
        })
    }

    pub fn empty(kind: StatementKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Pivot per-line-item observations into a period-by-item table.
    ///
    /// Line items keep the order they are given in; items without a single
    /// observation are left out.
    pub fn from_line_items<I>(kind: StatementKind, line_items: I) -> Self
    where
        I: IntoIterator<Item = (String, BTreeMap<Date, f64>)>,
    {
        let line_items = line_items
            .into_iter()
            .filter(|(_, observations)| !observations.is_empty())
            .collect::<Vec<_>>();

        let periods = line_items
            .iter()
            .flat_map(|(_, observations)| observations.keys().copied())
            .collect::<BTreeSet<_>>();

        let rows = periods
            .into_iter()
            .rev()
            .map(|period_end| StatementRow {
                period_end,
                values: line_items
                    .iter()
                    .map(|(_, observations)| observations.get(&period_end).copied())
                    .collect(),
            })
            .collect();

        Self {
            kind,
            columns: line_items.into_iter().map(|(name, _)| name).collect(),
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[StatementRow] {
        &self.rows
    }

    pub fn periods(&self) -> Vec<Date> {
        self.rows.iter().map(|row| row.period_end).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, period_end: Date, line_item: &str) -> Option<f64> {
        let column = self.column_index(line_item)?;
        self.rows
            .iter()
            .find(|row| row.period_end == period_end)
            .and_then(|row| row.values.get(column).copied().flatten())
    }

    /// Time-indexed values of one line item, most recent first.
    pub fn series(&self, line_item: &str) -> Vec<(Date, Option<f64>)> {
        match self.column_index(line_item) {
            Some(column) => self
                .rows
                .iter()
                .map(|row| (row.period_end, row.values.get(column).copied().flatten()))
                .collect(),
            None => Vec::new(),
        }
    }

    fn column_index(&self, line_item: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == line_item)
    }
}

/// Balance sheet, income statement and cash flow at one shared granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    pub symbol: Symbol,
    pub granularity: Granularity,
    pub balance_sheet: StatementTable,
    pub income_statement: StatementTable,
    pub cash_flow: StatementTable,
}

impl StatementSet {
    pub fn empty(symbol: Symbol, granularity: Granularity) -> Self {
        Self {
            symbol,
            granularity,
            balance_sheet: StatementTable::empty(StatementKind::BalanceSheet),
            income_statement: StatementTable::empty(StatementKind::IncomeStatement),
            cash_flow: StatementTable::empty(StatementKind::CashFlow),
        }
    }

    pub fn get(&self, kind: StatementKind) -> &StatementTable {
        match kind {
            StatementKind::BalanceSheet => &self.balance_sheet,
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::CashFlow => &self.cash_flow,
        }
    }

    pub fn tables(&self) -> [&StatementTable; 3] {
        [&self.balance_sheet, &self.income_statement, &self.cash_flow]
    }

    pub fn is_empty(&self) -> bool {
        self.tables().iter().all(|table| table.is_empty())
    }
}
