// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Type Definitions

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::rounding::{self, UNDEFINED};

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Errors raised when assembling a row set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowSetError {
    #[error("duplicate row identifier: {0}")]
    DuplicateRowId(RowId),
}

// ─── RowId ──────────────────────────────────────────────────────────────────

/// Stable key of one transaction line. Opaque; never parsed.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub String);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self { RowId(s) }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self { RowId(s.to_string()) }
}

// ─── Row ────────────────────────────────────────────────────────────────────

fn undefined() -> f64 {
    UNDEFINED
}

/// One transaction line.
///
/// Field order is the persisted column order. Net Price, Sales, Profit and
/// Gross Margin are derived; they default to the undefined sentinel when a
/// file does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "Row ID")]
    pub row_id: RowId,
    #[serde(rename = "Order Year")]
    pub order_year: i32,
    #[serde(rename = "Order Month")]
    pub order_month: u32,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Sub-Category")]
    pub sub_category: String,
    #[serde(rename = "Product ID")]
    pub product_id: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "Postal Code")]
    pub postal_code: String,
    #[serde(rename = "List Price")]
    pub list_price: f64,
    /// Fraction in [0, 1).
    #[serde(rename = "Discount")]
    pub discount: f64,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    /// Unit cost of goods sold.
    #[serde(rename = "COGS")]
    pub cogs: f64,
    #[serde(rename = "Net Price", default = "undefined")]
    pub net_price: f64,
    #[serde(rename = "Sales", default = "undefined")]
    pub sales: f64,
    #[serde(rename = "Profit", default = "undefined")]
    pub profit: f64,
    /// Fraction; below 1 for any row with a positive net price.
    #[serde(rename = "Gross Margin", default = "undefined")]
    pub gross_margin: f64,
}

/// Persisted column order, matching the field order of [`Row`].
pub const COLUMNS: [&str; 18] = [
    "Row ID", "Order Year", "Order Month", "Category", "Sub-Category", "Product ID",
    "Region", "State", "City", "Postal Code", "List Price", "Discount", "Quantity",
    "COGS", "Net Price", "Sales", "Profit", "Gross Margin",
];

/// Columns that are recomputed rather than authored.
pub const DERIVED_COLUMNS: [&str; 4] = ["Net Price", "Sales", "Profit", "Gross Margin"];

impl Row {
    /// Whether every derived field holds a number.
    pub fn is_defined(&self) -> bool {
        [self.list_price, self.net_price, self.sales, self.profit, self.gross_margin]
            .iter()
            .all(|v| !rounding::is_undefined(*v))
    }

    /// Discount given away on this line: `Discount × ListPrice × Quantity`.
    pub fn discount_value(&self) -> f64 {
        self.discount * self.list_price * self.quantity as f64
    }

    /// Cost of the whole line: `COGS × Quantity`.
    pub fn total_cogs(&self) -> f64 {
        self.cogs * self.quantity as f64
    }
}

// ─── RowSet ─────────────────────────────────────────────────────────────────

/// Ordered collection of rows with unique identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Result<Self, RowSetError> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(&row.row_id) {
                return Err(RowSetError::DuplicateRowId(row.row_id.clone()));
            }
        }
        Ok(Self { rows })
    }

    /// For rows whose ids are already known to be unique (same ids as an
    /// existing set).
    pub(crate) fn from_unique(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access for in-place passes. Identifiers must not be touched.
    pub(crate) fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn get(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.row_id == id)
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.get(id).is_some()
    }

    /// Subset in original order. Uniqueness carries over.
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Distinct product identifiers, sorted.
    pub fn product_ids(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.product_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl TryFrom<Vec<Row>> for RowSet {
    type Error = RowSetError;

    fn try_from(rows: Vec<Row>) -> Result<Self, Self::Error> {
        RowSet::new(rows)
    }
}

// ─── Version Labels ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionLabels {
    pub baseline: String,
    pub simulation: String,
}

impl Default for VersionLabels {
    fn default() -> Self {
        Self {
            baseline: "Baseline".to_string(),
            simulation: "Simulation".to_string(),
        }
    }
}

// ─── Rollup Summary ─────────────────────────────────────────────────────────

/// Aggregated financial record for one version label.
///
/// Unit fields are quantity-weighted (derived from totals). NaN marks a
/// metric that is undefined for the underlying rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupSummary {
    pub version: String,
    pub cogs: f64,
    pub list_price: f64,
    pub net_price: f64,
    pub discount_pct: f64,
    pub quantity: u64,
    pub sales: f64,
    pub total_cogs: f64,
    pub profit: f64,
    pub gross_margin_pct: f64,
}

impl RollupSummary {
    /// All-zero record, used for an empty row set.
    pub fn zero(version: &str) -> Self {
        Self {
            version: version.to_string(),
            cogs: 0.0,
            list_price: 0.0,
            net_price: 0.0,
            discount_pct: 0.0,
            quantity: 0,
            sales: 0.0,
            total_cogs: 0.0,
            profit: 0.0,
            gross_margin_pct: 0.0,
        }
    }

    pub fn is_defined(&self) -> bool {
        [
            self.cogs, self.list_price, self.net_price, self.discount_pct,
            self.sales, self.total_cogs, self.profit, self.gross_margin_pct,
        ]
        .iter()
        .all(|v| !rounding::is_undefined(*v))
    }
}

// ─── Comparison ─────────────────────────────────────────────────────────────

/// Baseline vs. simulation summaries for one scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: RollupSummary,
    pub simulation: RollupSummary,
}

impl Comparison {
    pub fn sales_delta(&self) -> f64 {
        rounding::round2(self.simulation.sales - self.baseline.sales)
    }

    pub fn total_cogs_delta(&self) -> f64 {
        rounding::round2(self.simulation.total_cogs - self.baseline.total_cogs)
    }

    pub fn profit_delta(&self) -> f64 {
        rounding::round2(self.simulation.profit - self.baseline.profit)
    }

    /// Both records in display order.
    pub fn rows(&self) -> [&RollupSummary; 2] {
        [&self.baseline, &self.simulation]
    }
}
