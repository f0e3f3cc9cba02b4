// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Metric Recalculation

//! Derives the dependent financial fields of a row from its inputs.
//!
//! Two directions exist and are mutually exclusive within one pass:
//!
//! ```text
//! profit-driven:  NetPrice = ListPrice × (1 − Discount)
//!                 Sales    = NetPrice × Quantity
//!                 Profit   = (NetPrice − COGS) × Quantity
//!                 Margin   = Profit / Sales
//!
//! margin-driven:  NetPrice = COGS / (1 − Margin)
//!                 Sales    = NetPrice × Quantity
//!                 ListPrice = NetPrice / (1 − Discount)
//!                 Profit   = (NetPrice − COGS) × Quantity
//!                 Margin   = Profit / Sales
//! ```
//!
//! The margin-driven pass re-derives the margin from profit and sales, so the
//! realized margin may drift from the requested one after rounding.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::rounding::{round2, UNDEFINED};
use crate::types::{Row, RowId, RowSet};

/// Which input the dependent fields are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// List Price, Discount or COGS changed.
    ProfitDriven,
    /// Gross Margin changed.
    MarginDriven,
}

/// Outcome of one or more recompute passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeReport {
    /// Rows visited, summed over passes.
    pub rows: usize,
    /// Rows left with at least one undefined field, first occurrence order.
    pub degenerate: Vec<RowId>,
}

impl RecomputeReport {
    pub fn is_clean(&self) -> bool {
        self.degenerate.is_empty()
    }

    /// Fold another pass into this report.
    pub fn merge(&mut self, other: RecomputeReport) {
        self.rows += other.rows;
        let mut seen: HashSet<RowId> = self.degenerate.iter().cloned().collect();
        for id in other.degenerate {
            if seen.insert(id.clone()) {
                self.degenerate.push(id);
            }
        }
    }
}

/// Recompute every row in place.
///
/// A degenerate row (division by zero) gets the undefined sentinel in the
/// affected fields and is listed in the report; the batch always completes.
pub fn recompute(rows: &mut [Row], direction: Direction) -> RecomputeReport {
    let mut report = RecomputeReport { rows: rows.len(), degenerate: Vec::new() };

    for row in rows.iter_mut() {
        let ok = match direction {
            Direction::ProfitDriven => profit_driven(row),
            Direction::MarginDriven => margin_driven(row),
        };
        round_row(row);
        if !ok {
            warn!(
                row_id = %row.row_id,
                ?direction,
                gross_margin = row.gross_margin,
                discount = row.discount,
                "degenerate row: dependent fields undefined"
            );
            report.degenerate.push(row.row_id.clone());
        }
    }

    debug!(rows = report.rows, degenerate = report.degenerate.len(), ?direction, "recompute pass");
    report
}

/// Copy-on-write variant: the input set is left untouched.
pub fn recompute_set(rows: &RowSet, direction: Direction) -> (RowSet, RecomputeReport) {
    let mut out = rows.clone();
    let report = recompute(out.rows_mut(), direction);
    (out, report)
}

fn profit_driven(row: &mut Row) -> bool {
    let quantity = row.quantity as f64;
    row.net_price = row.list_price * (1.0 - row.discount);
    row.sales = row.net_price * quantity;
    row.profit = (row.net_price - row.cogs) * quantity;

    if row.sales == 0.0 || !row.sales.is_finite() {
        row.gross_margin = UNDEFINED;
        return false;
    }
    row.gross_margin = row.profit / row.sales;
    row.gross_margin.is_finite()
}

fn margin_driven(row: &mut Row) -> bool {
    // (1 − margin) and (1 − discount) are divisors; both must stay positive
    if row.gross_margin.is_nan() || row.gross_margin >= 1.0 || row.discount >= 1.0 {
        row.net_price = UNDEFINED;
        row.sales = UNDEFINED;
        row.list_price = UNDEFINED;
        row.profit = UNDEFINED;
        row.gross_margin = UNDEFINED;
        return false;
    }

    let quantity = row.quantity as f64;
    row.net_price = row.cogs / (1.0 - row.gross_margin);
    row.sales = row.net_price * quantity;
    row.list_price = row.net_price / (1.0 - row.discount);
    row.profit = (row.net_price - row.cogs) * quantity;

    if row.sales == 0.0 {
        row.gross_margin = UNDEFINED;
        return false;
    }
    row.gross_margin = row.profit / row.sales;
    row.gross_margin.is_finite()
}

/// Finalize in the fixed column order.
fn round_row(row: &mut Row) {
    row.list_price = round2(row.list_price);
    row.net_price = round2(row.net_price);
    row.sales = round2(row.sales);
    row.cogs = round2(row.cogs);
    row.profit = round2(row.profit);
    row.gross_margin = round2(row.gross_margin);
}
