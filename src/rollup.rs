// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Rollup Aggregation

//! Collapses rows into one summary per version label.
//!
//! Unit metrics come from summed totals, never from averaging row values,
//! so every unit figure is quantity-weighted:
//!
//! ```text
//! NetPrice  = Sales / Quantity
//! COGS      = (Sales − Profit) / Quantity
//! ListPrice = (Sales + DiscountValue) / Quantity
//! Discount% = 1 − NetPrice / ListPrice        (0 when ListPrice = 0)
//! GM%       = Profit / Sales                  (undefined when Sales = 0)
//! ```

use tracing::debug;

use crate::rounding::{round2, UNDEFINED};
use crate::types::{RollupSummary, Row, RowSet};

/// Running sums for one label.
#[derive(Debug, Default)]
struct Totals {
    rows: usize,
    quantity: u64,
    sales: f64,
    discount_value: f64,
    total_cogs: f64,
    profit: f64,
}

impl Totals {
    fn add(&mut self, row: &Row) {
        self.rows += 1;
        // zero-quantity lines have no unit economics to contribute
        if row.quantity == 0 {
            return;
        }
        self.quantity += u64::from(row.quantity);
        self.sales += row.sales;
        self.discount_value += row.discount_value();
        self.total_cogs += row.total_cogs();
        self.profit += row.profit;
    }

    fn summarize(&self, version: &str) -> RollupSummary {
        if self.rows == 0 {
            return RollupSummary::zero(version);
        }

        let (net_price, cogs, list_price) = if self.quantity == 0 {
            (UNDEFINED, UNDEFINED, UNDEFINED)
        } else {
            let q = self.quantity as f64;
            (
                self.sales / q,
                (self.sales - self.profit) / q,
                (self.sales + self.discount_value) / q,
            )
        };
        let discount_pct = if list_price == 0.0 { 0.0 } else { 1.0 - net_price / list_price };
        let gross_margin_pct = if self.sales == 0.0 { UNDEFINED } else { self.profit / self.sales };

        RollupSummary {
            version: version.to_string(),
            cogs: round2(cogs),
            list_price: round2(list_price),
            net_price: round2(net_price),
            discount_pct: round2(discount_pct),
            quantity: self.quantity,
            sales: round2(self.sales),
            total_cogs: round2(self.total_cogs),
            profit: round2(self.profit),
            gross_margin_pct: round2(gross_margin_pct),
        }
    }
}

/// Summarize one row set under a single label.
///
/// An empty set yields a zero-valued record so callers always have a row to
/// show.
pub fn rollup(rows: &RowSet, version: &str) -> RollupSummary {
    let mut totals = Totals::default();
    for row in rows {
        totals.add(row);
    }
    debug!(version, rows = totals.rows, quantity = totals.quantity, "rollup");
    totals.summarize(version)
}

/// Summarize several labelled row sets, one record per distinct label in
/// order of first appearance. Sets sharing a label are pooled.
pub fn rollup_versions(sets: &[(&str, &RowSet)]) -> Vec<RollupSummary> {
    let mut groups: Vec<(&str, Totals)> = Vec::new();
    for (label, rows) in sets {
        let idx = match groups.iter().position(|(l, _)| l == label) {
            Some(idx) => idx,
            None => {
                groups.push((*label, Totals::default()));
                groups.len() - 1
            }
        };
        for row in *rows {
            groups[idx].1.add(row);
        }
    }
    groups
        .iter()
        .map(|(label, totals)| totals.summarize(label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recalc::{recompute_set, Direction};
    use crate::types::fixtures::row;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn derived(rows: Vec<Row>) -> RowSet {
        let set = RowSet::new(rows).expect("test: unique ids");
        recompute_set(&set, Direction::ProfitDriven).0
    }

    #[test]
    fn single_row_example() {
        let set = derived(vec![row("1", "P1", 100.0, 0.10, 2, 40.0)]);
        let s = rollup(&set, "Baseline");
        assert_eq!(s.version, "Baseline");
        assert_eq!(s.quantity, 2);
        assert_eq!(s.sales, 180.0);
        assert_eq!(s.profit, 100.0);
        assert_eq!(s.total_cogs, 80.0);
        assert_eq!(s.net_price, 90.0);
        assert_eq!(s.cogs, 40.0);
        assert_eq!(s.list_price, 100.0);
        assert_eq!(s.discount_pct, 0.1);
        assert_eq!(s.gross_margin_pct, 0.56);
    }

    #[test]
    fn unit_metrics_are_quantity_weighted() {
        let set = derived(vec![
            row("1", "P1", 10.0, 0.0, 1, 5.0),
            row("2", "P2", 20.0, 0.0, 3, 5.0),
        ]);
        let s = rollup(&set, "Baseline");
        // (10 + 60) / 4, not (10 + 20) / 2
        assert_eq!(s.net_price, 17.5);
        assert_eq!(s.cogs, 5.0);
        assert_eq!(s.quantity, 4);
    }

    #[test]
    fn empty_set_yields_zero_record() {
        let s = rollup(&RowSet::empty(), "Simulation");
        assert_eq!(s, RollupSummary::zero("Simulation"));
    }

    #[test]
    fn zero_sales_margin_is_undefined() {
        let set = derived(vec![
            row("1", "P1", 0.0, 0.0, 2, 5.0),
            row("2", "P2", 0.0, 0.0, 1, 5.0),
        ]);
        let s = rollup(&set, "Baseline");
        assert_eq!(s.sales, 0.0);
        assert!(s.gross_margin_pct.is_nan());
        assert_eq!(s.discount_pct, 0.0);
        assert_eq!(s.profit, -15.0);
    }

    #[test]
    fn zero_quantity_rows_are_excluded() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.10, 2, 40.0),
            row("2", "P2", 999.0, 0.50, 0, 1.0),
        ]);
        let s = rollup(&set, "Baseline");
        assert_eq!(s.quantity, 2);
        assert_eq!(s.list_price, 100.0);
        assert!(s.is_defined());
    }

    #[test]
    fn only_zero_quantity_rows_leave_units_undefined() {
        let set = derived(vec![row("1", "P1", 100.0, 0.10, 0, 40.0)]);
        let s = rollup(&set, "Baseline");
        assert_eq!(s.quantity, 0);
        assert_eq!(s.sales, 0.0);
        assert!(s.net_price.is_nan());
        assert!(s.gross_margin_pct.is_nan());
    }

    #[test]
    fn undefined_rows_propagate() {
        let mut set = derived(vec![row("1", "P1", 100.0, 0.10, 2, 40.0)]);
        set.rows_mut()[0].gross_margin = 1.0;
        let (set, _) = recompute_set(&set, Direction::MarginDriven);
        let s = rollup(&set, "Simulation");
        assert!(s.sales.is_nan());
        assert!(!s.is_defined());
    }

    #[test]
    fn one_record_per_label() {
        let a = derived(vec![row("1", "P1", 100.0, 0.0, 1, 40.0)]);
        let b = derived(vec![row("2", "P1", 50.0, 0.0, 2, 20.0)]);
        let out = rollup_versions(&[("Baseline", &a), ("Simulation", &b), ("Baseline", &b)]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].version, "Baseline");
        assert_eq!(out[0].sales, 200.0);
        assert_eq!(out[0].quantity, 3);
        assert_eq!(out[1].version, "Simulation");
        assert_eq!(out[1].sales, 100.0);
    }

    proptest! {
        #[test]
        fn sums_match_rows(
            lines in prop::collection::vec(
                (1u32..5_000, 0u32..=60, 1u32..50, 1u32..5_000),
                1..40,
            )
        ) {
            let rows: Vec<Row> = lines
                .iter()
                .enumerate()
                .map(|(i, (lp, disc, qty, cogs))| {
                    row(&i.to_string(), "P", *lp as f64 / 10.0, *disc as f64 / 100.0, *qty, *cogs as f64 / 10.0)
                })
                .collect();
            let set = derived(rows);
            let s = rollup(&set, "Baseline");

            let sales: f64 = set.iter().map(|r| r.sales).sum();
            let quantity: u64 = set.iter().map(|r| u64::from(r.quantity)).sum();
            prop_assert_eq!(s.quantity, quantity);
            assert_relative_eq!(s.sales, round2(sales), epsilon = 1e-6);
            assert_relative_eq!(s.sales, sales, epsilon = 0.005 + 1e-6);
        }
    }
}
