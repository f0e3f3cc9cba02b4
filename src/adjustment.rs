// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Adjustments

//! Hypothetical changes to one financial field family.
//!
//! Percent parameters are given in percent points (`20.0` = 20%). Absolute
//! targets are unit amounts and are only accepted for a row set that covers
//! a single product.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::recalc::{self, Direction, RecomputeReport};
use crate::types::{Row, RowSet};

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdjustmentError {
    #[error("{field} parameter {value} is out of range ({expected})")]
    OutOfRange {
        field: Family,
        value: f64,
        expected: &'static str,
    },

    #[error("more than one {0} adjustment in the same run")]
    DuplicateFamily(Family),

    #[error("absolute {field} target needs a single product, selection spans {products} products")]
    MultipleEntities { field: Family, products: usize },
}

// ─── Families & Methods ─────────────────────────────────────────────────────

/// Field family an adjustment targets. Declaration order is application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Family {
    ListPrice,
    Discount,
    Cogs,
    GrossMargin,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListPrice => "List Price",
            Self::Discount => "Discount",
            Self::Cogs => "COGS",
            Self::GrossMargin => "Gross Margin",
        };
        f.write_str(name)
    }
}

/// Change to a unit amount (List Price, COGS).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValueChange {
    /// Multiply by `1 + p/100`, `p` in [-100, 100].
    IncreasePct(f64),
    /// Set every row to this amount. Single-product scope only.
    Target(f64),
}

/// Change to the discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DiscountChange {
    /// Set every row's discount to `p` percent.
    Target(f64),
    /// Lower any discount above `p` percent down to it.
    Cap(f64),
}

/// Change to the gross margin rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MarginChange {
    /// Set every row's margin to `p` percent.
    Target(f64),
    /// Raise any margin below `p` percent up to it.
    Floor(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Adjustment {
    ListPrice(ValueChange),
    Discount(DiscountChange),
    Cogs(ValueChange),
    GrossMargin(MarginChange),
}

impl Adjustment {
    pub fn family(&self) -> Family {
        match self {
            Self::ListPrice(_) => Family::ListPrice,
            Self::Discount(_) => Family::Discount,
            Self::Cogs(_) => Family::Cogs,
            Self::GrossMargin(_) => Family::GrossMargin,
        }
    }

    /// Formula direction of the recompute pass that follows this adjustment.
    pub fn direction(&self) -> Direction {
        match self {
            Self::GrossMargin(_) => Direction::MarginDriven,
            _ => Direction::ProfitDriven,
        }
    }

    /// Whether this adjustment broadcasts one absolute amount.
    pub fn is_absolute(&self) -> bool {
        matches!(
            self,
            Self::ListPrice(ValueChange::Target(_)) | Self::Cogs(ValueChange::Target(_))
        )
    }

    /// Check the parameter against its domain.
    pub fn validate(&self) -> Result<(), AdjustmentError> {
        let field = self.family();
        let out_of_range = |value: f64, expected: &'static str| AdjustmentError::OutOfRange {
            field,
            value,
            expected,
        };
        match *self {
            Self::ListPrice(ValueChange::IncreasePct(p)) | Self::Cogs(ValueChange::IncreasePct(p)) => {
                if !(-100.0..=100.0).contains(&p) {
                    return Err(out_of_range(p, "-100 to 100 percent"));
                }
            }
            Self::ListPrice(ValueChange::Target(v)) | Self::Cogs(ValueChange::Target(v)) => {
                if !v.is_finite() || v < 0.0 {
                    return Err(out_of_range(v, "a non-negative amount"));
                }
            }
            Self::Discount(DiscountChange::Target(p) | DiscountChange::Cap(p))
            | Self::GrossMargin(MarginChange::Target(p) | MarginChange::Floor(p)) => {
                if !(0.0..100.0).contains(&p) {
                    return Err(out_of_range(p, "0 to below 100 percent"));
                }
            }
        }
        Ok(())
    }

    /// Reject an absolute target over a multi-product row set.
    pub fn check_scope(&self, rows: &RowSet) -> Result<(), AdjustmentError> {
        if !self.is_absolute() {
            return Ok(());
        }
        let products = rows.product_ids().len();
        if products > 1 {
            return Err(AdjustmentError::MultipleEntities { field: self.family(), products });
        }
        Ok(())
    }

    /// Apply this one adjustment to a copy of `rows` and recompute. Same
    /// checks as a single-step [`AdjustmentPlan`].
    pub fn apply(&self, rows: &RowSet) -> Result<(RowSet, RecomputeReport), AdjustmentError> {
        AdjustmentPlan::new(vec![*self])?.apply(rows)
    }

    /// Write the new input value into every row. Dependent fields are not
    /// touched and scope is not checked.
    pub(crate) fn write_inputs(&self, rows: &mut [Row]) {
        for row in rows.iter_mut() {
            match *self {
                Self::ListPrice(change) => row.list_price = change.apply(row.list_price),
                Self::Cogs(change) => row.cogs = change.apply(row.cogs),
                Self::Discount(DiscountChange::Target(p)) => row.discount = p / 100.0,
                Self::Discount(DiscountChange::Cap(p)) => row.discount = row.discount.min(p / 100.0),
                Self::GrossMargin(MarginChange::Target(p)) => row.gross_margin = p / 100.0,
                Self::GrossMargin(MarginChange::Floor(p)) => {
                    // NaN compares false, so an undefined margin stays undefined
                    let floor = p / 100.0;
                    if row.gross_margin < floor {
                        row.gross_margin = floor;
                    }
                }
            }
        }
    }
}

impl ValueChange {
    fn apply(self, current: f64) -> f64 {
        match self {
            Self::IncreasePct(p) => current * (1.0 + p / 100.0),
            Self::Target(v) => v,
        }
    }
}

// ─── Plan ───────────────────────────────────────────────────────────────────

/// Validated set of adjustments for one run, in application order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdjustmentPlan {
    steps: Vec<Adjustment>,
}

impl AdjustmentPlan {
    /// Validate parameters, reject repeated families, order by family.
    pub fn new(mut adjustments: Vec<Adjustment>) -> Result<Self, AdjustmentError> {
        for adj in &adjustments {
            adj.validate()?;
        }
        adjustments.sort_by_key(Adjustment::family);
        for pair in adjustments.windows(2) {
            if pair[0].family() == pair[1].family() {
                return Err(AdjustmentError::DuplicateFamily(pair[0].family()));
            }
        }
        Ok(Self { steps: adjustments })
    }

    pub fn steps(&self) -> &[Adjustment] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Apply every step to a copy of `rows`, each followed by a full
    /// recompute in its own direction. Scope is checked up front so a
    /// rejected plan never yields a partial result.
    pub fn apply(&self, rows: &RowSet) -> Result<(RowSet, RecomputeReport), AdjustmentError> {
        for step in &self.steps {
            step.check_scope(rows)?;
        }

        let mut out = rows.clone();
        let mut report = RecomputeReport::default();
        for step in &self.steps {
            debug!(family = %step.family(), adjustment = ?step, "applying adjustment");
            step.write_inputs(out.rows_mut());
            report.merge(recalc::recompute(out.rows_mut(), step.direction()));
        }

        info!(
            steps = self.steps.len(),
            rows = out.len(),
            degenerate = report.degenerate.len(),
            "adjustment plan applied"
        );
        Ok((out, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::row;
    use proptest::prelude::*;

    fn derived(rows: Vec<Row>) -> RowSet {
        let set = RowSet::new(rows).expect("test: unique ids");
        recalc::recompute_set(&set, Direction::ProfitDriven).0
    }

    #[test]
    fn list_price_increase_recomputes() {
        let set = derived(vec![row("1", "P1", 100.0, 0.10, 2, 40.0)]);
        let plan = AdjustmentPlan::new(vec![Adjustment::ListPrice(ValueChange::IncreasePct(10.0))])
            .expect("test: valid plan");
        let (out, report) = plan.apply(&set).expect("test: apply");
        let r = &out.rows()[0];
        assert_eq!(r.list_price, 110.0);
        assert_eq!(r.net_price, 99.0);
        assert_eq!(r.sales, 198.0);
        assert_eq!(r.profit, 118.0);
        assert_eq!(r.gross_margin, 0.6);
        assert!(report.is_clean());
        // baseline untouched
        assert_eq!(set.rows()[0].list_price, 100.0);
    }

    #[test]
    fn discount_cap_only_lowers() {
        let set = derived(vec![
            row("hi", "P1", 100.0, 0.35, 1, 40.0),
            row("lo", "P1", 100.0, 0.10, 1, 40.0),
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::Discount(DiscountChange::Cap(20.0))])
            .expect("test: valid plan");
        let (out, _) = plan.apply(&set).expect("test: apply");
        assert_eq!(out.rows()[0].discount, 0.20);
        assert_eq!(out.rows()[0].net_price, 80.0);
        assert_eq!(out.rows()[1].discount, 0.10);
        assert_eq!(out.rows()[1], set.rows()[1]);
    }

    #[test]
    fn margin_floor_only_raises() {
        let set = derived(vec![
            row("thin", "P1", 100.0, 0.0, 1, 90.0), // margin 0.10
            row("fat", "P1", 100.0, 0.0, 1, 40.0),  // margin 0.60
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::GrossMargin(MarginChange::Floor(30.0))])
            .expect("test: valid plan");
        let (out, _) = plan.apply(&set).expect("test: apply");
        let thin = &out.rows()[0];
        assert_eq!(thin.gross_margin, 0.3);
        // 90 / 0.7
        assert_eq!(thin.net_price, 128.57);
        assert_eq!(thin.list_price, 128.57);
        assert_eq!(out.rows()[1].gross_margin, 0.6);
        assert_eq!(out.rows()[1].net_price, 100.0);
    }

    #[test]
    fn plan_orders_by_family() {
        let plan = AdjustmentPlan::new(vec![
            Adjustment::GrossMargin(MarginChange::Floor(10.0)),
            Adjustment::Cogs(ValueChange::IncreasePct(5.0)),
            Adjustment::ListPrice(ValueChange::IncreasePct(1.0)),
        ])
        .expect("test: valid plan");
        let families: Vec<_> = plan.steps().iter().map(Adjustment::family).collect();
        assert_eq!(families, vec![Family::ListPrice, Family::Cogs, Family::GrossMargin]);
    }

    #[test]
    fn duplicate_family_rejected() {
        let err = AdjustmentPlan::new(vec![
            Adjustment::Discount(DiscountChange::Cap(20.0)),
            Adjustment::Discount(DiscountChange::Target(5.0)),
        ])
        .expect_err("test: duplicate");
        assert_eq!(err, AdjustmentError::DuplicateFamily(Family::Discount));
    }

    #[test]
    fn out_of_range_parameters_rejected() {
        let cases = [
            Adjustment::ListPrice(ValueChange::IncreasePct(150.0)),
            Adjustment::Cogs(ValueChange::Target(-1.0)),
            Adjustment::Discount(DiscountChange::Target(100.0)),
            Adjustment::GrossMargin(MarginChange::Floor(-5.0)),
            Adjustment::ListPrice(ValueChange::Target(f64::NAN)),
        ];
        for adj in cases {
            assert!(
                matches!(adj.validate(), Err(AdjustmentError::OutOfRange { .. })),
                "expected OutOfRange for {adj:?}"
            );
        }
    }

    #[test]
    fn absolute_target_rejected_across_products() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.0, 1, 40.0),
            row("2", "P2", 50.0, 0.0, 1, 20.0),
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::ListPrice(ValueChange::Target(120.0))])
            .expect("test: valid plan");
        let err = plan.apply(&set).expect_err("test: multi-product");
        assert_eq!(
            err,
            AdjustmentError::MultipleEntities { field: Family::ListPrice, products: 2 }
        );
    }

    #[test]
    fn absolute_target_on_single_product() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.0, 1, 40.0),
            row("2", "P1", 100.0, 0.5, 3, 40.0),
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::Cogs(ValueChange::Target(30.0))])
            .expect("test: valid plan");
        let (out, _) = plan.apply(&set).expect("test: single product");
        assert!(out.iter().all(|r| r.cogs == 30.0));
        assert_eq!(out.rows()[1].profit, 60.0);
    }

    #[test]
    fn rate_targets_may_broadcast() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.0, 1, 40.0),
            row("2", "P2", 50.0, 0.3, 1, 20.0),
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::Discount(DiscountChange::Target(5.0))])
            .expect("test: valid plan");
        let (out, _) = plan.apply(&set).expect("test: broadcast rate");
        assert!(out.iter().all(|r| r.discount == 0.05));
    }

    #[test]
    fn direct_absolute_target_checks_scope() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.0, 1, 40.0),
            row("2", "P2", 50.0, 0.0, 1, 20.0),
        ]);
        let err = Adjustment::Cogs(ValueChange::Target(10.0))
            .apply(&set)
            .expect_err("test: multi-product");
        assert_eq!(err, AdjustmentError::MultipleEntities { field: Family::Cogs, products: 2 });

        let err = Adjustment::ListPrice(ValueChange::IncreasePct(500.0))
            .apply(&set)
            .expect_err("test: out of range");
        assert!(matches!(err, AdjustmentError::OutOfRange { .. }));

        let (out, report) = Adjustment::ListPrice(ValueChange::IncreasePct(10.0))
            .apply(&set)
            .expect("test: percent change broadcasts");
        assert!(report.is_clean());
        assert_eq!(out.rows()[1].list_price, 55.0);
        assert_eq!(out.rows()[1].sales, 55.0);
    }

    #[test]
    fn margin_target_reprices_every_row() {
        let set = derived(vec![
            row("1", "P1", 100.0, 0.10, 2, 40.0),
            row("2", "P2", 50.0, 0.0, 1, 45.0),
        ]);
        let plan = AdjustmentPlan::new(vec![Adjustment::GrossMargin(MarginChange::Target(25.0))])
            .expect("test: valid plan");
        let (out, report) = plan.apply(&set).expect("test: apply");
        assert!(report.is_clean());

        // 40 / 0.75, then / 0.9 for the discount
        let a = &out.rows()[0];
        assert_eq!(a.list_price, 59.26);
        assert_eq!(a.net_price, 53.33);
        assert_eq!(a.sales, 106.67);
        assert_eq!(a.profit, 26.67);
        assert_eq!(a.gross_margin, 0.25);
        assert_eq!(a.cogs, 40.0);

        let b = &out.rows()[1];
        assert_eq!(b.list_price, 60.0);
        assert_eq!(b.net_price, 60.0);
        assert_eq!(b.sales, 60.0);
        assert_eq!(b.profit, 15.0);
        assert_eq!(b.gross_margin, 0.25);
    }

    #[test]
    fn margin_floor_also_reprices_unclamped_rows() {
        // margin 0.56 is above the floor, but the margin-driven pass rebuilds
        // net price from the rounded margin: 40 / 0.44
        let set = derived(vec![row("1", "P1", 100.0, 0.10, 2, 40.0)]);
        assert_eq!(set.rows()[0].gross_margin, 0.56);
        let plan = AdjustmentPlan::new(vec![Adjustment::GrossMargin(MarginChange::Floor(30.0))])
            .expect("test: valid plan");
        let (out, _) = plan.apply(&set).expect("test: apply");
        let r = &out.rows()[0];
        assert_eq!(r.gross_margin, 0.56);
        assert_eq!(r.net_price, 90.91);
        assert_eq!(r.list_price, 101.01);
        assert_eq!(r.sales, 181.82);
    }

    proptest! {
        #[test]
        fn cap_never_leaves_a_discount_above_it(d in 0.0f64..0.99, cap in 0.0f64..100.0) {
            let mut rows = vec![row("1", "P1", 100.0, d, 1, 40.0)];
            Adjustment::Discount(DiscountChange::Cap(cap)).write_inputs(&mut rows);
            prop_assert!(rows[0].discount <= cap / 100.0);
            if d <= cap / 100.0 {
                prop_assert_eq!(rows[0].discount, d);
            }
        }

        #[test]
        fn floor_never_leaves_a_margin_below_it(m in 0.0f64..0.95, floor in 0.0f64..95.0) {
            let mut r = row("1", "P1", 100.0, 0.0, 1, 40.0);
            r.gross_margin = m;
            let mut rows = vec![r];
            Adjustment::GrossMargin(MarginChange::Floor(floor)).write_inputs(&mut rows);
            prop_assert!(rows[0].gross_margin >= floor / 100.0);
            prop_assert!(rows[0].gross_margin >= m);
        }

        #[test]
        fn whole_percent_floor_holds_after_recompute(
            floor in 1u32..90,
            list_price in 1u32..1000,
            discount in 0u32..60,
            cogs_share in 10u32..100,
            quantity in 1u32..10,
        ) {
            let lp = f64::from(list_price);
            let set = derived(vec![row(
                "1",
                "P1",
                lp,
                f64::from(discount) / 100.0,
                quantity,
                crate::rounding::round2(lp * f64::from(cogs_share) / 100.0),
            )]);
            let plan = AdjustmentPlan::new(vec![Adjustment::GrossMargin(MarginChange::Floor(f64::from(floor)))])
                .expect("test: valid plan");
            let (out, report) = plan.apply(&set).expect("test: apply");
            let r = &out.rows()[0];
            if report.is_clean() {
                prop_assert!(
                    r.gross_margin >= f64::from(floor) / 100.0,
                    "margin {} below floor {}", r.gross_margin, floor
                );
            }
        }
    }
}
