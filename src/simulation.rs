// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Simulation Core

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adjustment::{Adjustment, AdjustmentError, AdjustmentPlan};
use crate::merge::{self, MergeError};
use crate::recalc::RecomputeReport;
use crate::rollup;
use crate::selection::Selection;
use crate::types::{Comparison, RowSet, RowSetError, VersionLabels};

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Any failure of one simulation run. None are retried; the caller decides
/// whether to surface them and let the user change parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    RowSet(#[from] RowSetError),

    #[error(transparent)]
    Adjustment(#[from] AdjustmentError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

// ─── Request / Outcome ──────────────────────────────────────────────────────

/// Everything the selection cascade hands to the engine for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationRequest {
    pub selection: Selection,
    pub adjustments: Vec<Adjustment>,
}

/// Result of one run: comparisons for the selection and the whole business.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationOutcome {
    pub selection: Comparison,
    pub total: Comparison,
    pub simulated_selection: RowSet,
    pub simulated_total: RowSet,
    pub report: RecomputeReport,
}

// ─── WhatIfSimulation ───────────────────────────────────────────────────────

/// Holds the baseline for a session. Runs never mutate it.
#[derive(Debug, Clone)]
pub struct WhatIfSimulation {
    pub(crate) baseline: RowSet,
    pub(crate) labels: VersionLabels,
}

impl WhatIfSimulation {
    pub fn new(baseline: RowSet) -> Self {
        Self { baseline, labels: VersionLabels::default() }
    }

    pub fn with_labels(mut self, labels: VersionLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn baseline(&self) -> &RowSet {
        &self.baseline
    }

    pub fn labels(&self) -> &VersionLabels {
        &self.labels
    }

    /// One deterministic pass:
    /// selection → adjustments → selection comparison → merge → total comparison.
    pub fn run(&self, request: &SimulationRequest) -> Result<SimulationOutcome, SimulationError> {
        let plan = AdjustmentPlan::new(request.adjustments.clone())?;
        let selected = request.selection.apply(&self.baseline);
        debug!(
            baseline = self.baseline.len(),
            selected = selected.len(),
            whole_business = request.selection.is_all(),
            steps = plan.steps().len(),
            "selection applied"
        );

        let (simulated_selection, report) = if plan.is_empty() {
            (selected.clone(), RecomputeReport::default())
        } else {
            plan.apply(&selected)?
        };

        let selection = self.compare(&selected, &simulated_selection);
        let simulated_total = merge::merge_into(&self.baseline, &simulated_selection)?;
        let total = self.compare(&self.baseline, &simulated_total);

        info!(
            selected = selected.len(),
            degenerate = report.degenerate.len(),
            selection_profit_delta = selection.profit_delta(),
            total_profit_delta = total.profit_delta(),
            "simulation run complete"
        );

        Ok(SimulationOutcome {
            selection,
            total,
            simulated_selection,
            simulated_total,
            report,
        })
    }

    fn compare(&self, baseline: &RowSet, simulation: &RowSet) -> Comparison {
        Comparison {
            baseline: rollup::rollup(baseline, &self.labels.baseline),
            simulation: rollup::rollup(simulation, &self.labels.simulation),
        }
    }
}
