// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator ("The Sandbox")

pub mod types;
pub mod rounding;
pub mod recalc;
pub mod adjustment;
pub mod rollup;
pub mod merge;
pub mod selection;
pub mod simulation;
pub mod store;
pub mod config;

pub use types::*;
pub use adjustment::{Adjustment, AdjustmentError, AdjustmentPlan, DiscountChange, Family, MarginChange, ValueChange};
pub use merge::{merge_into, MergeError};
pub use recalc::{recompute, recompute_set, Direction, RecomputeReport};
pub use rollup::{rollup, rollup_versions};
pub use rounding::round2;
pub use selection::{Dimension, GeographyLevel, LevelFilter, ProductLevel, Selection};
pub use simulation::{SimulationError, SimulationOutcome, SimulationRequest, WhatIfSimulation};

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

/// Browser-facing handle around one loaded baseline.
#[wasm_bindgen]
pub struct WhatIfSession {
    simulation: WhatIfSimulation,
}

#[wasm_bindgen]
impl WhatIfSession {
    /// Build a session from baseline CSV text.
    #[wasm_bindgen(constructor)]
    pub fn new(baseline_csv: &str) -> Result<WhatIfSession, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let baseline = store::read_rows(baseline_csv.as_bytes())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { simulation: WhatIfSimulation::new(baseline) })
    }

    /// Rename the two comparison versions. Blank or identical labels are rejected.
    pub fn set_labels(&mut self, baseline: &str, simulation: &str) -> Result<(), JsValue> {
        self.session_set_labels(baseline, simulation)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn row_count(&self) -> usize {
        self.simulation.baseline().len()
    }

    /// Selector values for `dimension` under a partial selection.
    pub fn options(&self, selection: JsValue, dimension: JsValue) -> Result<JsValue, JsValue> {
        let selection: Selection = if selection.is_undefined() || selection.is_null() {
            Selection::all()
        } else {
            serde_wasm_bindgen::from_value(selection)?
        };
        let dimension: Dimension = serde_wasm_bindgen::from_value(dimension)?;
        let rows = selection.apply(self.simulation.baseline());
        Ok(serde_wasm_bindgen::to_value(&selection::options(&rows, dimension))?)
    }

    /// Run one simulation; `request` is a serialized [`SimulationRequest`].
    pub fn run(&self, request: JsValue) -> Result<JsValue, JsValue> {
        let request: SimulationRequest = serde_wasm_bindgen::from_value(request)?;
        let outcome = self.session_run(&request).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(serde_wasm_bindgen::to_value(&outcome)?)
    }

    /// CSV text of the full simulated dataset, ready to be saved as a scenario.
    pub fn export_total(&self, request: JsValue) -> Result<String, JsValue> {
        let request: SimulationRequest = serde_wasm_bindgen::from_value(request)?;
        let outcome = self.session_run(&request).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut buf = Vec::new();
        store::write_rows(&outcome.simulated_total, &mut buf)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        String::from_utf8(buf).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl WhatIfSession {
    pub fn session_run(&self, request: &SimulationRequest) -> Result<SimulationOutcome, SimulationError> {
        self.simulation.run(request)
    }

    pub fn session_set_labels(&mut self, baseline: &str, simulation: &str) -> Result<(), config::ConfigError> {
        let labels = VersionLabels {
            baseline: baseline.to_string(),
            simulation: simulation.to_string(),
        };
        config::validate_labels(&labels)?;
        self.simulation.labels = labels;
        Ok(())
    }

    pub fn simulation(&self) -> &WhatIfSimulation {
        &self.simulation
    }
}
