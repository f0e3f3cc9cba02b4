// Comparison Report Rendering
// Plain-text tables for the terminal, plus a compact JSON shape

use serde::Serialize;
use whatif_engine::{Comparison, RollupSummary, RowId, SimulationOutcome, SimulationRequest};

// ─── JSON Output ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JsonOutcome<'a> {
    pub selection: &'a Comparison,
    pub total: &'a Comparison,
    pub selected_rows: usize,
    pub degenerate_rows: &'a [RowId],
}

impl<'a> From<&'a SimulationOutcome> for JsonOutcome<'a> {
    fn from(o: &'a SimulationOutcome) -> Self {
        Self {
            selection: &o.selection,
            total: &o.total,
            selected_rows: o.simulated_selection.len(),
            degenerate_rows: &o.report.degenerate,
        }
    }
}

// ─── Tables ─────────────────────────────────────────────────────────────────

fn cell(v: f64) -> String {
    if v.is_nan() { "n/a".to_string() } else { format!("{v:.2}") }
}

/// Ratio fields are stored as fractions.
fn pct_cell(v: f64) -> String {
    if v.is_nan() { "n/a".to_string() } else { format!("{:.0}%", v * 100.0) }
}

fn print_summary(s: &RollupSummary) {
    println!("  {:<14} {:>9} {:>10} {:>10} {:>7} {:>9} {:>13} {:>12} {:>13} {:>6}",
        s.version,
        cell(s.cogs),
        cell(s.list_price),
        cell(s.net_price),
        pct_cell(s.discount_pct),
        s.quantity,
        cell(s.sales),
        cell(s.total_cogs),
        cell(s.profit),
        pct_cell(s.gross_margin_pct),
    );
}

fn print_comparison(title: &str, cmp: &Comparison) {
    println!("\n  {title}");
    println!("  {:<14} {:>9} {:>10} {:>10} {:>7} {:>9} {:>13} {:>12} {:>13} {:>6}",
        "Version", "COGS", "List Price", "Net Price", "Disc.%", "Quantity", "Sales", "Total COGS", "Profit", "GM %");
    println!("  {}", "-".repeat(112));
    for s in cmp.rows() {
        print_summary(s);
    }
    println!("  {:<14} Sales {:>+.2} | Total COGS {:>+.2} | Profit {:>+.2}",
        "Delta", cmp.sales_delta(), cmp.total_cogs_delta(), cmp.profit_delta());
}

pub fn print_outcome(request: &SimulationRequest, outcome: &SimulationOutcome) {
    println!("\n  What-If Pricing Simulator");
    println!("  Selected rows: {} | Adjustments: {}",
        outcome.simulated_selection.len(), request.adjustments.len());
    for adj in &request.adjustments {
        println!("    - {}: {:?}", adj.family(), adj);
    }

    print_comparison("Selection", &outcome.selection);
    print_comparison("Total Business", &outcome.total);

    if !outcome.report.is_clean() {
        let ids: Vec<String> = outcome.report.degenerate.iter().take(10).map(|id| id.to_string()).collect();
        println!("\n  Warning: {} row(s) have undefined metrics (e.g. {})",
            outcome.report.degenerate.len(), ids.join(", "));
    }
}
