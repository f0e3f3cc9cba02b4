// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Scenario Merge

//! Reinserts a recalculated subset into the full dataset, keyed by row id.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::types::{Row, RowId, RowSet};

/// Errors from merging a subset into a baseline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("updated row {0} does not exist in the baseline")]
    UnknownRowId(RowId),
}

/// Replace every baseline row whose id appears in `updated` with the updated
/// row as a whole. Other rows pass through; baseline order is kept.
pub fn merge_into(baseline: &RowSet, updated: &RowSet) -> Result<RowSet, MergeError> {
    let known: HashSet<&RowId> = baseline.iter().map(|r| &r.row_id).collect();
    let mut replacements: HashMap<&RowId, &Row> = HashMap::with_capacity(updated.len());
    for row in updated {
        if !known.contains(&row.row_id) {
            return Err(MergeError::UnknownRowId(row.row_id.clone()));
        }
        replacements.insert(&row.row_id, row);
    }

    let rows: Vec<Row> = baseline
        .iter()
        .map(|row| match replacements.get(&row.row_id) {
            Some(new) => (*new).clone(),
            None => row.clone(),
        })
        .collect();

    debug!(baseline = baseline.len(), replaced = replacements.len(), "merged subset into baseline");
    Ok(RowSet::from_unique(rows))
}
