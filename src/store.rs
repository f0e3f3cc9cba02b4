// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Scenario Store

//! Flat-file persistence for baselines and saved scenarios.
//!
//! Every scenario is one CSV file with the [`COLUMNS`] header. A registry
//! CSV (header `Simulation Name`) lists saved scenarios in save order.

use chrono::{DateTime, Local};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::recalc::{self, Direction};
use crate::types::{Row, RowSet, RowSetError, COLUMNS, DERIVED_COLUMNS};

// ─── Errors ─────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    RowSet(#[from] RowSetError),

    #[error("invalid scenario name {0:?}")]
    InvalidName(String),

    #[error("scenario {0:?} not found")]
    NotFound(String),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

/// Header of the registry file.
pub const REGISTRY_HEADER: &str = "Simulation Name";

/// Timestamp suffix appended to saved scenario names.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

// ─── CSV Codec ──────────────────────────────────────────────────────────────

/// Parse rows from CSV text.
///
/// When the file carries none of the derived columns they are computed with
/// a profit-driven pass. Otherwise stored values are taken verbatim.
pub fn read_rows<R: Read>(reader: R) -> Result<RowSet, StoreError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let has_derived = DERIVED_COLUMNS.iter().any(|c| headers.iter().any(|h| h == *c));

    let rows = rdr.deserialize::<Row>().collect::<Result<Vec<_>, _>>()?;
    let mut set = RowSet::new(rows)?;

    if !has_derived {
        debug!(rows = set.len(), "derived columns absent; deriving profit-driven");
        recalc::recompute(set.rows_mut(), Direction::ProfitDriven);
    }
    Ok(set)
}

/// Write rows as CSV in the stable column order.
pub fn write_rows<W: Write>(rows: &RowSet, writer: W) -> Result<(), StoreError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

// ─── Store ──────────────────────────────────────────────────────────────────

/// Persists named scenario snapshots.
pub trait ScenarioStore {
    /// Saved scenario names in save order.
    fn list(&self) -> Result<Vec<String>, StoreError>;

    fn load(&self, name: &str) -> Result<RowSet, StoreError>;

    /// Save under `name` plus a disambiguating suffix; returns the stored name.
    fn save(&mut self, rows: &RowSet, name: &str) -> Result<String, StoreError>;
}

/// Scenario files in one directory plus a registry CSV.
#[derive(Debug, Clone)]
pub struct CsvScenarioStore {
    dir: PathBuf,
    registry: PathBuf,
}

impl CsvScenarioStore {
    pub fn new(dir: impl Into<PathBuf>, registry_file: &str) -> Self {
        let dir = dir.into();
        let registry = dir.join(registry_file);
        Self { dir, registry }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save with an explicit clock, so the suffix is reproducible.
    pub fn save_at(
        &mut self,
        rows: &RowSet,
        name: &str,
        now: DateTime<Local>,
    ) -> Result<String, StoreError> {
        validate_name(name)?;
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        let stem = format!("{}_{}", name, now.format(TIMESTAMP_FORMAT));
        let mut stored = format!("{stem}.csv");
        let mut n = 2;
        while self.dir.join(&stored).exists() {
            stored = format!("{stem}_{n}.csv");
            n += 1;
        }

        let path = self.dir.join(&stored);
        let file = File::create(&path).map_err(io_err(&path))?;
        write_rows(rows, file)?;
        self.register(&stored)?;

        info!(name = %stored, rows = rows.len(), "scenario saved");
        Ok(stored)
    }

    fn register(&self, stored: &str) -> Result<(), StoreError> {
        let fresh = !self.registry.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.registry)
            .map_err(io_err(&self.registry))?;
        let mut wtr = csv::Writer::from_writer(file);
        if fresh {
            wtr.write_record([REGISTRY_HEADER])?;
        }
        wtr.write_record([stored])?;
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Load any CSV in the store directory, registered or not (e.g. the baseline).
    pub fn load_file(&self, file_name: &str) -> Result<RowSet, StoreError> {
        validate_name(file_name)?;
        let path = self.dir.join(file_name);
        if !path.exists() {
            return Err(StoreError::NotFound(file_name.to_string()));
        }
        let file = File::open(&path).map_err(io_err(&path))?;
        let rows = read_rows(file)?;
        debug!(file = file_name, rows = rows.len(), "loaded row set");
        Ok(rows)
    }
}

impl ScenarioStore for CsvScenarioStore {
    fn list(&self) -> Result<Vec<String>, StoreError> {
        if !self.registry.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&self.registry)?;
        let mut names = Vec::new();
        for record in rdr.records() {
            if let Some(name) = record?.get(0) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn load(&self, name: &str) -> Result<RowSet, StoreError> {
        self.load_file(name)
    }

    fn save(&mut self, rows: &RowSet, name: &str) -> Result<String, StoreError> {
        self.save_at(rows, name, Local::now())
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(&['/', '\\'][..])
        || name.chars().any(char::is_control);
    if bad {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::row;
    use chrono::TimeZone;

    fn derived() -> RowSet {
        let set = RowSet::new(vec![
            row("1", "P1", 100.0, 0.10, 2, 40.0),
            row("2", "P2", 50.0, 0.30, 4, 20.0),
        ])
        .expect("test: set");
        recalc::recompute_set(&set, Direction::ProfitDriven).0
    }

    #[test]
    fn write_then_read_keeps_values_and_header() {
        let rows = derived();
        let mut buf = Vec::new();
        write_rows(&rows, &mut buf).expect("test: write");

        let text = String::from_utf8(buf.clone()).expect("test: utf8");
        let header = text.lines().next().expect("test: header line");
        assert_eq!(header, COLUMNS.join(","));

        let back = read_rows(buf.as_slice()).expect("test: read");
        assert_eq!(back, rows);
    }

    #[test]
    fn undefined_survives_round_trip() {
        let mut rows = derived();
        rows.rows_mut()[0].gross_margin = f64::NAN;
        let mut buf = Vec::new();
        write_rows(&rows, &mut buf).expect("test: write");
        let back = read_rows(buf.as_slice()).expect("test: read");
        assert!(back.rows()[0].gross_margin.is_nan());
        assert_eq!(back.rows()[1], rows.rows()[1]);
    }

    #[test]
    fn missing_derived_columns_are_computed() {
        let csv_text = "\
Row ID,Order Year,Order Month,Category,Sub-Category,Product ID,Region,State,City,Postal Code,List Price,Discount,Quantity,COGS
7,2017,3,Furniture,Chairs,FUR-1,West,California,Los Angeles,90036,100,0.1,2,40
";
        let rows = read_rows(csv_text.as_bytes()).expect("test: read");
        let r = &rows.rows()[0];
        assert_eq!(r.net_price, 90.0);
        assert_eq!(r.sales, 180.0);
        assert_eq!(r.profit, 100.0);
        assert_eq!(r.gross_margin, 0.56);
    }

    #[test]
    fn duplicate_ids_in_file_rejected() {
        let csv_text = "\
Row ID,Order Year,Order Month,Category,Sub-Category,Product ID,Region,State,City,Postal Code,List Price,Discount,Quantity,COGS
1,2017,3,Furniture,Chairs,FUR-1,West,California,Los Angeles,90036,100,0.1,2,40
1,2017,3,Furniture,Chairs,FUR-1,West,California,Los Angeles,90036,100,0.1,2,40
";
        let err = read_rows(csv_text.as_bytes()).expect_err("test: duplicate");
        assert!(matches!(err, StoreError::RowSet(RowSetError::DuplicateRowId(_))));
    }

    #[test]
    fn save_list_load() {
        let dir = tempfile::tempdir().expect("test: tempdir");
        let mut store = CsvScenarioStore::new(dir.path(), "simulations.csv");
        assert!(store.list().expect("test: list").is_empty());

        let now = Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).single().expect("test: time");
        let rows = derived();
        let first = store.save_at(&rows, "price_up", now).expect("test: save");
        let second = store.save_at(&rows, "price_up", now).expect("test: save again");
        assert_eq!(first, "price_up_2026-03-14_09-26-53.csv");
        assert_eq!(second, "price_up_2026-03-14_09-26-53_2.csv");

        assert_eq!(store.list().expect("test: list"), vec![first.clone(), second]);
        assert_eq!(store.load(&first).expect("test: load"), rows);
    }

    #[test]
    fn bad_names_rejected() {
        let dir = tempfile::tempdir().expect("test: tempdir");
        let mut store = CsvScenarioStore::new(dir.path(), "simulations.csv");
        for name in ["", "../escape", "a/b", ".."] {
            assert!(matches!(
                store.save(&RowSet::empty(), name),
                Err(StoreError::InvalidName(_))
            ));
        }
        assert!(matches!(store.load("missing.csv"), Err(StoreError::NotFound(_))));
    }
}
