// Copyright 2026 Hypermesh Foundation. All rights reserved.
// What-If Pricing Simulator - Selection Cascade

//! Year → month → product level → geography level filtering.
//!
//! Each step is optional; `None` stands for "All". Option lists for the next
//! selector are computed from whatever the previous steps left.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::{Row, RowSet};

// ─── Dimensions ─────────────────────────────────────────────────────────────

/// A column a selector can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    OrderYear,
    OrderMonth,
    Category,
    SubCategory,
    ProductId,
    Region,
    State,
    City,
    PostalCode,
}

impl Dimension {
    /// Text value of this dimension on a row.
    pub fn value_of(&self, row: &Row) -> String {
        match self {
            Self::OrderYear => row.order_year.to_string(),
            Self::OrderMonth => row.order_month.to_string(),
            Self::Category => row.category.clone(),
            Self::SubCategory => row.sub_category.clone(),
            Self::ProductId => row.product_id.clone(),
            Self::Region => row.region.clone(),
            Self::State => row.state.clone(),
            Self::City => row.city.clone(),
            Self::PostalCode => row.postal_code.clone(),
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(self, Self::OrderYear | Self::OrderMonth)
    }

    fn matches(&self, row: &Row, value: &str) -> bool {
        match self {
            Self::OrderYear => row.order_year.to_string() == value,
            Self::OrderMonth => row.order_month.to_string() == value,
            Self::Category => row.category == value,
            Self::SubCategory => row.sub_category == value,
            Self::ProductId => row.product_id == value,
            Self::Region => row.region == value,
            Self::State => row.state == value,
            Self::City => row.city == value,
            Self::PostalCode => row.postal_code == value,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OrderYear => "Order Year",
            Self::OrderMonth => "Order Month",
            Self::Category => "Category",
            Self::SubCategory => "Sub-Category",
            Self::ProductId => "Product ID",
            Self::Region => "Region",
            Self::State => "State",
            Self::City => "City",
            Self::PostalCode => "Postal Code",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductLevel {
    Category,
    SubCategory,
    ProductId,
}

impl From<ProductLevel> for Dimension {
    fn from(level: ProductLevel) -> Self {
        match level {
            ProductLevel::Category => Dimension::Category,
            ProductLevel::SubCategory => Dimension::SubCategory,
            ProductLevel::ProductId => Dimension::ProductId,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeographyLevel {
    Region,
    State,
    City,
    PostalCode,
}

impl From<GeographyLevel> for Dimension {
    fn from(level: GeographyLevel) -> Self {
        match level {
            GeographyLevel::Region => Dimension::Region,
            GeographyLevel::State => Dimension::State,
            GeographyLevel::City => Dimension::City,
            GeographyLevel::PostalCode => Dimension::PostalCode,
        }
    }
}

/// A level plus the concrete value chosen at that level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFilter<L> {
    pub level: L,
    pub value: String,
}

impl<L: Copy + Into<Dimension>> LevelFilter<L> {
    pub fn new(level: L, value: impl Into<String>) -> Self {
        Self { level, value: value.into() }
    }

    fn matches(&self, row: &Row) -> bool {
        let dimension: Dimension = self.level.into();
        dimension.matches(row, &self.value)
    }
}

// ─── Selection ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub product: Option<LevelFilter<ProductLevel>>,
    pub geography: Option<LevelFilter<GeographyLevel>>,
}

impl Selection {
    /// No filter at any level.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_all(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.year.map_or(true, |y| row.order_year == y)
            && self.month.map_or(true, |m| row.order_month == m)
            && self.product.as_ref().map_or(true, |f| f.matches(row))
            && self.geography.as_ref().map_or(true, |f| f.matches(row))
    }

    /// Rows passing every step, in baseline order.
    pub fn apply(&self, rows: &RowSet) -> RowSet {
        rows.filter(|r| self.matches(r))
    }
}

/// Distinct values of `dimension` in `rows`, sorted. Year and month sort
/// numerically.
pub fn options(rows: &RowSet, dimension: Dimension) -> Vec<String> {
    if dimension.is_numeric() {
        let values: BTreeSet<i64> = rows
            .iter()
            .map(|r| match dimension {
                Dimension::OrderYear => i64::from(r.order_year),
                _ => i64::from(r.order_month),
            })
            .collect();
        return values.into_iter().map(|v| v.to_string()).collect();
    }
    rows.iter()
        .map(|r| dimension.value_of(r))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
