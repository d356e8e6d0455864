//! The cleaning transformation.
//!
//! Three steps, in this order:
//!
//! 1. keep rows whose `price` lies in `[min_price, max_price]`
//! 2. parse `last_review` into a datetime, unparseable values become `None`
//! 3. keep rows inside [`NYC_BOUNDS`]
//!
//! Every range is inclusive at both ends. A null price or coordinate never
//! satisfies a range. An inverted price range is not an error, it just keeps
//! nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use basic_cleaning::{clean, read_table_file};
//!
//! let table = read_table_file("sample.csv")?;
//! let cleaned = clean(&table, 10.0, 350.0)?;
//! println!("{} of {} rows kept", cleaned.len(), table.len());
//! ```

pub mod dates;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::models::{ColumnData, Table, LAST_REVIEW, LATITUDE, LONGITUDE, PRICE};

pub use dates::parse_review_date;

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Inclusive longitude/latitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_longitude: f64,
    pub max_longitude: f64,
    pub min_latitude: f64,
    pub max_latitude: f64,
}

impl GeoBounds {
    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        self.min_longitude <= longitude
            && longitude <= self.max_longitude
            && self.min_latitude <= latitude
            && latitude <= self.max_latitude
    }
}

/// New York City, where every listing is expected to be.
pub const NYC_BOUNDS: GeoBounds = GeoBounds {
    min_longitude: -74.25,
    max_longitude: -73.50,
    min_latitude: 40.5,
    max_latitude: 41.2,
};

/// Row counts collected while cleaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanReport {
    pub input_rows: usize,
    pub dropped_by_price: usize,
    /// Present `last_review` values that did not parse.
    pub unparsed_dates: usize,
    pub dropped_by_location: usize,
    pub output_rows: usize,
}

/// A cleaned table and how it got there.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub table: Table,
    pub report: CleanReport,
}

/// Clean a table: price filter, date normalization, location filter.
pub fn clean(table: &Table, min_price: f64, max_price: f64) -> Result<Table, SchemaError> {
    clean_with_report(table, min_price, max_price).map(|c| c.table)
}

/// Same as [`clean`], also returning per-step row counts.
pub fn clean_with_report(
    table: &Table,
    min_price: f64,
    max_price: f64,
) -> Result<Cleaned, SchemaError> {
    let priced = filter_price(table, PriceRange::new(min_price, max_price))?;
    let after_price = priced.len();

    let (dated, unparsed_dates) = normalize_last_review(priced)?;
    let located = filter_location(&dated, &NYC_BOUNDS)?;

    let report = CleanReport {
        input_rows: table.len(),
        dropped_by_price: table.len() - after_price,
        unparsed_dates,
        dropped_by_location: after_price - located.len(),
        output_rows: located.len(),
    };

    Ok(Cleaned {
        table: located,
        report,
    })
}

/// Keep rows whose price lies in `range`. Null prices are dropped.
pub fn filter_price(table: &Table, range: PriceRange) -> Result<Table, SchemaError> {
    let keep: Vec<bool> = table
        .numeric(PRICE)?
        .iter()
        .map(|p| p.is_some_and(|p| range.contains(p.as_f64())))
        .collect();
    Ok(table.filter(&keep))
}

/// Parse `last_review` text into datetimes.
///
/// Returns the table and the number of present values that failed to parse.
/// A column that is already a datetime column is left alone.
pub fn normalize_last_review(mut table: Table) -> Result<(Table, usize), SchemaError> {
    let parsed: Option<Vec<Option<Option<NaiveDateTime>>>> =
        match &table.require(LAST_REVIEW)?.data {
            ColumnData::DateTime(_) => None,
            ColumnData::Text(values) => Some(
                values
                    .iter()
                    .map(|v| v.as_deref().map(parse_review_date))
                    .collect(),
            ),
            other => {
                return Err(SchemaError::WrongType {
                    column: LAST_REVIEW.to_string(),
                    expected: "text or datetime",
                    found: other.kind(),
                })
            }
        };
    let Some(parsed) = parsed else {
        return Ok((table, 0));
    };

    let unparsed = parsed.iter().filter(|v| matches!(v, Some(None))).count();
    let values = parsed.into_iter().map(Option::flatten).collect();

    table.replace(LAST_REVIEW, ColumnData::DateTime(values))?;
    Ok((table, unparsed))
}

/// Keep rows whose coordinates both lie in `bounds`.
pub fn filter_location(table: &Table, bounds: &GeoBounds) -> Result<Table, SchemaError> {
    let longitudes = table.numeric(LONGITUDE)?;
    let latitudes = table.numeric(LATITUDE)?;

    let keep: Vec<bool> = longitudes
        .iter()
        .zip(latitudes)
        .map(|(lon, lat)| match (lon, lat) {
            (Some(lon), Some(lat)) => bounds.contains(lon.as_f64(), lat.as_f64()),
            _ => false,
        })
        .collect();
    Ok(table.filter(&keep))
}
