//! In-memory table model.
//!
//! A [`Table`] is a list of named, typed [`Column`]s of equal length plus a
//! row index recording where each row sat in the file it was read from.
//! Filtering keeps the index of every surviving row, so it is not dense after
//! cleaning; writers do not persist it.
//!
//! Only the columns the cleaner inspects are typed. Everything else stays
//! [`ColumnData::Text`] holding the raw field.

use chrono::{NaiveDateTime, Timelike};
use std::fmt;

use crate::error::SchemaError;

/// Listing price column.
pub const PRICE: &str = "price";
/// Date of the most recent review.
pub const LAST_REVIEW: &str = "last_review";
/// Listing longitude.
pub const LONGITUDE: &str = "longitude";
/// Listing latitude.
pub const LATITUDE: &str = "latitude";

/// Columns every input table must carry.
pub const REQUIRED_COLUMNS: [&str; 4] = [PRICE, LAST_REVIEW, LONGITUDE, LATITUDE];

// =============================================================================
// Values
// =============================================================================

/// A numeric cell value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Int(i) => i as f64,
            Numeric::Float(f) => f,
        }
    }

    /// Parse a raw field. Integers stay integers.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            return Some(Numeric::Int(i));
        }
        raw.parse::<f64>().ok().map(Numeric::Float)
    }

    fn to_float(self) -> Self {
        Numeric::Float(self.as_f64())
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(i) => write!(f, "{}", i),
            // Whole floats keep a trailing ".0" so the column reads back as float
            Numeric::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            Numeric::Float(v) => write!(f, "{}", v),
        }
    }
}

// =============================================================================
// Columns
// =============================================================================

/// Values of one column. `None` is the "no value" marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<Numeric>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(v) => v.len(),
            ColumnData::Numeric(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the kind of values held, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ColumnData::Text(_) => "text",
            ColumnData::Numeric(_) => "numeric",
            ColumnData::DateTime(_) => "datetime",
        }
    }

    /// Build a numeric column. It widens to float if any value is fractional
    /// or missing, so an integer column with nulls writes `50.0`.
    pub fn numeric(values: Vec<Option<Numeric>>) -> Self {
        let widen = values
            .iter()
            .any(|v| matches!(v, None | Some(Numeric::Float(_))));
        if widen {
            ColumnData::Numeric(values.into_iter().map(|v| v.map(Numeric::to_float)).collect())
        } else {
            ColumnData::Numeric(values)
        }
    }

    /// Render every cell as it is written to CSV. Nulls become empty fields.
    ///
    /// Datetime columns print date-only when every present value is at
    /// midnight, and with a time of day otherwise.
    pub fn render(&self) -> Vec<String> {
        match self {
            ColumnData::Text(values) => values
                .iter()
                .map(|v| v.clone().unwrap_or_default())
                .collect(),
            ColumnData::Numeric(values) => values
                .iter()
                .map(|v| v.map(|n| n.to_string()).unwrap_or_default())
                .collect(),
            ColumnData::DateTime(values) => {
                let date_only = values
                    .iter()
                    .flatten()
                    .all(|dt| dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0);
                let format = if date_only { "%Y-%m-%d" } else { "%Y-%m-%d %H:%M:%S" };
                values
                    .iter()
                    .map(|v| v.map(|dt| dt.format(format).to_string()).unwrap_or_default())
                    .collect()
            }
        }
    }

    fn select(&self, keep: &[bool]) -> Self {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter(|(_, k)| **k)
                .map(|(v, _)| v.clone())
                .collect()
        }

        match self {
            ColumnData::Text(v) => ColumnData::Text(pick(v, keep)),
            ColumnData::Numeric(v) => ColumnData::Numeric(pick(v, keep)),
            ColumnData::DateTime(v) => ColumnData::DateTime(pick(v, keep)),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

// =============================================================================
// Table
// =============================================================================

/// An ordered collection of uniformly-columned rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    index: Vec<usize>,
}

impl Table {
    /// Build a table with a dense `0..n` index.
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        Self::with_index(columns, (0..rows).collect())
    }

    /// Build a table with an explicit row index.
    pub fn with_index(columns: Vec<Column>, index: Vec<usize>) -> Result<Self, SchemaError> {
        for column in &columns {
            if column.data.len() != index.len() {
                return Err(SchemaError::LengthMismatch {
                    column: column.name.clone(),
                    expected: index.len(),
                    found: column.data.len(),
                });
            }
        }
        Ok(Self { columns, index })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Row positions in the source file.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing with [`SchemaError::MissingColumn`].
    pub fn require(&self, name: &str) -> Result<&Column, SchemaError> {
        self.column(name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
    }

    /// Values of a numeric column.
    pub fn numeric(&self, name: &str) -> Result<&[Option<Numeric>], SchemaError> {
        match &self.require(name)?.data {
            ColumnData::Numeric(values) => Ok(values),
            other => Err(SchemaError::WrongType {
                column: name.to_string(),
                expected: "numeric",
                found: other.kind(),
            }),
        }
    }

    /// Replace the data of an existing column, keeping its position.
    pub fn replace(&mut self, name: &str, data: ColumnData) -> Result<(), SchemaError> {
        if data.len() != self.len() {
            return Err(SchemaError::LengthMismatch {
                column: name.to_string(),
                expected: self.len(),
                found: data.len(),
            });
        }
        let column = self
            .columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        column.data = data;
        Ok(())
    }

    /// Keep the rows whose mask entry is `true`, in order.
    ///
    /// `keep` must have one entry per row.
    pub fn filter(&self, keep: &[bool]) -> Table {
        debug_assert_eq!(keep.len(), self.len());
        let index = self
            .index
            .iter()
            .zip(keep)
            .filter(|(_, k)| **k)
            .map(|(i, _)| *i)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.select(keep)))
            .collect();
        Table { columns, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Table {
        Table::new(vec![
            Column::new("id", ColumnData::Text(vec![Some("a".into()), Some("b".into()), None])),
            Column::new(
                PRICE,
                ColumnData::Numeric(vec![Some(Numeric::Int(10)), None, Some(Numeric::Int(30))]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(Numeric::parse("42"), Some(Numeric::Int(42)));
        assert_eq!(Numeric::parse(" 4.5 "), Some(Numeric::Float(4.5)));
        assert_eq!(Numeric::parse("-73.9"), Some(Numeric::Float(-73.9)));
        assert_eq!(Numeric::parse("cheap"), None);
    }

    #[test]
    fn test_numeric_display() {
        assert_eq!(Numeric::Int(50).to_string(), "50");
        assert_eq!(Numeric::Float(50.0).to_string(), "50.0");
        assert_eq!(Numeric::Float(-73.95).to_string(), "-73.95");
    }

    #[test]
    fn test_numeric_column_widens_to_float() {
        let data = ColumnData::numeric(vec![Some(Numeric::Int(1)), None, Some(Numeric::Float(2.5))]);
        assert_eq!(
            data,
            ColumnData::Numeric(vec![Some(Numeric::Float(1.0)), None, Some(Numeric::Float(2.5))])
        );
    }

    #[test]
    fn test_numeric_column_with_nulls_widens_to_float() {
        let data = ColumnData::numeric(vec![Some(Numeric::Int(50)), None]);
        assert_eq!(data, ColumnData::Numeric(vec![Some(Numeric::Float(50.0)), None]));
        assert_eq!(data.render(), vec!["50.0", ""]);

        let dense = ColumnData::numeric(vec![Some(Numeric::Int(50)), Some(Numeric::Int(9))]);
        assert_eq!(dense.render(), vec!["50", "9"]);
    }

    #[test]
    fn test_filter_keeps_order_and_index() {
        let table = sample().filter(&[true, false, true]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.index(), &[0, 2]);
        assert_eq!(
            table.numeric(PRICE).unwrap(),
            &[Some(Numeric::Int(10)), Some(Numeric::Int(30))]
        );
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Table::new(vec![
            Column::new("a", ColumnData::Text(vec![None, None])),
            Column::new("b", ColumnData::Text(vec![None])),
        ]);
        assert!(matches!(result, Err(SchemaError::LengthMismatch { .. })));
    }

    #[test]
    fn test_numeric_on_text_column_is_wrong_type() {
        let err = sample().numeric("id").unwrap_err();
        assert_eq!(
            err,
            SchemaError::WrongType {
                column: "id".into(),
                expected: "numeric",
                found: "text",
            }
        );
        assert_eq!(
            sample().numeric("nope").unwrap_err(),
            SchemaError::MissingColumn("nope".into())
        );
    }

    #[test]
    fn test_render_dates() {
        let midnight = NaiveDate::from_ymd_opt(2019, 5, 21).unwrap().and_hms_opt(0, 0, 0);
        let afternoon = NaiveDate::from_ymd_opt(2019, 5, 22).unwrap().and_hms_opt(13, 5, 0);

        let date_only = ColumnData::DateTime(vec![midnight, None]);
        assert_eq!(date_only.render(), vec!["2019-05-21", ""]);

        let with_time = ColumnData::DateTime(vec![midnight, afternoon]);
        assert_eq!(with_time.render(), vec!["2019-05-21 00:00:00", "2019-05-22 13:05:00"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut table = sample();
        table
            .replace("id", ColumnData::Text(vec![None, None, Some("z".into())]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["id", PRICE]);
        assert!(table.replace("id", ColumnData::Text(vec![None])).is_err());
    }
}
