//! CSV reading and writing for listing tables.
//!
//! Reading detects the encoding, decodes to UTF-8 and types the columns the
//! cleaner looks at. Writing produces comma-separated UTF-8 with a header row
//! and no index column.

use std::io::Write;
use std::path::Path;

use crate::error::{CsvError, CsvResult, SchemaError, TableResult};
use crate::models::{
    Column, ColumnData, Numeric, Table, LATITUDE, LONGITUDE, PRICE, REQUIRED_COLUMNS,
};

/// Field values read as null.
pub const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw field is a null marker.
pub fn is_na(raw: &str) -> bool {
    NA_VALUES.contains(&raw.trim())
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => decode_with(encoding_rs::WINDOWS_1252, bytes, encoding)?,
        "windows-1252" | "cp1252" => decode_with(encoding_rs::WINDOWS_1252, bytes, encoding)?,
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    Ok(decoded)
}

fn decode_with(
    codec: &'static encoding_rs::Encoding,
    bytes: &[u8],
    label: &str,
) -> CsvResult<String> {
    let (text, _, had_errors) = codec.decode(bytes);
    if had_errors {
        return Err(CsvError::Encoding(label.to_string()));
    }
    Ok(text.into_owned())
}

/// Read a listings CSV file with encoding auto-detection.
///
/// # Example
/// ```ignore
/// let table = read_table_file("sample.csv")?;
/// println!("{} rows, columns: {:?}", table.len(), table.column_names());
/// ```
pub fn read_table_file<P: AsRef<Path>>(path: P) -> TableResult<Table> {
    let bytes = std::fs::read(path.as_ref()).map_err(CsvError::from)?;
    read_table_bytes(&bytes)
}

/// Read listings CSV bytes with encoding auto-detection.
pub fn read_table_bytes(bytes: &[u8]) -> TableResult<Table> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    parse_table(&content)
}

/// Parse comma-separated text into a typed table.
///
/// `price` becomes numeric (integer unless some value is fractional),
/// `longitude` and `latitude` become float, every other column keeps its raw
/// text. The row index counts data rows from zero.
pub fn parse_table(content: &str) -> TableResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(CsvError::from)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::EmptyFile.into());
    }

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(SchemaError::MissingColumn(required.to_string()).into());
        }
    }

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    let mut lines = Vec::new();

    for result in reader.records() {
        let record = result.map_err(CsvError::from)?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);

        for (cells, field) in raw.iter_mut().zip(record.iter()) {
            cells.push(if is_na(field) { None } else { Some(field.to_string()) });
        }
        lines.push(line);
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, cells) in headers.into_iter().zip(raw) {
        let data = match name.as_str() {
            PRICE => ColumnData::numeric(parse_numeric_column(&name, &cells, &lines)?),
            LONGITUDE | LATITUDE => {
                let values = parse_numeric_column(&name, &cells, &lines)?;
                ColumnData::Numeric(values.into_iter().map(|v| v.map(|n| Numeric::Float(n.as_f64()))).collect())
            }
            _ => ColumnData::Text(cells),
        };
        columns.push(Column::new(name, data));
    }

    Ok(Table::new(columns)?)
}

fn parse_numeric_column(
    name: &str,
    cells: &[Option<String>],
    lines: &[usize],
) -> Result<Vec<Option<Numeric>>, SchemaError> {
    cells
        .iter()
        .zip(lines)
        .map(|(cell, line)| match cell {
            None => Ok(None),
            Some(raw) => Numeric::parse(raw)
                .map(Some)
                .ok_or_else(|| SchemaError::NotNumeric {
                    line: *line,
                    column: name.to_string(),
                    value: raw.clone(),
                }),
        })
        .collect()
}

/// Write a table as CSV to any writer.
pub fn write_table<W: Write>(table: &Table, writer: W) -> CsvResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.column_names())?;

    let rendered: Vec<Vec<String>> = table.columns().iter().map(|c| c.data.render()).collect();
    for row in 0..table.len() {
        out.write_record(rendered.iter().map(|column| column[row].as_str()))?;
    }

    out.flush()?;
    Ok(())
}

/// Write a table as CSV to a file, replacing it if present.
pub fn write_table_file<P: AsRef<Path>>(table: &Table, path: P) -> CsvResult<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_table(table, std::io::BufWriter::new(file))
}

/// Render a table as a CSV string.
pub fn table_to_csv(table: &Table) -> CsvResult<String> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| CsvError::Encoding(e.to_string()))
}
