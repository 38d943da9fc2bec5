use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Sample, SampleDataset};
use super::schema;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sample dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with column names, one sample per row
/// * `.json`    – `[{ "Account": "...", "RESULT_IRON": 12.3, ... }, ...]`
/// * `.parquet` – flat columns, as written by `df.to_parquet()`
///
/// The required metadata columns are validated before rows are parsed;
/// a file missing any of them is rejected with a message naming them all.
pub fn load_file(path: &Path) -> Result<SampleDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Cell coercion
// ---------------------------------------------------------------------------

/// Parse one textual cell.  `RESULT_` columns must be numeric: malformed
/// numbers coerce to `Null` so a single bad cell never aborts the load.
fn coerce_cell(column: &str, raw: &str) -> CellValue {
    let raw = raw.trim();
    if raw.is_empty() {
        return CellValue::Null;
    }
    if schema::is_result_column(column) {
        return raw
            .parse::<f64>()
            .map(CellValue::Float)
            .unwrap_or(CellValue::Null);
    }
    if looks_like_date(raw) {
        return CellValue::Date(raw.to_string());
    }
    if let Ok(i) = raw.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return CellValue::Float(f);
    }
    if raw == "true" || raw == "false" {
        return CellValue::Bool(raw == "true");
    }
    CellValue::String(raw.to_string())
}

/// `YYYY-MM-DD` shape check, no calendar validation.
fn looks_like_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<SampleDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    schema::validate_headers(&headers)?;

    let mut samples = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut values = BTreeMap::new();
        for (col_idx, raw) in record.iter().enumerate() {
            let Some(column) = headers.get(col_idx) else {
                continue;
            };
            values.insert(column.clone(), coerce_cell(column, raw));
        }
        samples.push(Sample { values });
    }

    Ok(SampleDataset::from_samples(samples))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default
/// `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Account": "NorthFleet",
///     "Equipment ID": "EXC-014",
///     "Sample Date": "2024-03-17",
///     "Report Status": "Caution",
///     "RESULT_IRON": 48.2,
///     "RESULT_IRON_status": "Caution"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SampleDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    // Headers are the union of keys across all records.
    let mut headers: BTreeSet<String> = BTreeSet::new();
    for rec in records {
        if let Some(obj) = rec.as_object() {
            headers.extend(obj.keys().cloned());
        }
    }
    let headers: Vec<String> = headers.into_iter().collect();
    schema::validate_headers(&headers)?;

    let mut samples = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut values = BTreeMap::new();
        for (key, val) in obj {
            values.insert(key.clone(), json_to_cell(key, val));
        }
        samples.push(Sample { values });
    }

    Ok(SampleDataset::from_samples(samples))
}

fn json_to_cell(column: &str, val: &JsonValue) -> CellValue {
    if schema::is_result_column(column) {
        // Numeric coercion: anything that is not a number becomes Null.
        return match val {
            JsonValue::Number(n) => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
            JsonValue::String(s) => coerce_cell(column, s),
            _ => CellValue::Null,
        };
    }
    match val {
        JsonValue::String(s) if looks_like_date(s) => CellValue::Date(s.clone()),
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat columns (one cell per row, no lists).
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SampleDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    schema::validate_headers(&headers)?;

    let reader = builder.build().context("building parquet reader")?;

    let mut samples = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let batch_schema = batch.schema();

        for row in 0..batch.num_rows() {
            let mut values = BTreeMap::new();
            for (col_idx, field) in batch_schema.fields().iter().enumerate() {
                let column = field.name();
                let cell = extract_cell(batch.column(col_idx), row);
                let cell = if schema::is_result_column(column) {
                    // Force numeric; strings and other types become Null.
                    match cell.as_f64() {
                        Some(v) => CellValue::Float(v),
                        None => CellValue::Null,
                    }
                } else {
                    cell
                };
                values.insert(column.clone(), cell);
            }
            samples.push(Sample { values });
        }
    }

    Ok(SampleDataset::from_samples(samples))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                s.value(row).to_string()
            } else {
                // LargeStringArray
                col.as_string::<i64>().value(row).to_string()
            };
            if looks_like_date(&text) {
                CellValue::Date(text)
            } else {
                CellValue::String(text)
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            CellValue::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            CellValue::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            CellValue::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            CellValue::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            CellValue::Bool(arr.value(row))
        }
        _ => CellValue::String(format!("{:?}", col.data_type())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str =
        "Account,Equipment ID,Lubricant Type,Sample Date,Report Status,RESULT_IRON,RESULT_IRON_status";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "{HEADER}").unwrap();
        write!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_roundtrip() {
        let file = write_csv(
            "NorthFleet,EXC-014,15W-40,2024-03-17,Caution,48.2,Caution\n\
             NorthFleet,EXC-015,15W-40,2024-03-18,Normal,12.0,Normal\n",
        );
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.result_columns, vec!["RESULT_IRON"]);
        assert_eq!(
            ds.samples[0].get("Sample Date"),
            Some(&CellValue::Date("2024-03-17".into()))
        );
        assert_eq!(ds.samples[0].result_value("RESULT_IRON"), Some(48.2));
    }

    #[test]
    fn test_malformed_numeric_cell_coerces_to_null() {
        let file = write_csv("NorthFleet,EXC-014,15W-40,2024-03-17,Normal,n/a,Normal\n");
        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.samples[0].get("RESULT_IRON"), Some(&CellValue::Null));
        assert_eq!(ds.samples[0].result_value("RESULT_IRON"), None);
    }

    #[test]
    fn test_missing_required_columns_halt_load() {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "Account,RESULT_IRON").unwrap();
        writeln!(file, "NorthFleet,1.0").unwrap();
        file.flush().unwrap();

        let err = load_file(file.path()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("missing required columns"), "{msg}");
        assert!(msg.contains("Equipment ID"), "{msg}");
        assert!(msg.contains("Report Status"), "{msg}");
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_file(Path::new("samples.xls")).is_err());
    }

    #[test]
    fn test_json_numeric_coercion() {
        let mut file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        write!(
            file,
            r#"[{{"Account":"A","Equipment ID":"E1","Lubricant Type":"SAE 30",
                 "Sample Date":"2024-01-05","Report Status":"Alert",
                 "RESULT_IRON":"not-a-number","RESULT_IRON_status":"Alert"}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let ds = load_file(file.path()).unwrap();
        assert_eq!(ds.samples[0].get("RESULT_IRON"), Some(&CellValue::Null));
        assert_eq!(
            ds.samples[0].get("Sample Date"),
            Some(&CellValue::Date("2024-01-05".into()))
        );
    }

    #[test]
    fn test_date_shape_detection() {
        assert!(looks_like_date("2024-03-17"));
        assert!(!looks_like_date("17/03/2024"));
        assert!(!looks_like_date("2024-3-17"));
        assert!(!looks_like_date("15W-40"));
    }
}
