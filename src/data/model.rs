use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::schema;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet dtypes.
/// Used as a key in `BTreeMap` / `BTreeSet` downstream, so it must be `Ord`.
#[derive(Debug, Clone)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so CellValue can live in a BTreeSet --

/// Equality defers to `Ord` so the two never disagree: floats compare via
/// `total_cmp`, so a NaN cell equals itself and stays findable in filter sets.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn rank(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let ra = rank(self);
        let rb = rank(other);
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.2}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for aggregation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow the textual content of string-like values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) | CellValue::Date(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ReportStatus – categorical lab-result severity
// ---------------------------------------------------------------------------

/// Severity of a sample (or of a single parameter flag).  Ordered so that
/// `max` yields the worst severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ReportStatus {
    Normal,
    Caution,
    Alert,
}

/// Fixed display order for charts and tables.
pub const STATUS_ORDER: [ReportStatus; 3] = [
    ReportStatus::Normal,
    ReportStatus::Caution,
    ReportStatus::Alert,
];

impl ReportStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Normal => "Normal",
            ReportStatus::Caution => "Caution",
            ReportStatus::Alert => "Alert",
        }
    }

    /// Whether this severity counts as a failure for Pareto purposes.
    pub fn is_flagged(&self) -> bool {
        matches!(self, ReportStatus::Caution | ReportStatus::Alert)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ReportStatus::Normal),
            "caution" => Ok(ReportStatus::Caution),
            "alert" => Ok(ReportStatus::Alert),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample – one row of the table
// ---------------------------------------------------------------------------

/// A single lubricant sample (one row of the source spreadsheet).
#[derive(Debug, Clone)]
pub struct Sample {
    /// All cells: column_name → value.
    pub values: BTreeMap<String, CellValue>,
}

impl Sample {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    /// Numeric measurement for a `RESULT_` column, `None` when missing.
    pub fn result_value(&self, result_column: &str) -> Option<f64> {
        self.get(result_column).and_then(CellValue::as_f64)
    }

    /// Per-parameter severity flag, read from the companion `_status` column.
    /// Unrecognized flag text counts as missing.
    pub fn flag(&self, result_column: &str) -> Option<ReportStatus> {
        let flag_col = schema::flag_column_for(result_column);
        self.get(&flag_col)?.as_str()?.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// SampleDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    /// All samples (rows).
    pub samples: Vec<Sample>,
    /// Sorted list of every column name seen.
    pub column_names: Vec<String>,
    /// `RESULT_` measurement columns, sorted.
    pub result_columns: Vec<String>,
    /// Metadata columns offered as filters (everything that is neither a
    /// result column nor a flag column).
    pub filter_columns: Vec<String>,
    /// For each filter column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<CellValue>>,
}

impl SampleDataset {
    /// Build column indices from the loaded samples.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let mut columns: BTreeSet<String> = BTreeSet::new();
        for sample in &samples {
            columns.extend(sample.values.keys().cloned());
        }

        let result_columns: Vec<String> = columns
            .iter()
            .filter(|c| schema::is_result_column(c))
            .cloned()
            .collect();

        let filter_columns: Vec<String> = columns
            .iter()
            .filter(|c| !schema::is_result_column(c) && !schema::is_flag_column(c))
            .cloned()
            .collect();

        let mut unique_values: BTreeMap<String, BTreeSet<CellValue>> = BTreeMap::new();
        for sample in &samples {
            for col in &filter_columns {
                let val = sample.get(col).cloned().unwrap_or(CellValue::Null);
                unique_values.entry(col.clone()).or_default().insert(val);
            }
        }

        SampleDataset {
            samples,
            column_names: columns.into_iter().collect(),
            result_columns,
            filter_columns,
            unique_values,
        }
    }

    /// Severity of one sample: the explicit `Report Status` cell when it
    /// parses, otherwise the worst per-parameter flag on the row.
    pub fn status_of(&self, row: usize) -> Option<ReportStatus> {
        let sample = &self.samples[row];
        if let Some(text) = sample.get(schema::REPORT_STATUS).and_then(CellValue::as_str) {
            if let Ok(status) = text.parse() {
                return Some(status);
            }
        }
        self.result_columns
            .iter()
            .filter_map(|col| sample.flag(col))
            .max()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(cells: &[(&str, CellValue)]) -> Sample {
        Sample {
            values: cells
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn test_nan_cells_compare_consistently() {
        let a = CellValue::Float(f64::NAN);
        let b = CellValue::Float(f64::NAN);
        assert_eq!(a, b);

        let mut set = std::collections::BTreeSet::new();
        set.insert(a.clone());
        set.insert(b);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_status_parsing_is_case_insensitive() {
        assert_eq!("ALERT".parse(), Ok(ReportStatus::Alert));
        assert_eq!(" caution ".parse(), Ok(ReportStatus::Caution));
        assert!("unknown".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ReportStatus::Alert > ReportStatus::Caution);
        assert!(ReportStatus::Caution > ReportStatus::Normal);
        assert!(!ReportStatus::Normal.is_flagged());
        assert!(ReportStatus::Caution.is_flagged());
    }

    #[test]
    fn test_column_classification_in_dataset() {
        let ds = SampleDataset::from_samples(vec![sample(&[
            ("Account", CellValue::String("NorthFleet".into())),
            ("RESULT_IRON", CellValue::Float(12.0)),
            ("RESULT_IRON_status", CellValue::String("Normal".into())),
        ])]);
        assert_eq!(ds.result_columns, vec!["RESULT_IRON"]);
        assert_eq!(ds.filter_columns, vec!["Account"]);
        assert!(!ds.unique_values.contains_key("RESULT_IRON"));
    }

    #[test]
    fn test_status_derived_from_worst_flag_when_cell_missing() {
        let ds = SampleDataset::from_samples(vec![sample(&[
            ("RESULT_IRON", CellValue::Float(80.0)),
            ("RESULT_IRON_status", CellValue::String("Caution".into())),
            ("RESULT_LEAD", CellValue::Float(40.0)),
            ("RESULT_LEAD_status", CellValue::String("Alert".into())),
        ])]);
        assert_eq!(ds.status_of(0), Some(ReportStatus::Alert));
    }

    #[test]
    fn test_explicit_status_cell_wins() {
        let ds = SampleDataset::from_samples(vec![sample(&[
            ("Report Status", CellValue::String("Normal".into())),
            ("RESULT_IRON_status", CellValue::String("Alert".into())),
            ("RESULT_IRON", CellValue::Float(99.0)),
        ])]);
        assert_eq!(ds.status_of(0), Some(ReportStatus::Normal));
    }

    #[test]
    fn test_unrecognized_flag_is_missing() {
        let s = sample(&[(
            "RESULT_IRON_status",
            CellValue::String("borderline".into()),
        )]);
        assert_eq!(s.flag("RESULT_IRON"), None);
    }
}
