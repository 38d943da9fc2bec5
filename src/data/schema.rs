use thiserror::Error;

// ---------------------------------------------------------------------------
// Well-known column names
// ---------------------------------------------------------------------------

pub const ACCOUNT: &str = "Account";
pub const EQUIPMENT_ID: &str = "Equipment ID";
pub const LUBRICANT_TYPE: &str = "Lubricant Type";
pub const SAMPLE_DATE: &str = "Sample Date";
pub const REPORT_STATUS: &str = "Report Status";

/// Columns every input file must carry.  Everything else is optional.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    ACCOUNT,
    EQUIPMENT_ID,
    LUBRICANT_TYPE,
    SAMPLE_DATE,
    REPORT_STATUS,
];

/// Prefix identifying numeric measurement columns (e.g. `RESULT_IRON`).
pub const RESULT_PREFIX: &str = "RESULT_";

/// Suffix of the per-parameter flag column (e.g. `RESULT_IRON_status`).
pub const FLAG_SUFFIX: &str = "_status";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// Check that every required column is present.  On failure the error names
/// all missing columns at once, not just the first.
pub fn validate_headers<S: AsRef<str>>(headers: &[S]) -> Result<(), SchemaError> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.as_ref() == **required))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingColumns(missing))
    }
}

// ---------------------------------------------------------------------------
// Column classification
// ---------------------------------------------------------------------------

/// `RESULT_IRON` → true, `RESULT_IRON_status` → false.
pub fn is_result_column(name: &str) -> bool {
    name.starts_with(RESULT_PREFIX) && !name.ends_with(FLAG_SUFFIX)
}

pub fn is_flag_column(name: &str) -> bool {
    name.starts_with(RESULT_PREFIX) && name.ends_with(FLAG_SUFFIX)
}

/// Name of the flag column paired with a result column.
pub fn flag_column_for(result_column: &str) -> String {
    format!("{result_column}{FLAG_SUFFIX}")
}

/// Short display label for a result column: `RESULT_IRON` → `IRON`.
pub fn parameter_label(result_column: &str) -> &str {
    result_column
        .strip_prefix(RESULT_PREFIX)
        .unwrap_or(result_column)
}
