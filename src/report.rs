use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{CellValue, ReportStatus, SampleDataset, STATUS_ORDER};
use crate::data::schema;

// ---------------------------------------------------------------------------
// Report aggregates
//
// Everything here is computed over the *visible* rows (after filtering),
// so the charts always agree with the side-panel selection.
// ---------------------------------------------------------------------------

/// How many parameters the Pareto chart shows.
pub const PARETO_TOP: usize = 15;

/// How many failure combinations are listed.
pub const COMBO_TOP: usize = 10;

/// Sample counts per severity, fixed Normal → Alert order.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    /// (status, count, percentage of classified rows).
    pub entries: Vec<(ReportStatus, usize, f64)>,
    /// Rows with a recognized severity.
    pub classified: usize,
    /// Rows with no status cell and no parameter flags.
    pub unclassified: usize,
}

/// One bar of the failure Pareto.
#[derive(Debug, Clone, Serialize)]
pub struct ParetoEntry {
    /// Display label, `RESULT_` prefix stripped.
    pub parameter: String,
    /// Samples where this parameter was flagged Caution or Alert.
    pub failures: usize,
    /// Running share of the displayed failures, ends at 100.
    pub cumulative_pct: f64,
}

/// Samples per calendar month (`YYYY-MM`).
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: usize,
}

/// Pearson correlation over the numeric result columns.
/// `values[i][j]` is NaN when fewer than two complete pairs exist or a
/// column has zero variance.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub parameters: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

/// A set of parameters that failed together on the same sample.
#[derive(Debug, Clone, Serialize)]
pub struct ComboEntry {
    pub parameters: Vec<String>,
    pub count: usize,
}

/// Everything the report views need, computed in one pass over the
/// filtered rows.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub status: StatusBreakdown,
    pub pareto: Vec<ParetoEntry>,
    pub monthly: Vec<MonthlyCount>,
    pub correlation: CorrelationMatrix,
    pub combos: Vec<ComboEntry>,
    pub total_samples: usize,
    pub distinct_equipment: usize,
    pub distinct_accounts: usize,
    /// Min and max sample date (ISO strings sort chronologically).
    pub date_range: Option<(String, String)>,
    pub alert_pct: f64,
}

impl ReportSummary {
    pub fn compute(dataset: &SampleDataset, rows: &[usize]) -> Self {
        let status = status_breakdown(dataset, rows);
        let alert_pct = status
            .entries
            .iter()
            .find(|(s, _, _)| *s == ReportStatus::Alert)
            .map(|(_, _, pct)| *pct)
            .unwrap_or(0.0);

        ReportSummary {
            pareto: failure_pareto(dataset, rows),
            monthly: monthly_counts(dataset, rows),
            correlation: correlation_matrix(dataset, rows),
            combos: failure_combinations(dataset, rows),
            total_samples: rows.len(),
            distinct_equipment: distinct_count(dataset, rows, schema::EQUIPMENT_ID),
            distinct_accounts: distinct_count(dataset, rows, schema::ACCOUNT),
            date_range: date_range(dataset, rows),
            status,
            alert_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Status distribution
// ---------------------------------------------------------------------------

pub fn status_breakdown(dataset: &SampleDataset, rows: &[usize]) -> StatusBreakdown {
    let mut counts: BTreeMap<ReportStatus, usize> = BTreeMap::new();
    let mut unclassified = 0usize;

    for &row in rows {
        match dataset.status_of(row) {
            Some(status) => *counts.entry(status).or_default() += 1,
            None => unclassified += 1,
        }
    }

    let classified: usize = counts.values().sum();
    let entries = STATUS_ORDER
        .iter()
        .map(|&status| {
            let count = counts.get(&status).copied().unwrap_or(0);
            let pct = if classified == 0 {
                0.0
            } else {
                count as f64 * 100.0 / classified as f64
            };
            (status, count, pct)
        })
        .collect();

    StatusBreakdown {
        entries,
        classified,
        unclassified,
    }
}

// ---------------------------------------------------------------------------
// Failure Pareto
// ---------------------------------------------------------------------------

/// Count per parameter the samples whose flag is Caution or Alert, keep the
/// top [`PARETO_TOP`], and overlay the cumulative share of the displayed
/// failures.  Parameters with zero failures are omitted.
pub fn failure_pareto(dataset: &SampleDataset, rows: &[usize]) -> Vec<ParetoEntry> {
    let mut counts: Vec<(String, usize)> = dataset
        .result_columns
        .iter()
        .map(|col| {
            let failures = rows
                .iter()
                .filter(|&&row| {
                    dataset.samples[row]
                        .flag(col)
                        .is_some_and(|f| f.is_flagged())
                })
                .count();
            (schema::parameter_label(col).to_string(), failures)
        })
        .filter(|(_, failures)| *failures > 0)
        .collect();

    // Descending by count, name as tie-break for a stable chart.
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(PARETO_TOP);

    let shown_total: usize = counts.iter().map(|(_, n)| n).sum();
    let mut running = 0usize;
    counts
        .into_iter()
        .map(|(parameter, failures)| {
            running += failures;
            ParetoEntry {
                parameter,
                failures,
                cumulative_pct: running as f64 * 100.0 / shown_total as f64,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sampling frequency
// ---------------------------------------------------------------------------

/// Date cell for a row.  Only cells the loader recognized as dates count;
/// free-form strings in the date column never reach the aggregates.
fn sample_date(dataset: &SampleDataset, row: usize) -> Option<&str> {
    match dataset.samples[row].get(schema::SAMPLE_DATE) {
        Some(CellValue::Date(d)) => Some(d.as_str()),
        _ => None,
    }
}

/// Bucket samples by `YYYY-MM` of the sample date.  Rows without a parseable
/// date are skipped.  BTreeMap keeps months chronological.
pub fn monthly_counts(dataset: &SampleDataset, rows: &[usize]) -> Vec<MonthlyCount> {
    let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
    for &row in rows {
        // get(..7) rather than a direct slice: a hand-built Date cell may
        // not be char-aligned at byte 7, and such a row is simply skipped.
        let Some(month) = sample_date(dataset, row).and_then(|d| d.get(..7)) else {
            continue;
        };
        *buckets.entry(month.to_string()).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect()
}

// ---------------------------------------------------------------------------
// Parameter correlation
// ---------------------------------------------------------------------------

pub fn correlation_matrix(dataset: &SampleDataset, rows: &[usize]) -> CorrelationMatrix {
    let columns = &dataset.result_columns;
    let n = columns.len();

    // Column-major values for the visible rows, Null → NaN.
    let series: Vec<Vec<f64>> = columns
        .iter()
        .map(|col| {
            rows.iter()
                .map(|&row| {
                    dataset.samples[row]
                        .result_value(col)
                        .unwrap_or(f64::NAN)
                })
                .collect()
        })
        .collect();

    let mut values = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&series[i], &series[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        parameters: columns
            .iter()
            .map(|c| schema::parameter_label(c).to_string())
            .collect(),
        values,
    }
}

/// Pearson correlation over pairwise-complete observations.
/// NaN when fewer than two pairs remain or either side has zero variance.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();

    let n = pairs.len() as f64;
    if pairs.len() < 2 {
        return f64::NAN;
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

// ---------------------------------------------------------------------------
// Failure combinations
// ---------------------------------------------------------------------------

/// Multi-parameter combination counting: for every sample collect the set of
/// flagged parameters; combinations of two or more are tallied and the top
/// [`COMBO_TOP`] returned, ties broken lexicographically.
pub fn failure_combinations(dataset: &SampleDataset, rows: &[usize]) -> Vec<ComboEntry> {
    let mut counts: BTreeMap<Vec<String>, usize> = BTreeMap::new();

    for &row in rows {
        // result_columns is sorted, so the combo key is canonical.
        let flagged: Vec<String> = dataset
            .result_columns
            .iter()
            .filter(|col| {
                dataset.samples[row]
                    .flag(col)
                    .is_some_and(|f| f.is_flagged())
            })
            .map(|col| schema::parameter_label(col).to_string())
            .collect();

        if flagged.len() >= 2 {
            *counts.entry(flagged).or_default() += 1;
        }
    }

    let mut combos: Vec<ComboEntry> = counts
        .into_iter()
        .map(|(parameters, count)| ComboEntry { parameters, count })
        .collect();
    combos.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.parameters.cmp(&b.parameters)));
    combos.truncate(COMBO_TOP);
    combos
}

// ---------------------------------------------------------------------------
// Overview helpers
// ---------------------------------------------------------------------------

fn distinct_count(dataset: &SampleDataset, rows: &[usize], column: &str) -> usize {
    rows.iter()
        .filter_map(|&row| dataset.samples[row].get(column))
        .filter(|v| !v.is_null())
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

fn date_range(dataset: &SampleDataset, rows: &[usize]) -> Option<(String, String)> {
    let mut min: Option<&str> = None;
    let mut max: Option<&str> = None;
    for &row in rows {
        if let Some(d) = sample_date(dataset, row) {
            min = Some(min.map_or(d, |m| if d < m { d } else { m }));
            max = Some(max.map_or(d, |m| if d > m { d } else { m }));
        }
    }
    Some((min?.to_string(), max?.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    /// Build a dataset from (date, status, [(param, value, flag)]) triples.
    fn dataset(rows: &[(&str, &str, &[(&str, f64, &str)])]) -> SampleDataset {
        let samples = rows
            .iter()
            .enumerate()
            .map(|(i, (date, status, params))| {
                let mut values: BTreeMap<String, CellValue> = BTreeMap::new();
                values.insert("Account".into(), CellValue::String("NorthFleet".into()));
                values.insert(
                    "Equipment ID".into(),
                    CellValue::String(format!("EQ-{i:03}")),
                );
                values.insert("Lubricant Type".into(), CellValue::String("15W-40".into()));
                values.insert("Sample Date".into(), CellValue::Date(date.to_string()));
                values.insert("Report Status".into(), CellValue::String(status.to_string()));
                for (param, value, flag) in params.iter() {
                    values.insert(format!("RESULT_{param}"), CellValue::Float(*value));
                    values.insert(
                        format!("RESULT_{param}_status"),
                        CellValue::String(flag.to_string()),
                    );
                }
                Sample { values }
            })
            .collect();
        SampleDataset::from_samples(samples)
    }

    fn all_rows(ds: &SampleDataset) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn test_status_percentages_sum_to_100() {
        let ds = dataset(&[
            ("2024-01-05", "Normal", &[]),
            ("2024-01-12", "Normal", &[]),
            ("2024-02-02", "Caution", &[]),
            ("2024-02-20", "Alert", &[]),
        ]);
        let breakdown = status_breakdown(&ds, &all_rows(&ds));

        let total: usize = breakdown.entries.iter().map(|(_, n, _)| n).sum();
        assert_eq!(total, 4);
        assert_eq!(breakdown.unclassified, 0);

        let pct_sum: f64 = breakdown.entries.iter().map(|(_, _, p)| p).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);

        assert_eq!(breakdown.entries[0].0, ReportStatus::Normal);
        assert_eq!(breakdown.entries[0].1, 2);
        assert!((breakdown.entries[0].2 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_status_breakdown_empty_selection() {
        let ds = dataset(&[("2024-01-05", "Normal", &[])]);
        let breakdown = status_breakdown(&ds, &[]);
        assert_eq!(breakdown.classified, 0);
        for (_, count, pct) in &breakdown.entries {
            assert_eq!(*count, 0);
            assert_eq!(*pct, 0.0);
        }
    }

    #[test]
    fn test_pareto_sorted_and_cumulative_ends_at_100() {
        let ds = dataset(&[
            ("2024-01-05", "Alert", &[("IRON", 90.0, "Alert"), ("LEAD", 10.0, "Normal")][..]),
            ("2024-01-06", "Alert", &[("IRON", 85.0, "Alert"), ("LEAD", 55.0, "Caution")][..]),
            ("2024-01-07", "Caution", &[("IRON", 60.0, "Caution"), ("LEAD", 12.0, "Normal")][..]),
        ]);
        let pareto = failure_pareto(&ds, &all_rows(&ds));

        assert_eq!(pareto.len(), 2);
        assert_eq!(pareto[0].parameter, "IRON");
        assert_eq!(pareto[0].failures, 3);
        assert_eq!(pareto[1].parameter, "LEAD");
        assert_eq!(pareto[1].failures, 1);

        // Descending counts, non-decreasing cumulative ending at 100%.
        assert!(pareto[0].failures >= pareto[1].failures);
        assert!(pareto[0].cumulative_pct <= pareto[1].cumulative_pct);
        assert!((pareto.last().unwrap().cumulative_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_pareto_skips_clean_parameters() {
        let ds = dataset(&[("2024-01-05", "Normal", &[("IRON", 10.0, "Normal")][..])]);
        assert!(failure_pareto(&ds, &all_rows(&ds)).is_empty());
    }

    #[test]
    fn test_monthly_counts_chronological() {
        let ds = dataset(&[
            ("2024-02-10", "Normal", &[]),
            ("2024-01-05", "Normal", &[]),
            ("2024-02-20", "Normal", &[]),
        ]);
        let monthly = monthly_counts(&ds, &all_rows(&ds));
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].month, "2024-01");
        assert_eq!(monthly[0].count, 1);
        assert_eq!(monthly[1].month, "2024-02");
        assert_eq!(monthly[1].count, 2);
    }

    #[test]
    fn test_monthly_counts_skip_malformed_date_cells() {
        // A date cell that failed date coercion stays a String, including
        // ones with a multi-byte character straddling the month boundary.
        let base = dataset(&[("2024-01-05", "Normal", &[])]);
        let mut bad = base.samples[0].clone();
        bad.values.insert(
            "Sample Date".into(),
            CellValue::String("2024-0€01".into()),
        );
        let mut samples = base.samples.clone();
        samples.push(bad);
        let ds = SampleDataset::from_samples(samples);

        let monthly = monthly_counts(&ds, &[0, 1]);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, "2024-01");
        assert_eq!(monthly[0].count, 1);
    }

    #[test]
    fn test_date_range_ignores_non_date_cells() {
        // "unknown" sorts after any ISO date; it must not become the range end.
        let base = dataset(&[
            ("2024-01-05", "Normal", &[]),
            ("2024-03-10", "Normal", &[]),
        ]);
        let mut stray = base.samples[0].clone();
        stray
            .values
            .insert("Sample Date".into(), CellValue::String("unknown".into()));
        let mut samples = base.samples.clone();
        samples.push(stray);
        let ds = SampleDataset::from_samples(samples);

        assert_eq!(
            date_range(&ds, &[0, 1, 2]),
            Some(("2024-01-05".to_string(), "2024-03-10".to_string()))
        );
    }

    #[test]
    fn test_correlation_perfectly_correlated_columns() {
        let ds = dataset(&[
            ("2024-01-01", "Normal", &[("IRON", 1.0, "Normal"), ("COPPER", 2.0, "Normal")][..]),
            ("2024-01-02", "Normal", &[("IRON", 2.0, "Normal"), ("COPPER", 4.0, "Normal")][..]),
            ("2024-01-03", "Normal", &[("IRON", 3.0, "Normal"), ("COPPER", 6.0, "Normal")][..]),
        ]);
        let m = correlation_matrix(&ds, &all_rows(&ds));
        assert_eq!(m.parameters, vec!["COPPER", "IRON"]);
        assert!((m.values[0][1] - 1.0).abs() < 1e-9);
        // Symmetric with unit diagonal.
        assert_eq!(m.values[0][1].to_bits(), m.values[1][0].to_bits());
        assert!((m.values[0][0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_correlation_undefined_cases_are_nan() {
        // Constant column → zero variance; single row → too few pairs.
        let ds = dataset(&[
            ("2024-01-01", "Normal", &[("IRON", 5.0, "Normal"), ("COPPER", 1.0, "Normal")][..]),
            ("2024-01-02", "Normal", &[("IRON", 5.0, "Normal"), ("COPPER", 2.0, "Normal")][..]),
        ]);
        let m = correlation_matrix(&ds, &all_rows(&ds));
        let iron = m.parameters.iter().position(|p| p == "IRON").unwrap();
        let copper = m.parameters.iter().position(|p| p == "COPPER").unwrap();
        assert!(m.values[iron][copper].is_nan());

        let single = correlation_matrix(&ds, &[0]);
        assert!(single.values[iron][copper].is_nan());
    }

    #[test]
    fn test_combinations_require_two_or_more() {
        let ds = dataset(&[
            (
                "2024-01-01",
                "Alert",
                &[("IRON", 90.0, "Alert"), ("LEAD", 60.0, "Caution"), ("COPPER", 1.0, "Normal")][..],
            ),
            (
                "2024-01-02",
                "Alert",
                &[("IRON", 88.0, "Alert"), ("LEAD", 61.0, "Alert"), ("COPPER", 1.0, "Normal")][..],
            ),
            ("2024-01-03", "Caution", &[("IRON", 70.0, "Caution")][..]),
        ]);
        let combos = failure_combinations(&ds, &all_rows(&ds));
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].parameters, vec!["IRON", "LEAD"]);
        assert_eq!(combos[0].count, 2);
    }

    #[test]
    fn test_summary_overview_fields() {
        let ds = dataset(&[
            ("2024-03-10", "Alert", &[]),
            ("2024-01-05", "Normal", &[]),
        ]);
        let summary = ReportSummary::compute(&ds, &all_rows(&ds));
        assert_eq!(summary.total_samples, 2);
        assert_eq!(summary.distinct_equipment, 2);
        assert_eq!(summary.distinct_accounts, 1);
        assert_eq!(
            summary.date_range,
            Some(("2024-01-05".to_string(), "2024-03-10".to_string()))
        );
        assert!((summary.alert_pct - 50.0).abs() < 1e-9);
    }
}
