use std::collections::{BTreeMap, BTreeSet};

use super::model::{CellValue, SampleDataset};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per metadata column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// Only metadata (filter) columns appear here; measurement columns are
/// never filtered.
pub type FilterState = BTreeMap<String, BTreeSet<CellValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &SampleDataset) -> FilterState {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return indices of samples that pass all active filters.
///
/// A sample passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * Every unique value is selected → passes (no effective filter)
/// * The sample's value for that column is in the selected set → passes;
///   a missing cell counts as `Null`
pub fn filtered_indices(dataset: &SampleDataset, filters: &FilterState) -> Vec<usize> {
    (0..dataset.len())
        .filter(|&i| sample_passes(dataset, filters, i))
        .collect()
}

fn sample_passes(dataset: &SampleDataset, filters: &FilterState, row: usize) -> bool {
    let sample = &dataset.samples[row];
    for (col, selected) in filters {
        if selected.is_empty() {
            // Nothing selected for this column → hide everything
            return false;
        }
        if let Some(all_vals) = dataset.unique_values.get(col) {
            if selected.len() == all_vals.len() {
                continue; // everything selected, no filtering needed
            }
        }
        let value = sample.get(col).cloned().unwrap_or(CellValue::Null);
        if !selected.contains(&value) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    fn dataset() -> SampleDataset {
        let rows = [
            ("NorthFleet", "EXC-014"),
            ("NorthFleet", "EXC-015"),
            ("HarborLog", "CRN-002"),
        ];
        let samples = rows
            .iter()
            .map(|(account, equipment)| Sample {
                values: [
                    ("Account".to_string(), CellValue::String(account.to_string())),
                    (
                        "Equipment ID".to_string(),
                        CellValue::String(equipment.to_string()),
                    ),
                ]
                .into(),
            })
            .collect();
        SampleDataset::from_samples(samples)
    }

    #[test]
    fn test_all_selected_passes_everything() {
        let ds = dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn test_subset_selection_filters_rows() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert(
            "Account".to_string(),
            [CellValue::String("HarborLog".to_string())].into(),
        );
        assert_eq!(filtered_indices(&ds, &filters), vec![2]);
    }

    #[test]
    fn test_empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert("Account".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }
}
