use std::collections::BTreeSet;

use crate::data::filter::{FilterState, filtered_indices, init_filter_state};
use crate::data::model::{CellValue, SampleDataset};
use crate::report::ReportSummary;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which report view fills the central panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportView {
    #[default]
    Overview,
    Pareto,
    Frequency,
    Correlation,
    Samples,
}

impl ReportView {
    pub const ALL: [ReportView; 5] = [
        ReportView::Overview,
        ReportView::Pareto,
        ReportView::Frequency,
        ReportView::Correlation,
        ReportView::Samples,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ReportView::Overview => "Overview",
            ReportView::Pareto => "Failure Pareto",
            ReportView::Frequency => "Sampling Frequency",
            ReportView::Correlation => "Correlation",
            ReportView::Samples => "Samples",
        }
    }
}

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until the user opens a file).
    pub dataset: Option<SampleDataset>,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of samples passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Aggregates over the visible samples (cached, recomputed on filter
    /// change).
    pub report: Option<ReportSummary>,

    /// Active central-panel view.
    pub view: ReportView,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters and aggregates.
    pub fn set_dataset(&mut self, dataset: SampleDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.report = Some(ReportSummary::compute(&dataset, &self.visible_indices));

        self.dataset = Some(dataset);
        self.view = ReportView::Overview;
        self.status_message = None;
        self.loading = false;
    }

    /// Recompute visible rows and aggregates after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
            self.report = Some(ReportSummary::compute(ds, &self.visible_indices));
        }
    }

    /// Toggle a single value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    fn dataset() -> SampleDataset {
        let samples = ["Normal", "Alert"]
            .iter()
            .map(|status| Sample {
                values: [
                    (
                        "Report Status".to_string(),
                        CellValue::String(status.to_string()),
                    ),
                    ("Account".to_string(), CellValue::String("A".into())),
                ]
                .into(),
            })
            .collect();
        SampleDataset::from_samples(samples)
    }

    #[test]
    fn test_set_dataset_initialises_report() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.report.as_ref().unwrap().total_samples, 2);
    }

    #[test]
    fn test_toggle_filter_recomputes_report() {
        let mut state = AppState::default();
        state.set_dataset(dataset());

        state.toggle_filter_value("Report Status", &CellValue::String("Alert".into()));
        assert_eq!(state.visible_indices, vec![0]);
        assert_eq!(state.report.as_ref().unwrap().total_samples, 1);

        state.select_all("Report Status");
        assert_eq!(state.visible_indices.len(), 2);

        state.select_none("Report Status");
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.report.as_ref().unwrap().total_samples, 0);
    }
}
