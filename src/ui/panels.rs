use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, ReportView};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    // Clone what we need so we can mutate state inside the loop.
    let columns = dataset.filter_columns.clone();
    let unique = dataset.unique_values.clone();

    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for col in &columns {
                let Some(all_values) = unique.get(col) else {
                    continue;
                };

                let selected = state.filters.entry(col.clone()).or_default();

                // Show count of selected / total in the header
                let n_selected = selected.len();
                let n_total = all_values.len();
                let header_text = format!("{col}  ({n_selected}/{n_total})");

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        // Select all / none buttons
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.select_all(col);
                            }
                            if ui.small_button("None").clicked() {
                                state.select_none(col);
                            }
                        });

                        // Re-borrow after potential mutation from All/None
                        let selected = state.filters.entry(col.clone()).or_default();

                        for val in all_values {
                            let mut checked = selected.contains(val);
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                if checked {
                                    selected.insert(val.clone());
                                } else {
                                    selected.remove(val);
                                }
                                changed = true;
                            }
                        }
                    });
            }
        });

    // Recompute visible rows and aggregates after any checkbox change.
    if changed {
        state.refilter();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let has_report = state.report.is_some();
            if ui
                .add_enabled(has_report, egui::Button::new("Export summary…"))
                .clicked()
            {
                export_summary_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} samples loaded, {} visible",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// Row of buttons switching the central report view.
pub fn view_selector(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for view in ReportView::ALL {
            if ui
                .selectable_label(state.view == view, view.label())
                .clicked()
            {
                state.view = view;
            }
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open oil-analysis data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.loading = true;
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} samples, {} result columns",
                    dataset.len(),
                    dataset.result_columns.len()
                );
                state.set_dataset(dataset);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
                state.loading = false;
            }
        }
    }
}

/// Write the current [`crate::report::ReportSummary`] as pretty JSON.
pub fn export_summary_dialog(state: &mut AppState) {
    let Some(report) = &state.report else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export report summary")
        .set_file_name("oil_report_summary.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        let result = serde_json::to_string_pretty(report)
            .map_err(anyhow::Error::from)
            .and_then(|text| std::fs::write(&path, text).map_err(anyhow::Error::from));
        match result {
            Ok(()) => log::info!("Exported summary to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export summary: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
