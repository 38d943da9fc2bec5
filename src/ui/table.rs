use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color;
use crate::data::schema;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Samples table (central panel, "Samples" view)
// ---------------------------------------------------------------------------

/// Scrollable table of the visible samples, one column per dataset column.
/// The `Report Status` cell is tinted with its severity color.
pub fn samples_table(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a data file to view samples  (File → Open…)");
            });
            return;
        }
    };

    if state.visible_indices.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No samples match the current filters");
        });
        return;
    }

    let columns = &dataset.column_names;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(70.0), columns.len())
        .header(22.0, |mut header| {
            for col in columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, state.visible_indices.len(), |mut row| {
                let sample_idx = state.visible_indices[row.index()];
                let sample = &dataset.samples[sample_idx];

                for col in columns {
                    row.col(|ui| {
                        let text = sample
                            .get(col)
                            .filter(|v| !v.is_null())
                            .map(|v| v.to_string())
                            .unwrap_or_default();

                        if col == schema::REPORT_STATUS {
                            if let Some(status) = dataset.status_of(sample_idx) {
                                ui.label(
                                    RichText::new(status.label())
                                        .color(color::status_color(status)),
                                );
                                return;
                            }
                        }
                        ui.label(text);
                    });
                }
            });
        });
}
