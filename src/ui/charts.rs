use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Text};

use crate::color;
use crate::report::ReportSummary;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Pull the cached report out of the state, or show a placeholder.
fn report_or_placeholder<'a>(ui: &mut Ui, state: &'a AppState) -> Option<&'a ReportSummary> {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a data file to view reports  (File → Open…)");
        });
        return None;
    }
    match &state.report {
        Some(report) if report.total_samples > 0 => Some(report),
        _ => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No samples match the current filters");
            });
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Overview: summary cards + status distribution
// ---------------------------------------------------------------------------

pub fn overview(ui: &mut Ui, state: &AppState) {
    let Some(report) = report_or_placeholder(ui, state) else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        summary_card(ui, "Samples", &report.total_samples.to_string());
        summary_card(ui, "Equipment", &report.distinct_equipment.to_string());
        summary_card(ui, "Accounts", &report.distinct_accounts.to_string());
        if let Some((from, to)) = &report.date_range {
            summary_card(ui, "Date range", &format!("{from} → {to}"));
        }
        summary_card(ui, "In alert", &format!("{:.1}%", report.alert_pct));
    });
    ui.add_space(8.0);

    ui.strong("Sample status distribution");
    status_chart(ui, report);
}

fn summary_card(ui: &mut Ui, title: &str, value: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.label(RichText::new(title).small().weak());
            ui.label(RichText::new(value).heading());
        });
    });
}

fn status_chart(ui: &mut Ui, report: &ReportSummary) {
    let entries = report.status.entries.clone();

    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, (status, count, _))| {
            Bar::new(i as f64, *count as f64)
                .width(0.6)
                .fill(color::status_color(*status))
                .name(status.label())
        })
        .collect();

    let max_count = entries.iter().map(|(_, n, _)| *n).max().unwrap_or(0) as f64;
    let labels = entries.clone();

    Plot::new("status_chart")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 0.25 {
                return String::new();
            }
            labels
                .get(i as usize)
                .filter(|_| i >= 0.0)
                .map(|(status, _, _)| status.label().to_string())
                .unwrap_or_default()
        })
        .y_axis_label("Samples")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
            // Count + percentage above each bar.
            for (i, (_, count, pct)) in entries.iter().enumerate() {
                plot_ui.text(Text::new(
                    PlotPoint::new(i as f64, *count as f64 + max_count * 0.04),
                    format!("{count} ({pct:.1}%)"),
                ));
            }
        });

    if report.status.unclassified > 0 {
        ui.label(
            RichText::new(format!(
                "{} samples without a recognizable status",
                report.status.unclassified
            ))
            .weak(),
        );
    }
}

// ---------------------------------------------------------------------------
// Failure Pareto (top parameters + cumulative overlay + combinations)
// ---------------------------------------------------------------------------

pub fn pareto_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = report_or_placeholder(ui, state) else {
        return;
    };

    if report.pareto.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No flagged parameters in the current selection");
        });
        return;
    }

    ui.strong("Failure Pareto (top parameters, cumulative % overlay)");

    let n = report.pareto.len();
    let max_failures = report
        .pareto
        .iter()
        .map(|e| e.failures)
        .max()
        .unwrap_or(1) as f64;

    // Highest count at the top: entry i renders at y = n - 1 - i.
    let bars: Vec<Bar> = report
        .pareto
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::new((n - 1 - i) as f64, entry.failures as f64)
                .width(0.6)
                .fill(Color32::from_rgb(0x87, 0xce, 0xeb))
                .name(&entry.parameter)
        })
        .collect();

    // Cumulative percentage rescaled onto the count axis.
    let cumulative: PlotPoints = report
        .pareto
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            [
                entry.cumulative_pct / 100.0 * max_failures,
                (n - 1 - i) as f64,
            ]
        })
        .collect();

    let labels: Vec<String> = report.pareto.iter().map(|e| e.parameter.clone()).collect();
    let entries = report.pareto.clone();

    let chart_height = (n as f32 * 28.0 + 60.0).min(ui.available_height() * 0.7);
    Plot::new("pareto_chart")
        .height(chart_height)
        .y_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 0.25 || i < 0.0 {
                return String::new();
            }
            let idx = labels.len() as f64 - 1.0 - i;
            labels
                .get(idx as usize)
                .filter(|_| idx >= 0.0)
                .cloned()
                .unwrap_or_default()
        })
        .x_axis_label("Flagged samples")
        .legend(Legend::default())
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal());
            plot_ui.line(
                Line::new(cumulative)
                    .color(Color32::from_gray(40))
                    .width(1.5)
                    .name("cumulative %"),
            );
            for (i, entry) in entries.iter().enumerate() {
                let y = (entries.len() - 1 - i) as f64;
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(entry.failures as f64 + max_failures * 0.02, y),
                        entry.failures.to_string(),
                    )
                    .anchor(Align2::LEFT_CENTER),
                );
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(
                            entry.cumulative_pct / 100.0 * max_failures + max_failures * 0.02,
                            y + 0.35,
                        ),
                        format!("{:.0}%", entry.cumulative_pct),
                    )
                    .anchor(Align2::LEFT_CENTER),
                );
            }
        });

    // ---- Failure combinations table ----
    if !report.combos.is_empty() {
        ui.add_space(8.0);
        ui.strong("Parameters failing together");
        egui::Grid::new("combo_grid")
            .striped(true)
            .num_columns(2)
            .show(ui, |ui: &mut Ui| {
                ui.label(RichText::new("Combination").weak());
                ui.label(RichText::new("Samples").weak());
                ui.end_row();
                for combo in &report.combos {
                    ui.label(combo.parameters.join(" + "));
                    ui.label(combo.count.to_string());
                    ui.end_row();
                }
            });
    }
}

// ---------------------------------------------------------------------------
// Sampling frequency
// ---------------------------------------------------------------------------

pub fn frequency_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = report_or_placeholder(ui, state) else {
        return;
    };

    if report.monthly.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No sample dates in the current selection");
        });
        return;
    }

    ui.strong("Samples per month");

    let bars: Vec<Bar> = report
        .monthly
        .iter()
        .enumerate()
        .map(|(i, m)| {
            Bar::new(i as f64, m.count as f64)
                .width(0.7)
                .fill(Color32::from_rgb(0x5d, 0xad, 0xe2))
                .name(&m.month)
        })
        .collect();

    let months: Vec<String> = report.monthly.iter().map(|m| m.month.clone()).collect();

    Plot::new("frequency_chart")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value.round();
            if (mark.value - i).abs() > 0.25 || i < 0.0 {
                return String::new();
            }
            months.get(i as usize).cloned().unwrap_or_default()
        })
        .y_axis_label("Samples")
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Parameter correlation heatmap
// ---------------------------------------------------------------------------

pub fn correlation_view(ui: &mut Ui, state: &AppState) {
    let Some(report) = report_or_placeholder(ui, state) else {
        return;
    };

    let matrix = &report.correlation;
    let n = matrix.parameters.len();
    if n < 2 {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Need at least two RESULT_ columns for correlation");
        });
        return;
    }

    ui.strong("Parameter correlation (Pearson)");
    ui.add_space(4.0);

    // Painter-drawn grid: row/column labels plus one colored cell per pair.
    let label_w = 110.0_f32;
    let avail = ui.available_size();
    let cell = ((avail.x - label_w) / n as f32)
        .min((avail.y - label_w) / n as f32)
        .clamp(18.0, 56.0);

    let size = Vec2::new(label_w + cell * n as f32, label_w + cell * n as f32);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let font = FontId::proportional(10.0);

    for (i, row_label) in matrix.parameters.iter().enumerate() {
        // Row label, right-aligned against the grid.
        painter.text(
            egui::pos2(
                origin.x + label_w - 4.0,
                origin.y + label_w + (i as f32 + 0.5) * cell,
            ),
            Align2::RIGHT_CENTER,
            row_label,
            font.clone(),
            ui.visuals().text_color(),
        );
        // Column label, above the grid.
        painter.text(
            egui::pos2(
                origin.x + label_w + (i as f32 + 0.5) * cell,
                origin.y + label_w - 4.0,
            ),
            Align2::CENTER_BOTTOM,
            row_label,
            font.clone(),
            ui.visuals().text_color(),
        );

        for (j, &r) in matrix.values[i].iter().enumerate() {
            let rect = egui::Rect::from_min_size(
                egui::pos2(
                    origin.x + label_w + j as f32 * cell,
                    origin.y + label_w + i as f32 * cell,
                ),
                Vec2::splat(cell),
            );
            painter.rect_filled(
                rect.shrink(0.5),
                egui::CornerRadius::same(2),
                color::correlation_color(r),
            );
            let text = if r.is_finite() {
                format!("{r:.2}")
            } else {
                "–".to_string()
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                font.clone(),
                color::correlation_text_color(r),
            );
        }
    }
}
