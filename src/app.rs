use eframe::egui;

use crate::state::{AppState, ReportView};
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct LubeWatchApp {
    pub state: AppState,
}

impl eframe::App for LubeWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active report view ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::view_selector(ui, &mut self.state);
            ui.separator();

            match self.state.view {
                ReportView::Overview => charts::overview(ui, &self.state),
                ReportView::Pareto => charts::pareto_view(ui, &self.state),
                ReportView::Frequency => charts::frequency_view(ui, &self.state),
                ReportView::Correlation => charts::correlation_view(ui, &self.state),
                ReportView::Samples => table::samples_table(ui, &self.state),
            }
        });
    }
}
