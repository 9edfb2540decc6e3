use eframe::egui::{self, ScrollArea, Ui};

use crate::state::{AppState, Command};
use crate::ui::{filters, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CrimViewerApp {
    pub state: AppState,
}

impl CrimViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CrimViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // First frame: fetch the dataset for this session.
        if !self.state.loaded_once {
            self.state.dispatch(Command::Load);
        }

        let mut commands = Vec::new();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            commands.extend(panels::top_bar(ui, &self.state));
        });

        // ---- Left side panel: view toggles ----
        egui::SidePanel::left("view_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                commands.extend(panels::side_panel(ui, &self.state));
            });

        // ---- Central panel: aggregate views + filters ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    ui.heading("CRIM Project Relationship Meta Data Viewer");
                    ui.label(
                        "Metadata for the Relationships in Citations: The Renaissance Imitation Mass",
                    );
                    ui.hyperlink_to("Visit the CRIM Project", "https://crimproject.org");
                    ui.separator();

                    if self.state.table.is_none() {
                        ui.label("No dataset loaded. Use File → Reload or File → Open snapshot…");
                        return;
                    }

                    panels::aggregate_views(ui, &self.state);
                    commands.extend(filters::filter_sections(ui, &self.state));
                });
        });

        for command in commands {
            self.state.dispatch(command);
        }
    }
}
