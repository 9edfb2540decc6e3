use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::{AppState, Command, View};
use crate::ui::counts::counts_view;
use crate::ui::table::table_view;

// ---------------------------------------------------------------------------
// Left side panel – aggregate view toggles
// ---------------------------------------------------------------------------

/// Render the left panel of view checkboxes.
pub fn side_panel(ui: &mut Ui, state: &AppState) -> Vec<Command> {
    let mut commands = Vec::new();

    ui.heading("Views");
    ui.separator();
    ui.label(
        "Use the checkboxes below to see all data of a given category. \
         Advanced filtering can be performed in the main window.",
    );
    ui.add_space(4.0);

    for view in View::ALL {
        let mut enabled = state.views.contains(&view);
        if ui.checkbox(&mut enabled, view.label()).changed() {
            commands.push(Command::ToggleView(view));
        }
    }

    commands
}

/// Render the enabled aggregate views, in side-panel order.
pub fn aggregate_views(ui: &mut Ui, state: &AppState) {
    for view in View::ALL {
        if !state.views.contains(&view) {
            continue;
        }
        match view {
            View::AllMetadata => {
                if let Some(table) = &state.table {
                    ui.heading("All CRIM Relationships with All Metadata");
                    table_view(ui, "all_metadata", table);
                }
            }
            View::SelectedMetadata => {
                if let Some(table) = &state.selected_metadata {
                    ui.heading(
                        "Selected Metadata: ID, URL, Relationship Type, Musical Type, Model, Derivative",
                    );
                    table_view(ui, "selected_metadata", table);
                }
            }
            View::Counts(field) => {
                if let Some(counts) = state.counts.get(&field) {
                    ui.heading(format!("Total Relationships per {}", field.label()));
                    counts_view(ui, field, counts);
                }
            }
        }
        ui.separator();
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &AppState) -> Vec<Command> {
    let mut commands = Vec::new();

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open snapshot…").clicked() {
                if let Some(path) = open_file_dialog() {
                    commands.push(Command::OpenSnapshot(path));
                }
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                commands.push(Command::Reload);
                ui.close_menu();
            }
        });

        ui.separator();

        match &state.table {
            Some(table) => {
                ui.label(format!(
                    "{} relationships loaded from {}",
                    table.len(),
                    state.source_description()
                ));
            }
            None => {
                ui.label(format!("No data from {}", state.source_description()));
            }
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    commands
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn open_file_dialog() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open relationship snapshot")
        .add_filter("Supported files", &["json", "csv"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file()
}
