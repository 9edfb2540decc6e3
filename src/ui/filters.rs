use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Command, FilterPanel};
use crate::ui::table::table_view;

// ---------------------------------------------------------------------------
// Central panel – one section per filter dimension
// ---------------------------------------------------------------------------

/// Render the four "Select Relationships by …" sections.
/// Widget interactions are returned as commands instead of mutating state.
pub fn filter_sections(ui: &mut Ui, state: &AppState) -> Vec<Command> {
    let mut commands = Vec::new();

    ui.label(
        "Use the following dialogues to filter for one or more Relationship Type, \
         Musical Type, Model, or Derivative.",
    );
    ui.label(
        "To download a CSV file with the given results, provide a filename, \
         then click the download button.",
    );

    for panel in &state.filters {
        ui.separator();
        filter_section(ui, panel, &mut commands);
    }
    commands
}

fn filter_section(ui: &mut Ui, panel: &FilterPanel, commands: &mut Vec<Command>) {
    let field = panel.field;
    ui.heading(format!("Select Relationships by {}", field.label()));

    let header_text = format!(
        "{}  ({}/{} selected)",
        field.label(),
        panel.selected.len(),
        panel.options.len()
    );
    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(("filter_values", field))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    commands.push(Command::SelectAll(field));
                }
                if ui.small_button("None").clicked() {
                    commands.push(Command::SelectNone(field));
                }
            });

            ScrollArea::vertical()
                .id_salt(("filter_scroll", field))
                .max_height(200.0)
                .show(ui, |ui: &mut Ui| {
                    for value in &panel.options {
                        let mut checked = panel.selected.contains(value);
                        if ui.checkbox(&mut checked, value.to_string()).changed() {
                            commands.push(Command::ToggleValue {
                                field,
                                value: value.clone(),
                            });
                        }
                    }
                });
        });

    if let Some(err) = &panel.error {
        ui.label(RichText::new(err).color(Color32::RED));
    }

    table_view(ui, &format!("filter_table_{}", field.column()), &panel.result);

    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("Provide {} filename for download:", field.label()));
        let mut filename = panel.filename.clone();
        if ui
            .add(egui::TextEdit::singleline(&mut filename).hint_text("results.csv"))
            .changed()
        {
            commands.push(Command::SetFilename { field, filename });
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        if ui
            .button(format!("Download {} Results as CSV", field.label()))
            .clicked()
        {
            commands.push(Command::RequestExport(field));
        }
        if ui.button("Save…").clicked() {
            if let Some(path) = save_file_dialog(&panel.filename) {
                commands.push(Command::SaveExport { field, path });
            }
        }
    });

    if let Some(link) = &panel.link {
        ui.horizontal(|ui: &mut Ui| {
            ui.hyperlink_to(&link.text, &link.href);
            if ui.small_button("Copy HTML").clicked() {
                ui.ctx().copy_text(link.to_html());
            }
        });
        if let Some(warning) = &link.warning {
            ui.label(RichText::new(warning.to_string()).color(Color32::YELLOW));
        }
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn save_file_dialog(filename: &str) -> Option<std::path::PathBuf> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Save filtered relationships")
        .add_filter("CSV", &["csv"]);
    if !filename.trim().is_empty() {
        dialog = dialog.set_file_name(filename);
    }
    dialog.save_file()
}
