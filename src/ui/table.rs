use eframe::egui::Ui;
use egui_extras::{Column, TableBuilder};

use crate::data::model::RelationshipTable;

const ROW_HEIGHT: f32 = 18.0;

/// Render a relationship table with a sticky header and virtualised rows.
pub fn table_view(ui: &mut Ui, id: &str, table: &RelationshipTable) {
    ui.label(format!("{} rows × {} columns", table.len(), table.columns.len()));
    if table.columns.is_empty() {
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(300.0)
            .columns(Column::auto().at_least(60.0).clip(true), table.columns.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for name in &table.columns {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.len(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            if !cell.is_null() {
                                ui.label(cell.to_string());
                            }
                        });
                    }
                });
            });
    });
}
