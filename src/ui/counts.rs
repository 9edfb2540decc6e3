use eframe::egui::{self, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::color::ColorMap;
use crate::data::filter::ValueCount;
use crate::data::model::Field;

// ---------------------------------------------------------------------------
// "Total Relationships per …" views
// ---------------------------------------------------------------------------

/// Render value counts for one column as a bar chart plus a list.
pub fn counts_view(ui: &mut Ui, field: Field, counts: &[ValueCount]) {
    if counts.is_empty() {
        ui.label("No values.");
        return;
    }

    let color_map = ColorMap::from_counts(counts);
    let bars: Vec<Bar> = counts
        .iter()
        .enumerate()
        .map(|(i, vc)| {
            Bar::new(i as f64, vc.count as f64)
                .name(vc.value.to_string())
                .fill(color_map.color_for(&vc.value))
                .width(0.8)
        })
        .collect();

    Plot::new(("counts_plot", field))
        .height(220.0)
        .y_axis_label("Relationships")
        .show_x(false)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(field.label()));
        });

    egui::CollapsingHeader::new(format!("{} distinct values", counts.len()))
        .id_salt(("counts_list", field))
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new(("counts_grid", field))
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.strong(field.label());
                    ui.strong("Count");
                    ui.end_row();
                    for vc in counts {
                        ui.label(vc.value.to_string());
                        ui.label(vc.count.to_string());
                        ui.end_row();
                    }
                });
        });
}
