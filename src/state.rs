use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::data::filter::{distinct_values, filter_by_field, project, value_counts, Selection, ValueCount};
use crate::data::loader::load_file;
use crate::data::model::{CellValue, Field, RelationshipTable};
use crate::data::source::{RelationshipSource, StaticSource};
use crate::error::Result;
use crate::export::{save_csv, DownloadLink, Exporter};
use crate::session::SessionCache;

// ---------------------------------------------------------------------------
// Views and commands
// ---------------------------------------------------------------------------

/// Aggregate views toggled from the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum View {
    AllMetadata,
    SelectedMetadata,
    Counts(Field),
}

impl View {
    pub const ALL: [View; 6] = [
        View::AllMetadata,
        View::SelectedMetadata,
        View::Counts(Field::RelationshipType),
        View::Counts(Field::MusicalType),
        View::Counts(Field::ModelPiece),
        View::Counts(Field::DerivativePiece),
    ];

    pub fn label(self) -> String {
        match self {
            View::AllMetadata => "Show All Metadata Fields".to_string(),
            View::SelectedMetadata => {
                "Show Selected Metadata: ID, URL, Relationship Type, Musical Type, Model, Derivative"
                    .to_string()
            }
            View::Counts(Field::ModelPiece) => "Show Total Relationships per Model".to_string(),
            View::Counts(Field::DerivativePiece) => "Show Total Relationships per Derivative".to_string(),
            View::Counts(field) => format!("Show Total Relationships per {}", field.label()),
        }
    }
}

/// A discrete user action. Each one recomputes only what it affects.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Load the dataset if the session has none yet.
    Load,
    /// Refetch from the source, replacing the cached dataset.
    Reload,
    /// Switch the source to a local `.json` / `.csv` snapshot.
    OpenSnapshot(PathBuf),
    ToggleView(View),
    SetSelection { field: Field, values: Selection },
    ToggleValue { field: Field, value: CellValue },
    SelectAll(Field),
    SelectNone(Field),
    SetFilename { field: Field, filename: String },
    RequestExport(Field),
    SaveExport { field: Field, path: PathBuf },
}

// ---------------------------------------------------------------------------
// Per-dimension filter panel
// ---------------------------------------------------------------------------

/// State of one "Select Relationships by …" section.
#[derive(Debug, Clone)]
pub struct FilterPanel {
    pub field: Field,
    /// Values offered by the multi-select.
    pub options: Selection,
    pub selected: Selection,
    pub filename: String,
    /// Rows of the selected-metadata table passing `selected`.
    pub result: RelationshipTable,
    pub link: Option<DownloadLink>,
    /// Local export/filter error; never blocks the rest of the view.
    pub error: Option<String>,
}

impl FilterPanel {
    fn new(field: Field) -> Self {
        Self {
            field,
            options: Selection::new(),
            selected: Selection::new(),
            filename: String::new(),
            result: RelationshipTable::default(),
            link: None,
            error: None,
        }
    }

    fn recompute(&mut self, base: Option<&RelationshipTable>) {
        self.link = None;
        let Some(base) = base else {
            self.options.clear();
            self.result = RelationshipTable::default();
            return;
        };
        let outcome = distinct_values(base, self.field.column()).and_then(|options| {
            self.options = options;
            filter_by_field(base, self.field, &self.selected)
        });
        match outcome {
            Ok(result) => {
                self.result = result;
                self.error = None;
            }
            Err(e) => {
                self.result = base.empty_like();
                self.error = Some(format!("Error: {e}"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,
    session: SessionCache,
    exporter: Exporter,

    /// Full flattened dataset (None until loaded, or after a failed load).
    pub table: Option<Arc<RelationshipTable>>,

    /// The known columns only, in display order.
    pub selected_metadata: Option<RelationshipTable>,

    /// Value counts per filter dimension.
    pub counts: BTreeMap<Field, Vec<ValueCount>>,

    /// Enabled aggregate views.
    pub views: BTreeSet<View>,

    /// One panel per filter dimension, in [`Field::FILTERABLE`] order.
    pub filters: Vec<FilterPanel>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a load has been attempted this session.
    pub loaded_once: bool,
}

impl AppState {
    pub fn new(config: ViewerConfig, source: Box<dyn RelationshipSource>) -> Self {
        Self {
            exporter: Exporter::new(&config.export_mime),
            config,
            session: SessionCache::new(source),
            table: None,
            selected_metadata: None,
            counts: BTreeMap::new(),
            views: BTreeSet::new(),
            filters: Field::FILTERABLE.into_iter().map(FilterPanel::new).collect(),
            status_message: None,
            loaded_once: false,
        }
    }

    pub fn filter(&self, field: Field) -> Option<&FilterPanel> {
        self.filters.iter().find(|p| p.field == field)
    }

    fn filter_mut(&mut self, field: Field) -> Option<&mut FilterPanel> {
        self.filters.iter_mut().find(|p| p.field == field)
    }

    pub fn source_description(&self) -> String {
        self.session.source_description()
    }

    /// Apply one command.
    pub fn dispatch(&mut self, command: Command) {
        log::debug!("dispatch {command:?}");
        match command {
            Command::Load => {
                if self.table.is_none() {
                    let result = self.session.get();
                    self.apply_load(result);
                }
            }
            Command::Reload => {
                let result = self.session.reload();
                self.apply_load(result);
            }
            Command::OpenSnapshot(path) => match load_file(&path) {
                Ok(table) => {
                    log::info!("Loaded {} relationships from {}", table.len(), path.display());
                    let label = path.display().to_string();
                    self.session
                        .replace_source(Box::new(StaticSource::new(label, table)));
                    let result = self.session.get();
                    self.apply_load(result);
                }
                Err(e) => {
                    log::error!("Failed to load file: {e:#}");
                    self.status_message = Some(format!("Error: {e:#}"));
                }
            },
            Command::ToggleView(view) => {
                if !self.views.remove(&view) {
                    self.views.insert(view);
                }
            }
            Command::SetSelection { field, values } => {
                self.update_selection(field, |selected| *selected = values);
            }
            Command::ToggleValue { field, value } => {
                self.update_selection(field, |selected| {
                    if !selected.remove(&value) {
                        selected.insert(value);
                    }
                });
            }
            Command::SelectAll(field) => {
                let all = self.filter(field).map(|p| p.options.clone()).unwrap_or_default();
                self.update_selection(field, |selected| *selected = all);
            }
            Command::SelectNone(field) => {
                self.update_selection(field, |selected| selected.clear());
            }
            Command::SetFilename { field, filename } => {
                if let Some(panel) = self.filter_mut(field) {
                    panel.filename = filename;
                }
            }
            Command::RequestExport(field) => {
                let exporter = self.exporter.clone();
                let link_text = self.config.link_text.clone();
                if let Some(panel) = self.filter_mut(field) {
                    match exporter.table_link(&panel.result, &panel.filename, &link_text) {
                        Ok(link) => {
                            panel.link = Some(link);
                            panel.error = None;
                        }
                        Err(e) => {
                            log::error!("Export of {field} failed: {e}");
                            panel.link = None;
                            panel.error = Some(format!("Error: {e}"));
                        }
                    }
                }
            }
            Command::SaveExport { field, path } => {
                if let Some(panel) = self.filter_mut(field) {
                    panel.error = save_csv(&panel.result, &path)
                        .err()
                        .map(|e| format!("Error: {e}"));
                }
            }
        }
    }

    /// Ingest the outcome of a fetch and rebuild every derived view.
    fn apply_load(&mut self, result: Result<Arc<RelationshipTable>>) {
        self.loaded_once = true;
        match result {
            Ok(table) => {
                self.selected_metadata = match project(&table, &Field::ALL) {
                    Ok(projected) => Some(projected),
                    // Only reachable for an empty dataset, which has no columns.
                    Err(_) => Some(RelationshipTable::new(
                        Field::ALL.iter().map(|f| f.column().to_string()).collect(),
                        Vec::new(),
                    )),
                };
                self.counts = Field::FILTERABLE
                    .into_iter()
                    .filter_map(|f| value_counts(&table, f.column()).ok().map(|c| (f, c)))
                    .collect();
                self.table = Some(table);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load relationships: {e}");
                self.table = None;
                self.selected_metadata = None;
                self.counts.clear();
                self.status_message = Some(format!("Error: {e}"));
            }
        }

        let base = self.selected_metadata.as_ref();
        for panel in &mut self.filters {
            panel.recompute(base);
        }
    }

    fn update_selection(&mut self, field: Field, update: impl FnOnce(&mut Selection)) {
        let base = self.selected_metadata.as_ref();
        if let Some(panel) = self.filters.iter_mut().find(|p| p.field == field) {
            update(&mut panel.selected);
            panel.recompute(base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::flatten_records;
    use crate::error::ViewerError;

    struct Failing;

    impl RelationshipSource for Failing {
        fn fetch_relationships(&self) -> Result<RelationshipTable> {
            Err(ViewerError::Status {
                url: "http://x/".to_string(),
                status: 503,
            })
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }

    fn dataset() -> RelationshipTable {
        let records: Vec<serde_json::Value> = serde_json::from_str(
            r#"[
            {"id":1,"relationship_type":"Quotation","musical_type":"Mass","extra":"a",
             "model_observation":{"piece":{"piece_id":"M1"}},
             "derivative_observation":{"piece":{"piece_id":"D1"}},"url":"http://x/1"},
            {"id":2,"relationship_type":"Paraphrase","musical_type":"Mass","extra":"b",
             "model_observation":{"piece":{"piece_id":"M2"}},
             "derivative_observation":{"piece":{"piece_id":"M1"}},"url":"http://x/2"}
            ]"#,
        )
        .unwrap();
        flatten_records(&records).unwrap()
    }

    fn loaded() -> AppState {
        let mut state = AppState::new(
            ViewerConfig::default(),
            Box::new(StaticSource::new("test", dataset())),
        );
        state.dispatch(Command::Load);
        state
    }

    #[test]
    fn load_builds_projection_and_counts() {
        let state = loaded();
        assert_eq!(state.table.as_ref().unwrap().columns.len(), 7);
        let projected = state.selected_metadata.as_ref().unwrap();
        assert_eq!(projected.columns.len(), 6);
        assert_eq!(state.counts[&Field::MusicalType][0].count, 2);
        assert!(state.filters.iter().all(|p| p.result.is_empty()));
    }

    #[test]
    fn toggling_values_recomputes_only_that_panel() {
        let mut state = loaded();
        state.dispatch(Command::ToggleValue {
            field: Field::RelationshipType,
            value: "Quotation".into(),
        });
        assert_eq!(state.filter(Field::RelationshipType).unwrap().result.len(), 1);
        assert!(state.filter(Field::MusicalType).unwrap().result.is_empty());

        state.dispatch(Command::ToggleValue {
            field: Field::RelationshipType,
            value: "Quotation".into(),
        });
        assert!(state.filter(Field::RelationshipType).unwrap().result.is_empty());
    }

    #[test]
    fn derivative_panel_filters_derivative_ids() {
        let mut state = loaded();
        state.dispatch(Command::SetSelection {
            field: Field::DerivativePiece,
            values: [CellValue::from("M1")].into(),
        });
        let result = &state.filter(Field::DerivativePiece).unwrap().result;
        assert_eq!(result.len(), 1);
        assert_eq!(result.cell(0, 0), &CellValue::Integer(2));
    }

    #[test]
    fn select_all_and_none() {
        let mut state = loaded();
        state.dispatch(Command::SelectAll(Field::ModelPiece));
        assert_eq!(state.filter(Field::ModelPiece).unwrap().result.len(), 2);
        state.dispatch(Command::SelectNone(Field::ModelPiece));
        assert!(state.filter(Field::ModelPiece).unwrap().result.is_empty());
    }

    #[test]
    fn export_request_produces_link() {
        let mut state = loaded();
        state.dispatch(Command::SelectAll(Field::MusicalType));
        state.dispatch(Command::SetFilename {
            field: Field::MusicalType,
            filename: "mass.csv".to_string(),
        });
        state.dispatch(Command::RequestExport(Field::MusicalType));

        let link = state.filter(Field::MusicalType).unwrap().link.clone().unwrap();
        assert_eq!(link.filename.as_deref(), Some("mass.csv"));
        let csv = String::from_utf8(link.payload().unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("id,relationship_type,musical_type,"));
    }

    #[test]
    fn export_with_empty_selection_is_header_only() {
        let mut state = loaded();
        state.dispatch(Command::RequestExport(Field::RelationshipType));
        let panel = state.filter(Field::RelationshipType).unwrap();
        let link = panel.link.as_ref().unwrap();
        assert!(link.warning.is_some());
        assert_eq!(String::from_utf8(link.payload().unwrap()).unwrap().lines().count(), 1);
        assert!(panel.error.is_none());
    }

    #[test]
    fn failed_load_surfaces_error_without_table() {
        let mut state = AppState::new(ViewerConfig::default(), Box::new(Failing));
        state.dispatch(Command::Load);
        assert!(state.loaded_once);
        assert!(state.table.is_none());
        assert!(state.selected_metadata.is_none());
        assert!(state.status_message.as_deref().unwrap().contains("503"));
    }

    #[test]
    fn views_toggle_on_and_off() {
        let mut state = loaded();
        state.dispatch(Command::ToggleView(View::Counts(Field::ModelPiece)));
        assert!(state.views.contains(&View::Counts(Field::ModelPiece)));
        state.dispatch(Command::ToggleView(View::Counts(Field::ModelPiece)));
        assert!(state.views.is_empty());
    }

    #[test]
    fn open_snapshot_replaces_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        crate::export::save_csv(&dataset(), &path).unwrap();

        let mut state = AppState::new(ViewerConfig::default(), Box::new(Failing));
        state.dispatch(Command::Load);
        assert!(state.table.is_none());

        state.dispatch(Command::OpenSnapshot(path.clone()));
        assert_eq!(state.table.as_ref().unwrap().len(), 2);
        assert_eq!(state.source_description(), path.display().to_string());
        assert!(state.status_message.is_none());
    }
}
