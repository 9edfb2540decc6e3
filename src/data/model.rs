use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{Result, ViewerError};

// ---------------------------------------------------------------------------
// CellValue – a single cell of the flattened table
// ---------------------------------------------------------------------------

/// One cell of the flattened table. JSON arrays are not flattened; they are
/// stored as a `String` holding their JSON text.
///
/// Equality, ordering and hashing all go through [`Ord::cmp`], so values can
/// key `BTreeSet`s and `HashSet`s interchangeably. Floats compare with
/// `total_cmp`, which keeps `0.0` and `-0.0` apart.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Missing-value sentinel: absent field or JSON `null`.
    Null,
}

impl CellValue {
    /// Position in the cross-type order: Null, Bool, Integer, Float, String.
    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Integer(_) => 2,
            CellValue::Float(_) => 3,
            CellValue::String(_) => 4,
        }
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Float(a), CellValue::Float(b)) => a.total_cmp(b),
            (CellValue::String(a), CellValue::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            CellValue::String(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text written into a CSV field. `Null` becomes an empty field and
    /// floats keep a fractional part (`2.0`, not `2`).
    pub fn to_csv_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Float(v) => format!("{v:?}"),
            other => other.to_string(),
        }
    }

    /// Type a CSV field read back from disk.
    ///
    /// A quoted field is always a `String`. An unquoted one is `Null` when
    /// empty, then a number or boolean only when it is written exactly the
    /// way [`CellValue::to_csv_field`] would write that value, so `007` or
    /// `1.50` stay text.
    pub fn from_csv_field(text: &str, quoted: bool) -> CellValue {
        if quoted {
            return CellValue::String(text.to_string());
        }
        if text.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = text.parse::<i64>() {
            if i.to_string() == text {
                return CellValue::Integer(i);
            }
        }
        // Digits required: "inf" and "NaN" parse as floats but are words.
        if text.bytes().any(|b| b.is_ascii_digit()) {
            if let Ok(f) = text.parse::<f64>() {
                if format!("{f:?}") == text {
                    return CellValue::Float(f);
                }
            }
        }
        match text {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::String(text.to_string()),
        }
    }

    /// Whether this cell must be quoted in CSV to read back as itself:
    /// strings that contain CSV syntax, and strings an unquoted reader would
    /// take for another type (`""`, `"12"`, `"true"`).
    pub fn needs_csv_quotes(&self) -> bool {
        match self {
            CellValue::String(s) => {
                s.contains([',', '"', '\n', '\r'])
                    || CellValue::from_csv_field(s, false) != *self
            }
            _ => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

// ---------------------------------------------------------------------------
// Field – the columns the viewer knows by name
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Id,
    RelationshipType,
    MusicalType,
    ModelPiece,
    DerivativePiece,
    Url,
}

impl Field {
    /// Every known column, in the order of the "selected metadata" view.
    pub const ALL: [Field; 6] = [
        Field::Id,
        Field::RelationshipType,
        Field::MusicalType,
        Field::ModelPiece,
        Field::DerivativePiece,
        Field::Url,
    ];

    /// The four dimensions offered as filters.
    pub const FILTERABLE: [Field; 4] = [
        Field::RelationshipType,
        Field::MusicalType,
        Field::ModelPiece,
        Field::DerivativePiece,
    ];

    /// Flattened column name in the upstream data.
    pub fn column(self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::RelationshipType => "relationship_type",
            Field::MusicalType => "musical_type",
            Field::ModelPiece => "model_observation.piece.piece_id",
            Field::DerivativePiece => "derivative_observation.piece.piece_id",
            Field::Url => "url",
        }
    }

    /// Human readable label for headings.
    pub fn label(self) -> &'static str {
        match self {
            Field::Id => "ID",
            Field::RelationshipType => "Relationship Type",
            Field::MusicalType => "Musical Type",
            Field::ModelPiece => "Model ID",
            Field::DerivativePiece => "Derivative ID",
            Field::Url => "URL",
        }
    }

    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.column() == name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// RelationshipTable – the flattened dataset
// ---------------------------------------------------------------------------

/// One row; holds exactly one cell per table column.
pub type Row = Vec<CellValue>;

/// Rectangular table of relationship records with ordered, named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelationshipTable {
    /// Column names in first-seen order.
    pub columns: Vec<String>,
    /// Rows in fetch order.
    pub rows: Vec<Row>,
}

impl RelationshipTable {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        RelationshipTable { columns, rows }
    }

    /// A table with the same columns and no rows.
    pub fn empty_like(&self) -> Self {
        RelationshipTable {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Like [`column_index`](Self::column_index) but fails for unknown columns.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ViewerError::FilterFieldMissing(name.to_string()))
    }

    /// Cell at `(row, column)`.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        &self.rows[row][column]
    }

    /// All cells of one column, in row order.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |r| &r[column])
    }

    /// Copy the given rows (by index, in the given order) into a new table.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        RelationshipTable {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Fail fast when upstream data no longer carries every known column.
    ///
    /// An empty dataset has no columns at all and is accepted as-is.
    pub fn validate_schema(&self) -> Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let present: BTreeSet<&str> = self.columns.iter().map(String::as_str).collect();
        let missing: Vec<String> = Field::ALL
            .iter()
            .map(|f| f.column())
            .filter(|c| !present.contains(c))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ViewerError::SchemaDrift(missing))
        }
    }
}
