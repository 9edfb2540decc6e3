use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{CellValue, Field, RelationshipTable};
use crate::error::Result;

// ---------------------------------------------------------------------------
// Filter predicate: which values are accepted for one column
// ---------------------------------------------------------------------------

/// Accepted values for a single column.
pub type Selection = BTreeSet<CellValue>;

/// Return indices of rows whose value at `column` is in `accepted`.
///
/// A row passes when:
/// * its value is a member of `accepted`
/// * its value is missing (`Null`) and `Null` itself is accepted
///
/// An empty `accepted` set lets nothing through.
pub fn matching_indices(table: &RelationshipTable, column: usize, accepted: &Selection) -> Vec<usize> {
    if accepted.is_empty() {
        return Vec::new();
    }
    table
        .column_values(column)
        .enumerate()
        .filter(|(_, value)| accepted.contains(*value))
        .map(|(i, _)| i)
        .collect()
}

/// Rows of `table` whose value at column `field` is in `accepted`,
/// in original order. The source table is left untouched.
pub fn filter_by(table: &RelationshipTable, field: &str, accepted: &Selection) -> Result<RelationshipTable> {
    let column = table.require_column(field)?;
    let indices = matching_indices(table, column, accepted);
    log::debug!(
        "filter {field}: {} of {} rows match {} accepted value(s)",
        indices.len(),
        table.len(),
        accepted.len()
    );
    Ok(table.select_rows(&indices))
}

/// Typed variant of [`filter_by`] for the known columns.
pub fn filter_by_field(table: &RelationshipTable, field: Field, accepted: &Selection) -> Result<RelationshipTable> {
    filter_by(table, field.column(), accepted)
}

// ---------------------------------------------------------------------------
// Projections and aggregates
// ---------------------------------------------------------------------------

/// Keep only the given columns, in the given order.
pub fn project(table: &RelationshipTable, fields: &[Field]) -> Result<RelationshipTable> {
    let indices = fields
        .iter()
        .map(|f| table.require_column(f.column()))
        .collect::<Result<Vec<_>>>()?;

    let columns = fields.iter().map(|f| f.column().to_string()).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
        .collect();
    Ok(RelationshipTable::new(columns, rows))
}

/// Sorted set of distinct values found in a column, `Null` included.
pub fn distinct_values(table: &RelationshipTable, field: &str) -> Result<Selection> {
    let column = table.require_column(field)?;
    Ok(table.column_values(column).cloned().collect())
}

/// Turn typed-in text into the column values it names.
///
/// Each entry selects every distinct value whose CSV text is equal to it, so
/// `"007"` finds a string id, `"12"` an integer one, and an empty entry
/// selects `Null`. Text that names nothing in the column is kept as a string
/// and simply matches no row.
pub fn resolve_selection<S: AsRef<str>>(table: &RelationshipTable, field: &str, raw: &[S]) -> Result<Selection> {
    let present = distinct_values(table, field)?;
    let mut selection = Selection::new();
    for text in raw.iter().map(AsRef::as_ref) {
        let before = selection.len();
        selection.extend(present.iter().filter(|v| v.to_csv_field() == text).cloned());
        if selection.len() == before {
            log::warn!("{field}: no row has the value {text:?}");
            selection.insert(CellValue::from(text));
        }
    }
    Ok(selection)
}

/// Number of rows per distinct value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: CellValue,
    pub count: usize,
}

/// Count rows per non-null value, most frequent first; ties are broken
/// by value order.
pub fn value_counts(table: &RelationshipTable, field: &str) -> Result<Vec<ValueCount>> {
    let column = table.require_column(field)?;
    let mut counts: BTreeMap<&CellValue, usize> = BTreeMap::new();
    for value in table.column_values(column).filter(|v| !v.is_null()) {
        *counts.entry(value).or_default() += 1;
    }

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.clone(),
            count,
        })
        .collect();
    // Stable sort keeps the value order among equal counts.
    out.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(out)
}
