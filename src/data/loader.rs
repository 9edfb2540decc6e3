use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context};
use serde_json::{Map, Value as JsonValue};

use super::model::{CellValue, RelationshipTable, Row};
use crate::error::{Result, ViewerError};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse the upstream JSON document into a flattened, schema-checked table.
///
/// Expected layout (records-oriented):
///
/// ```json
/// [
///   {
///     "id": 1,
///     "relationship_type": "Quotation",
///     "model_observation": { "piece": { "piece_id": "CRIM_Model_0001" } },
///     ...
///   },
///   ...
/// ]
/// ```
pub fn parse_relationships(text: &str) -> Result<RelationshipTable> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(ViewerError::NotAnArray)?;
    let table = flatten_records(records)?;
    table.validate_schema()?;
    Ok(table)
}

/// Load a local snapshot of the dataset.  Dispatch by extension.
///
/// Supported formats:
/// * `.json` – the upstream JSON array, flattened on load
/// * `.csv`  – a previously exported table
pub fn load_file(path: &Path) -> anyhow::Result<RelationshipTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "json" => {
            let text = std::fs::read_to_string(path).context("reading JSON file")?;
            parse_relationships(&text).context("parsing JSON")?
        }
        "csv" => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            let table = read_csv(file).context("reading CSV")?;
            table.validate_schema()?;
            table
        }
        other => bail!("Unsupported file extension: .{other}"),
    };
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON flattening
// ---------------------------------------------------------------------------

/// Flatten an array of JSON objects into a rectangular table.
///
/// Nested objects become dot-joined column names
/// (`model_observation.piece.piece_id`). Columns are the union over all
/// records in first-seen order; a record lacking a column gets `Null`.
pub fn flatten_records(records: &[JsonValue]) -> Result<RelationshipTable> {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, CellValue)>> = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or(ViewerError::RecordNotObject(i))?;

        let mut flat = Vec::new();
        flatten_object("", obj, &mut flat);

        let cells = flat
            .into_iter()
            .map(|(name, value)| {
                let col = *index.entry(name.clone()).or_insert_with(|| {
                    columns.push(name);
                    columns.len() - 1
                });
                (col, value)
            })
            .collect();
        sparse_rows.push(cells);
    }

    let width = columns.len();
    let rows = sparse_rows
        .into_iter()
        .map(|cells| {
            let mut row: Row = vec![CellValue::Null; width];
            for (col, value) in cells {
                row[col] = value;
            }
            row
        })
        .collect();

    Ok(RelationshipTable::new(columns, rows))
}

fn flatten_object(prefix: &str, obj: &Map<String, JsonValue>, out: &mut Vec<(String, CellValue)>) {
    for (key, val) in obj {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            JsonValue::Object(inner) => flatten_object(&name, inner, out),
            other => out.push((name, json_to_cell(other))),
        }
    }
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Read a CSV document (header row + records) back into a table.
///
/// Typing follows [`CellValue::from_csv_field`]: quoted fields are text,
/// unquoted ones may be `Null`, numbers or booleans. Reading what
/// [`crate::export::encode_csv`] wrote gives back an equal table.
pub fn read_csv<R: Read>(mut reader: R) -> Result<RelationshipTable> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;

    let mut csv_reader = csv::Reader::from_reader(raw.as_slice());
    let columns: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let start = record.position().map_or(0, |p| p.byte() as usize);
        records.push((start, record));
    }

    // The csv reader drops quoting, so each record's raw bytes are rescanned.
    let ends: Vec<usize> = records
        .iter()
        .skip(1)
        .map(|(start, _)| *start)
        .chain(std::iter::once(raw.len()))
        .collect();

    let rows: Vec<Row> = records
        .iter()
        .zip(ends)
        .map(|((start, record), end)| {
            let quoted = quoted_fields(&raw[*start..end]);
            record
                .iter()
                .enumerate()
                .map(|(i, text)| CellValue::from_csv_field(text, quoted.get(i).copied().unwrap_or(false)))
                .collect()
        })
        .collect();

    Ok(RelationshipTable::new(columns, rows))
}

/// For one raw CSV record, whether each field opened with a quote.
fn quoted_fields(raw: &[u8]) -> Vec<bool> {
    let mut quoted = Vec::new();
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut field_quoted = false;

    let body = raw.iter().skip_while(|&&b| b == b'\r' || b == b'\n');
    for &b in body {
        if in_quotes {
            // A doubled quote closes and reopens, which nets out.
            in_quotes = b != b'"';
            continue;
        }
        match b {
            b'"' => {
                field_quoted |= at_field_start;
                in_quotes = true;
                at_field_start = false;
            }
            b',' => {
                quoted.push(field_quoted);
                field_quoted = false;
                at_field_start = true;
            }
            b'\r' | b'\n' => break,
            _ => at_field_start = false,
        }
    }
    quoted.push(field_quoted);
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Field;

    const SINGLE: &str = r#"[{"id":1,"relationship_type":"Quotation","musical_type":"Mass",
        "model_observation":{"piece":{"piece_id":"M1"}},
        "derivative_observation":{"piece":{"piece_id":"D1"}},"url":"http://x/1"}]"#;

    #[test]
    fn flattens_nested_objects_with_dot_paths() {
        let table = parse_relationships(SINGLE).unwrap();
        assert_eq!(
            table.columns,
            vec![
                "id",
                "relationship_type",
                "musical_type",
                "model_observation.piece.piece_id",
                "derivative_observation.piece.piece_id",
                "url",
            ]
        );
        assert_eq!(table.len(), 1);
        let model = table.require_column(Field::ModelPiece.column()).unwrap();
        assert_eq!(table.cell(0, 0), &CellValue::Integer(1));
        assert_eq!(table.cell(0, model), &CellValue::from("M1"));
    }

    #[test]
    fn union_of_columns_fills_missing_with_null() {
        let records: Vec<JsonValue> =
            serde_json::from_str(r#"[{"a":1},{"b":{"c":true}},{"a":2,"d":[1,2]}]"#).unwrap();
        let table = flatten_records(&records).unwrap();

        assert_eq!(table.columns, vec!["a", "b.c", "d"]);
        assert_eq!(table.rows[0], vec![CellValue::Integer(1), CellValue::Null, CellValue::Null]);
        assert_eq!(table.rows[1], vec![CellValue::Null, CellValue::Bool(true), CellValue::Null]);
        assert_eq!(table.rows[2][2], CellValue::from("[1,2]"));
    }

    #[test]
    fn empty_nested_object_adds_no_column() {
        let records: Vec<JsonValue> = serde_json::from_str(r#"[{"a":1,"meta":{}}]"#).unwrap();
        let table = flatten_records(&records).unwrap();
        assert_eq!(table.columns, vec!["a"]);
    }

    #[test]
    fn rejects_non_array_and_non_object_records() {
        assert!(matches!(
            parse_relationships(r#"{"id":1}"#),
            Err(ViewerError::NotAnArray)
        ));
        assert!(matches!(
            parse_relationships(r#"[{"id":1}, 7]"#),
            Err(ViewerError::RecordNotObject(1))
        ));
        assert!(matches!(
            parse_relationships("[{"),
            Err(ViewerError::Parse(_))
        ));
    }

    #[test]
    fn rejects_records_missing_known_columns() {
        assert!(matches!(
            parse_relationships(r#"[{"id":1,"url":"u"}]"#),
            Err(ViewerError::SchemaDrift(_))
        ));
    }

    #[test]
    fn empty_array_is_an_empty_table() {
        let table = parse_relationships("[]").unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn quoted_fields_are_tracked_per_field() {
        assert_eq!(quoted_fields(b"1,,\"\",x\n"), vec![false, false, true, false]);
        assert_eq!(quoted_fields(b"\"a,\"\"b\"\"\",2\r\n"), vec![true, false]);
        assert_eq!(quoted_fields(b"\n\"line\nbreak\",\n"), vec![true, false]);
    }

    #[test]
    fn reads_quoted_text_as_strings() {
        let csv = "id,code,remarks,score,flag\n1,007,\"\",2.0,true\n\"2\",,\"12\",2,\"true\"\n";
        let table = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![
                    CellValue::Integer(1),
                    CellValue::from("007"),
                    CellValue::from(""),
                    CellValue::Float(2.0),
                    CellValue::Bool(true),
                ],
                vec![
                    CellValue::from("2"),
                    CellValue::Null,
                    CellValue::from("12"),
                    CellValue::Integer(2),
                    CellValue::from("true"),
                ],
            ]
        );
    }

    #[test]
    fn load_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("snapshot.json");
        std::fs::write(&json_path, SINGLE).unwrap();
        assert_eq!(load_file(&json_path).unwrap().len(), 1);

        let txt_path = dir.path().join("snapshot.txt");
        std::fs::write(&txt_path, SINGLE).unwrap();
        assert!(load_file(&txt_path).is_err());
    }
}
