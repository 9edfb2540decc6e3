use std::collections::BTreeSet;

use proptest::prelude::*;

use crim_viewer::data::filter::{distinct_values, filter_by, filter_by_field, Selection};
use crim_viewer::data::loader::{parse_relationships, read_csv};
use crim_viewer::data::model::{CellValue, Field, RelationshipTable};
use crim_viewer::export::{encode_csv, to_download_link};

const SINGLE: &str = r#"[{"id":1,"relationship_type":"Quotation","musical_type":"Mass","model_observation":{"piece":{"piece_id":"M1"}},"derivative_observation":{"piece":{"piece_id":"D1"}},"url":"http://x/1"}]"#;

fn single() -> RelationshipTable {
    parse_relationships(SINGLE).unwrap()
}

fn selection(values: &[&str]) -> Selection {
    values.iter().map(|v| CellValue::from(*v)).collect()
}

#[test]
fn test_filter_single_record_by_relationship_type() {
    let table = single();

    let hit = filter_by_field(&table, Field::RelationshipType, &selection(&["Quotation"])).unwrap();
    assert_eq!(hit, table);

    let miss = filter_by_field(&table, Field::RelationshipType, &selection(&["Paraphrase"])).unwrap();
    assert!(miss.is_empty());
    assert_eq!(miss.columns, table.columns);
}

#[test]
fn test_encode_single_record_is_two_lines() {
    let csv = String::from_utf8(encode_csv(&single()).unwrap()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().unwrap().clone();
    let id_col = headers.iter().position(|h| h == "id").unwrap();
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[id_col], "1");
}

#[test]
fn test_download_link_carries_filtered_csv() {
    let table = single();
    let bytes = encode_csv(&table).unwrap();
    let link = to_download_link(&bytes, "quotations.csv", "Click here to download your data!");

    assert_eq!(link.payload().unwrap(), bytes);
    assert_eq!(read_csv(link.payload().unwrap().as_slice()).unwrap(), table);
}

#[test]
fn test_round_trip_with_special_characters() {
    let table = RelationshipTable::new(
        vec!["id".to_string(), "remark".to_string(), "note".to_string()],
        vec![
            vec![CellValue::Integer(1), CellValue::from("a, b"), CellValue::from("said \"yes\"")],
            vec![CellValue::Integer(2), CellValue::from("line\nbreak"), CellValue::Null],
        ],
    );
    let decoded = read_csv(encode_csv(&table).unwrap().as_slice()).unwrap();
    assert_eq!(decoded, table);
}

#[test]
fn test_snapshot_round_trip_keeps_cell_types() {
    let text = SINGLE.replace(r#""url":"http://x/1""#, r#""url":"http://x/1","score":2.0,"remarks":"","code":"007""#);
    let table = parse_relationships(&text).unwrap();
    let tail: Vec<&CellValue> = table.rows[0].iter().skip(6).collect();
    assert_eq!(
        tail,
        vec![&CellValue::Float(2.0), &CellValue::from(""), &CellValue::from("007")]
    );

    let decoded = read_csv(encode_csv(&table).unwrap().as_slice()).unwrap();
    assert_eq!(decoded, table);
}

#[test]
fn test_filter_unknown_field_is_reported() {
    assert!(filter_by(&single(), "composer", &selection(&["x"])).is_err());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn category() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        4 => prop::sample::select(vec!["Quotation", "Paraphrase", "Parody", "Mechanical"])
            .prop_map(|s| CellValue::from(s)),
        1 => Just(CellValue::Null),
    ]
}

fn table_strategy() -> impl Strategy<Value = RelationshipTable> {
    prop::collection::vec(category(), 0..40).prop_map(|cats| {
        let rows = cats
            .into_iter()
            .enumerate()
            .map(|(i, cat)| vec![CellValue::Integer(i as i64), cat])
            .collect();
        RelationshipTable::new(vec!["id".to_string(), "relationship_type".to_string()], rows)
    })
}

/// Free text, including CSV syntax and text that looks like other types.
fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        proptest::string::string_regex("[a-zA-Z0-9 ,.\"\n-]{0,12}").unwrap(),
        prop::sample::select(vec!["", "007", "12", "2.0", "-0.0", "true", "1e5", "NaN", "[1,2]"])
            .prop_map(str::to_string),
    ]
}

/// Any cell a flattened record can hold.
fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        text().prop_map(CellValue::String),
        any::<i64>().prop_map(CellValue::Integer),
        (-1.0e12..1.0e12f64).prop_map(CellValue::Float),
        prop::sample::select(vec![0.0, -0.0, 2.0, 1e-7, 1e300]).prop_map(CellValue::Float),
        any::<bool>().prop_map(CellValue::Bool),
        Just(CellValue::Null),
    ]
}

proptest! {
    #[test]
    fn prop_filter_returns_subset_with_accepted_values(
        table in table_strategy(),
        accepted in prop::collection::btree_set(category(), 0..4),
    ) {
        let out = filter_by(&table, "relationship_type", &accepted).unwrap();

        let source_ids: BTreeSet<&CellValue> = table.column_values(0).collect();
        for row in &out.rows {
            prop_assert!(source_ids.contains(&row[0]));
            prop_assert!(accepted.contains(&row[1]));
        }

        // Relative order is preserved.
        let ids: Vec<&CellValue> = out.column_values(0).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        prop_assert_eq!(ids, sorted);
    }

    #[test]
    fn prop_empty_selection_is_empty(table in table_strategy()) {
        let out = filter_by(&table, "relationship_type", &Selection::new()).unwrap();
        prop_assert!(out.is_empty());
    }

    #[test]
    fn prop_all_non_null_values_keep_populated_rows(table in table_strategy()) {
        let mut all = distinct_values(&table, "relationship_type").unwrap();
        all.remove(&CellValue::Null);

        let out = filter_by(&table, "relationship_type", &all).unwrap();
        let expected: Vec<_> = table.rows.iter().filter(|r| !r[1].is_null()).cloned().collect();
        prop_assert_eq!(out.rows, expected);
    }

    #[test]
    fn prop_csv_round_trip(values in prop::collection::vec((cell(), cell()), 1..10)) {
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(i, (a, b))| vec![CellValue::Integer(i as i64), a, b])
            .collect();
        let table = RelationshipTable::new(
            vec!["id".to_string(), "a".to_string(), "b".to_string()],
            rows,
        );
        let decoded = read_csv(encode_csv(&table).unwrap().as_slice()).unwrap();
        prop_assert_eq!(decoded, table);
    }
}
