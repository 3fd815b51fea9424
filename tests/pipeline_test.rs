use serde_json::{json, Value};
use tlnk::utils::dtype::{to_bool, to_date_iso, Truth};
use tlnk::{DataCleaner, DataConverter, PipelineError};

fn as_json(records: &[tlnk::Record]) -> Value {
    serde_json::to_value(records).unwrap()
}

#[test]
fn test_drop_nulls_then_duplicates() {
    let rows = json!([
        {"name": "Alice", "age": "30"},
        {"name": "", "age": "25"},
        {"name": "Alice", "age": "30"},
    ]);
    let cleaner = DataCleaner::from_json(&rows)
        .unwrap()
        .drop_nulls(Some(&["name"]))
        .drop_duplicates(Some(&["name", "age"]));

    assert_eq!(as_json(cleaner.to_list()), json!([{"name": "Alice", "age": "30"}]));
    let summary = cleaner.summary();
    assert_eq!(summary.original_count, 3);
    assert_eq!(summary.dropped, 2);
}

#[test]
fn test_unrecognised_bool_is_unknown() {
    assert_eq!(to_bool(&json!("maybe")), Truth::Unknown);
    assert_ne!(to_bool(&json!("maybe")), Truth::False);

    let converted = DataConverter::from_json(&json!([{"ok": "maybe"}, {"ok": "no"}]))
        .unwrap()
        .to_bool(&["ok"]);
    assert_eq!(as_json(converted.to_list()), json!([{"ok": null}, {"ok": false}]));
}

#[test]
fn test_date_normalisation() {
    assert_eq!(to_date_iso(&json!("15/01/2024")).as_deref(), Some("2024-01-15"));
    assert_eq!(to_date_iso(&json!("not a date")), None);
}

#[test]
fn test_unknown_cast_leaves_dataset_untouched() {
    let err = DataConverter::from_json(&json!([{"name": "Alice", "age": "30"}]))
        .unwrap()
        .try_cast([("name", "str"), ("age", "unknown")])
        .unwrap_err();

    assert!(matches!(err.source, PipelineError::UnknownType { ref dtype, .. } if dtype == "unknown"));
    let converter = err.into_converter();
    assert_eq!(converter.to_list()[0]["age"], "30");

    let converted = converter.to_int(&["age"]);
    assert_eq!(as_json(converted.to_list()), json!([{"name": "Alice", "age": 30}]));
}

#[test]
fn test_two_digit_years_are_not_dates() {
    let converted = DataConverter::from_json(&json!([{"d": "15-01-24"}, {"d": "2024-1-5"}]))
        .unwrap()
        .to_date_iso(&["d"]);
    assert_eq!(as_json(converted.to_list()), json!([{"d": null}, {"d": "2024-01-05"}]));
}

#[test]
fn test_fill_null_replaces_blank_strings() {
    let cleaned = DataCleaner::from_json(&json!([{"name": "  "}]))
        .unwrap()
        .fill_null("N/A", Some(&["name"]));
    assert_eq!(as_json(cleaned.to_list()), json!([{"name": "N/A"}]));
}

#[test]
fn test_source_records_are_not_mutated() {
    let rows = DataCleaner::from_json(&json!([{"name": " Bob ", "age": "41"}]))
        .unwrap()
        .into_records();
    let snapshot = rows.clone();

    let _ = DataCleaner::new(&rows)
        .strip_whitespace(None)
        .rename_columns([("name", "full_name")]);
    let _ = DataConverter::new(&rows).to_int(&["age"]);

    assert_eq!(rows, snapshot);
}

#[test]
fn test_rejects_non_record_input() {
    let err = DataCleaner::from_json(&json!([{"a": 1}, 2])).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(ref m) if m.contains("Row 1")));
    assert!(DataConverter::from_json(&json!({"a": 1})).is_err());
}

#[test]
fn test_clean_then_cast() {
    let rows = json!([
        {"Name": " Alice  Smith ", "Age": "30", "Joined": "2024/01/15", "Active": "yes"},
        {"Name": "Bob", "Age": "1,200", "Joined": "garbage", "Active": "0"},
    ]);
    let cleaned = DataCleaner::from_json(&rows)
        .unwrap()
        .strip_whitespace(None)
        .rename_columns([("Name", "name"), ("Age", "age"), ("Joined", "joined"), ("Active", "active")])
        .into_records();
    let converted = DataConverter::from(cleaned)
        .try_cast([("age", "int"), ("joined", "date"), ("active", "bool")])
        .unwrap();

    assert_eq!(
        as_json(converted.to_list()),
        json!([
            {"name": "Alice Smith", "age": 30, "joined": "2024-01-15", "active": true},
            {"name": "Bob", "age": 1200, "joined": null, "active": false},
        ])
    );
}
