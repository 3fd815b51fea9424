//! Property tests for the record pipeline and scalar coercion.

use proptest::collection::{btree_map, vec as prop_vec};
use proptest::prelude::*;
use serde_json::{json, Value};
use tlnk::utils::dtype::{to_int, to_str};
use tlnk::{DataCleaner, DataConverter, Record};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-5i64..5).prop_map(Value::from),
        prop::sample::select(vec!["", " ", "a", " a ", "b"]).prop_map(Value::from),
    ]
}

fn record() -> impl Strategy<Value = Record> {
    let key = prop::sample::select(vec!["a", "b", "c"]).prop_map(str::to_string);
    btree_map(key, scalar(), 0..4).prop_map(|m| m.into_iter().collect())
}

fn records() -> impl Strategy<Value = Vec<Record>> {
    prop_vec(record(), 0..12)
}

fn key_subset() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["a", "b", "c"], 0..=3)
}

proptest! {
    #[test]
    fn drop_duplicates_is_idempotent(rows in records()) {
        let once = DataCleaner::new(&rows).drop_duplicates(None).into_records();
        let twice = DataCleaner::new(&once).drop_duplicates(None).into_records();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn keyed_drop_duplicates_is_idempotent(rows in records(), keys in key_subset()) {
        let once = DataCleaner::new(&rows).drop_duplicates(Some(keys.as_slice())).into_records();
        let twice = DataCleaner::new(&once).drop_duplicates(Some(keys.as_slice())).into_records();
        prop_assert!(once.len() <= rows.len());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn filters_only_shrink(rows in records()) {
        let cleaner = DataCleaner::new(&rows)
            .drop_nulls(Some(&["a"]))
            .drop_duplicates(Some(&["b"]));
        let summary = cleaner.summary();
        prop_assert!(summary.cleaned_count <= rows.len());
        prop_assert_eq!(summary.original_count, rows.len());
        prop_assert_eq!(summary.cleaned_count + summary.dropped, rows.len());
    }

    #[test]
    fn per_record_stages_keep_length(rows in records()) {
        let cleaned = DataCleaner::new(&rows)
            .strip_whitespace(None)
            .fill_null("x", None)
            .rename_columns([("a", "z")])
            .select_columns(&["z", "b"]);
        prop_assert_eq!(cleaned.count(), rows.len());

        let converted = DataConverter::new(&rows).try_cast([("a", "int"), ("b", "bool")]).unwrap();
        prop_assert_eq!(converted.count(), rows.len());
    }

    #[test]
    fn stages_never_touch_the_input(rows in records()) {
        let snapshot = rows.clone();
        let _ = DataCleaner::new(&rows).strip_whitespace(None).fill_null(0, None);
        let _ = DataConverter::new(&rows).to_str(&["a", "b", "c"]);
        prop_assert_eq!(rows, snapshot);
    }

    #[test]
    fn int_survives_string_round_trip(n in any::<i64>()) {
        let s = to_str(&json!(n), "");
        prop_assert_eq!(to_int(&Value::String(s), None), Some(n));
    }
}
