use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use structural_equivalency as se;
use structural_equivalency::Value;

fn paths(mismatches: &[se::Mismatch]) -> Vec<String> {
    mismatches.iter().map(|m| m.path.to_string()).collect()
}

#[test]
fn test_order_matters_by_default() {
    let m = se::compare(&Value::seq([1, 2, 3]), &Value::seq([3, 2, 1]), |o| o).unwrap();
    assert_eq!(paths(&m), vec!["[0]", "[2]"]);
    assert_eq!(m[0].render("subject"), "Expected subject[0] to be 3, but found 1.");
}

#[test]
fn test_order_can_be_ignored() {
    let m = se::compare(&Value::seq([1, 2, 3]), &Value::seq([3, 2, 1]), |o| {
        o.without_strict_ordering()
    })
    .unwrap();
    assert!(m.is_empty());
}

#[test]
fn test_length_mismatch_is_reported_once() {
    let m = se::compare(&Value::seq([1, 2]), &Value::seq([1, 2, 3]), |o| o).unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(
        m[0].render("subject"),
        "Expected subject to be a collection with 3 item(s), \
         but [1, 2] contains 1 item(s) less than [1, 2, 3]."
    );

    let more = se::compare(&Value::seq([1, 2, 3, 4]), &Value::seq([1, 2, 3]), |o| o).unwrap();
    assert_eq!(
        more[0].render("subject"),
        "Expected subject to be a collection with 3 item(s), \
         but [1, 2, 3, 4] contains 1 item(s) more than [1, 2, 3]."
    );
}

#[test]
fn test_ordering_overrides_are_scoped_to_their_path() {
    let subject = Value::from(json!({ "Items": [1, 2, 3], "Other": [1, 2] }));
    let expectation = Value::from(json!({ "Items": [3, 2, 1], "Other": [2, 1] }));

    let m =
        se::compare(&subject, &expectation, |o| o.without_strict_ordering_for("Items")).unwrap();
    assert_eq!(paths(&m), vec!["Other[0]", "Other[1]"]);

    let latest_wins = se::compare(&subject, &expectation, |o| {
        o.without_strict_ordering()
            .with_strict_ordering_for("Items")
            .without_strict_ordering_for("Items")
    })
    .unwrap();
    assert!(latest_wins.is_empty());

    let strict_items = se::compare(&subject, &expectation, |o| {
        o.without_strict_ordering().with_strict_ordering_for("Items")
    })
    .unwrap();
    assert_eq!(paths(&strict_items), vec!["Items[0]", "Items[2]"]);
}

#[test]
fn test_unordered_objects_report_under_the_expectation_index() {
    let subject = Value::from(json!([
        { "Name": "c", "Age": 3 },
        { "Name": "a", "Age": 1 },
        { "Name": "b", "Age": 2 }
    ]));
    let expectation = Value::from(json!([
        { "Name": "a", "Age": 1 },
        { "Name": "b", "Age": 20 },
        { "Name": "c", "Age": 3 }
    ]));
    let m = se::compare(&subject, &expectation, |o| o.without_strict_ordering()).unwrap();
    assert_eq!(paths(&m), vec!["[1].Age"]);
    assert_eq!(m[0].expected, "20");
    assert_eq!(m[0].actual, "2");
}

#[test]
fn test_dictionaries_ignore_key_order() {
    let subject = Value::map([("Foo", 1), ("Bar", 2)]);
    let expectation = Value::map([("Bar", 2), ("Foo", 1)]);
    assert!(se::compare(&subject, &expectation, |o| o).unwrap().is_empty());
}

#[test]
fn test_dictionary_value_mismatch_names_the_key() {
    let subject = Value::map([("Foo", 1), ("Bar", 2)]);
    let expectation = Value::map([("Foo", 1), ("Bar", 3)]);
    let m = se::compare(&subject, &expectation, |o| o).unwrap();
    assert_eq!(paths(&m), vec!["[Bar]"]);
    assert_eq!(m[0].render("subject"), "Expected subject[Bar] to be 3, but found 2.");
}

#[test]
fn test_additional_keys() {
    let subject = Value::map([("Foo", 1), ("Bar", 2)]);
    let expectation = Value::map([("Foo", 1)]);
    let m = se::compare(&subject, &expectation, |o| o).unwrap();
    assert_eq!(m.len(), 1);
    assert_eq!(m[0].render("subject"), "Expected subject not to contain key \"Bar\", but it does.");
    let allowed = se::compare(&subject, &expectation, |o| o.allowing_additional_keys()).unwrap();
    assert!(allowed.is_empty());
    assert!(se::compare(&subject, &expectation, |o| o.excluding("Bar")).unwrap().is_empty());
}

#[test]
fn test_structure_mismatches() {
    let not_a_collection = se::compare(&Value::from(1), &Value::seq([1]), |o| o).unwrap();
    assert_eq!(
        not_a_collection[0].render("subject"),
        "Expected subject to be a collection equivalent to [1], but found 1."
    );
    let not_a_dictionary = se::compare(&Value::seq([1]), &Value::map([("Foo", 1)]), |o| o).unwrap();
    assert_eq!(not_a_dictionary.len(), 1);
}

/// Six-wide lists nested `depth` levels deep, with leaves counting up from `first`.
fn nested(depth: usize, first: i64) -> Value {
    if depth == 0 {
        return Value::seq((0..6).map(|i| first + i));
    }
    Value::seq((0..6).map(|_| nested(depth - 1, first)))
}

#[test]
fn test_nested_unordered_collections_stay_tractable() {
    let leaf_comparisons = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&leaf_comparisons);
    let m = se::compare(&nested(2, 100), &nested(2, 0), move |o| {
        o.without_strict_ordering().using_when(
            "counted leaf equality",
            |c: &se::Comparands<'_>, _: &se::Path| matches!(c.expectation, Value::Scalar(_)),
            move |s: &Value, e: &Value| {
                counter.fetch_add(1, Ordering::Relaxed);
                s.to_string() == e.to_string()
            },
        )
    })
    .unwrap();

    assert_eq!(m.len(), 216);
    assert_eq!(m[0].path.to_string(), "[0][0][0]");
    assert_eq!(m[215].path.to_string(), "[5][5][5]");
    // Every leaf differs, which is the worst case for closest-match pairing.
    assert!(leaf_comparisons.load(Ordering::Relaxed) < 20_000);
}
