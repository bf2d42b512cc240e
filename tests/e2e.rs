use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use structural_equivalency as se;
use structural_equivalency::{Configuration, Equivalency, Options, Value};

fn order(customer: &str, total: f64, lines: serde_json::Value) -> Value {
    Value::from(json!({
        "Customer": { "Name": customer, "Email": format!("{customer}@example.com") },
        "Total": total,
        "Lines": lines
    }))
}

#[test]
fn test_equivalent_documents() {
    let lines = json!([{ "Sku": "A-1", "Qty": 2 }, { "Sku": "B-7", "Qty": 1 }]);
    let subject = order("ann", 12.5, lines.clone());
    let expectation = order("ann", 12.5, lines);
    assert!(se::compare(&subject, &expectation, |o| o).unwrap().is_empty());
}

#[test]
fn test_every_difference_is_reported_in_traversal_order() {
    let subject = order("ann", 12.5, json!([{ "Sku": "A-1", "Qty": 2 }]));
    let expectation = order("bob", 10.0, json!([{ "Sku": "A-1", "Qty": 3 }]));
    let out = se::compare(&subject, &expectation, |o| o).unwrap();
    let rendered: Vec<String> = out.iter().map(|m| m.render("order")).collect();
    assert_eq!(
        rendered,
        vec![
            "Expected order.Customer.Email to be \"bob@example.com\", \
             but found \"ann@example.com\".",
            "Expected order.Customer.Name to be \"bob\", but found \"ann\".",
            "Expected order.Lines[0].Qty to be 3, but found 2.",
            "Expected order.Total to be 10.0, but found 12.5.",
        ]
    );
}

#[test]
fn test_member_mapping() {
    let subject = Value::from(json!({ "FullName": "Ann", "Owner": { "FullName": "Bob" } }));
    let expectation = Value::from(json!({ "Name": "Ann", "Owner": { "Name": "Bob" } }));
    let out = se::compare(&subject, &expectation, |o| {
        o.with_mapping("Name", "FullName")
    })
    .unwrap();
    assert!(out.is_empty());

    // A mapping scoped to Owner leaves the root member unmatched.
    let scoped = se::compare(&subject, &expectation, |o| {
        o.with_mapping("Owner.Name", "Owner.FullName")
    })
    .unwrap();
    let paths: Vec<String> = scoped.iter().map(|m| m.path.to_string()).collect();
    assert_eq!(paths, vec!["Name"]);
}

#[test]
fn test_custom_comparator_for_floats() {
    let subject = Value::from(json!({ "Price": 10.0001, "Name": "pen" }));
    let expectation = Value::from(json!({ "Price": 10.0, "Name": "pen" }));
    assert_eq!(se::compare(&subject, &expectation, |o| o).unwrap().len(), 1);

    let approx = |s: &Value, e: &Value| match (s, e) {
        (Value::Scalar(se::Scalar::Float(a)), Value::Scalar(se::Scalar::Float(b))) => {
            (a - b).abs() < 0.01
        }
        _ => false,
    };
    assert!(se::compare(&subject, &expectation, |o| o.using_for_type("float", approx))
        .unwrap()
        .is_empty());
}

#[test]
fn test_conditional_comparator_by_path() {
    let subject = Value::from(json!({ "Id": "A1B2", "Name": "pen" }));
    let expectation = Value::from(json!({ "Id": "a1b2", "Name": "pen" }));
    let out = se::compare(&subject, &expectation, |o| {
        o.using_when(
            "Id ignoring case",
            |_, path| path == "Id",
            |s, e| s.to_string().to_lowercase() == e.to_string().to_lowercase(),
        )
    })
    .unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_configuration_is_shared_between_threads() {
    let config: Arc<Configuration> = Arc::new(Options::new().excluding("Stamp").build().unwrap());
    std::thread::scope(|scope| {
        for i in 0..4 {
            let config = Arc::clone(&config);
            scope.spawn(move || {
                let subject = Value::from(json!({ "Id": i, "Stamp": i * 10 }));
                let expectation = Value::from(json!({ "Id": i, "Stamp": 0 }));
                assert!(se::compare_with(&subject, &expectation, &config).is_empty());
            });
        }
    });
}

#[test]
fn test_assertion_report() {
    let eq = Equivalency::default().named("order");
    let failure = eq
        .assert_equivalent(
            &Value::from(json!({ "Qty": 1 })),
            &Value::from(json!({ "Qty": 2 })),
            "stock moved",
        )
        .unwrap_err();
    assert!(failure.message.starts_with(
        "Expected order to be equivalent to the expectation because stock moved, but:\n\
         - Expected order.Qty to be 2, but found 1.\n"
    ));
    assert!(failure.to_string().contains("- Use strict ordering for collections"));
}

#[test]
fn test_mismatches_serialize_to_json() {
    let (subject, expectation) = (Value::from(json!({ "A": 1 })), Value::from(json!({ "A": 2 })));
    let out = se::compare(&subject, &expectation, |o| o).unwrap();
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(
        json,
        json!([{
            "path": "A",
            "template": "Expected {0} to be {1}, but found {2}.",
            "expected": "2",
            "actual": "1"
        }])
    );
}
