use crate::comparands::Comparands;
use crate::config::{Configuration, CyclicReferenceHandling, EnumEquivalency, Typing};
use crate::context::{Context, VisitKey};
use crate::members::{Member, TypeDescriptor};
use crate::path::Path;
use crate::reporter::{Mismatch, MismatchCollector, Reporter};
use crate::rules::Candidate;
use crate::value::{EnumValue, ObjectRef, Value};
use itertools::Itertools;
use std::sync::Arc;
use tracing::{debug, trace};

const VALUE_MISMATCH: &str = "Expected {0} to be {1}, but found {2}.";
const NOT_A_DICTIONARY: &str = "Expected {0} to be a dictionary equivalent to {1}, but found {2}.";
const NOT_A_COLLECTION: &str = "Expected {0} to be a collection equivalent to {1}, but found {2}.";
const NOT_AN_ENUM: &str = "Expected {0} to be enum {1}, but found {2}.";
const MISSING_KEY: &str = "Expected {0} to contain key {1}, but {2} does not.";
const ADDITIONAL_KEY: &str = "Expected {0} not to contain key {2}, but it does.";
const UNPAIRED_ITEM: &str = "Expected {0} to be paired with an item equivalent to {1}.";
const CYCLIC_REFERENCE: &str = "Expected {0} to be {1}, but it contains a cyclic reference \
     back to an object that is already being compared.";

/// Compares `subject` against `expectation` and returns every mismatch.
pub fn compare_with(
    subject: &Value,
    expectation: &Value,
    config: &Configuration,
) -> Vec<Mismatch> {
    let mut collector = MismatchCollector::new();
    compare_into(subject, expectation, config, &mut collector);
    collector.into_mismatches()
}

/// Compares `subject` against `expectation`, appending mismatches to `reporter`
/// in depth-first order.
pub fn compare_into(
    subject: &Value,
    expectation: &Value,
    config: &Configuration,
    reporter: &mut dyn Reporter,
) {
    debug!(
        subject = %subject.type_name(),
        expectation = %expectation.type_name(),
        "starting equivalency comparison"
    );
    let mut ctx = Context::new(config, reporter);
    compare(Comparands::new(subject, expectation), &mut ctx);
}

/// One traversal step. Never stops at a mismatch; every difference reachable
/// under the active rules is reported. Trial contexts are the exception and
/// return as soon as their mismatch limit is reached.
pub fn compare(c: Comparands<'_>, ctx: &mut Context<'_>) {
    if ctx.is_exhausted() {
        return;
    }
    trace!(path = %ctx.path(), depth = ctx.depth(), "comparing");
    match (c.subject, c.expectation) {
        (Value::Null, Value::Null) => return,
        (Value::Null, _) | (_, Value::Null) => {
            ctx.report(VALUE_MISMATCH, c.expectation, c.subject);
            return;
        }
        _ => {}
    }

    let config = ctx.config();
    if let Some(comparator) = config.find_comparator(&c, ctx.path()) {
        if !comparator.equivalent(c.subject, c.expectation) {
            let template = format!(
                "Expected {{0}} to be {{1}}, but found {{2}} (compared using {}).",
                comparator.name()
            );
            ctx.report(template, c.expectation, c.subject);
        }
        return;
    }

    if let (Value::Object(s), Value::Object(e)) = (c.subject, c.expectation) {
        if ctx.is_visited(&VisitKey::new(s, e, c.declared)) {
            debug!(path = %ctx.path(), "cyclic reference detected");
            if config.cyclic_references() == CyclicReferenceHandling::Report {
                ctx.report(CYCLIC_REFERENCE, c.expectation, c.subject);
            }
            return;
        }
    }

    let structural = matches!(
        c.expectation,
        Value::Object(_) | Value::Sequence(_) | Value::Map(_)
    );
    if let Some(max) = config.max_depth() {
        if structural && ctx.depth() > max {
            debug!(path = %ctx.path(), max, "maximum recursion depth reached");
            let template = format!(
                "The maximum recursion depth of {max} was reached while comparing {{0}}; \
                 the objects may contain a cyclic or unbounded structure."
            );
            ctx.report(template, c.expectation, c.subject);
            return;
        }
    }

    match c.expectation {
        Value::Map(entries) => compare_dictionaries(c, entries, ctx),
        Value::Sequence(items) => compare_sequences(c, items, ctx),
        Value::Enum(expected) => compare_enums(c, expected, ctx),
        Value::Object(expected) => compare_objects(c, expected, ctx),
        Value::Scalar(expected) => match c.subject {
            Value::Scalar(actual) if actual == expected => {}
            _ => ctx.report(VALUE_MISMATCH, c.expectation, c.subject),
        },
        Value::Null => {}
    }
}

fn is_included(ctx: &Context<'_>, path: &Path, member: Option<&Member>) -> bool {
    ctx.config().includes(&Candidate { path, member })
}

fn compare_dictionaries(c: Comparands<'_>, expected: &[(Value, Value)], ctx: &mut Context<'_>) {
    let Value::Map(actual) = c.subject else {
        ctx.report(NOT_A_DICTIONARY, c.expectation, c.subject);
        return;
    };

    for (key, expected_value) in expected {
        let path = ctx.path().append_key(key.key_text());
        if !is_included(ctx, &path, None) {
            continue;
        }
        match actual.iter().find(|(k, _)| k.key_eq(key)) {
            Some((_, actual_value)) => ctx.descend(path, |ctx| {
                compare(Comparands::new(actual_value, expected_value), ctx)
            }),
            None => ctx.report(MISSING_KEY, key, c.subject),
        }
    }

    if ctx.config().allowing_additional_keys() {
        return;
    }
    for (key, _) in actual {
        if expected.iter().any(|(k, _)| k.key_eq(key)) {
            continue;
        }
        let path = ctx.path().append_key(key.key_text());
        if is_included(ctx, &path, None) {
            ctx.report(ADDITIONAL_KEY, c.expectation, key);
        }
    }
}

fn compare_sequences(c: Comparands<'_>, expected: &[Value], ctx: &mut Context<'_>) {
    let Value::Sequence(actual) = c.subject else {
        ctx.report(NOT_A_COLLECTION, c.expectation, c.subject);
        return;
    };

    if actual.len() != expected.len() {
        let (diff, direction) = if actual.len() < expected.len() {
            (expected.len() - actual.len(), "less")
        } else {
            (actual.len() - expected.len(), "more")
        };
        let template = format!(
            "Expected {{0}} to be a collection with {} item(s), \
             but {{2}} contains {diff} item(s) {direction} than {{1}}.",
            expected.len()
        );
        ctx.report(template, c.expectation, c.subject);
    }

    if ctx.config().is_strict_ordering(ctx.path()) {
        for (i, (actual_item, expected_item)) in actual.iter().zip(expected).enumerate() {
            let path = ctx.path().append_index(i);
            if is_included(ctx, &path, None) {
                ctx.descend(path, |ctx| compare(Comparands::new(actual_item, expected_item), ctx));
            }
        }
    } else {
        compare_unordered(actual, expected, ctx);
    }
}

/// Pairs elements regardless of position.
///
/// Every expectation element first claims the first unclaimed subject element
/// that is fully equivalent to it. Elements left over are paired with the
/// unclaimed subject element that yields the fewest mismatches, preferring the
/// one at the same index and then the lowest index; the mismatches of that
/// pairing are reported under the expectation element's index.
///
/// Equivalence checks stop at the first mismatch, and scoring a candidate stops
/// once it can no longer beat the best one found so far. Inside a trial an
/// unpaired element counts as a single mismatch and no closest match is
/// searched for.
fn compare_unordered(actual: &[Value], expected: &[Value], ctx: &mut Context<'_>) {
    let mut claimed = vec![false; actual.len()];
    let mut leftovers = Vec::new();

    for (i, expected_item) in expected.iter().enumerate() {
        let path = ctx.path().append_index(i);
        if !is_included(ctx, &path, None) {
            continue;
        }
        let exact = (0..actual.len())
            .filter(|&j| !claimed[j])
            .find(|&j| trial_count(ctx, &path, &actual[j], expected_item, 1) == 0);
        match exact {
            Some(j) => claimed[j] = true,
            None if ctx.is_trial() => {
                ctx.report_at(path, UNPAIRED_ITEM, expected_item, "");
                if ctx.is_exhausted() {
                    return;
                }
            }
            None => leftovers.push(i),
        }
    }

    for i in leftovers {
        let path = ctx.path().append_index(i);
        let candidates = (0..actual.len())
            .filter(|&j| !claimed[j])
            .sorted_by_key(|&j| (j != i, j));
        let mut best: Option<(usize, usize)> = None;
        for j in candidates {
            let limit = best.map_or(usize::MAX, |(count, _)| count);
            let count = trial_count(ctx, &path, &actual[j], &expected[i], limit);
            if count < limit {
                best = Some((count, j));
            }
        }
        let Some((_, j)) = best else {
            continue;
        };
        claimed[j] = true;
        trace!(path = %path, subject_index = j, "pairing element by closest match");
        ctx.descend(path, |ctx| compare(Comparands::new(&actual[j], &expected[i]), ctx));
    }
}

/// Mismatches of a trial comparison, counted up to `limit`.
fn trial_count(
    ctx: &Context<'_>,
    path: &Path,
    subject: &Value,
    expectation: &Value,
    limit: usize,
) -> usize {
    let mut scratch = Tally::default();
    let mut trial = ctx.trial(path.clone(), &mut scratch, limit);
    compare(Comparands::new(subject, expectation), &mut trial);
    drop(trial);
    scratch.0
}

/// Counts mismatches without keeping them.
#[derive(Default)]
struct Tally(usize);

impl Reporter for Tally {
    fn append(&mut self, _mismatch: Mismatch) {
        self.0 += 1;
    }
}

fn compare_enums(c: Comparands<'_>, expected: &EnumValue, ctx: &mut Context<'_>) {
    let Value::Enum(actual) = c.subject else {
        ctx.report(NOT_AN_ENUM, c.expectation, c.subject);
        return;
    };
    let equivalent = match ctx.config().enums() {
        EnumEquivalency::ByValue => actual.value == expected.value,
        EnumEquivalency::ByName => actual.name == expected.name,
    };
    if !equivalent {
        ctx.report(VALUE_MISMATCH, c.expectation, c.subject);
    }
}

fn compare_objects(c: Comparands<'_>, expected: &ObjectRef, ctx: &mut Context<'_>) {
    let Value::Object(actual) = c.subject else {
        ctx.report(VALUE_MISMATCH, c.expectation, c.subject);
        return;
    };
    let key = VisitKey::new(actual, expected, c.declared);
    ctx.visiting(key, |ctx| compare_members(c.declared, actual, expected, ctx));
}

fn member_kind(member: &Member) -> &'static str {
    if member.is_field() {
        "field"
    } else {
        "property"
    }
}

fn compare_members(
    declared: Option<&Arc<TypeDescriptor>>,
    actual: &ObjectRef,
    expected: &ObjectRef,
    ctx: &mut Context<'_>,
) {
    let config = ctx.config();
    let expectation_type = match (config.typing(), declared) {
        (Typing::Declared, Some(declared)) => Arc::clone(declared),
        _ => expected.type_descriptor(),
    };
    let subject_type = actual.type_descriptor();
    let null = Value::Null;

    for member in expectation_type.members() {
        let path = ctx.path().append(member.name());
        if !is_included(ctx, &path, Some(member)) {
            continue;
        }
        let Some(subject_member) = config.find_match(member, &subject_type, ctx.path()) else {
            if !config.excluding_missing_members() {
                let template = format!(
                    "Expectation has {} {{0}} that the other object does not have.",
                    member_kind(member)
                );
                ctx.report_at(path, template, member.name(), actual.type_name());
            }
            continue;
        };
        let expected_value = expected.get(member.name());
        let actual_value = actual.get(subject_member.name());
        let e = expected_value.as_deref().unwrap_or(&null);
        let s = actual_value.as_deref().unwrap_or(&null);
        ctx.descend(path, |ctx| {
            compare(Comparands::new(s, e).declared_as(member.declared_type()), ctx)
        });
    }

    if !config.failing_on_unexpected_members() {
        return;
    }
    for member in subject_type.members() {
        let path = ctx.path().append(member.name());
        if !is_included(ctx, &path, Some(member)) {
            continue;
        }
        let paired = expectation_type.members().iter().any(|em| {
            config
                .find_match(em, &subject_type, ctx.path())
                .is_some_and(|m| m.name() == member.name())
        });
        if !paired {
            let template = format!(
                "Subject has {} {{0}} that the expectation does not have.",
                member_kind(member)
            );
            ctx.report_at(path, template, expected.type_name(), member.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::members::TypeDescriptor;
    use pretty_assertions::assert_eq;

    fn paths(mismatches: &[Mismatch]) -> Vec<String> {
        mismatches.iter().map(|m| m.path.to_string()).collect()
    }

    #[test]
    fn null_handling() {
        let config = Configuration::default();
        assert!(compare_with(&Value::Null, &Value::Null, &config).is_empty());
        let m = compare_with(&Value::from(1), &Value::Null, &config);
        assert_eq!(m[0].render("x"), "Expected x to be <null>, but found 1.");
        let m = compare_with(&Value::Null, &Value::from("a"), &config);
        assert_eq!(m[0].render("x"), "Expected x to be \"a\", but found <null>.");
    }

    #[test]
    fn scalars_compare_strictly_by_variant_and_value() {
        let config = Configuration::default();
        assert!(compare_with(&Value::from(1), &Value::from(1), &config).is_empty());
        assert_eq!(compare_with(&Value::from(1), &Value::from(1.0), &config).len(), 1);
        assert_eq!(compare_with(&Value::from("a"), &Value::from('a'), &config).len(), 1);
    }

    #[test]
    fn enums_by_value_or_by_name() {
        let red = Value::enumeration("Color", "Red", 1);
        let rouge = Value::enumeration("Couleur", "Rouge", 1);
        let config = Configuration::default();
        assert!(compare_with(&rouge, &red, &config).is_empty());

        let by_name = Options::new().comparing_enums_by_name().build().unwrap();
        let m = compare_with(&rouge, &red, &by_name);
        assert_eq!(
            m[0].render("color"),
            "Expected color to be Color.Red {value: 1}, but found Couleur.Rouge {value: 1}."
        );
        assert_eq!(compare_with(&Value::from(1), &red, &config)[0].template, NOT_AN_ENUM);
    }

    #[test]
    fn ordered_sequences_report_length_and_compare_common_prefix() {
        let config = Configuration::default();
        let m = compare_with(&Value::seq([1, 5]), &Value::seq([1, 2, 3]), &config);
        assert_eq!(paths(&m), vec!["", "[1]"]);
        assert_eq!(
            m[0].render("list"),
            "Expected list to be a collection with 3 item(s), \
             but [1, 5] contains 1 item(s) less than [1, 2, 3]."
        );
    }

    #[test]
    fn unordered_pairs_by_closest_match() {
        let config = Options::new().without_strict_ordering().build().unwrap();
        let person = |name: &str, age: i64| {
            Value::anonymous([("Name", Value::from(name)), ("Age", Value::from(age))])
        };
        let subject = Value::seq([person("b", 2), person("a", 1)]);
        let expectation = Value::seq([person("a", 1), person("b", 3)]);
        let m = compare_with(&subject, &expectation, &config);
        assert_eq!(paths(&m), vec!["[1].Age"]);
    }

    #[test]
    fn dictionaries_report_missing_and_additional_keys() {
        let config = Configuration::default();
        let subject = Value::map([("Foo", 1), ("Extra", 2)]);
        let expectation = Value::map([("Foo", 1), ("Bar", 2)]);
        let m = compare_with(&subject, &expectation, &config);
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].template, MISSING_KEY);
        assert_eq!(m[0].expected, "\"Bar\"");
        assert_eq!(m[1].template, ADDITIONAL_KEY);
        assert_eq!(m[1].actual, "\"Extra\"");

        let lenient = Options::new().allowing_additional_keys().build().unwrap();
        assert_eq!(compare_with(&subject, &expectation, &lenient).len(), 1);
    }

    #[test]
    fn custom_comparators_are_terminal() {
        let money = TypeDescriptor::builder("Money")
            .property("Amount")
            .property("Currency")
            .build();
        let eur = |amount: i64| {
            Value::from(ObjectRef::new(&money).with("Amount", amount).with("Currency", "EUR"))
        };
        let config = Options::new()
            .using_for_type("Money", |s, e| {
                let amount = |v: &Value| {
                    v.as_object().and_then(|o| o.get("Amount").map(|a| a.to_string()))
                };
                amount(s) == amount(e)
            })
            .build()
            .unwrap();
        assert!(compare_with(&eur(5), &eur(5), &config).is_empty());
        let m = compare_with(&eur(5), &eur(6), &config);
        assert_eq!(paths(&m), vec![""]);
        assert!(m[0].template.contains("compared using a custom equality check"));
    }

    #[test]
    fn depth_guard_reports_instead_of_recursing() {
        let ty = TypeDescriptor::builder("Tree").property("Child").build();
        let chain = |len: usize| {
            (0..len).fold(Value::Null, |child, _| {
                Value::from(ObjectRef::new(&ty).with("Child", child))
            })
        };
        let config = Options::new().with_max_recursion_depth(3).build().unwrap();
        let m = compare_with(&chain(6), &chain(6), &config);
        assert_eq!(paths(&m), vec!["Child.Child.Child.Child"]);
        assert!(m[0].template.starts_with("The maximum recursion depth of 3 was reached"));

        let unbounded = Options::new().allowing_infinite_recursion().build().unwrap();
        assert!(compare_with(&chain(30), &chain(30), &unbounded).is_empty());
    }

    #[test]
    fn unexpected_subject_members_fail_when_asked() {
        let subject = Value::anonymous([("Name", Value::from("a")), ("Id", Value::from(1))]);
        let expectation = Value::anonymous([("Name", Value::from("a"))]);
        assert!(compare_with(&subject, &expectation, &Configuration::default()).is_empty());

        let strict = Options::new().failing_on_unexpected_members().build().unwrap();
        let m = compare_with(&subject, &expectation, &strict);
        assert_eq!(paths(&m), vec!["Id"]);
        assert_eq!(
            m[0].render("s"),
            "Subject has property s.Id that the expectation does not have."
        );
    }
}
