//! Object-rule semantics: property routing, discriminants, warnings.

use typed_yaml_grammar::{rules, validate_rule, EngineError, Grammar, Rule, Severity};
use typed_yaml_tree::parse;

fn object_rule(properties: Vec<typed_yaml_grammar::PropertyRule>) -> Rule {
    rules::object(properties).unwrap()
}

fn run(rule: &Rule, text: &str) -> typed_yaml_grammar::Outcome {
    let grammar = Grammar::new();
    let doc = parse(text).unwrap();
    validate_rule(&grammar, rule, &doc).unwrap()
}

#[test]
fn matches_declared_properties() {
    let rule = object_rule(vec![
        rules::mandatory_property("p1", rules::array(rules::string())),
        rules::property("p2", rules::integer()),
    ]);

    let outcome = run(&rule, "p1: [a, b, c]\np2: 42");
    assert!(outcome.accepted);
    assert!(outcome.issues.is_empty());
}

#[test]
fn rejects_non_object() {
    let rule = object_rule(vec![rules::property("p1", rules::string())]);

    let outcome = run(&rule, "[1, 2]");
    assert!(!outcome.accepted);
    assert_eq!(outcome.issues[0].message, "Expected object, got: ARRAY");
}

#[test]
fn missing_mandatory_keys_yield_one_aggregated_failure() {
    let rule = object_rule(vec![
        rules::mandatory_property("p1", rules::string()),
        rules::mandatory_property("p2", rules::string()),
        rules::property("p3", rules::string()),
    ]);

    let outcome = run(&rule, "p3: present");
    assert!(!outcome.accepted);
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(
        outcome.issues[0].message,
        "Missing required properties: [p1, p2]"
    );
}

#[test]
fn unknown_property_warns_but_never_rejects() {
    let rule = object_rule(vec![rules::property("p1", rules::string())]);

    let outcome = run(&rule, "p1: v1\nmystery: 42");
    assert!(outcome.accepted);

    let warnings: Vec<_> = outcome.issues_of(Severity::Warning).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "Unexpected property: \"mystery\"");
    assert_eq!(warnings[0].pointer, "/mystery");
}

#[test]
fn failing_plain_property_records_but_object_still_matches() {
    // The recorded failure rejects the document, but the object rule itself
    // reports success to its caller (a first-of would still pick it).
    let rule = object_rule(vec![rules::property("p1", rules::integer())]);

    let outcome = run(&rule, "p1: not a number");
    assert!(!outcome.accepted);
    assert_eq!(
        outcome.issues[0].message,
        "Expected: INTEGER, got: \"not a number\""
    );
}

#[test]
fn failing_discriminant_aborts_the_object() {
    let rule = object_rule(vec![
        rules::discriminant("kind", rules::literal("service")),
        rules::mandatory_property("port", rules::integer()),
        rules::property("after", rules::integer()),
    ]);

    let outcome = run(&rule, "kind: wrong\nafter: oops");
    assert!(!outcome.accepted);

    // Only the discriminant failure is reported: later properties and the
    // mandatory check are skipped once the discriminant fails.
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(
        outcome.issues[0].message,
        "Expected: \"service\", got: \"wrong\""
    );
}

#[test]
fn pattern_properties_route_in_declaration_order() {
    // "ab" matches both patterns; the first declared one wins, so the string
    // rule is applied and the integer rule never sees the value.
    let rule = object_rule(vec![
        rules::pattern_property("a.*", rules::string()).unwrap(),
        rules::pattern_property(".*b", rules::integer()).unwrap(),
    ]);

    let outcome = run(&rule, "ab: some text");
    assert!(outcome.accepted);
    assert!(outcome.issues.is_empty());
}

#[test]
fn pattern_property_failure_never_fails_the_object() {
    let rule = object_rule(vec![
        rules::pattern_property("x-.*", rules::integer()).unwrap()
    ]);

    let outcome = run(&rule, "x-custom: not a number");
    // Recorded as a failure, rejecting the document, but no unexpected-
    // property warning and no object-level failure.
    assert!(!outcome.accepted);
    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(outcome.issues[0].pointer, "/x-custom");
}

#[test]
fn duplicate_key_is_fatal() {
    let rule = object_rule(vec![rules::property("p1", rules::string())]);
    let grammar = Grammar::new();
    let doc = parse("p1: a\np2: b\np1: c").unwrap();

    let result = validate_rule(&grammar, &rule, &doc);
    assert!(matches!(
        result,
        Err(EngineError::DuplicateProperty { key, .. }) if key == "p1"
    ));
}

#[test]
fn catch_all_accepts_everything() {
    let rule = rules::any_object();

    let outcome = run(&rule, "a: 1\nb: [x]\nc:\n  d: deep");
    assert!(outcome.accepted);
    assert!(outcome.issues.is_empty());
}

#[test]
fn issues_serialize_for_tooling() {
    let rule = object_rule(vec![rules::mandatory_property("p1", rules::string())]);

    let outcome = run(&rule, "p2: v2");
    let json = serde_json::to_string(&outcome.issues).unwrap();
    let parsed: Vec<typed_yaml_grammar::ValidationIssue> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, outcome.issues);
}
