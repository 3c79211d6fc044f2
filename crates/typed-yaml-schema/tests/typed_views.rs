//! End-to-end coverage: descriptors through validation to typed views.

use typed_yaml_schema::descriptor::{self, ChoiceAlt, HierarchyDef, ObjectDef};
use typed_yaml_schema::{materialize, TypeSet, TypedParser, TypedValue, ViewError};

fn parser_for(types: &TypeSet, root: &str) -> TypedParser {
    TypedParser::compile(types, root).unwrap()
}

#[test]
fn mandatory_list_of_strings() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").mandatory(
        "p1",
        descriptor::list(descriptor::string()),
    ));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("p1: [a, b, c]").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap();
    let p1 = config.get("p1").unwrap();
    let list = p1.as_list().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1).unwrap().as_str(), Some("b"));
    assert_eq!(list.get(9).unwrap().as_str(), None);
}

#[test]
fn string_choice_rejects_with_one_enumerating_failure() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property("value", descriptor::string_choice(["x", "y"])));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("value: z").unwrap();
    assert!(!parsed.accepted());

    let errors: Vec<_> = parsed.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "Expected one of [\"x\", \"y\"]");
    assert_eq!(errors[0].pointer, "/value");
}

#[test]
fn cyclic_descriptor_materializes_three_levels() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Node")
            .mandatory("name", descriptor::string())
            .property("children", descriptor::list(descriptor::named("Node"))),
    );
    let parser = parser_for(&types, "Node");

    let parsed = parser
        .parse(
            r#"
name: root
children:
  - name: child
    children:
      - name: grandchild
"#,
        )
        .unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let root = view.as_object().unwrap();
    assert_eq!(root.get("name").unwrap().as_str(), Some("root"));

    let children = root.get("children").unwrap();
    let child = children.as_list().unwrap().get(0).unwrap();
    let child = child.as_object().unwrap().clone();
    assert_eq!(child.get("name").unwrap().as_str(), Some("child"));

    let grandchildren = child.get("children").unwrap();
    let grandchild = grandchildren.as_list().unwrap().get(0).unwrap();
    let grandchild = grandchild.as_object().unwrap().clone();
    assert_eq!(grandchild.get("name").unwrap().as_str(), Some("grandchild"));
    assert!(grandchild.get("children").unwrap().is_absent());
}

#[test]
fn hierarchy_routes_to_matched_variant() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Cat")
            .discriminant("kind", descriptor::string_choice(["cat"]))
            .property("lives", descriptor::integer()),
    );
    types.define(
        ObjectDef::new("Dog")
            .discriminant("kind", descriptor::string_choice(["dog"]))
            .property("good_boy", descriptor::boolean()),
    );
    types.define(HierarchyDef::new("Pet").variant("Cat").variant("Dog"));
    let parser = parser_for(&types, "Pet");

    // Cat is attempted first and fails; Dog (index 1) matches, and the view
    // comes from Dog's factory.
    let parsed = parser.parse("kind: dog\ngood_boy: yes").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let pet = view.as_object().unwrap();
    assert_eq!(pet.type_name(), "Dog");
    assert_eq!(pet.get("good_boy").unwrap().as_bool(), Some(true));

    // The node is decorated with the hierarchy's own key, variants being
    // transparent.
    let grammar = &parser.schema().grammar;
    assert_eq!(
        grammar.decorated_name(parsed.document().root()),
        Some("Pet")
    );
}

#[test]
fn hierarchy_rejects_unknown_discriminant() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Cat").discriminant("kind", descriptor::string_choice(["cat"])));
    types.define(ObjectDef::new("Dog").discriminant("kind", descriptor::string_choice(["dog"])));
    types.define(HierarchyDef::new("Pet").variant("Cat").variant("Dog"));
    let parser = parser_for(&types, "Pet");

    let parsed = parser.parse("kind: ferret").unwrap();
    assert!(!parsed.accepted());
    let errors: Vec<_> = parsed.errors().collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("Expected one of [Cat, Dog]"));
    // The failed probes of both variants survive as causes.
    assert_eq!(errors[0].causes.len(), 2);
}

#[test]
fn overlapping_patterns_route_to_first_declared() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Config")
            .pattern("first", "a.*", descriptor::string())
            .pattern("second", ".*b", descriptor::string()),
    );
    let parser = parser_for(&types, "Config");

    // "ab" matches both patterns; it belongs to the first accessor only.
    let parsed = parser.parse("ab: routed\nzb: other").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();

    let first = config.get("first").unwrap();
    let first = first.as_map().unwrap();
    assert_eq!(first.keys(), vec!["ab"]);
    assert_eq!(first.get("ab").unwrap().as_str(), Some("routed"));

    let second = config.get("second").unwrap();
    let second = second.as_map().unwrap();
    assert_eq!(second.keys(), vec!["zb"]);
    assert!(second.get("ab").unwrap().is_absent());
}

#[test]
fn resolvable_object_dereferences_transparently() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Target")
            .resolvable()
            .mandatory("value", descriptor::string()),
    );
    types.define(
        ObjectDef::new("Config")
            .property("direct", descriptor::named("Target"))
            .property("indirect", descriptor::named("Target")),
    );
    let parser = parser_for(&types, "Config");

    let parsed = parser
        .parse(
            r##"
direct:
  value: hello
indirect:
  $ref: "#/direct"
"##,
        )
        .unwrap();
    assert!(parsed.accepted(), "issues: {:?}", parsed.issues());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();

    let direct = config.get("direct").unwrap();
    let direct = direct.as_object().unwrap();
    assert!(!direct.is_ref());
    assert_eq!(direct.get("value").unwrap().as_str(), Some("hello"));

    let indirect = config.get("indirect").unwrap();
    let indirect = indirect.as_object().unwrap();
    assert!(indirect.is_ref());
    assert_eq!(indirect.ref_string().as_deref(), Some("#/direct"));
    assert_eq!(indirect.get("value").unwrap().as_str(), Some("hello"));

    // The resolved node is the same node the direct view sits on.
    assert_eq!(indirect.resolved_node().unwrap(), direct.node());
}

#[test]
fn unresolvable_reference_is_a_fatal_view_error() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Target")
            .resolvable()
            .mandatory("value", descriptor::string()),
    );
    types.define(ObjectDef::new("Config").property("t", descriptor::named("Target")));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("t:\n  $ref: \"#/absent\"").unwrap();
    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap();
    let t = config.get("t").unwrap();
    let t = t.as_object().unwrap();

    assert!(matches!(
        t.get("value"),
        Err(ViewError::UnresolvedRef { reference }) if reference == "#/absent"
    ));
}

#[test]
fn map_descriptor_wraps_entries_lazily() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property(
        "scores",
        descriptor::map(descriptor::integer()),
    ));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("scores:\n  alice: 3\n  bob: 5").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();
    let scores = config.get("scores").unwrap();
    let scores = scores.as_map().unwrap();

    assert_eq!(scores.len(), 2);
    assert_eq!(scores.keys(), vec!["alice", "bob"]);
    assert_eq!(scores.get("bob").unwrap().as_int(), Some(5));
    assert!(scores.get("carol").unwrap().is_absent());
}

#[test]
fn restricted_map_warns_on_foreign_keys() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property(
        "extensions",
        descriptor::map_matching("x-.*", descriptor::string()),
    ));
    let parser = parser_for(&types, "Config");

    let parsed = parser
        .parse("extensions:\n  x-one: fine\n  other: flagged")
        .unwrap();
    // Foreign keys warn; they never reject.
    assert!(parsed.accepted());
    assert_eq!(parsed.issues().len(), 1);
    assert_eq!(
        parsed.issues()[0].message,
        "Unexpected property: \"other\""
    );

    let strict = TypedParser::compile(&types, "Config")
        .unwrap()
        .with_strict_validation(true);
    let parsed = strict
        .parse("extensions:\n  x-one: fine\n  other: flagged")
        .unwrap();
    assert!(!parsed.accepted());
}

#[test]
fn scalars_parse_best_effort_and_absence_is_a_marker() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Config")
            .property("count", descriptor::integer())
            .property("ratio", descriptor::float())
            .property("flag", descriptor::boolean())
            .property("amount", descriptor::number())
            .property("note", descriptor::string()),
    );
    let parser = parser_for(&types, "Config");

    let parsed = parser
        .parse("count: 3\nratio: 0.5\nflag: yes\namount: 7")
        .unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();
    assert_eq!(config.get("count").unwrap().as_int(), Some(3));
    assert_eq!(config.get("ratio").unwrap().as_float(), Some(0.5));
    assert_eq!(config.get("flag").unwrap().as_bool(), Some(true));
    assert_eq!(config.get("amount").unwrap().as_int(), Some(7));
    // A property the document never supplied materializes as Absent.
    assert!(config.get("note").unwrap().is_absent());
    assert!(config.get("count").unwrap().as_str().is_none());
}

#[test]
fn explicit_null_materializes_as_absent() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property("note", descriptor::string()));
    let parser = parser_for(&types, "Config");

    // The string rule rejects an explicit null, but materialization still
    // yields the absence marker rather than crashing.
    let parsed = parser.parse("note: ~").unwrap();
    assert!(!parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap();
    assert!(config.get("note").unwrap().is_absent());
}

#[test]
fn enum_and_any_node_views() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Config")
            .property("level", descriptor::enumeration("Level", ["low", "high"]))
            .property("payload", descriptor::any_node()),
    );
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("level: high\npayload:\n  anything: [1, 2]").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();
    assert_eq!(config.get("level").unwrap().as_str(), Some("high"));

    let payload = config.get("payload").unwrap();
    let node = payload.as_node().unwrap();
    assert!(node.is_object());
    assert_eq!(node.at_str("/anything/1").unwrap().int_value(), 2);
}

#[test]
fn choice_mixing_literals_and_shapes() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Size").mandatory("pixels", descriptor::integer()));
    types.define(ObjectDef::new("Config").property(
        "size",
        descriptor::choice(vec![
            ChoiceAlt::Str("auto".into()),
            ChoiceAlt::Type(descriptor::named("Size")),
        ]),
    ));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("size: auto").unwrap();
    assert!(parsed.accepted());
    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();
    assert_eq!(config.get("size").unwrap().as_str(), Some("auto"));

    let parsed = parser.parse("size:\n  pixels: 400").unwrap();
    assert!(parsed.accepted());
    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap().clone();
    let size = config.get("size").unwrap();
    let size = size.as_object().unwrap();
    assert_eq!(size.type_name(), "Size");
    assert_eq!(size.get("pixels").unwrap().as_int(), Some(400));
}

#[test]
fn materialize_rejects_a_foreign_outcome() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Cat").discriminant("kind", descriptor::string_choice(["cat"])));
    types.define(ObjectDef::new("Dog").discriminant("kind", descriptor::string_choice(["dog"])));
    types.define(HierarchyDef::new("Pet").variant("Cat").variant("Dog"));
    let parser = parser_for(&types, "Pet");

    let first = parser.parse("kind: cat").unwrap();
    let second = parser.parse("kind: dog").unwrap();

    // Materializing one document with another run's outcome is a
    // programming error, reported as such rather than as bad data.
    let result = materialize(parser.schema(), second.document(), first.outcome());
    assert!(matches!(result, Err(ViewError::ForeignOutcome)));
}

#[test]
fn unmatched_choice_is_a_programming_error() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Cat").discriminant("kind", descriptor::string_choice(["cat"])));
    types.define(ObjectDef::new("Dog").discriminant("kind", descriptor::string_choice(["dog"])));
    types.define(HierarchyDef::new("Pet").variant("Cat").variant("Dog"));
    let parser = parser_for(&types, "Pet");

    // The document was rejected, so no variant was recorded for the root;
    // asking the choice factory for a view anyway is a programming error.
    let parsed = parser.parse("kind: ferret").unwrap();
    assert!(!parsed.accepted());

    let result = parser.view(&parsed);
    assert!(matches!(result, Err(ViewError::UnmatchedChoice { .. })));
}

#[test]
fn accepted_documents_materialize_every_reachable_accessor() {
    let mut types = TypeSet::new();
    types.define(
        ObjectDef::new("Server")
            .mandatory("host", descriptor::string())
            .property("port", descriptor::integer()),
    );
    types.define(
        ObjectDef::new("Config")
            .mandatory("servers", descriptor::list(descriptor::named("Server")))
            .property("labels", descriptor::map(descriptor::string()))
            .pattern("extras", "x-.*", descriptor::any_node()),
    );
    let parser = parser_for(&types, "Config");

    let parsed = parser
        .parse(
            r#"
servers:
  - host: a.example.com
    port: 80
  - host: b.example.com
labels:
  env: prod
x-custom: 12
"#,
        )
        .unwrap();
    assert!(parsed.accepted(), "issues: {:?}", parsed.issues());

    let view = parser.view(&parsed).unwrap();
    walk(&view).unwrap();
}

/// Exhaustively materialize every reachable accessor and element.
fn walk(value: &TypedValue<'_>) -> Result<(), ViewError> {
    match value {
        TypedValue::List(list) => {
            for element in list.to_vec()? {
                walk(&element)?;
            }
        }
        TypedValue::Map(map) => {
            for (_, entry) in map.entries()? {
                walk(entry)?;
            }
        }
        TypedValue::Object(object) => {
            let accessors: Vec<String> = object.accessors().map(str::to_string).collect();
            for accessor in accessors {
                walk(&object.get(&accessor)?)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[test]
fn keyed_accessor_reads_renamed_document_key() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Step").keyed_property(
        "location",
        "in",
        descriptor::string(),
    ));
    let parser = parser_for(&types, "Step");

    let parsed = parser.parse("in: body").unwrap();
    assert!(parsed.accepted());

    let view = parser.view(&parsed).unwrap();
    let step = view.as_object().unwrap();
    assert_eq!(step.get("location").unwrap().as_str(), Some("body"));
}

#[test]
fn accessor_results_are_cached_per_view_instance() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property("items", descriptor::list(descriptor::integer())));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("items: [1, 2]").unwrap();
    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap();

    let first = config.get("items").unwrap();
    let second = config.get("items").unwrap();
    // Clones of a cached accessor share the same lazily-resolved list.
    assert_eq!(first.as_list().unwrap().get(0).unwrap().as_int(), Some(1));
    assert_eq!(second.as_list().unwrap().get(0).unwrap().as_int(), Some(1));
}

#[test]
fn unknown_accessor_is_a_programming_error() {
    let mut types = TypeSet::new();
    types.define(ObjectDef::new("Config").property("p", descriptor::string()));
    let parser = parser_for(&types, "Config");

    let parsed = parser.parse("p: v").unwrap();
    let view = parser.view(&parsed).unwrap();
    let config = view.as_object().unwrap();

    assert!(matches!(
        config.get("q"),
        Err(ViewError::UnknownAccessor { name, accessor }) if name == "Config" && accessor == "q"
    ));
}
