//! Integration tests for descriptor resolution and document shapes

use datagraft_engine::{
    DeserializeConfig, Environment, FieldDescriptor, ObjectDescriptor, PrimitiveDescriptor,
    Registry, deserialize, deserialize_with,
};
use datagraft_foundation::{ErrorKind, TypeTag, Value};
use serde_json::json;

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register_all([
            PrimitiveDescriptor::string().into_ref(),
            PrimitiveDescriptor::number().into_ref(),
            ObjectDescriptor::new("Message")
                .with_field(FieldDescriptor::required("text", "string"))
                .with_field(FieldDescriptor::optional("wgt", "number", 1))
                .into_ref(),
            ObjectDescriptor::new("Tip")
                .with_field(FieldDescriptor::required("text", "string"))
                .into_ref(),
        ])
        .unwrap();
    registry
}

fn tag_of(env: &Environment, name: &str) -> Option<String> {
    env.get_value(name)
        .and_then(Value::type_tag)
        .map(|t| t.as_str().to_string())
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn explicit_type_beats_registry_default() {
    let mut registry = registry();
    let message = registry.lookup_by_name("Message").cloned();
    registry.set_default_descriptor(message).unwrap();

    let env = deserialize(
        &registry,
        &json!([
            {"$name": "a", "text": "x"},
            {"$name": "b", "$type": "Tip", "text": "y"}
        ]),
    )
    .unwrap();
    assert_eq!(tag_of(&env, "a").as_deref(), Some("Message"));
    assert_eq!(tag_of(&env, "b").as_deref(), Some("Tip"));
}

#[test]
fn inherited_type_beats_default() {
    let mut registry = registry();
    let message = registry.lookup_by_name("Message").cloned();
    registry.set_default_descriptor(message).unwrap();

    let env = deserialize(
        &registry,
        &json!([
            {"$name": "tip", "$type": "Tip", "text": "y"},
            {"$name": "tip2", "$inherit": "tip"}
        ]),
    )
    .unwrap();
    assert_eq!(tag_of(&env, "tip2").as_deref(), Some("Tip"));
}

#[test]
fn explicit_type_beats_inherited_type() {
    let env = deserialize(
        &registry(),
        &json!([
            {"$name": "tip", "$type": "Tip", "text": "y"},
            {"$name": "msg", "$type": "Message", "$inherit": "tip"}
        ]),
    )
    .unwrap();
    let msg = env.get_value("msg").unwrap();
    assert_eq!(msg.type_tag().map(TypeTag::as_str), Some("Message"));
    assert_eq!(msg.get("text"), Some(&Value::from("y")));
    assert_eq!(msg.get("wgt"), Some(&Value::Int(1)));
}

#[test]
fn wrapper_type_beats_registry_default() {
    let mut registry = registry();
    let message = registry.lookup_by_name("Message").cloned();
    registry.set_default_descriptor(message).unwrap();

    let env = deserialize(
        &registry,
        &json!({"$type": "Tip", "$values": [{"$name": "t", "text": "y"}]}),
    )
    .unwrap();
    assert_eq!(tag_of(&env, "t").as_deref(), Some("Tip"));
}

#[test]
fn wrapper_type_applies_only_inside_block() {
    let mut env = Environment::new();
    let registry = registry();
    deserialize_with(
        &mut env,
        &registry,
        &json!({"$type": "Tip", "$value": {"$name": "t", "text": "y"}}),
        &DeserializeConfig::default(),
    )
    .unwrap();

    let err = deserialize_with(
        &mut env,
        &registry,
        &json!([{"$name": "u", "text": "z"}]),
        &DeserializeConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeResolution(_)));
    assert!(env.contains("t"));
}

#[test]
fn call_default_applies_when_nothing_else_does() {
    let registry = registry();
    let tip = registry.lookup_by_name("Tip").cloned().unwrap();
    let config = DeserializeConfig::default().with_default_descriptor(tip);

    let mut env = Environment::new();
    deserialize_with(&mut env, &registry, &json!([{"$name": "t", "text": "y"}]), &config).unwrap();
    assert_eq!(tag_of(&env, "t").as_deref(), Some("Tip"));
}

#[test]
fn unknown_type_name_is_a_format_error() {
    let err = deserialize(
        &registry(),
        &json!([{"$name": "g", "$type": "Ghost"}]),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownTypeName(ref n) if n == "Ghost"));
    assert!(err.is_format());
    assert_eq!(err.path(), "g");
}

#[test]
fn unknown_inherit_is_a_format_error() {
    let err = deserialize(
        &registry(),
        &json!([{"$name": "b", "$type": "Message", "$inherit": "a"}]),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownInherit(ref n) if n == "a"));
}

#[test]
fn reserved_keys_must_be_strings() {
    let err = deserialize(&registry(), &json!([{"$name": "m", "$type": 3}])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidReservedKey { .. }));

    let err = deserialize(&registry(), &json!([{"$name": 3, "$type": "Message"}])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidReservedKey { .. }));
}

// =============================================================================
// Document Shapes
// =============================================================================

#[test]
fn sequence_of_entries() {
    let env = deserialize(
        &registry(),
        &json!([
            {"$name": "a", "$type": "Message", "text": "1"},
            {"$name": "b", "$type": "Message", "text": "2"}
        ]),
    )
    .unwrap();
    assert_eq!(env.names().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn wrapper_with_both_values_keys_is_rejected() {
    let err = deserialize(
        &registry(),
        &json!({"$values": [], "$value": {"$name": "x"}}),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedWrapper));
    assert!(!err.is_format());
}

#[test]
fn wrapper_values_must_be_a_sequence() {
    let err = deserialize(&registry(), &json!({"$values": {"$name": "x"}})).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ExpectedSequence { .. }));
}

#[test]
fn scalar_document_is_rejected() {
    let err = deserialize(&registry(), &json!("hello")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDocument(_)));
}

#[test]
fn empty_sequence_is_fine() {
    let env = deserialize(&registry(), &json!([])).unwrap();
    assert!(env.is_empty());
}

#[test]
fn entries_before_a_failure_stay_committed() {
    let mut env = Environment::new();
    let err = deserialize_with(
        &mut env,
        &registry(),
        &json!([
            {"$name": "ok", "$type": "Message", "text": "fine"},
            {"$name": "bad", "$type": "Message"},
            {"$name": "never", "$type": "Message", "text": "unreached"}
        ]),
        &DeserializeConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingField { .. }));
    assert_eq!(err.path(), "bad");
    assert!(env.contains("ok"));
    assert!(!env.contains("bad"));
    assert!(!env.contains("never"));
}

#[test]
fn later_entry_replaces_earlier_with_same_name() {
    let env = deserialize(
        &registry(),
        &json!([
            {"$name": "m", "$type": "Message", "text": "first"},
            {"$name": "m", "$type": "Message", "text": "second"}
        ]),
    )
    .unwrap();
    assert_eq!(env.len(), 1);
    assert_eq!(env.get_value("m").and_then(|m| m.get("text")), Some(&Value::from("second")));
}

// =============================================================================
// Entry Error Policy
// =============================================================================

#[test]
fn skip_policy_reports_and_continues() {
    let mut env = Environment::new();
    let report = deserialize_with(
        &mut env,
        &registry(),
        &json!([
            {"$name": "bad", "$type": "Message", "text": 5},
            {"text": "no name", "$type": "Message"},
            {"$name": "good", "$type": "Message", "text": "ok"}
        ]),
        &DeserializeConfig::skip_invalid(),
    )
    .unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[0].name.as_deref(), Some("bad"));
    assert!(report.skipped[1].name.is_none());
    assert_eq!(report.committed.len(), 1);
    assert!(env.contains("good"));
}

#[test]
fn depth_limit_stops_runaway_nesting() {
    let mut registry = registry();
    registry
        .register(
            ObjectDescriptor::new("Chain")
                .with_field(FieldDescriptor::optional_nil("next", "Chain"))
                .into_ref(),
        )
        .unwrap();

    let mut data = json!({});
    for _ in 0..10 {
        data = json!({"next": data});
    }
    let mut entry = data;
    entry["$name"] = json!("c");
    entry["$type"] = json!("Chain");

    let config = DeserializeConfig::default().with_max_depth(4);
    let mut env = Environment::new();
    let err = deserialize_with(&mut env, &registry, &json!([entry.clone()]), &config).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::LimitExceeded(_)));

    let mut env = Environment::new();
    deserialize_with(&mut env, &registry, &json!([entry]), &DeserializeConfig::default()).unwrap();
    assert!(env.contains("c"));
}
