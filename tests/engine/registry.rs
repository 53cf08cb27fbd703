//! Integration tests for the registry

use datagraft_engine::{
    AbstractDescriptor, ArrayDescriptor, FieldDescriptor, ObjectDescriptor,
    PrimitiveDescriptor, Registry, RootDescriptor, TypeRef,
};
use datagraft_foundation::{ErrorKind, List, Object, TypeTag, Value};

fn message() -> ObjectDescriptor {
    ObjectDescriptor::new("Message")
        .with_field(FieldDescriptor::required("text", "string"))
        .with_field(FieldDescriptor::optional("wgt", "number", 1))
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn lookups_by_name_and_instance_type() {
    let mut registry = Registry::new();
    registry
        .register_all([
            PrimitiveDescriptor::string().into_ref(),
            message().with_tag("msg").into_ref(),
        ])
        .unwrap();

    assert_eq!(registry.len(), 2);
    let by_name = registry.lookup_by_name("Message").unwrap();
    let value = by_name.new_empty().unwrap();
    assert_eq!(value.type_tag().map(TypeTag::as_str), Some("msg"));

    let by_type = registry.lookup_by_instance_type(&value).unwrap();
    assert_eq!(by_type.name(), "Message");
    assert!(registry.lookup_by_instance_type(&Value::Int(1)).is_none());
    assert!(registry.lookup_by_name("msg").is_none());

    let by_tag = registry.lookup_by_tag(&TypeTag::new("msg")).unwrap();
    assert_eq!(by_tag.name(), "Message");
    assert!(registry.lookup_by_tag(&TypeTag::new("Message")).is_none());
}

#[test]
fn duplicate_names_are_rejected() {
    let mut registry = Registry::new();
    let first = message().into_ref();
    registry.register(first.clone()).unwrap();
    registry.register(first).unwrap();
    assert_eq!(registry.len(), 1);

    let err = registry.register(message().into_ref()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateDescriptor(ref n) if n == "Message"));
    assert!(!err.is_format());
}

#[test]
fn invalid_definitions_are_rejected_at_registration() {
    let mut registry = Registry::new();
    let bad = ObjectDescriptor::new("Bad")
        .with_field(FieldDescriptor::required("$name", "string"))
        .into_ref();
    let err = registry.register(bad).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDefinition(_)));
    assert!(registry.is_empty());

    let err = registry.register(RootDescriptor::shared()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidDefinition(_)));
}

#[test]
fn register_all_stops_at_first_failure() {
    let mut registry = Registry::new();
    let result = registry.register_all([
        message().into_ref(),
        message().into_ref(),
        PrimitiveDescriptor::string().into_ref(),
    ]);
    assert!(result.is_err());
    assert_eq!(registry.len(), 1);
}

#[test]
fn default_descriptor_is_registered() {
    let mut registry = Registry::new();
    registry
        .set_default_descriptor(Some(message().into_ref()))
        .unwrap();
    assert!(registry.contains("Message"));
    assert_eq!(registry.default_descriptor().map(|d| d.name()), Some("Message"));

    registry.set_default_descriptor(None).unwrap();
    assert!(registry.default_descriptor().is_none());
    assert!(registry.contains("Message"));
}

#[test]
fn dangling_references_are_found() {
    let mut registry = Registry::new();
    registry
        .register_all([
            ArrayDescriptor::new(TypeRef::named("Message")).into_ref(),
            PrimitiveDescriptor::string().into_ref(),
        ])
        .unwrap();
    assert!(registry.check_references().is_err());

    registry.register(message().into_ref()).unwrap();
    let err = registry.check_references().unwrap_err();
    assert!(err.to_string().contains("`number`"));

    registry.register(PrimitiveDescriptor::number().into_ref()).unwrap();
    assert!(registry.check_references().is_ok());
}

// =============================================================================
// Cloning
// =============================================================================

fn unit_registry(owns_elements: bool) -> Registry {
    let mut registry = Registry::new();
    registry
        .register_all([
            PrimitiveDescriptor::number().into_ref(),
            ObjectDescriptor::new("Stats")
                .with_field(FieldDescriptor::required("hp", "number"))
                .into_ref(),
            ObjectDescriptor::new("Unit")
                .with_field(FieldDescriptor::required("stats", "Stats").with_owned(true))
                .into_ref(),
            ArrayDescriptor::new(TypeRef::named("Unit"))
                .with_name("Units")
                .with_owned_elements(owns_elements)
                .into_ref(),
        ])
        .unwrap();
    registry
}

fn units() -> Value {
    let unit = Value::object(
        Object::new(TypeTag::new("Unit"))
            .with("stats", Value::object(Object::new(TypeTag::new("Stats")).with("hp", 5))),
    );
    Value::list(List::from_items(Some(TypeTag::new("Units")), [unit]))
}

#[test]
fn owned_elements_are_independent() {
    let registry = unit_registry(true);
    let original = units();
    let mut copy = registry.clone_value(&original).unwrap();
    assert_eq!(copy, original);

    let first = copy.list_mut().unwrap();
    let mut unit = first.get(0).cloned().unwrap();
    let source_unit = original.as_list().unwrap().get(0).unwrap();
    assert!(!Value::same_instance(&unit, source_unit));
    assert!(!Value::same_instance(
        unit.get("stats").unwrap(),
        source_unit.get("stats").unwrap()
    ));

    unit.object_mut()
        .unwrap()
        .set("stats", Value::object(Object::new(TypeTag::new("Stats")).with("hp", 99)));
    first.assign(0, unit);

    let hp = |v: &Value| {
        v.as_list()
            .and_then(|l| l.get(0))
            .and_then(|u| u.get("stats"))
            .and_then(|s| s.get("hp"))
            .cloned()
    };
    assert_eq!(hp(&original), Some(Value::Int(5)));
    assert_eq!(hp(&copy), Some(Value::Int(99)));
}

#[test]
fn unowned_elements_are_shared() {
    let registry = unit_registry(false);
    let original = units();
    let copy = registry.clone_value(&original).unwrap();
    assert!(!Value::same_instance(&copy, &original));
    assert!(Value::same_instance(
        copy.as_list().unwrap().get(0).unwrap(),
        original.as_list().unwrap().get(0).unwrap()
    ));
}

#[test]
fn unknown_runtime_type_cannot_be_cloned() {
    let registry = unit_registry(true);
    let ghost = Value::object(Object::new(TypeTag::new("Ghost")));
    let err = registry.clone_value(&ghost).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownType(_)));
    assert!(!err.is_format());
}

#[test]
fn abstract_values_cannot_be_cloned() {
    let mut registry = Registry::new();
    registry.register(AbstractDescriptor::new("Effect").into_ref()).unwrap();
    let fake = Value::object(Object::new(TypeTag::new("Effect")));
    let err = registry.clone_value(&fake).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Construction { .. }));
}

#[test]
fn plain_data_is_copied_structurally() {
    let registry = Registry::new();
    let original = Value::from(vec![Value::from(vec![1, 2]), Value::from("x")]);
    let copy = registry.clone_value(&original).unwrap();
    assert_eq!(copy, original);
    assert!(!Value::same_instance(&copy, &original));
    assert!(!Value::same_instance(
        copy.as_list().unwrap().get(0).unwrap(),
        original.as_list().unwrap().get(0).unwrap()
    ));
}
