//! Integration tests for the node pool and custom descriptors

use std::sync::Arc;

use datagraft_engine::{
    ClassDescriptor, DataView, DeserializeConfig, DescriptorKind, DescriptorRef, Deserializer, Environment,
    FieldDescriptor, NodeId, NodePool, ObjectDescriptor, PrimitiveDescriptor, Registry, Slot,
    deserialize_with,
};
use datagraft_foundation::{Object, Result, TypeTag, Value};
use serde_json::json;

/// An object descriptor that pins its nodes and counts its fields.
#[derive(Debug)]
struct Pinned {
    tag: TypeTag,
    fields: Vec<FieldDescriptor>,
}

impl Pinned {
    fn new() -> Self {
        Self {
            tag: TypeTag::new("Pinned"),
            fields: vec![FieldDescriptor::required("label", "string")],
        }
    }
}

impl ClassDescriptor for Pinned {
    fn name(&self) -> &str {
        "Pinned"
    }

    fn type_tag(&self) -> Option<&TypeTag> {
        Some(&self.tag)
    }

    fn kind(&self) -> DescriptorKind {
        DescriptorKind::Object
    }

    fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    fn new_empty(&self) -> Result<Value> {
        Ok(Value::object(Object::new(self.tag.clone())))
    }

    fn new_clone(&self, _registry: &Registry, source: &Value) -> Result<Value> {
        Ok(source.clone())
    }

    fn populate(&self, de: &mut Deserializer<'_>, node: NodeId, data: DataView<'_>) -> Result<()> {
        de.initialize_default(node, self)?;
        de.populate_fields(node, &self.fields, data)?;
        let count = i64::try_from(data.keys().count()).unwrap_or(i64::MAX);
        de.node_object_mut(node)?.set("keys", Value::Int(count));
        de.preserve(node);
        Ok(())
    }
}

fn registry() -> Registry {
    let pinned: DescriptorRef = Arc::new(Pinned::new());
    let mut registry = Registry::new();
    registry
        .register_all([
            PrimitiveDescriptor::string().into_ref(),
            ObjectDescriptor::new("Message")
                .with_field(FieldDescriptor::required("text", "string"))
                .into_ref(),
            pinned,
        ])
        .unwrap();
    registry
}

fn message() -> DescriptorRef {
    ObjectDescriptor::new("Message").into_ref()
}

// =============================================================================
// NodePool
// =============================================================================

#[test]
fn released_nodes_are_reused() {
    let mut pool = NodePool::new();
    let a = pool.lease(None, Slot::Root, message());
    pool.release(a);
    assert_eq!(pool.free_count(), 1);

    let b = pool.lease(None, Slot::Index(0), message());
    assert_eq!(a, b);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.in_use_count(), 1);
}

#[test]
fn released_nodes_are_reset() {
    let mut pool = NodePool::new();
    let a = pool.lease(None, Slot::Root, message());
    pool.get_mut(a).unwrap().set_value(Value::Int(1));
    pool.release(a);

    let b = pool.lease(None, Slot::Root, message());
    assert!(!pool.get(b).unwrap().is_initialized());
}

#[test]
fn preserve_marks_ancestors() {
    let mut pool = NodePool::new();
    let root = pool.lease(None, Slot::Root, message());
    let child = pool.lease(Some(root), Slot::Field("a".into()), message());
    let grandchild = pool.lease(Some(child), Slot::Index(0), message());
    let sibling = pool.lease(Some(root), Slot::Field("b".into()), message());

    pool.preserve(grandchild);
    assert_eq!(pool.preserved_count(), 3);
    assert!(!pool.get(sibling).unwrap().is_preserved());

    pool.get_mut(grandchild).unwrap().set_value(Value::Int(7));
    for id in [grandchild, sibling, child, root] {
        pool.release(id);
    }
    assert_eq!(pool.free_count(), 1);
    assert_eq!(pool.get(grandchild).unwrap().value(), Some(&Value::Int(7)));
    assert!(!pool.get(grandchild).unwrap().is_in_use());
}

#[test]
fn double_release_is_harmless() {
    let mut pool = NodePool::new();
    let a = pool.lease(None, Slot::Root, message());
    pool.release(a);
    pool.release(a);
    assert_eq!(pool.free_count(), 1);
}

#[test]
fn trim_keeps_live_nodes() {
    let mut pool = NodePool::new();
    let ids: Vec<_> = (0..4)
        .map(|i| pool.lease(None, Slot::Index(i), message()))
        .collect();
    pool.release(ids[3]);
    pool.release(ids[1]);
    pool.trim(0);
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.free_count(), 1);

    pool.release(ids[2]);
    pool.release(ids[0]);
    pool.trim(1);
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.free_count(), 1);
}

// =============================================================================
// Pool During Deserialization
// =============================================================================

#[test]
fn pool_is_idle_between_calls() {
    let registry = registry();
    let mut env = Environment::new();
    let config = DeserializeConfig::default();
    deserialize_with(
        &mut env,
        &registry,
        &json!([{"$name": "a", "$type": "Message", "text": "x"}]),
        &config,
    )
    .unwrap();
    assert_eq!(env.pool().in_use_count(), 0);
    let allocated = env.pool().len();
    assert!(allocated > 0);

    deserialize_with(
        &mut env,
        &registry,
        &json!([{"$name": "b", "$type": "Message", "text": "y"}]),
        &config,
    )
    .unwrap();
    assert_eq!(env.pool().len(), allocated);
}

#[test]
fn pool_retain_bounds_idle_nodes() {
    let registry = registry();
    let mut env = Environment::new();
    let entries: Vec<_> = (0..10)
        .map(|i| json!({"$name": format!("m{i}"), "$type": "Message", "text": "x"}))
        .collect();
    let config = DeserializeConfig::default().with_pool_retain(0);
    deserialize_with(&mut env, &registry, &json!(entries), &config).unwrap();
    assert!(env.pool().is_empty());
    assert_eq!(env.len(), 10);
}

#[test]
fn custom_descriptor_can_preserve_nodes() {
    let registry = registry();
    let mut env = Environment::new();
    deserialize_with(
        &mut env,
        &registry,
        &json!([{"$name": "p", "$type": "Pinned", "label": "here", "extra": 1}]),
        &DeserializeConfig::default(),
    )
    .unwrap();

    let p = env.get_value("p").unwrap();
    assert_eq!(p.get("label"), Some(&Value::from("here")));
    assert_eq!(p.get("keys"), Some(&Value::Int(2)));

    assert_eq!(env.pool().in_use_count(), 0);
    assert_eq!(env.pool().preserved_count(), 2);
    let kept: Vec<_> = env
        .pool()
        .preserved()
        .filter_map(|(_, node)| node.descriptor().map(|d| d.name().to_string()))
        .collect();
    assert!(kept.contains(&"Pinned".to_string()));
    assert!(kept.contains(&"root".to_string()));
}
