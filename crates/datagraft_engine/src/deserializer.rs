//! The resolution engine.
//!
//! Walks a document depth first. Every datum gets a leased [`Node`], a
//! descriptor chosen by the precedence below, and is populated by that
//! descriptor; the finished value is then written into its parent.
//!
//! Descriptor precedence for a node:
//!
//! 1. `$type` naming a registered descriptor
//! 2. the runtime type of the `$inherit` value
//! 3. the type declared by the enclosing field or array
//! 4. for top-level entries only: the wrapper block's `$type`, then the
//!    call's default, then the registry's default
//!
//! Elements of an array with a concrete element type skip 1 and 2: the
//! declared type wins.
//!
//! [`Node`]: crate::node::Node

use std::sync::Arc;

use datagraft_foundation::{Error, ErrorKind, Object, Result, Value};
use serde_json::Value as Json;

use crate::config::{DeserializeConfig, EntryErrorPolicy};
use crate::data::{DataView, INHERIT_KEY, NAME_KEY, TYPE_KEY};
use crate::descriptor::{ClassDescriptor, DescriptorKind, DescriptorRef};
use crate::environment::Environment;
use crate::field::{FieldDescriptor, TypeRef};
use crate::node::{NodeId, Slot};
use crate::registry::Registry;
use crate::root::RootDescriptor;

/// Deserializes a document into a fresh environment.
///
/// # Errors
///
/// Returns the first error encountered; see [`deserialize_with`].
pub fn deserialize(registry: &Registry, data: &Json) -> Result<Environment> {
    let mut env = Environment::new();
    deserialize_into(&mut env, registry, data)?;
    Ok(env)
}

/// Deserializes a document into an existing environment.
///
/// Entries already in `env` can be inherited from.
///
/// # Errors
///
/// Returns the first error encountered; see [`deserialize_with`].
pub fn deserialize_into(env: &mut Environment, registry: &Registry, data: &Json) -> Result<()> {
    deserialize_with(env, registry, data, &DeserializeConfig::default()).map(|_| ())
}

/// Deserializes a document with explicit settings.
///
/// Entries are committed to `env` as soon as each one resolves, so on
/// failure the environment holds every entry before the failing one.
///
/// # Errors
///
/// Format errors for data that does not fit the registry (unless skipped
/// by [`EntryErrorPolicy::Skip`]), usage errors for registry or call
/// problems.
pub fn deserialize_with(
    env: &mut Environment,
    registry: &Registry,
    data: &Json,
    config: &DeserializeConfig,
) -> Result<DeserializeReport> {
    let mut de = Deserializer::new(registry, env, config);
    let result = de.run(data);
    let report = de.finish();
    result.map(|()| report)
}

/// Outcome of a successful deserialize call.
#[derive(Debug, Default)]
pub struct DeserializeReport {
    /// Names of entries committed, in document order.
    pub committed: Vec<Arc<str>>,
    /// Entries dropped under [`EntryErrorPolicy::Skip`].
    pub skipped: Vec<SkippedEntry>,
}

impl DeserializeReport {
    /// Returns true if no entry was skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// An entry that failed and was skipped.
#[derive(Debug)]
pub struct SkippedEntry {
    /// The entry's `$name`, if it had a usable one.
    pub name: Option<String>,
    /// Why it failed.
    pub error: Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
    Entry,
    Child,
    Element,
}

/// Traversal state for one deserialize call.
///
/// Descriptors receive it in [`ClassDescriptor::populate`] and use it to
/// read and write their node and to build child values.
pub struct Deserializer<'a> {
    registry: &'a Registry,
    env: &'a mut Environment,
    config: &'a DeserializeConfig,
    wrapper_default: Option<DescriptorRef>,
    depth: usize,
    report: DeserializeReport,
}

impl<'a> Deserializer<'a> {
    /// Creates a deserializer writing into `env`.
    #[must_use]
    pub fn new(registry: &'a Registry, env: &'a mut Environment, config: &'a DeserializeConfig) -> Self {
        Self {
            registry,
            env,
            config,
            wrapper_default: None,
            depth: 0,
            report: DeserializeReport::default(),
        }
    }

    /// Resolves a whole document.
    ///
    /// # Errors
    ///
    /// See [`deserialize_with`].
    pub fn run(&mut self, data: &Json) -> Result<()> {
        log::debug!("deserializing document ({})", crate::data::kind_of(data));
        let root = RootDescriptor::shared();
        let node = self.env.pool_mut().lease(None, Slot::Root, root.clone());
        let result = root.populate(self, node, DataView::new(data));
        self.env.pool_mut().release(node);
        result
    }

    /// Ends the call, trimming the pool and returning the report.
    #[must_use]
    pub fn finish(self) -> DeserializeReport {
        self.env.pool_mut().trim(self.config.pool_retain);
        log::debug!(
            "document done: {} committed, {} skipped",
            self.report.committed.len(),
            self.report.skipped.len()
        );
        self.report
    }

    /// The registry descriptors are resolved against.
    #[must_use]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// The environment being filled.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &*self.env
    }

    /// The settings for this call.
    #[must_use]
    pub fn config(&self) -> &DeserializeConfig {
        self.config
    }

    /// The value under construction at `node`.
    #[must_use]
    pub fn node_value(&self, node: NodeId) -> Option<&Value> {
        self.env.pool().get(node).and_then(|n| n.value())
    }

    /// Replaces the value under construction at `node`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `node` is not allocated.
    pub fn set_node_value(&mut self, node: NodeId, value: Value) -> Result<()> {
        self.env
            .pool_mut()
            .get_mut(node)
            .ok_or_else(|| unknown_node(node))?
            .set_value(value);
        Ok(())
    }

    /// Copy-on-write access to the object under construction at `node`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the node holds no object.
    pub fn node_object_mut(&mut self, node: NodeId) -> Result<&mut Object> {
        self.env
            .pool_mut()
            .get_mut(node)
            .and_then(|n| n.value_mut())
            .and_then(Value::object_mut)
            .ok_or_else(|| Error::internal(format!("node {} holds no object", node.index())))
    }

    /// Gives `node` a fresh value from `descriptor` unless it already has one.
    ///
    /// # Errors
    ///
    /// Whatever [`ClassDescriptor::new_empty`] fails with.
    pub fn initialize_default(&mut self, node: NodeId, descriptor: &dyn ClassDescriptor) -> Result<()> {
        let initialized = self
            .env
            .pool()
            .get(node)
            .ok_or_else(|| unknown_node(node))?
            .is_initialized();
        if initialized {
            return Ok(());
        }
        let value = descriptor.new_empty()?;
        self.set_node_value(node, value)
    }

    /// Populates each field of `node` in order.
    ///
    /// # Errors
    ///
    /// The first field error.
    pub fn populate_fields(&mut self, node: NodeId, fields: &[FieldDescriptor], data: DataView<'_>) -> Result<()> {
        fields.iter().try_for_each(|f| f.populate(self, node, data))
    }

    /// Keeps `node` and its ancestors out of the pool once released.
    pub fn preserve(&mut self, node: NodeId) {
        self.env.pool_mut().preserve(node);
    }

    /// Builds the value for a child datum of `parent`.
    ///
    /// `declared` is the type the enclosing field declares; `$type` and
    /// `$inherit` on the datum take precedence over it.
    ///
    /// # Errors
    ///
    /// Whatever resolving or populating the child fails with.
    pub fn build_child(
        &mut self,
        parent: NodeId,
        slot: Slot,
        declared: Option<DescriptorRef>,
        data: &Json,
    ) -> Result<Value> {
        self.build(parent, slot, declared, data, Resolution::Child)
    }

    /// Builds the value for element `index` of an array node.
    ///
    /// A concrete element type is used as is, ignoring `$type` on the
    /// element. Abstract element types resolve like any other child.
    ///
    /// # Errors
    ///
    /// Whatever resolving or populating the element fails with.
    pub fn build_element(
        &mut self,
        parent: NodeId,
        index: usize,
        element: DescriptorRef,
        data: &Json,
    ) -> Result<Value> {
        let mode = if element.kind() == DescriptorKind::Abstract {
            Resolution::Child
        } else {
            Resolution::Element
        };
        self.build(parent, Slot::Index(index), Some(element), data, mode)
    }

    /// Tries each candidate in order and returns the first value built.
    ///
    /// Candidates failing with a format error are recorded and the next is
    /// tried; any other error aborts immediately. Nothing is written to the
    /// parent here, so a failed attempt leaves no trace.
    ///
    /// # Errors
    ///
    /// `NoVariantMatched` carrying every attempt's error when no candidate
    /// fits, or the first non-format error.
    pub fn build_variant(
        &mut self,
        parent: NodeId,
        slot: Slot,
        label: &str,
        candidates: &[TypeRef],
        data: &Json,
    ) -> Result<Value> {
        let mut attempts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let descriptor = candidate.resolve(self.registry)?;
            match self.build(parent, slot.clone(), Some(descriptor), data, Resolution::Child) {
                Ok(value) => {
                    log::trace!("variant `{label}` matched `{}`", candidate.name());
                    return Ok(value);
                }
                Err(e) if e.is_format() => {
                    log::trace!("variant `{label}` rejected `{}`: {e}", candidate.name());
                    attempts.push(e.with_frame(candidate.name()));
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::no_variant_matched(label, attempts))
    }

    /// Writes a finished child value into its slot on `parent`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the parent holds nothing the slot can be
    /// written into.
    pub fn write_back(&mut self, parent: NodeId, slot: Slot, value: Value) -> Result<()> {
        match slot {
            Slot::Entry(name) => {
                self.commit(name, value);
                Ok(())
            }
            Slot::Field(key) => {
                self.node_object_mut(parent)?.set(key, value);
                Ok(())
            }
            Slot::Index(index) => {
                let list = self
                    .env
                    .pool_mut()
                    .get_mut(parent)
                    .and_then(|n| n.value_mut())
                    .and_then(Value::list_mut)
                    .ok_or_else(|| {
                        Error::internal(format!("node {} holds no list", parent.index()))
                    })?;
                list.assign(index, value);
                Ok(())
            }
            Slot::Root => Err(Error::internal("the document root takes no value")),
        }
    }

    /// Resolves one top-level entry and commits it under its `$name`.
    pub(crate) fn process_entry(&mut self, root: NodeId, data: &Json) -> Result<()> {
        let view = DataView::new(data);
        let name = match view.reserved(NAME_KEY) {
            Ok(Some(name)) => Ok(name),
            Ok(None) => Err(Error::new(ErrorKind::MissingEntryName)),
            Err(e) => Err(e),
        };
        let result = name.and_then(|name| {
            let slot = Slot::Entry(Arc::from(name));
            self.build(root, slot.clone(), None, data, Resolution::Entry)
                .and_then(|value| self.write_back(root, slot, value))
                .map_err(|e| e.with_frame(name))
        });

        match result {
            Err(e) if e.is_format() && self.config.entry_errors == EntryErrorPolicy::Skip => {
                let name = view.reserved(NAME_KEY).ok().flatten().map(str::to_string);
                log::warn!("skipping entry {}: {e}", name.as_deref().unwrap_or("<unnamed>"));
                self.report.skipped.push(SkippedEntry { name, error: e });
                Ok(())
            }
            other => other,
        }
    }

    /// Runs `f` with `default` as the wrapper block's entry type.
    pub(crate) fn with_wrapper_default<R>(
        &mut self,
        default: Option<DescriptorRef>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let previous = self.wrapper_default.clone();
        if default.is_some() {
            self.wrapper_default = default;
        }
        let result = f(self);
        self.wrapper_default = previous;
        result
    }

    fn commit(&mut self, name: Arc<str>, value: Value) {
        log::debug!("committed entry `{name}`");
        if self.env.insert(name.clone(), value).is_some() {
            log::debug!("entry `{name}` replaced an earlier entry");
        }
        self.report.committed.push(name);
    }

    fn build(
        &mut self,
        parent: NodeId,
        slot: Slot,
        declared: Option<DescriptorRef>,
        data: &Json,
        mode: Resolution,
    ) -> Result<Value> {
        if self.depth >= self.config.max_depth {
            return Err(Error::new(ErrorKind::LimitExceeded(format!(
                "nesting deeper than {}",
                self.config.max_depth
            ))));
        }
        let view = DataView::new(data);
        let (descriptor, inherited) = self.resolve(declared, view, mode)?;
        log::trace!("{slot:?} resolved to `{}`", descriptor.name());

        let node = self
            .env
            .pool_mut()
            .lease(Some(parent), slot, descriptor.clone());
        self.depth += 1;
        let result = self.enter(node, &descriptor, inherited.as_ref(), view);
        self.depth -= 1;

        let value = result.and_then(|()| {
            self.node_value(node).cloned().ok_or_else(|| {
                Error::internal(format!("`{}` produced no value", descriptor.name()))
            })
        });
        self.env.pool_mut().release(node);
        value
    }

    fn enter(
        &mut self,
        node: NodeId,
        descriptor: &DescriptorRef,
        inherited: Option<&Value>,
        view: DataView<'_>,
    ) -> Result<()> {
        if let Some(source) = inherited {
            let start = descriptor.new_clone(self.registry, source)?;
            self.set_node_value(node, start)?;
        }
        descriptor.populate(self, node, view)
    }

    fn resolve(
        &self,
        declared: Option<DescriptorRef>,
        view: DataView<'_>,
        mode: Resolution,
    ) -> Result<(DescriptorRef, Option<Value>)> {
        let type_name = view.reserved(TYPE_KEY)?;
        let inherited = match view.reserved(INHERIT_KEY)? {
            Some(name) => Some(
                self.env
                    .get_value(name)
                    .cloned()
                    .ok_or_else(|| Error::new(ErrorKind::UnknownInherit(name.to_string())))?,
            ),
            None => None,
        };

        if mode == Resolution::Element {
            if let Some(element) = declared {
                return Ok((element, inherited));
            }
        }

        let explicit = match type_name {
            Some(name) => Some(
                self.registry
                    .lookup_by_name(name)
                    .cloned()
                    .ok_or_else(|| Error::new(ErrorKind::UnknownTypeName(name.to_string())))?,
            ),
            None => None,
        };
        let descriptor = explicit
            .or_else(|| {
                inherited
                    .as_ref()
                    .and_then(|v| self.registry.lookup_by_instance_type(v))
                    .cloned()
            })
            .or(declared);

        let descriptor = match (descriptor, mode) {
            (Some(d), _) => d,
            (None, Resolution::Entry) => self
                .wrapper_default
                .clone()
                .or_else(|| self.config.default_descriptor.clone())
                .or_else(|| self.registry.default_descriptor().cloned())
                .ok_or_else(|| {
                    Error::new(ErrorKind::TypeResolution(
                        "entry has no `$type`, no typed `$inherit`, and no default descriptor is set"
                            .to_string(),
                    ))
                })?,
            (None, _) => {
                return Err(Error::new(ErrorKind::TypeResolution(
                    "value has no `$type`, no typed `$inherit`, and no declared type".to_string(),
                )));
            }
        };
        Ok((descriptor, inherited))
    }
}

fn unknown_node(node: NodeId) -> Error {
    Error::internal(format!("node {} is not allocated", node.index()))
}
