//! Parent-chained symbol tables

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{GenericContainer, ObjectRef};
use crate::config::ContainerConfig;
use crate::error::ReflectResult;
use crate::object::{Object, ObjectBase, Reflect};
use crate::types::{Described, TypeBuilder, TypeKey, TypeRegistry};

/// Children a container accepts unless configured otherwise
pub const DEFAULT_CAPACITY: usize = 256;

/// Anything that can answer whether a name is visible in it
pub trait Scope {
    /// Whether `name` resolves here or in an enclosing scope
    fn contains(&self, name: &str) -> bool;
}

struct Children<C> {
    ordered: Vec<C>,
    by_name: HashMap<String, C>,
}

impl<C> Default for Children<C> {
    fn default() -> Self {
        Self {
            ordered: Vec::new(),
            by_name: HashMap::new(),
        }
    }
}

/// Named, parent-chained collection of children
///
/// Children are kept in insertion order and indexed by their most recent
/// name. Lookups that miss locally continue in the parent, so a name added
/// here shadows the same name further out. The container only holds
/// handles; it does not manage the children's lifecycle.
pub struct Container<C> {
    base: ObjectBase,
    children: RwLock<Children<C>>,
    parent: Option<Arc<Container<C>>>,
    capacity: Option<usize>,
}

impl<C: Clone> Container<C> {
    /// Empty root container with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(Some(DEFAULT_CAPACITY))
    }

    /// Empty root container holding at most `capacity` children
    ///
    /// `None` lets the container grow without bound.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            base: ObjectBase::default(),
            children: RwLock::new(Children::default()),
            parent: None,
            capacity,
        }
    }

    /// Empty root container sized from configuration
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self::with_capacity(config.limit())
    }

    /// Chain this container to `parent`
    pub fn with_parent(mut self, parent: Arc<Container<C>>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Replace the enclosing container
    pub fn set_parent(&mut self, parent: Option<Arc<Container<C>>>) {
        self.parent = parent;
    }

    /// Enclosing container, if any
    pub fn parent(&self) -> Option<&Arc<Container<C>>> {
        self.parent.as_ref()
    }

    /// Capacity limit, `None` when unbounded
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Add `child` under `name`
    ///
    /// The child is appended to the ordered children and becomes the value
    /// of `name`, replacing any earlier child with that name.
    ///
    /// # Returns
    /// The child previously mapped to `name` in this container.
    ///
    /// # Panics
    /// Panics when the container already holds `capacity` children.
    pub fn add(&self, name: impl Into<String>, child: C) -> Option<C> {
        let name = name.into();
        let mut children = self.children.write();

        if let Some(capacity) = self.capacity {
            if children.ordered.len() >= capacity {
                drop(children);
                panic!(
                    "container capacity of {} children exceeded while adding {:?}",
                    capacity, name
                );
            }
        }

        children.ordered.push(child.clone());
        let previous = children.by_name.insert(name.clone(), child);
        if previous.is_some() {
            debug!("Container rebound {:?}", name);
        } else {
            trace!("Container added {:?}", name);
        }
        previous
    }

    /// Child named `name`, here or in an enclosing container
    pub fn child(&self, name: &str) -> Option<C> {
        if let Some(found) = self.children.read().by_name.get(name) {
            return Some(found.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.child(name))
    }

    /// Whether `name` resolves here or in an enclosing container
    pub fn contains(&self, name: &str) -> bool {
        self.children.read().by_name.contains_key(name)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.contains(name))
    }

    /// Number of children added to this container
    pub fn len(&self) -> usize {
        self.children.read().ordered.len()
    }

    /// Whether nothing was added to this container
    pub fn is_empty(&self) -> bool {
        self.children.read().ordered.is_empty()
    }

    /// Snapshot of this container's children in insertion order
    pub fn children(&self) -> Vec<C> {
        self.children.read().ordered.clone()
    }
}

impl<C: Clone> Default for Container<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clone> Scope for Container<C> {
    fn contains(&self, name: &str) -> bool {
        Container::contains(self, name)
    }
}

impl<C> fmt::Debug for Container<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let children = self.children.read();
        let mut names: Vec<&String> = children.by_name.keys().collect();
        names.sort();
        f.debug_struct("Container")
            .field("names", &names)
            .field("len", &children.ordered.len())
            .field("capacity", &self.capacity)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl<C: 'static> Reflect for Container<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn as_object(&self) -> Option<&dyn Object> {
        Some(self)
    }

    fn as_object_mut(&mut self) -> Option<&mut dyn Object> {
        Some(self)
    }
}

impl<C: 'static> Object for Container<C> {
    fn object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn as_reflect(&self) -> &dyn Reflect {
        self
    }
}

impl Container<ObjectRef> {
    /// Create an untyped container through its descriptor
    pub fn create(
        registry: &TypeRegistry,
        parent: Option<Arc<GenericContainer>>,
    ) -> ReflectResult<Box<GenericContainer>> {
        let mut container = registry.create::<GenericContainer>()?;
        container.set_parent(parent);
        Ok(container)
    }
}

impl Described for Container<ObjectRef> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        let scope = match registry.key_of::<dyn Scope>() {
            Some(key) => key,
            None => {
                let object = registry.object_type();
                registry.register(
                    TypeBuilder::new("ContainerBase", "container base")
                        .bind::<dyn Scope>()
                        .base(object),
                )?
            }
        };

        registry.register(
            TypeBuilder::concrete::<GenericContainer>("GenericContainer", "untyped container")
                .inherits::<GenericContainer, ObjectBase>(scope, |c| &c.base, |c| &mut c.base),
        )
    }
}
