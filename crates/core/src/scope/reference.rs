//! Lazily resolved references into containers

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{Container, GenericContainer, GenericReference, ObjectRef};
use crate::config::ReferenceConfig;
use crate::error::ReflectResult;
use crate::object::{Object, ObjectBase, Reflect};
use crate::types::{Described, FieldBuilder, TypeBuilder, TypeKey, TypeRegistry};

/// What resolving a reference without a context does
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnboundPolicy {
    /// Report unresolved and try again on the next access
    #[default]
    Retry,
    /// Report unresolved and never try again
    Abandon,
}

/// Observable resolution state of a [`Reference`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceState {
    /// No context to resolve against
    Unbound,
    /// Context present, target not found yet
    Pending,
    /// Target found and cached
    Resolved,
    /// Given up without a context
    Abandoned,
}

enum Binding<C> {
    Unbound,
    Pending,
    Resolved(C),
    Abandoned,
}

impl<C> Binding<C> {
    fn state(&self) -> ReferenceState {
        match self {
            Binding::Unbound => ReferenceState::Unbound,
            Binding::Pending => ReferenceState::Pending,
            Binding::Resolved(_) => ReferenceState::Resolved,
            Binding::Abandoned => ReferenceState::Abandoned,
        }
    }
}

/// Deferred lookup of the child `id` in a container
///
/// The first successful lookup is cached and returned from then on, even if
/// the container later maps `id` to something else. Misses are not cached,
/// so a reference to a name that does not exist yet resolves once the name
/// is added.
pub struct Reference<C> {
    base: ObjectBase,
    id: String,
    context: Option<Arc<Container<C>>>,
    binding: Mutex<Binding<C>>,
    policy: UnboundPolicy,
}

impl<C: Clone> Reference<C> {
    /// Reference to `id` without a context yet
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            base: ObjectBase::default(),
            id: id.into(),
            context: None,
            binding: Mutex::new(Binding::Unbound),
            policy: UnboundPolicy::default(),
        }
    }

    /// Reference to `id` resolved against `context`
    pub fn with_context(context: Arc<Container<C>>, id: impl Into<String>) -> Self {
        let mut reference = Self::new(id);
        reference.attach(context);
        reference
    }

    /// Reference to `id` using the configured unbound policy
    pub fn from_config(
        config: &ReferenceConfig,
        context: Option<Arc<Container<C>>>,
        id: impl Into<String>,
    ) -> Self {
        let mut reference = Self::new(id).with_policy(config.unbound);
        if let Some(context) = context {
            reference.attach(context);
        }
        reference
    }

    /// Set the unbound policy
    pub fn with_policy(mut self, policy: UnboundPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Name this reference resolves
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Container this reference resolves against
    pub fn context(&self) -> Option<&Arc<Container<C>>> {
        self.context.as_ref()
    }

    /// Unbound policy in effect
    pub fn policy(&self) -> UnboundPolicy {
        self.policy
    }

    /// Provide the container to resolve against
    ///
    /// Resolved and abandoned references keep their outcome.
    pub fn attach(&mut self, context: Arc<Container<C>>) {
        self.context = Some(context);
        let binding = self.binding.get_mut();
        if matches!(binding, Binding::Unbound) {
            *binding = Binding::Pending;
        }
    }

    /// Resolve the target, looking it up on first use
    ///
    /// # Returns
    /// The cached target if already resolved; otherwise the result of
    /// looking up `id` in the context, cached on success. `None` when the
    /// lookup misses, when there is no context, or when the reference was
    /// abandoned.
    pub fn resolve(&self) -> Option<C> {
        let mut binding = self.binding.lock();
        match &*binding {
            Binding::Resolved(target) => return Some(target.clone()),
            Binding::Abandoned => return None,
            Binding::Unbound | Binding::Pending => {}
        }

        let Some(context) = &self.context else {
            if self.policy == UnboundPolicy::Abandon {
                warn!("Reference {:?} has no context, abandoning", self.id);
                *binding = Binding::Abandoned;
            }
            return None;
        };

        match context.child(&self.id) {
            Some(target) => {
                debug!("Resolved reference {:?}", self.id);
                *binding = Binding::Resolved(target.clone());
                Some(target)
            }
            None => {
                trace!("Reference {:?} not found, still pending", self.id);
                *binding = Binding::Pending;
                None
            }
        }
    }

    /// Cached target without attempting a lookup
    pub fn get(&self) -> Option<C> {
        match &*self.binding.lock() {
            Binding::Resolved(target) => Some(target.clone()),
            _ => None,
        }
    }

    /// Whether the target has been resolved
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.binding.lock(), Binding::Resolved(_))
    }

    /// Current resolution state
    pub fn state(&self) -> ReferenceState {
        self.binding.lock().state()
    }
}

impl<C: Clone> Default for Reference<C> {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl<C> fmt::Debug for Reference<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("id", &self.id)
            .field("state", &self.binding.lock().state())
            .field("policy", &self.policy)
            .finish()
    }
}

impl<C: 'static> Reflect for Reference<C> {
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

impl<C: 'static> Object for Reference<C> {
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

impl Reference<ObjectRef> {
    /// Create an untyped reference through its descriptor
    pub fn create(
        registry: &TypeRegistry,
        context: Option<Arc<GenericContainer>>,
        id: impl Into<String>,
    ) -> ReflectResult<Box<GenericReference>> {
        let mut reference = registry.create::<GenericReference>()?;
        reference.id = id.into();
        if let Some(context) = context {
            reference.attach(context);
        }
        Ok(reference)
    }
}

impl Described for Reference<ObjectRef> {
    fn describe(registry: &mut TypeRegistry) -> ReflectResult<TypeKey> {
        let object = registry.object_type();
        let key = registry.register(
            TypeBuilder::concrete::<GenericReference>("GenericReference", "untyped reference")
                .inherits::<GenericReference, ObjectBase>(object, |r| &r.base, |r| &mut r.base),
        )?;

        let text = registry.ensure::<String>()?;
        registry.register_field(
            FieldBuilder::<GenericReference, String>::new(key, "id", text, |r| &r.id, |r| &mut r.id)
                .default_value(|| String::from("unnamed")),
        )?;
        Ok(key)
    }
}
