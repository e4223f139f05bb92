//! Process-wide type registry
//!
//! Applications that want a single registry build it at start-up, register
//! their types, and install it here once. Access afterwards is lock-free
//! via `OnceLock`; the installed registry is immutable.

use std::sync::OnceLock;

use crate::error::{ReflectError, ReflectResult};
use crate::types::TypeRegistry;

static REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// Install the process-wide registry
///
/// Returns an error if a registry was already installed.
pub fn init_registry(registry: TypeRegistry) -> ReflectResult<&'static TypeRegistry> {
    REGISTRY
        .set(registry)
        .map_err(|_| ReflectError::AlreadyInitialized)?;
    tracing::info!("Type registry installed");
    Ok(self::registry())
}

/// Get the process-wide registry
///
/// # Panics
/// Panics if called before `init_registry`
pub fn registry() -> &'static TypeRegistry {
    REGISTRY.get().expect("Type registry not initialized")
}

/// Try to get the process-wide registry without panicking
pub fn try_registry() -> Option<&'static TypeRegistry> {
    REGISTRY.get()
}

/// Check if the process-wide registry is installed
pub fn is_registry_initialized() -> bool {
    REGISTRY.get().is_some()
}
