//! Error types for the reflection kernel
//!
//! Lookups that can legitimately miss (registry search, container lookup,
//! casts) return `Option`. This enum only covers registration and
//! instantiation mistakes the caller can act on.

/// Error type for descriptor registration and instantiation
#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    /// Descriptor cannot build instances (root, abstract and field descriptors)
    #[error("Cannot instantiate abstract type: {0}")]
    AbstractType(String),

    /// Key does not belong to this registry
    #[error("Unknown type key: {0}")]
    UnknownType(String),

    /// Base descriptor must be registered before its derived types
    #[error("Base type not registered for {0}")]
    UnknownBase(String),

    /// Field owner must be registered before its fields
    #[error("Owner type not registered for field {0}")]
    UnknownOwner(String),

    /// A Rust type may only be bound to one descriptor
    #[error("Rust type already described as {existing}, refusing {name}")]
    AlreadyDescribed { existing: String, name: String },

    /// Process-wide registry was installed twice
    #[error("Type registry already initialized")]
    AlreadyInitialized,
}

/// Result type for reflection operations
pub type ReflectResult<T> = Result<T, ReflectError>;
