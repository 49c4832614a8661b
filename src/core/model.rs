//! Capability markers for handler resolution.
//!
//! A [`ModelKey`] identifies "a handler that can produce a model of type `M`".
//! It is never instantiated as a handler; it only keys the resolution cache and
//! filters the handler universe.

use std::any::{Any, TypeId, type_name};
use std::fmt;

/// Type-level identifier of a model type, used as the capability marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    type_id: TypeId,
    name: &'static str,
}

impl ModelKey {
    /// The capability marker for model type `M`.
    pub fn of<M: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// The `TypeId` of the model type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The model type's name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this model type can stand for any value.
    ///
    /// Resolving a handler for such a type would match every handler, so the
    /// resolver rejects it up front.
    pub fn is_universal(&self) -> bool {
        [
            TypeId::of::<Box<dyn Any>>(),
            TypeId::of::<Box<dyn Any + Send>>(),
            TypeId::of::<Box<dyn Any + Send + Sync>>(),
            TypeId::of::<dyn Any>(),
            TypeId::of::<dyn Any + Send>(),
            TypeId::of::<dyn Any + Send + Sync>(),
            TypeId::of::<serde_json::Value>(),
        ]
        .contains(&self.type_id)
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
