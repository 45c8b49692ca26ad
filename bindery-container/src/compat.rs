//! Type compatibility rules.
//!
//! Decides whether a candidate type may satisfy a requested type:
//! identical, convertible, or incompatible. Rust has no structural
//! convertibility at runtime, so the "convertible" relation is an
//! explicit table of registered conversion edges (the moral equivalent
//! of a named-type alias over the same representation).
//!
//! Interface satisfaction needs no table entry: bind the trait-object
//! type (`Arc<dyn Trait>`) directly and it matches by identity.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::error::{BinderyError, Result};
use crate::registry::Shared;

/// Outcome of a compatibility check between a requested and a
/// candidate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Same `TypeId` — directly assignable.
    Identical,
    /// A conversion edge is registered — assignable after conversion.
    Convertible,
    /// Neither identical nor convertible.
    Incompatible,
}

impl Compatibility {
    /// Returns `true` unless the pair is [`Compatibility::Incompatible`].
    #[inline]
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Compatibility::Incompatible)
    }

    /// Returns `true` if a conversion step is required.
    #[inline]
    pub fn needs_conversion(&self) -> bool {
        matches!(self, Compatibility::Convertible)
    }
}

/// A type-erased conversion edge.
///
/// Takes the source value by reference and produces a freshly allocated
/// shared value of the target type.
type ConvertFn = Arc<dyn Fn(&dyn Any) -> Result<Shared> + Send + Sync>;

/// Registry of conversion edges between types.
///
/// Consulted when validating `bind_*_as` calls and by the resolver's
/// fallback scan over bindings of a different but convertible type.
pub struct ConversionTable {
    edges: DashMap<(TypeId, TypeId), ConvertFn>,
}

impl ConversionTable {
    pub(crate) fn new() -> Self {
        Self {
            edges: DashMap::new(),
        }
    }

    /// Registers a conversion from `From` to `To`.
    ///
    /// Later registrations for the same pair replace earlier ones.
    ///
    /// # Examples
    /// ```rust,ignore
    /// // A named alias over a base type, plus the coercion to read it back:
    /// container.add_conversion::<Arc<Meters>, Arc<Distance>>(|m| m.clone().into());
    /// ```
    pub fn register<From, To>(
        &self,
        convert: impl Fn(&From) -> To + Send + Sync + 'static,
    ) where
        From: 'static,
        To: Send + Sync + 'static,
    {
        let edge: ConvertFn = Arc::new(move |value: &dyn Any| {
            let from = value.downcast_ref::<From>().ok_or_else(|| {
                BinderyError::ConversionFailed {
                    from: type_name::<From>(),
                    to: type_name::<To>(),
                }
            })?;
            Ok(Arc::new(convert(from)) as Shared)
        });

        debug!(
            from = type_name::<From>(),
            to = type_name::<To>(),
            "Registered conversion"
        );
        self.edges
            .insert((TypeId::of::<From>(), TypeId::of::<To>()), edge);
    }

    /// Classifies a `(requested, candidate)` pair.
    pub fn compatibility(&self, requested: TypeId, candidate: TypeId) -> Compatibility {
        if requested == candidate {
            Compatibility::Identical
        } else if self.edges.contains_key(&(candidate, requested)) {
            Compatibility::Convertible
        } else {
            Compatibility::Incompatible
        }
    }

    /// Returns `true` if a conversion edge `from → to` is registered.
    pub fn convertible(&self, from: TypeId, to: TypeId) -> bool {
        self.edges.contains_key(&(from, to))
    }

    /// Applies the registered `from → to` edge to a value.
    ///
    /// Fails with `ConversionFailed` if the edge is missing or the value
    /// is not actually of the source type.
    pub(crate) fn apply(
        &self,
        from: TypeId,
        to: TypeId,
        from_name: &'static str,
        to_name: &'static str,
        value: &dyn Any,
    ) -> Result<Shared> {
        let edge = self
            .edges
            .get(&(from, to))
            .map(|e| Arc::clone(e.value()))
            .ok_or(BinderyError::ConversionFailed {
                from: from_name,
                to: to_name,
            })?;
        edge(value)
    }
}

impl fmt::Debug for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionTable")
            .field("edges", &self.edges.len())
            .finish()
    }
}
