//! Error types for container operations.
//!
//! Every failure names the types involved. No more
//! `TypeNotFound: 0x7f3a2b1c`.

use std::fmt;

use bindery_support::rendering::render_chain;

use crate::key::BindingKey;

/// Main error type for all container operations.
#[derive(Debug, thiserror::Error)]
pub enum BinderyError {
    /// No binding satisfies the requested `(type, key)` pair.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// The candidate is neither identical nor convertible to the
    /// requested type at bind time.
    #[error("cannot bind <{candidate}> to <{requested}>")]
    CannotBind {
        requested: &'static str,
        candidate: &'static str,
    },

    /// A type already under construction was requested again without a
    /// deferred handle, or a non-singleton binding participates in a cycle.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A conversion registered for the fallback path failed or vanished.
    #[error("cannot convert <{from}> to <{to}>")]
    ConversionFailed {
        from: &'static str,
        to: &'static str,
    },

    /// A provider returned an error during construction, or a resolved
    /// value failed its final downcast.
    #[error("failed to construct {key}: {source}")]
    ConstructionFailed {
        key: BindingKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An invoke override was supplied with the wrong type.
    #[error("override for argument {position} is not a <{expected}>")]
    InvalidOverride {
        position: usize,
        expected: &'static str,
    },
}

/// Error when no binding satisfies a request.
///
/// Includes helpful hints about what went wrong.
#[derive(Debug)]
pub struct NotFoundError {
    /// The binding slot that was requested
    pub requested: BindingKey,
    /// What required this binding (if resolution was nested)
    pub required_by: Option<BindingKey>,
    /// Similar types that ARE bound (for "did you mean?" suggestions)
    pub suggestions: Vec<BindingKey>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no binding found for type <{}>", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to call .bind_instance::<{}>() or .bind_provider()?",
            self.requested.type_name()
        )
    }
}

/// Error when a resolution chain loops back on itself.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// The chain of bindings that forms the cycle.
    /// Example: ["A", "B", "C", "A"]
    pub chain: Vec<BindingKey>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "circular dependency detected:\n  ")?;

        let names: Vec<&str> = self.chain.iter().map(|k| k.type_name()).collect();
        write!(f, "{}", render_chain(&names))?;

        write!(
            f,
            "\n  Hint: Singleton cycles can be completed with resolve_deferred()"
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, BinderyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_error_display() {
        let err = BinderyError::NotFound(NotFoundError {
            requested: BindingKey::of::<String>(),
            required_by: Some(BindingKey::of::<Vec<u8>>()),
            suggestions: vec![],
        });

        let msg = format!("{err}");
        assert!(msg.contains("no binding found"));
        assert!(msg.contains("String"));
        assert!(msg.contains("Required by"));
    }

    #[test]
    fn cannot_bind_names_both_types() {
        let err = BinderyError::CannotBind {
            requested: std::any::type_name::<String>(),
            candidate: std::any::type_name::<i32>(),
        };

        let msg = format!("{err}");
        assert!(msg.contains("String"));
        assert!(msg.contains("i32"));
    }

    #[test]
    fn circular_dependency_error_display() {
        let err = BinderyError::CircularDependency(CircularDependencyError {
            chain: vec![
                BindingKey::of::<String>(),
                BindingKey::of::<i32>(),
                BindingKey::of::<String>(),
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("circular"));
        assert!(msg.contains("→"));
    }

    #[test]
    fn conversion_failed_display() {
        let err = BinderyError::ConversionFailed {
            from: "a::Alias",
            to: "b::Base",
        };

        let msg = format!("{err}");
        assert!(msg.contains("a::Alias"));
        assert!(msg.contains("b::Base"));
    }

    #[test]
    fn invalid_override_display() {
        let err = BinderyError::InvalidOverride {
            position: 2,
            expected: "u64",
        };

        let msg = format!("{err}");
        assert!(msg.contains("argument 2"));
        assert!(msg.contains("u64"));
    }
}
