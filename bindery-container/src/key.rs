//! Binding identification keys.
//!
//! [`BindingKey`] uniquely identifies a binding slot within the container.
//! It combines a [`TypeId`] with an optional name, so several independent
//! bindings of the same type can coexist.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Uniquely identifies a `(type, key)` binding slot.
///
/// Each binding is identified by its Rust type ([`TypeId`]) and an
/// optional name for cases where multiple instances of the same type
/// are bound side by side.
///
/// # Examples
/// ```
/// use bindery_container::key::BindingKey;
///
/// // Plain key — just a type
/// let key = BindingKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert_eq!(key.name(), None);
///
/// // Named key — type + name
/// let key = BindingKey::named::<String>("database_url");
/// assert_eq!(key.name(), Some("database_url"));
/// ```
#[derive(Clone)]
pub struct BindingKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<&'static str>,
}

impl BindingKey {
    /// Creates a key for type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: None,
        }
    }

    /// Creates a named key for type `T`.
    ///
    /// Named keys allow binding multiple independent instances of the
    /// same type; a named and an unnamed binding never alias.
    ///
    /// # Examples
    /// ```
    /// use bindery_container::key::BindingKey;
    ///
    /// let primary = BindingKey::named::<String>("primary_db");
    /// let replica = BindingKey::named::<String>("replica_db");
    /// assert_ne!(primary, replica);
    /// ```
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name: Some(name),
        }
    }

    /// Creates a key for type `T` with an optional name.
    #[inline]
    pub fn with_name<T: ?Sized + 'static>(name: Option<&'static str>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            name,
        }
    }

    /// Returns the [`TypeId`] of the requested type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable type name.
    ///
    /// Used in error messages for better developer experience.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the optional name of this binding slot.
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }
}

// Two keys are equal when both TypeId and name match.
impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.name == other.name
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "BindingKey({}, name={:?})", self.type_name, name),
            None => write!(f, "BindingKey({})", self.type_name),
        }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} (name={:?})", self.type_name, name),
            None => write!(f, "{}", self.type_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MyStruct;

    #[test]
    fn key_of_type() {
        let key = BindingKey::of::<MyStruct>();
        assert!(key.type_name().contains("MyStruct"));
        assert_eq!(key.name(), None);
    }

    #[test]
    fn key_equality_same_type() {
        assert_eq!(BindingKey::of::<String>(), BindingKey::of::<String>());
    }

    #[test]
    fn key_inequality_different_types() {
        assert_ne!(BindingKey::of::<String>(), BindingKey::of::<i32>());
    }

    #[test]
    fn named_keys_different() {
        let k1 = BindingKey::named::<String>("a");
        let k2 = BindingKey::named::<String>("b");
        assert_ne!(k1, k2);
    }

    #[test]
    fn named_vs_unnamed_different() {
        assert_ne!(
            BindingKey::named::<String>("a"),
            BindingKey::of::<String>()
        );
    }

    #[test]
    fn with_name_matches_named() {
        assert_eq!(
            BindingKey::with_name::<String>(Some("x")),
            BindingKey::named::<String>("x")
        );
        assert_eq!(BindingKey::with_name::<String>(None), BindingKey::of::<String>());
    }

    #[test]
    fn key_in_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(BindingKey::of::<String>(), "string");
        map.insert(BindingKey::of::<i32>(), "i32");
        assert_eq!(map.get(&BindingKey::of::<String>()), Some(&"string"));
        assert_eq!(map.get(&BindingKey::of::<bool>()), None);
    }

    #[test]
    fn unsized_type_key() {
        // dyn traits work as keys
        trait MyTrait {}
        let _key = BindingKey::of::<dyn MyTrait>();
    }
}
