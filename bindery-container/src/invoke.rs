//! The invoker — calls arbitrary functions with container-resolved
//! arguments.
//!
//! A function is invokable when every parameter can be pulled from the
//! container (or supplied as a positional override) and it returns
//! `Result<T, E>`. The `Result` return is how a function reports its own
//! failure: the container surfaces it as `ConstructionFailed` and
//! short-circuits the resolution tree.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;

use crate::error::{BinderyError, Result};
use crate::key::BindingKey;
use crate::resolver::Resolver;

/// Boxed error type accepted from user functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A value the invoker can produce for one parameter position.
///
/// The blanket impl resolves by type, honoring a per-position key.
pub trait FromResolver: Sized {
    fn from_resolver(resolver: &Resolver<'_>, key: Option<&'static str>) -> Result<Self>;
}

impl<T: Clone + Send + Sync + 'static> FromResolver for T {
    fn from_resolver(resolver: &Resolver<'_>, key: Option<&'static str>) -> Result<Self> {
        match key {
            Some(name) => resolver.resolve_keyed::<T>(name),
            None => resolver.resolve::<T>(),
        }
    }
}

/// Call-scoped options for [`Invokable::call_with`].
///
/// Overrides replace resolution for a parameter position; keys route a
/// position to a named binding.
///
/// # Examples
/// ```rust,ignore
/// let opts = InvokeOptions::new()
///     .override_arg(0, pool.clone())
///     .key_for(1, "replica");
/// let report = container.invoke_with(build_report, opts)?;
/// ```
#[derive(Default)]
pub struct InvokeOptions {
    overrides: HashMap<usize, Box<dyn Any + Send + Sync>>,
    keys: HashMap<usize, &'static str>,
}

impl InvokeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies a ready value for a parameter position.
    pub fn override_arg(mut self, position: usize, value: impl Any + Send + Sync) -> Self {
        self.overrides.insert(position, Box::new(value));
        self
    }

    /// Resolves a parameter position against a named binding.
    pub fn key_for(mut self, position: usize, name: &'static str) -> Self {
        self.keys.insert(position, name);
        self
    }

    pub(crate) fn take_override(&mut self, position: usize) -> Option<Box<dyn Any + Send + Sync>> {
        self.overrides.remove(&position)
    }

    pub(crate) fn key(&self, position: usize) -> Option<&'static str> {
        self.keys.get(&position).copied()
    }
}

impl fmt::Debug for InvokeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokeOptions")
            .field("overrides", &self.overrides.len())
            .field("keys", &self.keys)
            .finish()
    }
}

/// A function whose arguments the container can assemble.
///
/// Implemented for `FnOnce` of arity 0 through 8 returning
/// `Result<T, E>`. `Args` is the tuple of parameter types; it exists
/// only to keep the impls coherent and is inferred at the call site.
pub trait Invokable<Args> {
    type Output;

    /// Resolves every parameter, calls the function, and classifies
    /// its result.
    fn call_with(self, resolver: &Resolver<'_>, opts: InvokeOptions) -> Result<Self::Output>;
}

macro_rules! impl_invokable {
    ($($position:tt $arg:ident $var:ident),*) => {
        impl<Func, $($arg,)* Out, Err> Invokable<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> std::result::Result<Out, Err>,
            Out: Send + Sync + 'static,
            Err: Into<BoxError>,
            $($arg: FromResolver + 'static,)*
        {
            type Output = Out;

            #[allow(unused_variables, unused_mut)]
            fn call_with(self, resolver: &Resolver<'_>, mut opts: InvokeOptions) -> Result<Out> {
                $(
                    let $var: $arg = match opts.take_override($position) {
                        Some(value) => *value.downcast::<$arg>().map_err(|_| {
                            BinderyError::InvalidOverride {
                                position: $position,
                                expected: type_name::<$arg>(),
                            }
                        })?,
                        None => $arg::from_resolver(resolver, opts.key($position))?,
                    };
                )*
                (self)($($var),*).map_err(|e| BinderyError::ConstructionFailed {
                    key: BindingKey::of::<Out>(),
                    source: e.into(),
                })
            }
        }
    };
}

impl_invokable!();
impl_invokable!(0 A0 a0);
impl_invokable!(0 A0 a0, 1 A1 a1);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2, 3 A3 a3);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2, 3 A3 a3, 4 A4 a4);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2, 3 A3 a3, 4 A4 a4, 5 A5 a5);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2, 3 A3 a3, 4 A4 a4, 5 A5 a5, 6 A6 a6);
impl_invokable!(0 A0 a0, 1 A1 a1, 2 A2 a2, 3 A3 a3, 4 A4 a4, 5 A5 a5, 6 A6 a6, 7 A7 a7);
