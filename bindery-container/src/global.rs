//! Process-wide default container.
//!
//! A convenience layer for applications that want one shared container
//! without threading a handle everywhere. Every free function here
//! forwards to the same lazily-created [`Container`]; libraries should
//! prefer an explicit container owned by the caller.

use once_cell::sync::Lazy;

use crate::container::{BindOptions, Container};
use crate::error::Result;
use crate::invoke::{Invokable, InvokeOptions};
use crate::resolver::Resolver;

static DEFAULT: Lazy<Container> = Lazy::new(Container::new);

/// The shared default container, for operations without a free-function
/// wrapper (conversions, deferred resolves, named binds).
pub fn default_container() -> &'static Container {
    &DEFAULT
}

/// Binds a ready value into the default container.
pub fn bind_instance<T: Send + Sync + 'static>(value: T) -> Result<()> {
    DEFAULT.bind_instance(value)
}

/// Binds a provider into the default container.
pub fn bind_provider<T, F>(provider: F) -> Result<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
{
    DEFAULT.bind_provider(provider)
}

/// [`bind_provider`] with explicit [`BindOptions`].
pub fn bind_provider_with<T, F>(opts: BindOptions, provider: F) -> Result<()>
where
    T: Send + Sync + 'static,
    F: Fn(&Resolver<'_>) -> Result<T> + Send + Sync + 'static,
{
    DEFAULT.bind_provider_with(opts, provider)
}

/// Resolves a value from the default container.
pub fn resolve<T: Clone + Send + Sync + 'static>() -> Result<T> {
    DEFAULT.resolve()
}

/// Resolves a value from a named slot of the default container.
pub fn resolve_keyed<T: Clone + Send + Sync + 'static>(name: &'static str) -> Result<T> {
    DEFAULT.resolve_keyed(name)
}

/// Whether the default container can resolve the type.
pub fn has<T: 'static>() -> bool {
    DEFAULT.has::<T>()
}

/// Invokes a function with arguments resolved from the default
/// container.
pub fn invoke<F, Args>(f: F) -> Result<F::Output>
where
    F: Invokable<Args>,
{
    DEFAULT.invoke(f)
}

/// [`invoke`] with call-scoped options.
pub fn invoke_with<F, Args>(f: F, opts: InvokeOptions) -> Result<F::Output>
where
    F: Invokable<Args>,
{
    DEFAULT.invoke_with(f, opts)
}

#[cfg(test)]
mod tests {
    // The default container is process state shared across tests, so
    // each test binds its own local types.
    use super::*;
    use crate::error::BinderyError;
    use std::sync::Arc;

    #[test]
    fn default_container_binds_and_resolves() {
        #[derive(Clone, PartialEq, Debug)]
        struct Marker(u8);

        bind_instance(Marker(3)).unwrap();
        assert!(has::<Marker>());
        assert_eq!(resolve::<Marker>().unwrap(), Marker(3));
    }

    #[test]
    fn default_container_runs_providers() {
        struct Built;

        bind_provider(|_| Ok(Arc::new(Built))).unwrap();
        let a: Arc<Built> = resolve().unwrap();
        let b: Arc<Built> = resolve().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn default_container_invokes() {
        #[derive(Clone)]
        struct Port(u16);

        bind_instance(Port(8080)).unwrap();
        let out = invoke(|p: Port| Ok::<_, BinderyError>(p.0 + 1)).unwrap();
        assert_eq!(out, 8081);
    }

    #[test]
    fn default_container_is_one_instance() {
        #[derive(Clone)]
        struct Shared;

        default_container().bind_instance(Arc::new(Shared)).unwrap();
        let via_free: Arc<Shared> = resolve().unwrap();
        let via_handle: Arc<Shared> = default_container().resolve().unwrap();
        assert!(Arc::ptr_eq(&via_free, &via_handle));
    }
}
