use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::base::environment::Environment;
use crate::foundation::error::{GloperateError, GloperateResult};

type FactoryFn = Rc<dyn Fn(&Environment) -> Box<dyn Any>>;

struct ComponentEntry {
    type_id: TypeId,
    type_name: &'static str,
    factory: FactoryFn,
}

/// Explicit name-to-factory table resolving named capabilities.
///
/// This replaces the original framework's directory-scanned plugin
/// discovery: everything instantiable by name (stages, exporters) is
/// registered here at startup, and hosts resolve a name plus expected
/// type to a fresh instance.
pub struct ComponentRegistry {
    entries: RefCell<BTreeMap<String, ComponentEntry>>,
}

impl ComponentRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    /// Register a factory for the component `name`, producing `T`.
    /// Re-registering a name replaces the previous factory.
    pub fn register<T, F>(&self, name: &str, factory: F)
    where
        T: 'static,
        F: Fn(&Environment) -> T + 'static,
    {
        self.entries.borrow_mut().insert(
            name.to_string(),
            ComponentEntry {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                factory: Rc::new(move |env| Box::new(factory(env)) as Box<dyn Any>),
            },
        );
    }

    /// Whether a component `name` of type `T` is registered.
    pub fn contains<T: 'static>(&self, name: &str) -> bool {
        self.entries
            .borrow()
            .get(name)
            .is_some_and(|entry| entry.type_id == TypeId::of::<T>())
    }

    /// Instantiate the component `name` as a `T`.
    ///
    /// Fails with a configuration error for an unknown name or a type
    /// other than the registered one.
    pub fn create<T: 'static>(&self, name: &str, env: &Environment) -> GloperateResult<T> {
        let (factory, registered_type) = {
            let entries = self.entries.borrow();
            let entry = entries.get(name).ok_or_else(|| {
                GloperateError::configuration(format!("no component named '{name}'"))
            })?;
            (Rc::clone(&entry.factory), entry.type_name)
        };
        let instance = factory(env);
        instance.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            GloperateError::configuration(format!(
                "component '{name}' is a {registered_type}, not a {}",
                type_name::<T>()
            ))
        })
    }

    /// Names of all components registered as type `T`, sorted.
    pub fn names_of<T: 'static>(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.type_id == TypeId::of::<T>())
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/components/registry.rs"]
mod tests;
