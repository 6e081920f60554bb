use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::foundation::error::{GloperateError, GloperateResult};
use crate::foundation::variant::VariantMap;

type LoaderFn = Rc<dyn Fn(&Path, &VariantMap) -> GloperateResult<Box<dyn Any>>>;

struct LoaderEntry {
    type_id: TypeId,
    type_name: &'static str,
    extensions: Vec<String>,
    load: LoaderFn,
}

/// Registry of resource loaders, keyed by produced type and file
/// extension.
///
/// Stages request a typed resource for a path plus an engine-agnostic
/// option bag; the registry picks the first registered loader whose type
/// and extension match. Concrete loader backends (scene import, texture
/// decode) plug in from outside the engine; only the built-in image
/// loader ships with it.
pub struct ResourceRegistry {
    loaders: RefCell<Vec<LoaderEntry>>,
}

impl ResourceRegistry {
    pub(crate) fn new() -> Self {
        Self {
            loaders: RefCell::new(Vec::new()),
        }
    }

    /// Register a loader producing `T` for the given file extensions
    /// (matched case-insensitively, without the dot).
    pub fn register<T, F>(&self, extensions: &[&str], loader: F)
    where
        T: 'static,
        F: Fn(&Path, &VariantMap) -> GloperateResult<T> + 'static,
    {
        self.loaders.borrow_mut().push(LoaderEntry {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
            load: Rc::new(move |path, options| {
                loader(path, options).map(|value| Box::new(value) as Box<dyn Any>)
            }),
        });
    }

    /// Load a resource of type `T` from `path`.
    ///
    /// Fails with a resource error when no loader matches the requested
    /// type and the path's extension, or when the matched loader fails.
    pub fn load<T: 'static>(
        &self,
        path: impl AsRef<Path>,
        options: &VariantMap,
    ) -> GloperateResult<T> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let loader = self
            .loaders
            .borrow()
            .iter()
            .find(|entry| {
                entry.type_id == TypeId::of::<T>()
                    && entry.extensions.iter().any(|e| *e == extension)
            })
            .map(|entry| Rc::clone(&entry.load));

        let loader = loader.ok_or_else(|| {
            GloperateError::resource(format!(
                "no loader for type {} and extension '{}' ({})",
                type_name::<T>(),
                extension,
                path.display()
            ))
        })?;

        let loaded = loader(path, options)?;
        loaded.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            GloperateError::resource(format!(
                "loader for '{}' produced an unexpected type",
                path.display()
            ))
        })
    }

    /// Number of registered loaders.
    pub fn len(&self) -> usize {
        self.loaders.borrow().len()
    }

    /// True if no loaders are registered.
    pub fn is_empty(&self) -> bool {
        self.loaders.borrow().is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resources/registry.rs"]
mod tests;
