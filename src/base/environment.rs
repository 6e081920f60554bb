use std::cell::Cell;
use std::rc::Rc;

use crate::components::registry::ComponentRegistry;
use crate::input::manager::InputManager;
use crate::resources::registry::ResourceRegistry;

/// Per-frame timing state the host advances and stages consume.
pub struct TimeManager {
    delta: Cell<f32>,
    elapsed: Cell<f64>,
}

impl TimeManager {
    fn new() -> Self {
        Self {
            delta: Cell::new(0.0),
            elapsed: Cell::new(0.0),
        }
    }

    /// Advance time by `delta` seconds.
    pub fn update(&self, delta: f32) {
        self.delta.set(delta);
        self.elapsed.set(self.elapsed.get() + f64::from(delta));
    }

    /// Seconds since the previous update.
    pub fn delta(&self) -> f32 {
        self.delta.get()
    }

    /// Seconds accumulated across all updates.
    pub fn elapsed(&self) -> f64 {
        self.elapsed.get()
    }
}

struct EnvironmentInner {
    next_id: Cell<u64>,
    time: TimeManager,
    input: InputManager,
    resources: ResourceRegistry,
    components: ComponentRegistry,
}

/// Explicitly-owned engine state: id allocation, timing, input
/// dispatch, resource loaders and the component table.
///
/// One environment is constructed at startup and handed (as a cheap
/// clone) to every stage and pipeline at construction; there is no
/// ambient global lookup. The built-in resource loaders and stage
/// components are registered here.
#[derive(Clone)]
pub struct Environment {
    inner: Rc<EnvironmentInner>,
}

impl Environment {
    /// Create an environment with the built-in loaders and stage
    /// components registered.
    pub fn new() -> Self {
        let env = Self {
            inner: Rc::new(EnvironmentInner {
                next_id: Cell::new(1),
                time: TimeManager::new(),
                input: InputManager::new(),
                resources: ResourceRegistry::new(),
                components: ComponentRegistry::new(),
            }),
        };
        crate::resources::image_loader::register_builtin_loaders(&env);
        crate::stages::register_builtin_stages(&env);
        env
    }

    /// Frame timing state.
    pub fn time(&self) -> &TimeManager {
        &self.inner.time
    }

    /// Input-device event dispatch.
    pub fn input_manager(&self) -> &InputManager {
        &self.inner.input
    }

    /// Resource loader registry.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.inner.resources
    }

    /// Component (name to factory) registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.inner.components
    }

    pub(crate) fn next_id(&self) -> u64 {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        id
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
