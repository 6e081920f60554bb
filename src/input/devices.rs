use crate::base::environment::Environment;
use crate::foundation::core::{Point, Vec2};
use crate::input::events::{InputEvent, Key, Modifiers, MouseButton};

/// Mouse abstraction a host surface feeds raw pointer events into.
pub struct MouseDevice {
    env: Environment,
    name: String,
}

impl MouseDevice {
    /// Create a mouse device named after its owning surface.
    pub fn new(env: &Environment, name: &str) -> Self {
        Self {
            env: env.clone(),
            name: name.to_string(),
        }
    }

    /// The owning surface's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward a pointer move.
    pub fn move_to(&self, position: Point) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::MouseMove { position });
    }

    /// Forward a button press.
    pub fn button_press(&self, button: MouseButton, position: Point) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::MousePress { button, position });
    }

    /// Forward a button release.
    pub fn button_release(&self, button: MouseButton, position: Point) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::MouseRelease { button, position });
    }

    /// Forward a wheel scroll.
    pub fn wheel_scroll(&self, delta: Vec2, position: Point) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::MouseWheel { delta, position });
    }
}

/// Keyboard abstraction a host surface feeds raw key events into.
pub struct KeyboardDevice {
    env: Environment,
    name: String,
}

impl KeyboardDevice {
    /// Create a keyboard device named after its owning surface.
    pub fn new(env: &Environment, name: &str) -> Self {
        Self {
            env: env.clone(),
            name: name.to_string(),
        }
    }

    /// The owning surface's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forward a key press.
    pub fn key_press(&self, key: Key, modifiers: Modifiers) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::KeyPress { key, modifiers });
    }

    /// Forward a key release.
    pub fn key_release(&self, key: Key, modifiers: Modifiers) {
        self.env
            .input_manager()
            .dispatch(&InputEvent::KeyRelease { key, modifiers });
    }
}
