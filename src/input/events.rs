use crate::foundation::core::{Point, Vec2};

bitflags::bitflags! {
    /// Keyboard modifier state accompanying key and mouse events.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        /// Shift held.
        const SHIFT = 1 << 0;
        /// Control held.
        const CONTROL = 1 << 1;
        /// Alt held.
        const ALT = 1 << 2;
        /// Super/meta held.
        const SUPER = 1 << 3;
    }
}

/// Host keycode; the engine passes codes through without interpreting
/// them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key(pub u32);

/// Mouse button identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Middle button or wheel click.
    Middle,
    /// Secondary button.
    Right,
    /// Any further button, by host index.
    Other(u8),
}

/// Input-device event forwarded from the host surface.
///
/// These bypass the dataflow graph: the input manager broadcasts them to
/// registered handlers in registration order.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A key went down.
    KeyPress {
        /// Pressed key.
        key: Key,
        /// Modifier state.
        modifiers: Modifiers,
    },
    /// A key went up.
    KeyRelease {
        /// Released key.
        key: Key,
        /// Modifier state.
        modifiers: Modifiers,
    },
    /// The pointer moved.
    MouseMove {
        /// Pointer position in device pixels.
        position: Point,
    },
    /// A mouse button went down.
    MousePress {
        /// Pressed button.
        button: MouseButton,
        /// Pointer position in device pixels.
        position: Point,
    },
    /// A mouse button went up.
    MouseRelease {
        /// Released button.
        button: MouseButton,
        /// Pointer position in device pixels.
        position: Point,
    },
    /// The wheel scrolled.
    MouseWheel {
        /// Scroll delta per axis.
        delta: Vec2,
        /// Pointer position in device pixels.
        position: Point,
    },
}
