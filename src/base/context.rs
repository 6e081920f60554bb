use std::any::Any;

use crate::base::environment::Environment;
use crate::foundation::core::ContextId;
use crate::rendering::framebuffer::{Framebuffer, FramebufferHandle};

/// The rendering-backend scope stages acquire and release resources
/// against.
///
/// Hosts supply the concrete context (a GL context behind a window, a
/// headless software target); the engine only needs its identity to tell
/// a recreated context apart from the one a stage initialized against,
/// plus a downcast hook for backend-specific stages.
pub trait RenderContext {
    /// Identity of this context generation.
    fn id(&self) -> ContextId;

    /// The context as [`Any`], for backend-specific downcasts.
    fn as_any(&mut self) -> &mut dyn Any;
}

/// Software rendering context: no GPU, a plain framebuffer as the
/// default target.
///
/// This is the context the viewer binary and the test-suite drive frames
/// against; it doubles as the reference implementation of the context
/// contract.
pub struct HeadlessContext {
    id: ContextId,
    default_framebuffer: FramebufferHandle,
}

impl HeadlessContext {
    /// Create a context with a default framebuffer of the given size.
    pub fn new(env: &Environment, width: u32, height: u32) -> Self {
        Self {
            id: ContextId(env.next_id()),
            default_framebuffer: FramebufferHandle::new(Framebuffer::new(width, height)),
        }
    }

    /// The default render target of this context.
    pub fn default_framebuffer(&self) -> &FramebufferHandle {
        &self.default_framebuffer
    }
}

impl RenderContext for HeadlessContext {
    fn id(&self) -> ContextId {
        self.id
    }

    fn as_any(&mut self) -> &mut dyn Any {
        self
    }
}
