use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::foundation::core::Color;

/// Software framebuffer: an RGBA8 pixel target the headless context and
/// the built-in render stages draw into.
///
/// GL-backed hosts supply their own framebuffer objects behind the same
/// handle type; the engine only moves handles through slots and never
/// touches pixels itself.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: RefCell<Vec<u8>>,
}

impl Framebuffer {
    /// Create a framebuffer of the given size, cleared to transparent
    /// black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: RefCell::new(vec![0; (width as usize) * (height as usize) * 4]),
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill every pixel with `color`.
    pub fn clear(&self, color: Color) {
        let rgba = color.to_rgba8();
        for pixel in self.pixels.borrow_mut().chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    /// Borrow the pixel bytes, row-major RGBA8.
    pub fn pixels(&self) -> Ref<'_, Vec<u8>> {
        self.pixels.borrow()
    }

    /// Copy the pixel bytes out.
    pub fn snapshot(&self) -> Vec<u8> {
        self.pixels.borrow().clone()
    }

    /// Overwrite the pixel bytes; the length must match the dimensions.
    pub fn write_pixels(&self, data: &[u8]) {
        let mut pixels = self.pixels.borrow_mut();
        debug_assert_eq!(data.len(), pixels.len());
        pixels.copy_from_slice(data);
    }
}

/// Shareable reference to a render target, published through slots.
///
/// Handles compare by identity; an empty handle stands for "no target"
/// and render stages skip drawing when they receive one.
#[derive(Clone, Debug, Default)]
pub struct FramebufferHandle {
    target: Option<Rc<Framebuffer>>,
}

impl FramebufferHandle {
    /// Handle referring to no render target.
    pub fn none() -> Self {
        Self { target: None }
    }

    /// Handle to a freshly-created framebuffer.
    pub fn new(framebuffer: Framebuffer) -> Self {
        Self {
            target: Some(Rc::new(framebuffer)),
        }
    }

    /// The referenced framebuffer, if any.
    pub fn buffer(&self) -> Option<&Framebuffer> {
        self.target.as_deref()
    }

    /// True if the handle refers to no target.
    pub fn is_none(&self) -> bool {
        self.target.is_none()
    }
}

impl PartialEq for FramebufferHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&self.target, &other.target) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
