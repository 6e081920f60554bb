use std::rc::Rc;
use std::sync::Arc;

/// Decoded texture pixels in row-major RGBA8.
///
/// The pixel payload is shared: loaders that decode off the processing
/// thread hand the finished buffer over without a copy.
#[derive(Clone, Debug)]
pub struct TextureData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes, `width * height * 4` long.
    pub rgba8: Arc<Vec<u8>>,
}

impl TextureData {
    /// Construct texture data; the byte length must match the dimensions.
    pub fn new(width: u32, height: u32, rgba8: Vec<u8>) -> Self {
        debug_assert_eq!(rgba8.len(), (width as usize) * (height as usize) * 4);
        Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        }
    }
}

/// Shareable reference to a loaded texture, published through output
/// slots.
///
/// Handles compare by identity, not pixel content: two handles are equal
/// when they refer to the same texture object. Consumers treat a handle
/// received through a slot as borrowed for the current process cycle
/// unless the publisher keeps it alive.
#[derive(Clone, Debug, Default)]
pub struct TextureHandle {
    data: Option<Rc<TextureData>>,
}

impl TextureHandle {
    /// Handle referring to no texture.
    pub fn none() -> Self {
        Self { data: None }
    }

    /// Handle owning freshly-loaded texture data.
    pub fn new(data: TextureData) -> Self {
        Self {
            data: Some(Rc::new(data)),
        }
    }

    /// The referenced texture data, if any.
    pub fn data(&self) -> Option<&TextureData> {
        self.data.as_deref()
    }

    /// True if the handle refers to no texture.
    pub fn is_none(&self) -> bool {
        self.data.is_none()
    }
}

impl PartialEq for TextureHandle {
    fn eq(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}
