use std::path::Path;

use crate::base::environment::Environment;
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::foundation::variant::VariantMap;
use crate::rendering::texture::TextureData;

/// File extensions the built-in image loader accepts.
const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tga", "gif"];

/// Register the built-in loaders on `env`'s resource registry.
///
/// Currently that is a single image loader producing [`TextureData`]
/// from common raster formats. Option bag keys: `flip_y` (bool) flips
/// the image vertically for bottom-left-origin texture conventions.
pub fn register_builtin_loaders(env: &Environment) {
    env.resources()
        .register::<TextureData, _>(&IMAGE_EXTENSIONS, load_texture);
}

fn load_texture(path: &Path, options: &VariantMap) -> GloperateResult<TextureData> {
    let mut decoded = image::open(path).map_err(|error| {
        GloperateError::resource(format!("cannot decode '{}': {error}", path.display()))
    })?;

    let flip_y = options
        .get("flip_y")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if flip_y {
        decoded = decoded.flipv();
    }

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "texture loaded");
    Ok(TextureData::new(width, height, rgba.into_raw()))
}
