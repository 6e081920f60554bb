use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::error::GloperateResult;
use crate::foundation::variant::{Variant, VariantMap};
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::stage::{Stage, StageCore};
use crate::rendering::texture::{TextureData, TextureHandle};

/// Loads a texture from a file through the resource-loader registry.
///
/// The texture is only (re)loaded while the output is stale: a filename
/// change invalidates it through the usual cascade. A file watcher can
/// force reloads by invalidating `texture` after marking it required,
/// so the scheduler keeps reprocessing until the load succeeds. A load
/// failure leaves the output stale, so downstream stages see the miss
/// and can substitute a fallback.
pub struct TextureLoadStage {
    core: StageCore,
    /// Path of the image file to load.
    pub filename: Input<String>,
    /// Flip the decoded image vertically for bottom-left-origin
    /// conventions.
    pub flip_y: Input<bool>,
    /// The loaded texture.
    pub texture: Output<TextureHandle>,
}

impl TextureLoadStage {
    /// Create a texture-load stage named `name`.
    pub fn new(env: &Environment, name: &str) -> Self {
        let core = StageCore::new(env, name);
        let filename = Input::new(&core, "filename", String::new());
        let flip_y = Input::new(&core, "flip_y", false);
        let texture = Output::new(&core, "texture", TextureHandle::none());
        Self {
            core,
            filename,
            flip_y,
            texture,
        }
    }
}

impl Stage for TextureLoadStage {
    fn core(&self) -> &StageCore {
        &self.core
    }

    fn on_process(&mut self, _ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        if self.texture.is_valid() {
            return Ok(());
        }
        let filename = self.filename.get();
        if filename.is_empty() {
            return Ok(());
        }

        let mut options = VariantMap::new();
        options.insert("flip_y".to_string(), Variant::Bool(self.flip_y.get()));
        let data = self
            .core
            .environment()
            .resources()
            .load::<TextureData>(&filename, &options)?;
        self.texture.set(TextureHandle::new(data));
        Ok(())
    }
}
