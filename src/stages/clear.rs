use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::core::Color;
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::stage::{Stage, StageCore};
use crate::rendering::framebuffer::FramebufferHandle;

/// Minimal render stage: clears the target framebuffer to the
/// background color and reports the frame as rendered.
///
/// Declares the root slot names, so dropping it into a
/// [`PipelineContainer`](crate::PipelineContainer) wires it up as a
/// complete (if plain) render stage; richer stages replace it.
pub struct ClearStage {
    core: StageCore,
    /// Clear color.
    pub background_color: Input<Color>,
    /// Target to clear.
    pub target_framebuffer: Input<FramebufferHandle>,
    /// Frame counter; changes each frame and keeps the stage processing.
    pub frame_counter: Input<u64>,
    /// True after the frame was cleared.
    pub rendered: Output<bool>,
}

impl ClearStage {
    /// Create a clear stage named `name`.
    pub fn new(env: &Environment, name: &str) -> Self {
        let core = StageCore::new(env, name);
        let background_color = Input::new(&core, "background_color", Color::BLACK);
        let target_framebuffer =
            Input::new(&core, "target_framebuffer", FramebufferHandle::none());
        let frame_counter = Input::new(&core, "frame_counter", 0u64);
        let rendered = Output::new(&core, "rendered", false);
        Self {
            core,
            background_color,
            target_framebuffer,
            frame_counter,
            rendered,
        }
    }
}

impl Stage for ClearStage {
    fn core(&self) -> &StageCore {
        &self.core
    }

    fn on_process(&mut self, _ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        let target = self.target_framebuffer.get();
        let Some(buffer) = target.buffer() else {
            return Err(GloperateError::context(format!(
                "stage '{}' has no target framebuffer",
                self.core.name()
            )));
        };
        buffer.clear(self.background_color.get());
        tracing::trace!(
            stage = self.core.name(),
            frame = self.frame_counter.get(),
            "cleared target"
        );
        self.rendered.set(true);
        Ok(())
    }
}
