use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::core::{Color, Viewport};
use crate::foundation::error::GloperateResult;
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::pipeline::Pipeline;
use crate::pipeline::stage::{Stage, StageCore};
use crate::rendering::framebuffer::FramebufferHandle;

/// Root input slots a [`PipelineContainer`] wires into a render stage
/// when a child input of the same name exists.
const ROOT_INPUT_SLOTS: [&str; 6] = [
    "time_delta",
    "frame_counter",
    "device_viewport",
    "virtual_viewport",
    "background_color",
    "target_framebuffer",
];

/// The root pipeline a host surface drives.
///
/// Exposes the well-known per-frame inputs (time delta, frame counter,
/// viewports, background color, target framebuffer) the host sets every
/// frame, and the required `rendered` output whose invalidation is the
/// host's redraw trigger. The actual render stage is a swappable child;
/// its same-named slots are wired to the root slots on insertion and its
/// `rendered` output is mirrored on the container, so nested pipelines
/// compose transparently for the host.
pub struct PipelineContainer {
    pipeline: Pipeline,
    render_stage: Option<String>,

    /// Seconds since the previous frame.
    pub time_delta: Input<f32>,
    /// Monotonic frame counter, bumped by the host per render call.
    pub frame_counter: Input<u64>,
    /// Viewport in physical pixels.
    pub device_viewport: Input<Viewport>,
    /// Viewport in scaled (virtual) coordinates.
    pub virtual_viewport: Input<Viewport>,
    /// Clear color for the frame.
    pub background_color: Input<Color>,
    /// Framebuffer the frame renders into.
    pub target_framebuffer: Input<FramebufferHandle>,
    /// Whether the frame was rendered; stale means a redraw is pending.
    pub rendered: Output<bool>,
}

impl PipelineContainer {
    /// Create an empty container.
    pub fn new(env: &Environment) -> Self {
        let pipeline = Pipeline::new(env, "container");
        let core = pipeline.core();
        let time_delta = Input::new(core, "time_delta", 0.0f32);
        let frame_counter = Input::new(core, "frame_counter", 0u64);
        let device_viewport = Input::new(core, "device_viewport", Viewport::default());
        let virtual_viewport = Input::new(core, "virtual_viewport", Viewport::default());
        let background_color = Input::new(core, "background_color", Color::BLACK);
        let target_framebuffer = Input::new(core, "target_framebuffer", FramebufferHandle::none());
        let rendered = Output::new(core, "rendered", false);
        rendered.set_required(true);

        Self {
            pipeline,
            render_stage: None,
            time_delta,
            frame_counter,
            device_viewport,
            virtual_viewport,
            background_color,
            target_framebuffer,
            rendered,
        }
    }

    /// The composite pipeline owning the render stage.
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Mutable access to the composite pipeline.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    /// Name of the current render stage, if one is set.
    pub fn render_stage(&self) -> Option<&str> {
        self.render_stage.as_deref()
    }

    /// Swap in a new render stage, returning the previous one.
    ///
    /// The stage's inputs matching the root slot names are bound to the
    /// container's inputs and its `rendered` output, when present, is
    /// mirrored on the container's. Context bracketing (deinit of the old
    /// stage, init of the new one) is the caller's responsibility; the
    /// canvas does it.
    pub fn set_render_stage(
        &mut self,
        stage: Box<dyn Stage>,
    ) -> GloperateResult<Option<Box<dyn Stage>>> {
        let previous = match self.render_stage.take() {
            Some(name) => Some(self.pipeline.remove_stage(&name)?),
            None => None,
        };

        let name = stage.core().name().to_string();
        let has_slot =
            |slot: &str| -> bool { stage.core().find_slot(slot).is_some() };
        let wire_inputs: Vec<&str> = ROOT_INPUT_SLOTS
            .iter()
            .copied()
            .filter(|slot| has_slot(slot))
            .collect();
        let wire_rendered = stage.core().find_output("rendered").is_some();

        self.pipeline.add_stage(stage)?;
        self.render_stage = Some(name.clone());

        for slot in wire_inputs {
            self.pipeline
                .connect_slots(slot, &format!("{name}.{slot}"))?;
        }
        if wire_rendered {
            self.pipeline
                .connect_slots(&format!("{name}.rendered"), "rendered")?;
        }
        Ok(previous)
    }
}

impl Stage for PipelineContainer {
    fn core(&self) -> &StageCore {
        self.pipeline.core()
    }

    fn on_process(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        self.pipeline.on_process(ctx)
    }

    fn init_context(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        self.pipeline.init_context(ctx)
    }

    fn deinit_context(&mut self, ctx: &mut dyn RenderContext) {
        self.pipeline.deinit_context(ctx);
    }

    fn needs_processing(&self) -> bool {
        self.pipeline.needs_processing()
    }

    fn process(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        self.pipeline.process(ctx)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/container.rs"]
mod tests;
