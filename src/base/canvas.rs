use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::core::{Color, Point, Vec2, Viewport};
use crate::foundation::error::{GloperateError, GloperateResult};
use crate::input::devices::{KeyboardDevice, MouseDevice};
use crate::input::events::{Key, Modifiers, MouseButton};
use crate::pipeline::container::PipelineContainer;
use crate::pipeline::stage::Stage;
use crate::rendering::framebuffer::FramebufferHandle;

/// Host-facing rendering surface driving the root pipeline.
///
/// A canvas owns the [`PipelineContainer`] and translates the host's
/// per-frame calls into root slot updates and one `process` invocation.
/// It watches the container's `rendered` output: the valid-to-stale
/// transition raises a single pending redraw request, coalescing any
/// number of invalidations until the host services it with
/// [`render`](Canvas::render).
pub struct Canvas {
    env: Environment,
    container: PipelineContainer,
    frame: u64,
    mouse: MouseDevice,
    keyboard: KeyboardDevice,
    redraw_pending: Rc<Cell<bool>>,
}

impl Canvas {
    /// Create a canvas with an empty root container.
    pub fn new(env: &Environment) -> Self {
        let container = PipelineContainer::new(env);
        // The initial frame is always due; afterwards only the
        // valid-to-stale transition of `rendered` raises the flag.
        let redraw_pending = Rc::new(Cell::new(true));
        let pending = Rc::clone(&redraw_pending);
        container.rendered.on_invalidated(move || {
            pending.set(true);
        });

        Self {
            env: env.clone(),
            container,
            frame: 0,
            mouse: MouseDevice::new(env, "canvas"),
            keyboard: KeyboardDevice::new(env, "canvas"),
            redraw_pending,
        }
    }

    /// The root container.
    pub fn container(&self) -> &PipelineContainer {
        &self.container
    }

    /// Mutable access to the root container.
    pub fn container_mut(&mut self) -> &mut PipelineContainer {
        &mut self.container
    }

    /// The environment the canvas was created in.
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Swap the render stage, bracketing the exchange with context
    /// deinit of the old stage and init of the new one when a context is
    /// supplied.
    pub fn set_render_stage(
        &mut self,
        stage: Box<dyn Stage>,
        ctx: Option<&mut dyn RenderContext>,
    ) -> GloperateResult<()> {
        match ctx {
            Some(ctx) => {
                if let Some(name) = self.container.render_stage().map(str::to_string) {
                    if let Some(old) = self.container.pipeline_mut().stage_mut(&name) {
                        old.deinit_context(ctx);
                    }
                }
                self.container.set_render_stage(stage)?;
                self.container.init_context(ctx)
            }
            None => self.container.set_render_stage(stage).map(|_| ()),
        }
    }

    /// Associate the whole pipeline with a (new) rendering context.
    pub fn init_context(&mut self, ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        self.container.init_context(ctx)
    }

    /// Release the pipeline's context association; safe on an
    /// uninitialized canvas.
    pub fn deinit_context(&mut self, ctx: &mut dyn RenderContext) {
        self.container.deinit_context(ctx);
    }

    /// Advance time: updates the environment clock and publishes the
    /// delta on the container.
    pub fn update(&mut self, delta: f32) {
        self.env.time().update(delta);
        self.container.time_delta.set(self.env.time().delta());
    }

    /// Publish the device and virtual viewports.
    pub fn set_viewport(&mut self, device: Viewport, virtual_vp: Viewport) {
        self.container.device_viewport.set(device);
        self.container.virtual_viewport.set(virtual_vp);
    }

    /// Publish the background color.
    pub fn set_background_color(&mut self, color: Color) {
        self.container.background_color.set(color);
    }

    /// Render one frame into `target`: bumps the frame counter, publishes
    /// the target framebuffer and processes the root pipeline.
    #[tracing::instrument(skip_all, fields(frame = self.frame + 1))]
    pub fn render(
        &mut self,
        ctx: &mut dyn RenderContext,
        target: &FramebufferHandle,
    ) -> GloperateResult<()> {
        if self.container.render_stage().is_none() {
            return Ok(());
        }
        self.frame += 1;
        self.container.frame_counter.set(self.frame);
        self.container.target_framebuffer.set(target.clone());
        self.container.process(ctx)
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Take the pending redraw request, resetting it.
    ///
    /// Returns true at most once per `rendered` valid-to-stale
    /// transition, no matter how many invalidations happened since the
    /// last call.
    pub fn take_redraw_request(&self) -> bool {
        self.redraw_pending.replace(false)
    }

    /// Save a framebuffer's pixels as a PNG image.
    pub fn export_image(
        &self,
        framebuffer: &FramebufferHandle,
        path: impl AsRef<Path>,
    ) -> GloperateResult<()> {
        let path = path.as_ref();
        let buffer = framebuffer.buffer().ok_or_else(|| {
            GloperateError::resource("cannot export an empty framebuffer handle")
        })?;
        image::save_buffer_with_format(
            path,
            &buffer.pixels(),
            buffer.width(),
            buffer.height(),
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|error| {
            GloperateError::resource(format!("cannot write '{}': {error}", path.display()))
        })
    }

    /// Forward a key press to the keyboard device.
    pub fn key_press(&self, key: Key, modifiers: Modifiers) {
        self.keyboard.key_press(key, modifiers);
    }

    /// Forward a key release to the keyboard device.
    pub fn key_release(&self, key: Key, modifiers: Modifiers) {
        self.keyboard.key_release(key, modifiers);
    }

    /// Forward a pointer move to the mouse device.
    pub fn mouse_move(&self, position: Point) {
        self.mouse.move_to(position);
    }

    /// Forward a button press to the mouse device.
    pub fn mouse_press(&self, button: MouseButton, position: Point) {
        self.mouse.button_press(button, position);
    }

    /// Forward a button release to the mouse device.
    pub fn mouse_release(&self, button: MouseButton, position: Point) {
        self.mouse.button_release(button, position);
    }

    /// Forward a wheel scroll to the mouse device.
    pub fn mouse_wheel(&self, delta: Vec2, position: Point) {
        self.mouse.wheel_scroll(delta, position);
    }
}
