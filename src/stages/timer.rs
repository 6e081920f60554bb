use crate::base::context::RenderContext;
use crate::base::environment::Environment;
use crate::foundation::error::GloperateResult;
use crate::pipeline::input::Input;
use crate::pipeline::output::Output;
use crate::pipeline::stage::{Stage, StageCore};

/// Accumulates the per-frame time delta into a virtual time.
///
/// Wire `time_delta` to the container's root slot and connect
/// `virtual_time` to anything that should animate; every update tick
/// marks the stage dirty, driving continuous re-rendering.
pub struct TimerStage {
    core: StageCore,
    /// Seconds since the previous frame.
    pub time_delta: Input<f32>,
    /// Seconds accumulated since the stage started processing.
    pub virtual_time: Output<f32>,
    time: f32,
}

impl TimerStage {
    /// Create a timer stage named `name`.
    pub fn new(env: &Environment, name: &str) -> Self {
        let core = StageCore::new(env, name);
        let time_delta = Input::new(&core, "time_delta", 0.0f32);
        let virtual_time = Output::new(&core, "virtual_time", 0.0f32);
        Self {
            core,
            time_delta,
            virtual_time,
            time: 0.0,
        }
    }
}

impl Stage for TimerStage {
    fn core(&self) -> &StageCore {
        &self.core
    }

    fn on_process(&mut self, _ctx: &mut dyn RenderContext) -> GloperateResult<()> {
        self.time += self.time_delta.get();
        self.virtual_time.set(self.time);
        Ok(())
    }
}
