//! Built-in stages: the minimal set a host needs to put a frame on
//! screen, and the reference for writing richer ones.

pub mod clear;
pub mod texture_load;
pub mod timer;

use crate::base::environment::Environment;
use crate::pipeline::stage::Stage;

/// Register the built-in stages as named components, so hosts and
/// presets can instantiate them by name.
pub fn register_builtin_stages(env: &Environment) {
    let components = env.components();
    components.register::<Box<dyn Stage>, _>("ClearStage", |env| {
        Box::new(clear::ClearStage::new(env, "clear"))
    });
    components.register::<Box<dyn Stage>, _>("TextureLoadStage", |env| {
        Box::new(texture_load::TextureLoadStage::new(env, "texture_load"))
    });
    components.register::<Box<dyn Stage>, _>("TimerStage", |env| {
        Box::new(timer::TimerStage::new(env, "timer"))
    });
}
