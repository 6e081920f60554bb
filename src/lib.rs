//! gloperate is a dataflow rendering-pipeline framework.
//!
//! Rendering work is organized as a graph of **stages** wired together
//! through typed input/output **slots**. Slots track validity; changing
//! an input marks its stage for reprocessing and pushes staleness
//! strictly downstream, so one [`process`](Stage::process) call per
//! frame recomputes only the stages whose dependencies changed.
//!
//! # Engine overview
//!
//! 1. **Slots**: [`Input`] pulls from a bound [`Output`] or a local
//!    value; [`Output`] publishes a value and a validity flag and
//!    notifies bound inputs.
//! 2. **Stages**: a [`Stage`] owns slots and recomputes outputs from
//!    inputs in `on_process`, with context-scoped resource lifecycle
//!    hooks.
//! 3. **Pipelines**: a [`Pipeline`] owns child stages and processes them
//!    in dependency order, insertion order breaking ties.
//! 4. **Host loop**: a [`Canvas`] drives the root
//!    [`PipelineContainer`] once per frame against a [`RenderContext`]
//!    and coalesces redraw requests from the required `rendered` output.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single-threaded frames**: one synchronous `process` per frame on
//!   the thread owning the rendering context; asynchronous producers
//!   publish through slot validity on later frames.
//! - **Deterministic scheduling**: identical inputs yield an identical
//!   processing order and frame output.
//! - **Stage-local failure**: a failing stage is logged and skipped for
//!   the frame; siblings and the host loop keep running.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod base;
mod components;
mod foundation;
mod input;
mod pipeline;
mod rendering;
mod resources;
mod stages;

pub use base::canvas::Canvas;
pub use base::context::{HeadlessContext, RenderContext};
pub use base::environment::{Environment, TimeManager};
pub use components::registry::ComponentRegistry;
pub use foundation::core::{Color, ContextId, Point, Rect, SlotId, StageId, Vec2, Viewport};
pub use foundation::error::{GloperateError, GloperateResult};
pub use foundation::variant::{TypeTag, Variant, VariantMap};
pub use input::devices::{KeyboardDevice, MouseDevice};
pub use input::events::{InputEvent, Key, Modifiers, MouseButton};
pub use input::manager::{InputManager, Subscription};
pub use pipeline::container::PipelineContainer;
pub use pipeline::input::Input;
pub use pipeline::output::Output;
pub use pipeline::pipeline::Pipeline;
pub use pipeline::slot::{AbstractSlot, SlotDirection, SlotValue};
pub use pipeline::stage::{Stage, StageCore};
pub use rendering::framebuffer::{Framebuffer, FramebufferHandle};
pub use rendering::texture::{TextureData, TextureHandle};
pub use resources::image_loader::register_builtin_loaders;
pub use resources::registry::ResourceRegistry;
pub use stages::clear::ClearStage;
pub use stages::register_builtin_stages;
pub use stages::texture_load::TextureLoadStage;
pub use stages::timer::TimerStage;
