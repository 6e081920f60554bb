//! Engine backbone: the environment, the rendering-context contract and
//! the host-facing canvas.

pub mod canvas;
pub mod context;
pub mod environment;
