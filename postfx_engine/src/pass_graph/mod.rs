//! Pass graph module
//!
//! Passes, groups and the pipeline executor that runs them every frame,
//! plus the typed input references used to bind pass inputs to shaders.

mod binding;
mod iteration;
mod pass;
mod group;
mod pipeline;

pub use binding::InputRef;
pub use iteration::{Direction, Range, IterationPolicy, IterationPlan, neighbours};
pub use pass::{Pass, divided_size};
pub use group::{Group, ViewportMode, BlendMode, GroupBlend};
pub use pipeline::{Pipeline, PipelineOutput, RenderStats, FrameContext};
