//! Render target module
//!
//! GPU images the pass graph renders into or samples from, and the side
//! table that tracks which host targets have a pipeline attached.

mod render_target;
mod data_texture;
mod target_manager;

pub use render_target::RenderTarget;
pub use data_texture::{DataTexture, DataExtent};
pub use target_manager::{
    TargetManager, HostTargetId, HostSurface, HostState,
    AttachmentRecord, InitCallback, InitContext, InitFn,
};
