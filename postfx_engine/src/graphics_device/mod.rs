/// Graphics device module - backend trait and all device-facing types

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod blend;
pub mod uniform;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use blend::*;
pub use uniform::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
