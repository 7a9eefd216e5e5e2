//! Vulkan layer of the Gravity framework.
//!
//! This crate provides:
//! - Instance, device and queue family negotiation
//! - Optional `VK_GOOGLE_display_timing` frame pacing
//! - Swapchain lifecycle and per-frame submission
//! - Depth buffer, command buffer and memory helpers

pub mod ash_driver;
pub mod capabilities;
pub mod command;
pub mod context;
pub mod debug;
pub mod depth;
pub mod driver;
pub mod error;
pub mod instance;
pub mod memory;
pub mod negotiate;
pub mod surface;
pub mod swapchain;
pub mod sync;
pub mod timing;

#[cfg(test)]
mod mock_driver;

pub use ash_driver::AshSwapchainDriver;
pub use capabilities::{DeviceCapabilities, ExtensionTable, GpuVendor};
pub use command::{CommandPool, LayoutTransition};
pub use context::{GpuContext, GpuContextBuilder};
pub use depth::DepthBuffer;
pub use driver::SwapchainDriver;
pub use error::{GpuError, Result};
pub use memory::{find_memory_type, GpuAllocator, GpuBuffer};
pub use negotiate::QueueFamilySelection;
pub use surface::{SurfaceContext, SurfaceSource};
pub use swapchain::{
    AcquireOutcome, PresentOutcome, QueueSetup, SwapchainManager, SwapchainRequest,
    SwapchainState,
};
pub use timing::{PacingChange, PresentTimingController};

pub use ash;
