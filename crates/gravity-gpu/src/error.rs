//! GPU error types.
//!
//! Every variant is unrecoverable for the frame loop. Conditions the
//! framework recovers from (an out-of-date or suboptimal swapchain) are
//! reported through [`crate::AcquireOutcome`] and [`crate::PresentOutcome`]
//! instead.

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// The Vulkan loader could not be found or opened.
    #[error("Failed to load Vulkan: {0}")]
    Loader(String),

    /// No Vulkan capable device was enumerated.
    #[error("No Vulkan capable device found")]
    NoSuitableDevice,

    /// Required extension not supported.
    #[error("Required extension not supported: {0}")]
    ExtensionNotSupported(String),

    /// No queue family satisfies a requirement.
    #[error("Could not find a {0} queue family")]
    QueueFamilyNotFound(&'static str),

    /// The surface does not offer the requested present mode.
    #[error("Present mode {0:?} is not supported by the surface")]
    PresentModeUnsupported(vk::PresentModeKHR),

    /// The surface reported no formats at all.
    #[error("Surface reports no supported formats")]
    NoSurfaceFormats,

    /// No memory type matches the requested properties.
    #[error("No memory type matches bits {type_bits:#x} with {required:?}")]
    NoCompatibleMemoryType {
        type_bits: u32,
        required: vk::MemoryPropertyFlags,
    },

    /// Memory allocation failed.
    #[error("Memory allocation failed: {0}")]
    AllocationFailed(String),

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// Acquiring a swapchain image failed with a non-recoverable code.
    #[error("Failed to acquire next swapchain image: {0}")]
    Acquire(vk::Result),

    /// Presenting failed with a non-recoverable code.
    #[error("vkQueuePresentKHR failed: {0}")]
    Present(vk::Result),

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
