//! Per-frame context for drawing.

use ash::vk;

/// The frame being drawn.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Index of the acquired swapchain image.
    pub image_index: u32,
    /// Render command buffer recorded for this image.
    pub command_buffer: vk::CommandBuffer,
    /// Framebuffer for this image.
    pub framebuffer: vk::Framebuffer,
    /// Current swapchain extent.
    pub extent: vk::Extent2D,
    /// Seconds since the previous frame; zero while paused.
    pub dt: f32,
    /// Number of frames presented before this one.
    pub frame_number: u64,
    /// Whether animation is paused.
    pub paused: bool,
}
