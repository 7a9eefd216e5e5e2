//! The seam between [`crate::SwapchainManager`] and the Vulkan driver.
//!
//! The manager only talks to the GPU through [`SwapchainDriver`], which keeps
//! its state machine testable against a scripted driver. The production
//! implementation is [`crate::AshSwapchainDriver`].

use crate::error::Result;
use ash::prelude::VkResult;
use ash::vk;

/// Everything needed to create a swapchain for the driver's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainDesc {
    pub min_image_count: u32,
    pub surface_format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub old_swapchain: vk::SwapchainKHR,
}

/// A single queue submission with at most one wait and one signal semaphore.
#[derive(Debug, Clone, Copy)]
pub struct SubmitDesc<'a> {
    pub command_buffers: &'a [vk::CommandBuffer],
    pub wait: Option<(vk::Semaphore, vk::PipelineStageFlags)>,
    pub signal: Option<vk::Semaphore>,
    pub fence: vk::Fence,
}

/// A queue family ownership transfer of one swapchain image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipTransfer {
    pub image: vk::Image,
    pub src_family: u32,
    pub dst_family: u32,
}

/// Driver operations used by the swapchain manager.
///
/// Errors returned here are fatal to the caller, except for the raw
/// [`VkResult`]s of acquire and present, which the manager inspects for
/// out-of-date and suboptimal codes.
pub trait SwapchainDriver {
    // Surface
    fn surface_capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR>;
    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>>;
    fn surface_present_modes(&self) -> Result<Vec<vk::PresentModeKHR>>;
    fn destroy_surface(&self);

    // Swapchain
    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR>;
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>>;
    /// Returns the image index and whether the swapchain is suboptimal.
    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)>;
    /// Returns whether the swapchain is suboptimal.
    fn queue_present(
        &self,
        queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
        present_time: Option<vk::PresentTimeGOOGLE>,
    ) -> VkResult<bool>;

    // Display timing
    fn supports_display_timing(&self) -> bool;
    fn refresh_cycle_duration(&self, swapchain: vk::SwapchainKHR) -> Result<u64>;
    fn past_presentation_timing(
        &self,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::PastPresentationTimingGOOGLE>>;
    /// The presentation engine's clock in nanoseconds, if readable.
    fn present_clock_ns(&self) -> Option<u64>;

    // Per-image objects
    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> Result<vk::ImageView>;
    fn destroy_image_view(&self, view: vk::ImageView);
    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    // Synchronization
    fn create_semaphore(&self) -> Result<vk::Semaphore>;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    fn create_fence(&self, signaled: bool) -> Result<vk::Fence>;
    fn destroy_fence(&self, fence: vk::Fence);
    /// Block until `fence` signals. There is no timeout.
    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()>;
    fn reset_fence(&self, fence: vk::Fence) -> Result<()>;

    // Commands
    fn create_command_pool(&self, queue_family: u32) -> Result<vk::CommandPool>;
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn allocate_command_buffers(
        &self,
        pool: vk::CommandPool,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>>;
    fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]);
    /// Record a complete command buffer that acquires `transfer.image` on the
    /// present queue family.
    fn record_ownership_acquire(
        &self,
        cmd: vk::CommandBuffer,
        transfer: &OwnershipTransfer,
    ) -> Result<()>;
    /// Append the matching release barrier to a command buffer that is
    /// already recording.
    fn cmd_ownership_release(&self, cmd: vk::CommandBuffer, transfer: &OwnershipTransfer);
    fn queue_submit(&self, queue: vk::Queue, submit: &SubmitDesc<'_>) -> Result<()>;
}
