//! [`SwapchainDriver`] backed by a real Vulkan device.

use crate::capabilities::ExtensionTable;
use crate::context::GpuContext;
use crate::driver::{OwnershipTransfer, SubmitDesc, SwapchainDesc, SwapchainDriver};
use crate::error::{GpuError, Result};
use crate::surface::SurfaceContext;
use crate::sync::fence_info;
use ash::prelude::VkResult;
use ash::vk;
use std::sync::Arc;

fn color_range() -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange::default()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1)
}

fn ownership_barrier(transfer: &OwnershipTransfer) -> vk::ImageMemoryBarrier<'static> {
    vk::ImageMemoryBarrier::default()
        .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
        .dst_access_mask(vk::AccessFlags::empty())
        .old_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
        .src_queue_family_index(transfer.src_family)
        .dst_queue_family_index(transfer.dst_family)
        .image(transfer.image)
        .subresource_range(color_range())
}

/// Swapchain driver for one surface on one logical device.
///
/// Owns the surface; it is released by [`SwapchainDriver::destroy_surface`].
pub struct AshSwapchainDriver {
    device: Arc<ash::Device>,
    extensions: ExtensionTable,
    surface: SurfaceContext,
}

impl AshSwapchainDriver {
    /// Bind `surface` to the context's device.
    #[must_use]
    pub fn new(gpu: &GpuContext, surface: SurfaceContext) -> Self {
        Self {
            device: Arc::clone(&gpu.device),
            extensions: gpu.extensions.clone(),
            surface,
        }
    }

    fn display_timing(&self) -> Result<&ash::google::display_timing::Device> {
        self.extensions.display_timing.as_ref().ok_or_else(|| {
            GpuError::ExtensionNotSupported(
                ash::google::display_timing::NAME.to_string_lossy().into_owned(),
            )
        })
    }
}

impl SwapchainDriver for AshSwapchainDriver {
    fn surface_capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        self.surface.capabilities()
    }

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>> {
        self.surface.formats()
    }

    fn surface_present_modes(&self) -> Result<Vec<vk::PresentModeKHR>> {
        self.surface.present_modes()
    }

    fn destroy_surface(&self) {
        // SAFETY: the manager destroys the swapchain before the surface.
        unsafe { self.surface.destroy() }
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR> {
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface.surface)
            .min_image_count(desc.min_image_count)
            .image_format(desc.surface_format.format)
            .image_color_space(desc.surface_format.color_space)
            .image_extent(desc.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(desc.pre_transform)
            .composite_alpha(desc.composite_alpha)
            .present_mode(desc.present_mode)
            .clipped(true)
            .old_swapchain(desc.old_swapchain);

        unsafe {
            self.extensions
                .swapchain
                .create_swapchain(&create_info, None)
                .map_err(|e| GpuError::SwapchainCreation(e.to_string()))
        }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.extensions.swapchain.destroy_swapchain(swapchain, None) }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        unsafe {
            self.extensions
                .swapchain
                .get_swapchain_images(swapchain)
                .map_err(GpuError::from)
        }
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.extensions.swapchain.acquire_next_image(
                swapchain,
                u64::MAX,
                semaphore,
                vk::Fence::null(),
            )
        }
    }

    fn queue_present(
        &self,
        queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
        present_time: Option<vk::PresentTimeGOOGLE>,
    ) -> VkResult<bool> {
        let swapchains = [swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let mut present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let times: Vec<vk::PresentTimeGOOGLE> = present_time.into_iter().collect();
        let mut times_info = vk::PresentTimesInfoGOOGLE::default().times(&times);
        if !times.is_empty() {
            present_info = present_info.push_next(&mut times_info);
        }

        unsafe { self.extensions.swapchain.queue_present(queue, &present_info) }
    }

    fn supports_display_timing(&self) -> bool {
        self.extensions.has_display_timing()
    }

    fn refresh_cycle_duration(&self, swapchain: vk::SwapchainKHR) -> Result<u64> {
        let timing = self.display_timing()?;
        let duration = unsafe { timing.get_refresh_cycle_duration(swapchain)? };
        Ok(duration.refresh_duration)
    }

    fn past_presentation_timing(
        &self,
        swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::PastPresentationTimingGOOGLE>> {
        let timing = self.display_timing()?;
        unsafe {
            timing
                .get_past_presentation_timing(swapchain)
                .map_err(GpuError::from)
        }
    }

    fn present_clock_ns(&self) -> Option<u64> {
        // The presentation engine clock is not exposed portably; the timing
        // controller anchors itself to feedback timestamps instead.
        None
    }

    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> Result<vk::ImageView> {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::R,
                g: vk::ComponentSwizzle::G,
                b: vk::ComponentSwizzle::B,
                a: vk::ComponentSwizzle::A,
            })
            .subresource_range(color_range());

        unsafe {
            self.device
                .create_image_view(&view_info, None)
                .map_err(GpuError::from)
        }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) }
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer> {
        let info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        unsafe {
            self.device
                .create_framebuffer(&info, None)
                .map_err(GpuError::from)
        }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(framebuffer, None) }
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        unsafe {
            self.device
                .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(GpuError::from)
        }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) }
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        unsafe {
            self.device
                .create_fence(&fence_info(signaled), None)
                .map_err(GpuError::from)
        }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) }
    }

    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()> {
        // No timeout: a lost device surfaces as an error instead.
        unsafe {
            self.device
                .wait_for_fences(&[fence], true, u64::MAX)
                .map_err(GpuError::from)
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.device.reset_fences(&[fence]).map_err(GpuError::from) }
    }

    fn create_command_pool(&self, queue_family: u32) -> Result<vk::CommandPool> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        unsafe {
            self.device
                .create_command_pool(&create_info, None)
                .map_err(GpuError::from)
        }
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe { self.device.destroy_command_pool(pool, None) }
    }

    fn allocate_command_buffers(
        &self,
        pool: vk::CommandPool,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe {
            self.device
                .allocate_command_buffers(&alloc_info)
                .map_err(GpuError::from)
        }
    }

    fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        if !buffers.is_empty() {
            unsafe { self.device.free_command_buffers(pool, buffers) }
        }
    }

    fn record_ownership_acquire(
        &self,
        cmd: vk::CommandBuffer,
        transfer: &OwnershipTransfer,
    ) -> Result<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);
        let barrier = ownership_barrier(transfer)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

        unsafe {
            self.device.begin_command_buffer(cmd, &begin_info)?;
            self.device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
            self.device.end_command_buffer(cmd)?;
        }
        Ok(())
    }

    fn cmd_ownership_release(&self, cmd: vk::CommandBuffer, transfer: &OwnershipTransfer) {
        let barrier = ownership_barrier(transfer);
        unsafe {
            self.device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    fn queue_submit(&self, queue: vk::Queue, submit: &SubmitDesc<'_>) -> Result<()> {
        let (wait_semaphores, wait_stages): (Vec<_>, Vec<_>) = submit.wait.into_iter().unzip();
        let signal_semaphores: Vec<_> = submit.signal.into_iter().collect();

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(submit.command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device
                .queue_submit(queue, &[submit_info], submit.fence)
                .map_err(GpuError::from)
        }
    }
}
