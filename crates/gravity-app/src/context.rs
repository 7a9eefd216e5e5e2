//! Application context.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use ash::vk;
use gravity_core::EventQueue;
use gravity_gpu::command::{begin_command_buffer, end_command_buffer, transition_image_layout};
use gravity_gpu::sync::ScopedFence;
use gravity_gpu::{
    CommandPool, DepthBuffer, GpuContext, LayoutTransition, SwapchainManager, SwapchainState,
};
use gravity_platform::WinitBackend;

use crate::config::AppConfig;
use crate::setup::{SetupDevice, SetupLifecycle};

/// Application context shared across all app methods.
///
/// Field order is drop order: the swapchain (and with it the surface) goes
/// before the device, the device before the window.
pub struct AppContext {
    /// Swapchain and per-image resources.
    pub swapchain: SwapchainManager,
    setup: SetupLifecycle<DepthBuffer>,
    setup_pool: Option<CommandPool>,
    /// GPU context with device and queues.
    pub gpu: GpuContext,
    /// The window.
    pub window: WinitBackend,
    /// Events delivered by the window, drained once per loop iteration.
    pub events: Arc<EventQueue>,
    /// Configuration the application was started with.
    pub config: AppConfig,
    /// Frames presented so far.
    pub frame_count: u64,
    pub(crate) last_frame_time: Instant,
}

impl AppContext {
    pub(crate) fn new(
        swapchain: SwapchainManager,
        gpu: GpuContext,
        window: WinitBackend,
        events: Arc<EventQueue>,
        config: AppConfig,
    ) -> Self {
        Self {
            swapchain,
            setup: SetupLifecycle::default(),
            setup_pool: None,
            gpu,
            window,
            events,
            config,
            frame_count: 0,
            last_frame_time: Instant::now(),
        }
    }

    /// Get the Vulkan device.
    pub fn device(&self) -> &ash::Device {
        self.gpu.device()
    }

    /// Get the current swapchain extent.
    pub const fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Get the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        let extent = self.extent();
        if extent.height == 0 {
            return 1.0;
        }
        extent.width as f32 / extent.height as f32
    }

    /// The depth buffer, absent while the window has zero area.
    pub const fn depth(&self) -> Option<&DepthBuffer> {
        self.setup.depth()
    }

    /// Whether the swapchain and depth buffer exist and frames can be drawn.
    pub const fn is_prepared(&self) -> bool {
        self.setup.is_prepared()
    }

    fn split_setup(&mut self) -> (&mut SetupLifecycle<DepthBuffer>, VulkanSetup<'_>) {
        let device = VulkanSetup {
            gpu: &self.gpu,
            swapchain: &mut self.swapchain,
            pool: &mut self.setup_pool,
        };
        (&mut self.setup, device)
    }

    /// Create the swapchain, start the setup command buffer and create the
    /// depth buffer.
    ///
    /// A window with zero area leaves the context unprepared, which is not an
    /// error; the next resize tries again.
    pub(crate) fn pre_setup(&mut self) -> anyhow::Result<()> {
        let (setup, mut device) = self.split_setup();
        setup.pre_setup(&mut device)
    }

    /// The setup command buffer started by [`Self::pre_setup`].
    pub(crate) const fn setup_command_buffer(&self) -> vk::CommandBuffer {
        self.setup.setup_command_buffer()
    }

    /// Submit the setup command buffer and block until it has executed.
    pub(crate) fn post_setup(&mut self) -> anyhow::Result<()> {
        let (setup, mut device) = self.split_setup();
        setup.post_setup(&mut device)
    }

    /// Tear down the depth buffer, the setup command pool and the swapchain
    /// resources. The device must be idle.
    ///
    /// On resize the swapchain keeps its surface and handle for recreation;
    /// otherwise it is destroyed for good.
    pub(crate) fn cleanup_command_objects(&mut self, is_resize: bool) -> anyhow::Result<()> {
        let (setup, mut device) = self.split_setup();
        setup.cleanup(&mut device, is_resize)
    }
}

/// [`SetupDevice`] over the context's GPU, swapchain and setup pool.
struct VulkanSetup<'a> {
    gpu: &'a GpuContext,
    swapchain: &'a mut SwapchainManager,
    pool: &'a mut Option<CommandPool>,
}

impl SetupDevice for VulkanSetup<'_> {
    type Depth = DepthBuffer;

    fn create_swapchain(&mut self) -> anyhow::Result<bool> {
        self.swapchain.create_swapchain()?;
        Ok(self.swapchain.state() == SwapchainState::Attached)
    }

    fn begin_setup_commands(&mut self) -> anyhow::Result<vk::CommandBuffer> {
        if self.pool.is_none() {
            *self.pool = Some(CommandPool::new(
                self.gpu.shared_device(),
                self.gpu.graphics_queue_family(),
                vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            )?);
        }
        let pool = self.pool.as_ref().context("setup command pool missing")?;
        let cmd = pool.allocate()?;
        unsafe {
            begin_command_buffer(
                self.gpu.device(),
                cmd,
                vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            )?;
        }
        Ok(cmd)
    }

    fn create_depth(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<DepthBuffer> {
        let device = self.gpu.device();
        let depth = unsafe {
            DepthBuffer::new(device, self.gpu.memory_properties(), self.swapchain.extent())?
        };
        unsafe {
            transition_image_layout(
                device,
                cmd,
                depth.image,
                &LayoutTransition {
                    aspect_mask: vk::ImageAspectFlags::DEPTH,
                    old_layout: vk::ImageLayout::UNDEFINED,
                    new_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                    src_access_mask: vk::AccessFlags::empty(),
                    src_stages: vk::PipelineStageFlags::TOP_OF_PIPE,
                    dest_stages: vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                },
            );
        }
        Ok(depth)
    }

    fn destroy_depth(&mut self, depth: DepthBuffer) {
        unsafe { depth.destroy(self.gpu.device()) };
    }

    fn submit_and_wait(&mut self, cmd: vk::CommandBuffer) -> anyhow::Result<()> {
        let device = self.gpu.device();
        unsafe { end_command_buffer(device, cmd)? };
        let fence = ScopedFence::new(device)?;
        self.swapchain.submit(&[cmd], fence.handle(), true)?;
        Ok(())
    }

    fn free_setup_commands(&mut self, cmd: vk::CommandBuffer) {
        if let Some(pool) = self.pool.as_ref() {
            unsafe { pool.free(&[cmd]) };
        }
    }

    fn release_setup_pool(&mut self) {
        *self.pool = None;
    }

    fn release_swapchain(&mut self, is_resize: bool) -> anyhow::Result<()> {
        if is_resize {
            self.swapchain.resize()?;
        } else {
            self.swapchain.destroy_swapchain()?;
        }
        Ok(())
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        if let Err(e) = self.gpu.wait_idle() {
            tracing::error!("Failed to wait idle: {e}");
        }
        if let Err(e) = self.cleanup_command_objects(false) {
            tracing::error!("Failed to release swapchain: {e}");
        }
    }
}
