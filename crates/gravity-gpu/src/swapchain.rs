//! Swapchain management.
//!
//! [`SwapchainManager`] owns the swapchain, the per-image views,
//! framebuffers and command buffers, and the per-wait-slot semaphores and
//! fences. Two counters drive a frame:
//!
//! - the *image index*, returned by the presentation engine on acquire,
//!   selects the command buffer and framebuffer;
//! - the *wait slot*, advanced round-robin after every present, selects the
//!   semaphores and the in-flight fence.
//!
//! The two only coincide when the presentation engine hands out images in
//! strict rotation.

use crate::ash_driver::AshSwapchainDriver;
use crate::driver::{OwnershipTransfer, SubmitDesc, SwapchainDesc, SwapchainDriver};
use crate::error::{GpuError, Result};
use crate::negotiate::QueueFamilySelection;
use crate::timing::PresentTimingController;
use ash::vk;

/// What the application asks of the swapchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainRequest {
    pub image_count: u32,
    pub present_mode: vk::PresentModeKHR,
    pub preferred_format: vk::Format,
    pub fallback_format: vk::Format,
}

impl Default for SwapchainRequest {
    fn default() -> Self {
        Self {
            image_count: 3,
            present_mode: vk::PresentModeKHR::FIFO,
            preferred_format: vk::Format::B8G8R8A8_SRGB,
            fallback_format: vk::Format::B8G8R8A8_UNORM,
        }
    }
}

/// Queues the manager submits and presents on.
#[derive(Debug, Clone, Copy)]
pub struct QueueSetup {
    pub families: QueueFamilySelection,
    pub graphics: vk::Queue,
    pub present: vk::Queue,
}

/// Lifecycle of a [`SwapchainManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    /// Nothing negotiated yet.
    Uninitialized,
    /// Format, present mode and image count chosen; fences exist.
    Prepared,
    /// Swapchain and per-image resources are live.
    Attached,
    /// Per-image resources freed. The swapchain handle survives so it can
    /// be passed as `oldSwapchain` to the next creation.
    Detached,
    /// Everything released, including the surface.
    Destroyed,
}

/// Result of [`SwapchainManager::acquire_next_image_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image is ready. A suboptimal swapchain still presents correctly.
    Acquired { image_index: u32, suboptimal: bool },
    /// The surface changed; resize and acquire again.
    OutOfDate,
}

/// Result of [`SwapchainManager::submit_and_present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Presented,
    Suboptimal,
    /// The frame was submitted but the surface changed; resize before the
    /// next acquire.
    OutOfDate,
}

/// Clamp the requested image count to the surface limits.
///
/// A `max_image_count` of zero means unbounded.
#[must_use]
pub fn resolve_image_count(requested: u32, caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = requested.max(caps.min_image_count);
    if caps.max_image_count > 0 {
        count.min(caps.max_image_count)
    } else {
        count
    }
}

/// Extent to create the swapchain with.
///
/// A current width of `u32::MAX` means the window system lets the swapchain
/// decide, in which case the cached window size is kept.
#[must_use]
pub const fn resolve_extent(caps: &vk::SurfaceCapabilitiesKHR, cached: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width == u32::MAX {
        cached
    } else {
        caps.current_extent
    }
}

/// Choose the surface format.
///
/// A single `UNDEFINED` entry means the surface has no preference. Otherwise
/// an exact match of the preferred format wins, then the fallback, then the
/// last entry scanned.
pub fn select_surface_format(
    available: &[vk::SurfaceFormatKHR],
    preferred: vk::Format,
    fallback: vk::Format,
) -> Result<vk::SurfaceFormatKHR> {
    match available {
        [] => Err(GpuError::NoSurfaceFormats),
        [only] if only.format == vk::Format::UNDEFINED => Ok(vk::SurfaceFormatKHR {
            format: preferred,
            color_space: only.color_space,
        }),
        [.., last] => {
            if let Some(exact) = available.iter().find(|f| f.format == preferred) {
                return Ok(*exact);
            }
            Ok(available
                .iter()
                .find(|f| f.format == fallback)
                .copied()
                .unwrap_or(*last))
        }
    }
}

/// `OPAQUE` if supported, otherwise the first supported mode.
#[must_use]
pub fn select_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::INHERIT,
    ]
    .into_iter()
    .find(|&flag| supported.contains(flag))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// Identity if the surface supports it, otherwise its current transform.
#[must_use]
pub fn select_pre_transform(caps: &vk::SurfaceCapabilitiesKHR) -> vk::SurfaceTransformFlagsKHR {
    if caps
        .supported_transforms
        .contains(vk::SurfaceTransformFlagsKHR::IDENTITY)
    {
        vk::SurfaceTransformFlagsKHR::IDENTITY
    } else {
        caps.current_transform
    }
}

/// Resources owned per swapchain image.
#[derive(Debug, Clone, Copy)]
struct ImageResources {
    image: vk::Image,
    view: vk::ImageView,
    framebuffer: vk::Framebuffer,
    render_cmd: vk::CommandBuffer,
    /// Only allocated with a separate present queue.
    present_cmd: vk::CommandBuffer,
}

/// Semaphores owned per wait slot.
#[derive(Debug, Clone, Copy)]
struct SlotSync {
    image_acquired: vk::Semaphore,
    draw_complete: vk::Semaphore,
    image_ownership: Option<vk::Semaphore>,
}

/// Owns a swapchain and everything sized by its image count.
pub struct SwapchainManager<D: SwapchainDriver = AshSwapchainDriver> {
    driver: D,
    queues: QueueSetup,
    state: SwapchainState,

    requested_image_count: u32,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    composite_alpha: vk::CompositeAlphaFlagsKHR,
    pre_transform: vk::SurfaceTransformFlagsKHR,
    extent: vk::Extent2D,

    swapchain: vk::SwapchainKHR,
    command_pool: vk::CommandPool,
    images: Vec<ImageResources>,
    slots: Vec<SlotSync>,
    fences: Vec<vk::Fence>,

    wait_slot: usize,
    current_image: u32,
    acquired_image: Option<u32>,
    resize_pending: bool,
    timing: Option<PresentTimingController>,
}

impl<D: SwapchainDriver> SwapchainManager<D> {
    /// Create a manager for the driver's surface. `window_extent` is the
    /// window size used when the surface leaves the extent to the swapchain.
    pub const fn new(driver: D, queues: QueueSetup, window_extent: vk::Extent2D) -> Self {
        Self {
            driver,
            queues,
            state: SwapchainState::Uninitialized,
            requested_image_count: 0,
            surface_format: vk::SurfaceFormatKHR {
                format: vk::Format::UNDEFINED,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            present_mode: vk::PresentModeKHR::FIFO,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            pre_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            extent: window_extent,
            swapchain: vk::SwapchainKHR::null(),
            command_pool: vk::CommandPool::null(),
            images: Vec::new(),
            slots: Vec::new(),
            fences: Vec::new(),
            wait_slot: 0,
            current_image: 0,
            acquired_image: None,
            resize_pending: false,
            timing: None,
        }
    }

    fn expect_state(&self, allowed: &[SwapchainState], operation: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(GpuError::InvalidState(format!(
                "{operation} called in state {:?}",
                self.state
            )))
        }
    }

    /// Negotiate present mode, image count, composite alpha, pre-transform
    /// and surface format, and create one pre-signaled fence per image.
    ///
    /// Fails if the surface does not offer the exact present mode requested.
    pub fn prepare(&mut self, request: &SwapchainRequest) -> Result<()> {
        self.expect_state(&[SwapchainState::Uninitialized], "prepare")?;

        let present_modes = self.driver.surface_present_modes()?;
        if !present_modes.contains(&request.present_mode) {
            return Err(GpuError::PresentModeUnsupported(request.present_mode));
        }
        self.present_mode = request.present_mode;

        let caps = self.driver.surface_capabilities()?;
        self.requested_image_count = resolve_image_count(request.image_count, &caps);
        self.composite_alpha = select_composite_alpha(caps.supported_composite_alpha);
        self.pre_transform = select_pre_transform(&caps);
        self.extent = resolve_extent(&caps, self.extent);

        let formats = self.driver.surface_formats()?;
        self.surface_format =
            select_surface_format(&formats, request.preferred_format, request.fallback_format)?;

        self.resize_fences(self.requested_image_count as usize)?;

        tracing::info!(
            "Swapchain prepared: {} images, {:?}, {:?}/{:?}, composite {:?}",
            self.requested_image_count,
            self.present_mode,
            self.surface_format.format,
            self.surface_format.color_space,
            self.composite_alpha
        );
        if !self.driver.supports_display_timing() {
            tracing::debug!("Display timing unavailable, presenting without pacing");
        }

        self.state = SwapchainState::Prepared;
        Ok(())
    }

    /// Wait for `fence` and destroy it. A null slot lost its fence to a
    /// failed submit and has nothing to wait for.
    fn retire_fence(&self, fence: vk::Fence) -> Result<()> {
        if fence != vk::Fence::null() {
            self.driver.wait_for_fence(fence)?;
            self.driver.destroy_fence(fence);
        }
        Ok(())
    }

    /// Grow or shrink the fence ring to `count`, keeping existing fences.
    fn resize_fences(&mut self, count: usize) -> Result<()> {
        while self.fences.len() > count {
            if let Some(fence) = self.fences.pop() {
                self.retire_fence(fence)?;
            }
        }
        while self.fences.len() < count {
            let fence = self.driver.create_fence(true)?;
            self.fences.push(fence);
        }
        if self.wait_slot >= count {
            self.wait_slot = 0;
        }
        Ok(())
    }

    /// Create (or recreate) the swapchain and its per-image resources.
    ///
    /// The previous swapchain, if any, is passed as `oldSwapchain` and
    /// destroyed once the new one exists. A surface with zero area is left
    /// alone; the state is unchanged and the call succeeds.
    pub fn create_swapchain(&mut self) -> Result<()> {
        self.expect_state(
            &[SwapchainState::Prepared, SwapchainState::Detached],
            "create_swapchain",
        )?;

        let caps = self.driver.surface_capabilities()?;
        self.extent = resolve_extent(&caps, self.extent);
        if self.extent.width == 0 || self.extent.height == 0 {
            tracing::debug!("Surface has zero area, deferring swapchain creation");
            return Ok(());
        }

        let old_swapchain = self.swapchain;
        let desc = SwapchainDesc {
            min_image_count: self.requested_image_count,
            surface_format: self.surface_format,
            extent: self.extent,
            pre_transform: self.pre_transform,
            composite_alpha: self.composite_alpha,
            present_mode: self.present_mode,
            old_swapchain,
        };
        let swapchain = self.driver.create_swapchain(&desc)?;
        if old_swapchain != vk::SwapchainKHR::null() {
            self.driver.destroy_swapchain(old_swapchain);
        }
        self.swapchain = swapchain;

        let images = self.driver.swapchain_images(swapchain)?;
        if images.len() != self.requested_image_count as usize {
            tracing::info!(
                "Driver created {} swapchain images ({} requested)",
                images.len(),
                self.requested_image_count
            );
        }
        self.resize_fences(images.len())?;

        self.command_pool = self
            .driver
            .create_command_pool(self.queues.families.graphics)?;
        let render_cmds = self
            .driver
            .allocate_command_buffers(self.command_pool, images.len() as u32)?;
        let separate_present = self.queues.families.uses_separate_present_queue();
        let present_cmds = if separate_present {
            self.driver
                .allocate_command_buffers(self.command_pool, images.len() as u32)?
        } else {
            vec![vk::CommandBuffer::null(); images.len()]
        };

        for ((&image, &render_cmd), &present_cmd) in
            images.iter().zip(&render_cmds).zip(&present_cmds)
        {
            let view = self
                .driver
                .create_image_view(image, self.surface_format.format)?;
            self.images.push(ImageResources {
                image,
                view,
                framebuffer: vk::Framebuffer::null(),
                render_cmd,
                present_cmd,
            });
            if separate_present {
                self.driver.record_ownership_acquire(
                    present_cmd,
                    &OwnershipTransfer {
                        image,
                        src_family: self.queues.families.graphics,
                        dst_family: self.queues.families.present,
                    },
                )?;
            }
        }

        for _ in 0..images.len() {
            let image_acquired = self.driver.create_semaphore()?;
            let draw_complete = self.driver.create_semaphore()?;
            let image_ownership = if separate_present {
                Some(self.driver.create_semaphore()?)
            } else {
                None
            };
            self.slots.push(SlotSync {
                image_acquired,
                draw_complete,
                image_ownership,
            });
        }

        self.timing = if self.driver.supports_display_timing() {
            let refresh = self.driver.refresh_cycle_duration(swapchain)?;
            tracing::debug!("Refresh cycle {refresh} ns");
            Some(PresentTimingController::new(refresh))
        } else {
            None
        };

        self.current_image = 0;
        self.resize_pending = false;
        self.state = SwapchainState::Attached;

        tracing::info!(
            "Created swapchain: {}x{}, {} images",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
        Ok(())
    }

    /// Build one framebuffer per image from its color view and the shared
    /// depth view. Replaces framebuffers from an earlier call.
    pub fn attach_render_pass_and_depth_buffer(
        &mut self,
        render_pass: vk::RenderPass,
        depth_view: vk::ImageView,
    ) -> Result<()> {
        self.expect_state(&[SwapchainState::Attached], "attach_render_pass_and_depth_buffer")?;

        for index in 0..self.images.len() {
            let old = std::mem::replace(&mut self.images[index].framebuffer, vk::Framebuffer::null());
            if old != vk::Framebuffer::null() {
                self.driver.destroy_framebuffer(old);
            }
            let attachments = [self.images[index].view, depth_view];
            self.images[index].framebuffer =
                self.driver
                    .create_framebuffer(render_pass, &attachments, self.extent)?;
        }
        Ok(())
    }

    /// Wait for the current wait slot to retire, then acquire an image.
    ///
    /// The slot's fence is reset at submission, so an out-of-date result
    /// leaves it signaled and the next acquire cannot deadlock on it.
    pub fn acquire_next_image_index(&mut self) -> Result<AcquireOutcome> {
        self.expect_state(&[SwapchainState::Attached], "acquire_next_image_index")?;
        if self.acquired_image.is_some() {
            return Err(GpuError::InvalidState(
                "image already acquired and not yet presented".to_string(),
            ));
        }

        let slot = self.wait_slot;
        let fence = self.fences[slot];
        if fence == vk::Fence::null() {
            return Err(GpuError::InvalidState(format!(
                "wait slot {slot} has no fence after a failed submit"
            )));
        }
        self.driver.wait_for_fence(fence)?;

        match self
            .driver
            .acquire_next_image(self.swapchain, self.slots[slot].image_acquired)
        {
            Ok((image_index, suboptimal)) => {
                if suboptimal {
                    tracing::debug!("Acquired image {image_index} from a suboptimal swapchain");
                }
                self.current_image = image_index;
                self.acquired_image = Some(image_index);
                Ok(AcquireOutcome::Acquired {
                    image_index,
                    suboptimal,
                })
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                tracing::debug!("Swapchain out of date on acquire");
                self.resize_pending = true;
                Ok(AcquireOutcome::OutOfDate)
            }
            Err(err) => Err(GpuError::Acquire(err)),
        }
    }

    /// Submit the acquired image's render command buffer and present it.
    ///
    /// The wait slot advances whatever the present result.
    pub fn submit_and_present(&mut self) -> Result<PresentOutcome> {
        self.expect_state(&[SwapchainState::Attached], "submit_and_present")?;
        let image_index = self.acquired_image.take().ok_or_else(|| {
            GpuError::InvalidState("submit_and_present without an acquired image".to_string())
        })?;

        let present_time = match self.timing.as_mut() {
            Some(timing) => {
                let past = self.driver.past_presentation_timing(self.swapchain)?;
                timing.process(&past);
                Some(timing.next_present_time(self.driver.present_clock_ns()))
            }
            None => None,
        };

        let slot = self.wait_slot;
        let sync = self.slots[slot];
        let fence = self.fences[slot];
        let image = self.images[image_index as usize];

        self.driver.reset_fence(fence)?;
        let submitted = self.driver.queue_submit(
            self.queues.graphics,
            &SubmitDesc {
                command_buffers: &[image.render_cmd],
                wait: Some((
                    sync.image_acquired,
                    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                )),
                signal: Some(sync.draw_complete),
                fence,
            },
        );
        if let Err(err) = submitted {
            // Nothing will ever signal the reset fence; swap in a signaled
            // one so teardown can still wait on every slot.
            self.replace_unsubmitted_fence(slot);
            return Err(err);
        }

        let mut present_wait = sync.draw_complete;
        if let Some(ownership) = sync.image_ownership {
            self.driver.queue_submit(
                self.queues.present,
                &SubmitDesc {
                    command_buffers: &[image.present_cmd],
                    wait: Some((
                        sync.draw_complete,
                        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                    )),
                    signal: Some(ownership),
                    fence: vk::Fence::null(),
                },
            )?;
            present_wait = ownership;
        }

        let result = self.driver.queue_present(
            self.queues.present,
            self.swapchain,
            image_index,
            present_wait,
            present_time,
        );
        self.wait_slot = (slot + 1) % self.slots.len();

        match result {
            Ok(false) => Ok(PresentOutcome::Presented),
            Ok(true) => Ok(PresentOutcome::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                tracing::debug!("Swapchain out of date on present");
                self.resize_pending = true;
                Ok(PresentOutcome::OutOfDate)
            }
            Err(err) => Err(GpuError::Present(err)),
        }
    }

    fn replace_unsubmitted_fence(&mut self, slot: usize) {
        match self.driver.create_fence(true) {
            Ok(replacement) => {
                let stale = std::mem::replace(&mut self.fences[slot], replacement);
                self.driver.destroy_fence(stale);
            }
            Err(err) => {
                tracing::error!("Failed to replace fence for slot {slot}: {err}");
                let stale = std::mem::replace(&mut self.fences[slot], vk::Fence::null());
                self.driver.destroy_fence(stale);
            }
        }
    }

    /// Submit already-recorded command buffers to the graphics queue,
    /// optionally blocking until `fence` signals.
    pub fn submit(
        &self,
        command_buffers: &[vk::CommandBuffer],
        fence: vk::Fence,
        wait: bool,
    ) -> Result<()> {
        if self.state == SwapchainState::Destroyed {
            return Err(GpuError::InvalidState("submit after destroy".to_string()));
        }
        self.driver.queue_submit(
            self.queues.graphics,
            &SubmitDesc {
                command_buffers,
                wait: None,
                signal: None,
                fence,
            },
        )?;
        if wait && fence != vk::Fence::null() {
            self.driver.wait_for_fence(fence)?;
        }
        Ok(())
    }

    /// Record the release of image `image_index` from the graphics to the
    /// present queue family into `cmd`. Does nothing when both are the same
    /// family.
    pub fn insert_present_commands(&self, cmd: vk::CommandBuffer, image_index: u32) -> Result<()> {
        if !self.uses_separate_present_queue() {
            return Ok(());
        }
        let image = self.image(image_index)?;
        self.driver.cmd_ownership_release(
            cmd,
            &OwnershipTransfer {
                image: image.image,
                src_family: self.queues.families.graphics,
                dst_family: self.queues.families.present,
            },
        );
        Ok(())
    }

    /// Free command buffers, framebuffers, views and semaphores.
    ///
    /// Keeps the swapchain handle and the fences. Safe to call repeatedly.
    pub fn detach(&mut self) {
        let render_cmds: Vec<_> = self.images.iter().map(|i| i.render_cmd).collect();
        let present_cmds: Vec<_> = self
            .images
            .iter()
            .map(|i| i.present_cmd)
            .filter(|&cmd| cmd != vk::CommandBuffer::null())
            .collect();

        if self.command_pool != vk::CommandPool::null() {
            self.driver
                .free_command_buffers(self.command_pool, &render_cmds);
            self.driver
                .free_command_buffers(self.command_pool, &present_cmds);
            self.driver.destroy_command_pool(self.command_pool);
            self.command_pool = vk::CommandPool::null();
        }

        for image in self.images.drain(..) {
            if image.framebuffer != vk::Framebuffer::null() {
                self.driver.destroy_framebuffer(image.framebuffer);
            }
            self.driver.destroy_image_view(image.view);
        }

        for sync in self.slots.drain(..) {
            self.driver.destroy_semaphore(sync.image_acquired);
            self.driver.destroy_semaphore(sync.draw_complete);
            if let Some(ownership) = sync.image_ownership {
                self.driver.destroy_semaphore(ownership);
            }
        }

        self.acquired_image = None;
        self.timing = None;
        if self.state == SwapchainState::Attached {
            tracing::debug!("Swapchain detached");
            self.state = SwapchainState::Detached;
        }
    }

    /// Release per-image resources and re-query the surface size.
    ///
    /// The caller recreates resources with [`Self::create_swapchain`].
    pub fn resize(&mut self) -> Result<()> {
        self.expect_state(
            &[
                SwapchainState::Prepared,
                SwapchainState::Attached,
                SwapchainState::Detached,
            ],
            "resize",
        )?;
        self.detach();
        let caps = self.driver.surface_capabilities()?;
        self.extent = resolve_extent(&caps, self.extent);
        self.resize_pending = false;
        tracing::info!("Swapchain resize to {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }

    /// Wait for every in-flight frame, then release everything including
    /// the surface. Calling it again does nothing.
    pub fn destroy_swapchain(&mut self) -> Result<()> {
        if self.state == SwapchainState::Destroyed {
            return Ok(());
        }

        while let Some(fence) = self.fences.pop() {
            self.retire_fence(fence)?;
        }
        self.detach();
        if self.swapchain != vk::SwapchainKHR::null() {
            self.driver.destroy_swapchain(self.swapchain);
            self.swapchain = vk::SwapchainKHR::null();
        }
        self.driver.destroy_surface();
        self.state = SwapchainState::Destroyed;
        tracing::info!("Swapchain destroyed");
        Ok(())
    }

    /// Update the window size used when the surface does not report one.
    pub const fn set_window_extent(&mut self, width: u32, height: u32) {
        self.extent = vk::Extent2D { width, height };
    }

    /// Whether an out-of-date result asked for a resize that has not
    /// happened yet.
    #[must_use]
    pub const fn resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Consume the pending-resize flag set by an out-of-date present.
    pub fn take_resize_pending(&mut self) -> bool {
        std::mem::take(&mut self.resize_pending)
    }

    fn image(&self, index: u32) -> Result<&ImageResources> {
        self.images.get(index as usize).ok_or_else(|| {
            GpuError::InvalidState(format!(
                "image index {index} out of range ({} images)",
                self.images.len()
            ))
        })
    }

    /// Render command buffer for image `index`.
    pub fn render_command_buffer(&self, index: u32) -> Result<vk::CommandBuffer> {
        self.image(index).map(|i| i.render_cmd)
    }

    /// Framebuffer for image `index`; null until a render pass is attached.
    pub fn framebuffer(&self, index: u32) -> Result<vk::Framebuffer> {
        self.image(index).map(|i| i.framebuffer)
    }

    /// Render command buffer of the most recently acquired image.
    pub fn current_render_command_buffer(&self) -> Result<vk::CommandBuffer> {
        self.render_command_buffer(self.current_image)
    }

    /// Framebuffer of the most recently acquired image.
    pub fn current_framebuffer(&self) -> Result<vk::Framebuffer> {
        self.framebuffer(self.current_image)
    }

    #[must_use]
    pub const fn state(&self) -> SwapchainState {
        self.state
    }

    #[must_use]
    pub const fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.extent.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.extent.height
    }

    /// Number of live swapchain images.
    #[must_use]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    #[must_use]
    pub const fn swapchain_format(&self) -> vk::Format {
        self.surface_format.format
    }

    #[must_use]
    pub const fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.surface_format
    }

    #[must_use]
    pub const fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    #[must_use]
    pub const fn graphics_queue_family(&self) -> u32 {
        self.queues.families.graphics
    }

    #[must_use]
    pub const fn present_queue_family(&self) -> u32 {
        self.queues.families.present
    }

    #[must_use]
    pub const fn uses_separate_present_queue(&self) -> bool {
        self.queues.families.uses_separate_present_queue()
    }

    #[must_use]
    pub const fn wait_slot(&self) -> usize {
        self.wait_slot
    }

    #[must_use]
    pub const fn current_image(&self) -> u32 {
        self.current_image
    }

    /// Frame pacing state, when display timing is active.
    #[must_use]
    pub const fn timing(&self) -> Option<&PresentTimingController> {
        self.timing.as_ref()
    }

    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: SwapchainDriver> Drop for SwapchainManager<D> {
    fn drop(&mut self) {
        if let Err(err) = self.destroy_swapchain() {
            tracing::error!("Failed to destroy swapchain on drop: {err}");
        }
    }
}
