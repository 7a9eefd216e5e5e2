//! Scripted [`SwapchainDriver`] for unit tests.
//!
//! Hands out fake handles, counts creations and destructions per object
//! kind, and panics on double destruction or on waits that could never
//! complete on a real device.

use crate::driver::{OwnershipTransfer, SubmitDesc, SwapchainDesc, SwapchainDriver};
use crate::error::{GpuError, Result};
use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct RecordedSubmit {
    pub queue: vk::Queue,
    pub command_buffers: Vec<vk::CommandBuffer>,
    pub wait: Option<(vk::Semaphore, vk::PipelineStageFlags)>,
    pub signal: Option<vk::Semaphore>,
    pub fence: vk::Fence,
}

#[derive(Debug, Clone, Copy)]
pub struct RecordedPresent {
    pub queue: vk::Queue,
    pub image_index: u32,
    pub wait_semaphore: vk::Semaphore,
    pub present_time: Option<vk::PresentTimeGOOGLE>,
}

pub struct MockDriver {
    next_handle: Cell<u64>,
    live: RefCell<HashSet<(&'static str, u64)>>,
    created: RefCell<HashMap<&'static str, usize>>,
    destroyed: RefCell<HashMap<&'static str, usize>>,
    fence_signaled: RefCell<HashMap<u64, bool>>,
    images: RefCell<HashMap<u64, Vec<vk::Image>>>,
    next_image: Cell<u32>,

    pub capabilities: RefCell<vk::SurfaceCapabilitiesKHR>,
    pub formats: RefCell<Vec<vk::SurfaceFormatKHR>>,
    pub present_modes: RefCell<Vec<vk::PresentModeKHR>>,
    /// Number of images the driver actually creates, instead of the minimum requested.
    pub image_count_override: Cell<Option<u32>>,
    pub acquire_script: RefCell<VecDeque<VkResult<(u32, bool)>>>,
    pub present_script: RefCell<VecDeque<VkResult<bool>>>,
    /// Error returned by the next queue submission, which then leaves its
    /// fence untouched.
    pub submit_failure: Cell<Option<vk::Result>>,
    pub display_timing: Cell<bool>,
    pub refresh_duration: Cell<u64>,
    pub past_timings: RefCell<VecDeque<Vec<vk::PastPresentationTimingGOOGLE>>>,

    pub swapchain_descs: RefCell<Vec<SwapchainDesc>>,
    pub submits: RefCell<Vec<RecordedSubmit>>,
    pub presents: RefCell<Vec<RecordedPresent>>,
    pub ownership_releases: RefCell<Vec<(vk::CommandBuffer, OwnershipTransfer)>>,
    pub ownership_acquires: RefCell<Vec<(vk::CommandBuffer, OwnershipTransfer)>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            next_handle: Cell::new(0x1000),
            live: RefCell::default(),
            created: RefCell::default(),
            destroyed: RefCell::default(),
            fence_signaled: RefCell::default(),
            images: RefCell::default(),
            next_image: Cell::new(0),
            capabilities: RefCell::new(vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 8,
                current_extent: vk::Extent2D {
                    width: 640,
                    height: 480,
                },
                supported_transforms: vk::SurfaceTransformFlagsKHR::IDENTITY,
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                ..Default::default()
            }),
            formats: RefCell::new(vec![
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_UNORM,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
                vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                },
            ]),
            present_modes: RefCell::new(vec![vk::PresentModeKHR::FIFO]),
            image_count_override: Cell::new(None),
            acquire_script: RefCell::default(),
            present_script: RefCell::default(),
            submit_failure: Cell::new(None),
            display_timing: Cell::new(false),
            refresh_duration: Cell::new(16_666_667),
            past_timings: RefCell::default(),
            swapchain_descs: RefCell::default(),
            submits: RefCell::default(),
            presents: RefCell::default(),
            ownership_releases: RefCell::default(),
            ownership_acquires: RefCell::default(),
        }
    }
}

impl MockDriver {
    fn handle<H: Handle>(&self) -> H {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        H::from_raw(raw)
    }

    fn create<H: Handle + Copy>(&self, kind: &'static str) -> H {
        let handle: H = self.handle();
        self.live.borrow_mut().insert((kind, handle.as_raw()));
        *self.created.borrow_mut().entry(kind).or_default() += 1;
        handle
    }

    fn destroy<H: Handle>(&self, kind: &'static str, handle: H) {
        let raw = handle.as_raw();
        assert!(
            self.live.borrow_mut().remove(&(kind, raw)),
            "{kind} {raw:#x} destroyed twice or never created"
        );
        *self.destroyed.borrow_mut().entry(kind).or_default() += 1;
    }

    fn assert_live<H: Handle>(&self, kind: &'static str, handle: H) {
        let raw = handle.as_raw();
        assert!(
            self.live.borrow().contains(&(kind, raw)),
            "{kind} {raw:#x} used but not alive"
        );
    }

    pub fn created(&self, kind: &str) -> usize {
        self.created.borrow().get(kind).copied().unwrap_or(0)
    }

    pub fn destroyed(&self, kind: &str) -> usize {
        self.destroyed.borrow().get(kind).copied().unwrap_or(0)
    }

    pub fn live_count(&self, kind: &str) -> usize {
        self.live.borrow().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_fence_signaled(&self, fence: vk::Fence) -> bool {
        self.fence_signaled
            .borrow()
            .get(&fence.as_raw())
            .copied()
            .unwrap_or(false)
    }

    pub fn assert_all_released(&self) {
        let live = self.live.borrow();
        assert!(live.is_empty(), "leaked objects: {live:?}");
    }
}

impl SwapchainDriver for MockDriver {
    fn surface_capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        Ok(*self.capabilities.borrow())
    }

    fn surface_formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>> {
        Ok(self.formats.borrow().clone())
    }

    fn surface_present_modes(&self) -> Result<Vec<vk::PresentModeKHR>> {
        Ok(self.present_modes.borrow().clone())
    }

    fn destroy_surface(&self) {
        *self.destroyed.borrow_mut().entry("surface").or_default() += 1;
        assert_eq!(self.destroyed("surface"), 1, "surface destroyed twice");
    }

    fn create_swapchain(&self, desc: &SwapchainDesc) -> Result<vk::SwapchainKHR> {
        if desc.old_swapchain != vk::SwapchainKHR::null() {
            self.assert_live("swapchain", desc.old_swapchain);
        }
        self.swapchain_descs.borrow_mut().push(*desc);

        let swapchain: vk::SwapchainKHR = self.create("swapchain");
        let count = self
            .image_count_override
            .get()
            .unwrap_or(desc.min_image_count);
        let images = (0..count).map(|_| self.handle()).collect();
        self.images.borrow_mut().insert(swapchain.as_raw(), images);
        Ok(swapchain)
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.destroy("swapchain", swapchain);
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        self.assert_live("swapchain", swapchain);
        Ok(self.images.borrow()[&swapchain.as_raw()].clone())
    }

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        semaphore: vk::Semaphore,
    ) -> VkResult<(u32, bool)> {
        self.assert_live("swapchain", swapchain);
        self.assert_live("semaphore", semaphore);
        if let Some(scripted) = self.acquire_script.borrow_mut().pop_front() {
            return scripted;
        }
        let count = self.images.borrow()[&swapchain.as_raw()].len() as u32;
        let index = self.next_image.get() % count;
        self.next_image.set(index + 1);
        Ok((index, false))
    }

    fn queue_present(
        &self,
        queue: vk::Queue,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
        present_time: Option<vk::PresentTimeGOOGLE>,
    ) -> VkResult<bool> {
        self.assert_live("swapchain", swapchain);
        self.assert_live("semaphore", wait_semaphore);
        self.presents.borrow_mut().push(RecordedPresent {
            queue,
            image_index,
            wait_semaphore,
            present_time,
        });
        self.present_script
            .borrow_mut()
            .pop_front()
            .unwrap_or(Ok(false))
    }

    fn supports_display_timing(&self) -> bool {
        self.display_timing.get()
    }

    fn refresh_cycle_duration(&self, _swapchain: vk::SwapchainKHR) -> Result<u64> {
        if self.display_timing.get() {
            Ok(self.refresh_duration.get())
        } else {
            Err(GpuError::ExtensionNotSupported("VK_GOOGLE_display_timing".into()))
        }
    }

    fn past_presentation_timing(
        &self,
        _swapchain: vk::SwapchainKHR,
    ) -> Result<Vec<vk::PastPresentationTimingGOOGLE>> {
        Ok(self.past_timings.borrow_mut().pop_front().unwrap_or_default())
    }

    fn present_clock_ns(&self) -> Option<u64> {
        Some(1_000_000_000)
    }

    fn create_image_view(&self, _image: vk::Image, _format: vk::Format) -> Result<vk::ImageView> {
        Ok(self.create("image_view"))
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.destroy("image_view", view);
    }

    fn create_framebuffer(
        &self,
        _render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        _extent: vk::Extent2D,
    ) -> Result<vk::Framebuffer> {
        self.assert_live("image_view", attachments[0]);
        Ok(self.create("framebuffer"))
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.destroy("framebuffer", framebuffer);
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        Ok(self.create("semaphore"))
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.destroy("semaphore", semaphore);
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        let fence: vk::Fence = self.create("fence");
        self.fence_signaled
            .borrow_mut()
            .insert(fence.as_raw(), signaled);
        Ok(fence)
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        self.destroy("fence", fence);
        self.fence_signaled.borrow_mut().remove(&fence.as_raw());
    }

    fn wait_for_fence(&self, fence: vk::Fence) -> Result<()> {
        self.assert_live("fence", fence);
        assert!(
            self.is_fence_signaled(fence),
            "waiting on fence {:#x} that nothing will signal",
            fence.as_raw()
        );
        Ok(())
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        self.assert_live("fence", fence);
        self.fence_signaled
            .borrow_mut()
            .insert(fence.as_raw(), false);
        Ok(())
    }

    fn create_command_pool(&self, _queue_family: u32) -> Result<vk::CommandPool> {
        Ok(self.create("command_pool"))
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.destroy("command_pool", pool);
    }

    fn allocate_command_buffers(
        &self,
        pool: vk::CommandPool,
        count: u32,
    ) -> Result<Vec<vk::CommandBuffer>> {
        self.assert_live("command_pool", pool);
        Ok((0..count).map(|_| self.create("command_buffer")).collect())
    }

    fn free_command_buffers(&self, pool: vk::CommandPool, buffers: &[vk::CommandBuffer]) {
        self.assert_live("command_pool", pool);
        for &buffer in buffers {
            self.destroy("command_buffer", buffer);
        }
    }

    fn record_ownership_acquire(
        &self,
        cmd: vk::CommandBuffer,
        transfer: &OwnershipTransfer,
    ) -> Result<()> {
        self.assert_live("command_buffer", cmd);
        self.ownership_acquires.borrow_mut().push((cmd, *transfer));
        Ok(())
    }

    fn cmd_ownership_release(&self, cmd: vk::CommandBuffer, transfer: &OwnershipTransfer) {
        self.ownership_releases.borrow_mut().push((cmd, *transfer));
    }

    fn queue_submit(&self, queue: vk::Queue, submit: &SubmitDesc<'_>) -> Result<()> {
        for &cmd in submit.command_buffers {
            self.assert_live("command_buffer", cmd);
        }
        if let Some(err) = self.submit_failure.take() {
            return Err(GpuError::Vulkan(err));
        }
        if submit.fence != vk::Fence::null() {
            self.assert_live("fence", submit.fence);
            assert!(
                !self.is_fence_signaled(submit.fence),
                "submitted with a fence that is already signaled"
            );
            // Work completes immediately.
            self.fence_signaled
                .borrow_mut()
                .insert(submit.fence.as_raw(), true);
        }
        self.submits.borrow_mut().push(RecordedSubmit {
            queue,
            command_buffers: submit.command_buffers.to_vec(),
            wait: submit.wait,
            signal: submit.signal,
            fence: submit.fence,
        });
        Ok(())
    }
}
