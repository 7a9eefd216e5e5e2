//! Synchronization helpers.

use crate::error::Result;
use ash::vk;

pub(crate) fn fence_info(signaled: bool) -> vk::FenceCreateInfo<'static> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };
    vk::FenceCreateInfo::default().flags(flags)
}

/// An unsignaled fence for a single blocking submission, destroyed on drop.
pub struct ScopedFence<'a> {
    device: &'a ash::Device,
    fence: vk::Fence,
}

impl<'a> ScopedFence<'a> {
    pub fn new(device: &'a ash::Device) -> Result<Self> {
        let fence = unsafe { device.create_fence(&fence_info(false), None)? };
        Ok(Self { device, fence })
    }

    #[must_use]
    pub const fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for ScopedFence<'_> {
    fn drop(&mut self) {
        unsafe { self.device.destroy_fence(self.fence, None) };
    }
}
