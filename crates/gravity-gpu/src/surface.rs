//! Surface management for windowed rendering.
//!
//! The GPU layer never talks to a window system directly. A window backend
//! implements [`SurfaceSource`] to contribute instance extensions and create
//! the platform surface.

use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::c_char;

/// Something that can produce a Vulkan surface, usually a window.
pub trait SurfaceSource {
    /// Instance extensions required to create this source's surfaces.
    fn required_instance_extensions(&self) -> Result<Vec<*const c_char>>;

    /// Create a surface for the source.
    ///
    /// # Safety
    /// The instance must have been created with the extensions returned by
    /// [`Self::required_instance_extensions`], and the source must outlive
    /// the surface.
    unsafe fn create_surface(
        &self,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<vk::SurfaceKHR>;
}

/// A created surface together with the loader that manages it.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub loader: ash::khr::surface::Instance,
    physical_device: vk::PhysicalDevice,
}

impl SurfaceContext {
    /// Wrap a surface created for `physical_device`.
    #[must_use]
    pub const fn new(
        surface: vk::SurfaceKHR,
        loader: ash::khr::surface::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Self {
        Self {
            surface,
            loader,
            physical_device,
        }
    }

    /// Whether queue family `family` can present to this surface.
    pub fn supports_present(&self, family: u32) -> Result<bool> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(self.physical_device, family, self.surface)
                .map_err(GpuError::from)
        }
    }

    /// Current capabilities (extent, image count limits, transforms).
    pub fn capabilities(&self) -> Result<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.loader
                .get_physical_device_surface_capabilities(self.physical_device, self.surface)
                .map_err(GpuError::from)
        }
    }

    /// Supported format/color-space pairs.
    pub fn formats(&self) -> Result<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_formats(self.physical_device, self.surface)
                .map_err(GpuError::from)
        }
    }

    /// Supported present modes.
    pub fn present_modes(&self) -> Result<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.loader
                .get_physical_device_surface_present_modes(self.physical_device, self.surface)
                .map_err(GpuError::from)
        }
    }

    /// Destroy the surface.
    ///
    /// # Safety
    /// The surface must not be in use by any swapchain.
    pub unsafe fn destroy(&self) {
        self.loader.destroy_surface(self.surface, None);
    }
}
