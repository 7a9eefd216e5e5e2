//! Physical device properties and the resolved extension function table.

use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// GPU vendor identification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    Arm,
    Qualcomm,
    Other(u32),
}

impl GpuVendor {
    /// Identify vendor from PCI vendor ID.
    #[must_use]
    pub const fn from_vendor_id(id: u32) -> Self {
        match id {
            0x10DE => Self::Nvidia,
            0x1002 => Self::Amd,
            0x8086 => Self::Intel,
            0x106B => Self::Apple,
            0x13B5 => Self::Arm,
            0x5143 => Self::Qualcomm,
            other => Self::Other(other),
        }
    }
}

/// What the selected physical device reports about itself.
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// GPU vendor
    pub vendor: GpuVendor,
    /// Device name
    pub device_name: String,
    /// Vulkan API version
    pub api_version: u32,
    /// Driver version
    pub driver_version: u32,
    /// Device type (discrete, integrated, ...)
    pub device_type: vk::PhysicalDeviceType,
    /// Memory types and heaps, used for raw allocations.
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Queue families in index order.
    pub queue_families: Vec<vk::QueueFamilyProperties>,

    // Available extensions
    pub available_extensions: HashSet<String>,
}

impl DeviceCapabilities {
    /// Query capabilities from a physical device.
    ///
    /// # Safety
    /// The instance and physical device must be valid.
    pub unsafe fn query(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> crate::Result<Self> {
        let properties = instance.get_physical_device_properties(physical_device);
        let memory_properties = instance.get_physical_device_memory_properties(physical_device);
        let queue_families =
            instance.get_physical_device_queue_family_properties(physical_device);

        let extensions = instance.enumerate_device_extension_properties(physical_device)?;
        let available_extensions: HashSet<String> = extensions
            .iter()
            .filter_map(|ext| {
                ext.extension_name_as_c_str()
                    .ok()
                    .and_then(|name| name.to_str().ok())
                    .map(String::from)
            })
            .collect();

        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            vendor: GpuVendor::from_vendor_id(properties.vendor_id),
            device_name,
            api_version: properties.api_version,
            driver_version: properties.driver_version,
            device_type: properties.device_type,
            memory_properties,
            queue_families,
            available_extensions,
        })
    }

    /// Whether the device advertises `name`.
    #[must_use]
    pub fn has_extension(&self, name: &CStr) -> bool {
        name.to_str()
            .is_ok_and(|name| self.available_extensions.contains(name))
    }

    /// Get a human-readable summary of capabilities.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} ({:?}, {:?}) - Vulkan {}.{}.{}",
            self.device_name,
            self.vendor,
            self.device_type,
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }
}

/// Extension entry points, resolved once when the device is created and
/// never changed afterwards.
///
/// Display timing is `None` when the extension was not enabled.
#[derive(Clone)]
pub struct ExtensionTable {
    pub surface: ash::khr::surface::Instance,
    pub swapchain: ash::khr::swapchain::Device,
    pub display_timing: Option<ash::google::display_timing::Device>,
}

impl ExtensionTable {
    /// Load the device-level function pointers for every enabled extension.
    ///
    /// The surface loader is created with the instance, before any device
    /// exists, and handed in here.
    #[must_use]
    pub fn load(
        surface: ash::khr::surface::Instance,
        instance: &ash::Instance,
        device: &ash::Device,
        display_timing: bool,
    ) -> Self {
        Self {
            surface,
            swapchain: ash::khr::swapchain::Device::new(instance, device),
            display_timing: display_timing
                .then(|| ash::google::display_timing::Device::new(instance, device)),
        }
    }

    /// Whether present timing feedback is available.
    #[must_use]
    pub const fn has_display_timing(&self) -> bool {
        self.display_timing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_identification() {
        assert_eq!(GpuVendor::from_vendor_id(0x10DE), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_vendor_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_vendor_id(0x8086), GpuVendor::Intel);
        assert_eq!(GpuVendor::from_vendor_id(0x13B5), GpuVendor::Arm);
        assert_eq!(GpuVendor::from_vendor_id(0x1234), GpuVendor::Other(0x1234));
    }
}
