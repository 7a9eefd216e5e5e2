//! Vulkan instance creation.

use crate::error::{GpuError, Result};
use ash::vk;
use std::ffi::{c_char, CStr, CString};

/// Validation layer enabled by `--validate`.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Application identity reported to the driver.
#[derive(Debug, Clone)]
pub struct InstanceDesc<'a> {
    pub app_name: &'a str,
    pub app_version: u32,
    pub engine_name: &'a str,
    pub engine_version: u32,
    /// Extensions the window backend needs to create surfaces.
    pub window_extensions: &'a [*const c_char],
    pub enable_validation: bool,
}

/// Create a Vulkan instance.
///
/// With validation enabled the Khronos layer and `VK_EXT_debug_utils` are
/// requested as well. A missing validation layer only produces a warning.
///
/// # Safety
/// The entry must be a valid Vulkan entry point and every pointer in
/// `window_extensions` must be a valid NUL-terminated string.
pub unsafe fn create_instance(entry: &ash::Entry, desc: &InstanceDesc<'_>) -> Result<ash::Instance> {
    let app_name = CString::new(desc.app_name)
        .map_err(|_| GpuError::InvalidState("application name contains NUL".to_string()))?;
    let engine_name = CString::new(desc.engine_name)
        .map_err(|_| GpuError::InvalidState("engine name contains NUL".to_string()))?;

    let app_info = vk::ApplicationInfo::default()
        .application_name(&app_name)
        .application_version(desc.app_version)
        .engine_name(&engine_name)
        .engine_version(desc.engine_version)
        .api_version(vk::API_VERSION_1_0);

    let mut extension_names: Vec<*const c_char> = desc.window_extensions.to_vec();

    let mut layer_names: Vec<*const c_char> = Vec::new();
    if desc.enable_validation {
        extension_names.push(ash::ext::debug_utils::NAME.as_ptr());

        let available_layers = entry.enumerate_instance_layer_properties()?;
        let found = available_layers
            .iter()
            .any(|props| props.layer_name_as_c_str().is_ok_and(|name| name == VALIDATION_LAYER));
        if found {
            layer_names.push(VALIDATION_LAYER.as_ptr());
        } else {
            tracing::warn!(
                "Validation layer {} not available",
                VALIDATION_LAYER.to_string_lossy()
            );
        }
    }

    // Required for MoltenVK on macOS
    #[cfg(target_os = "macos")]
    let create_flags = {
        extension_names.push(ash::khr::portability_enumeration::NAME.as_ptr());
        vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
    };
    #[cfg(not(target_os = "macos"))]
    let create_flags = vk::InstanceCreateFlags::empty();

    let create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names)
        .flags(create_flags);

    let instance = entry.create_instance(&create_info, None).map_err(|err| {
        if err == vk::Result::ERROR_INCOMPATIBLE_DRIVER {
            GpuError::NoSuitableDevice
        } else {
            GpuError::from(err)
        }
    })?;

    Ok(instance)
}

/// Select the physical device to render with.
///
/// The first enumerated device is used.
///
/// # Safety
/// The instance must be valid.
pub unsafe fn select_physical_device(instance: &ash::Instance) -> Result<vk::PhysicalDevice> {
    let devices = instance.enumerate_physical_devices()?;
    tracing::debug!("{} physical device(s) enumerated", devices.len());

    devices.first().copied().ok_or(GpuError::NoSuitableDevice)
}
