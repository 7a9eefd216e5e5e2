//! Validation layer messages routed into `tracing`.

use crate::error::Result;
use ash::vk;
use std::ffi::{c_void, CStr};

/// A `VK_EXT_debug_utils` messenger.
pub struct DebugMessenger {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    /// Install the messenger.
    ///
    /// With `break_on_error`, error messages make the offending Vulkan call
    /// fail with `VK_ERROR_VALIDATION_FAILED_EXT`.
    ///
    /// # Safety
    /// The instance must have been created with `VK_EXT_debug_utils` enabled.
    pub unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        break_on_error: bool,
    ) -> Result<Self> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);

        let callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT = if break_on_error {
            Some(break_on_error_callback)
        } else {
            Some(log_callback)
        };

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(callback);

        let messenger = loader.create_debug_utils_messenger(&create_info, None)?;
        Ok(Self { loader, messenger })
    }

    /// Remove the messenger.
    ///
    /// # Safety
    /// Must be called before the instance is destroyed.
    pub unsafe fn destroy(&self) {
        self.loader
            .destroy_debug_utils_messenger(self.messenger, None);
    }
}

unsafe fn emit(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
) {
    // SAFETY: the loader passes either null or a valid callback data struct
    // whose message pointer, when non-null, is NUL-terminated.
    let message = unsafe {
        data.as_ref()
            .and_then(|data| data.message_as_c_str())
            .map_or_else(|| "<no message>".into(), CStr::to_string_lossy)
    };

    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: "vulkan", ?kind, "{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: "vulkan", ?kind, "{message}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        tracing::debug!(target: "vulkan", ?kind, "{message}");
    } else {
        tracing::trace!(target: "vulkan", ?kind, "{message}");
    }
}

unsafe extern "system" fn log_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    unsafe { emit(severity, kind, data) };
    vk::FALSE
}

unsafe extern "system" fn break_on_error_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    kind: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    unsafe { emit(severity, kind, data) };
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        vk::TRUE
    } else {
        vk::FALSE
    }
}
