//! GPU context management.

use crate::capabilities::{DeviceCapabilities, ExtensionTable};
use crate::debug::DebugMessenger;
use crate::error::{GpuError, Result};
use crate::instance::{create_instance, select_physical_device, InstanceDesc};
use crate::memory::GpuAllocator;
use crate::negotiate::{negotiate_device_extensions, queue_create_infos, select_queue_families};
use crate::surface::{SurfaceContext, SurfaceSource};
use crate::swapchain::QueueSetup;
use ash::vk;
use parking_lot::Mutex;
use std::ffi::c_char;
use std::sync::Arc;

/// Instance, device and queues shared by everything that renders.
///
/// The surface is handed out separately by [`GpuContextBuilder::build`] and
/// must be destroyed (through the swapchain manager) before this context is
/// dropped.
pub struct GpuContext {
    // Keeps the loader library mapped.
    #[allow(dead_code)]
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) debug: Option<DebugMessenger>,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: Arc<ash::Device>,
    pub(crate) capabilities: DeviceCapabilities,
    pub(crate) allocator: Mutex<GpuAllocator>,
    pub(crate) extensions: ExtensionTable,
    pub(crate) queues: QueueSetup,
}

impl GpuContext {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// A shared handle to the device, for objects that destroy themselves.
    pub fn shared_device(&self) -> Arc<ash::Device> {
        Arc::clone(&self.device)
    }

    /// Get the Vulkan instance handle.
    pub const fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the physical device handle.
    pub const fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Get device capabilities.
    pub const fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Memory types and heaps of the physical device.
    pub const fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.capabilities.memory_properties
    }

    /// Resolved extension entry points.
    pub const fn extensions(&self) -> &ExtensionTable {
        &self.extensions
    }

    /// Selected queue families and their queues.
    pub const fn queues(&self) -> QueueSetup {
        self.queues
    }

    /// Get the graphics queue.
    pub const fn graphics_queue(&self) -> vk::Queue {
        self.queues.graphics
    }

    /// Get the graphics queue family index.
    pub const fn graphics_queue_family(&self) -> u32 {
        self.queues.families.graphics
    }

    /// Get access to the GPU allocator.
    pub const fn allocator(&self) -> &Mutex<GpuAllocator> {
        &self.allocator
    }

    /// Wait for device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            // Allocations must be returned before the device goes away.
            self.allocator.lock().shutdown();

            self.device.destroy_device(None);
            if let Some(debug) = self.debug.take() {
                debug.destroy();
            }
            self.instance.destroy_instance(None);
        }
        tracing::debug!("GPU context destroyed");
    }
}

/// Builder for creating a GPU context.
pub struct GpuContextBuilder {
    app_name: String,
    app_version: u32,
    enable_validation: bool,
    break_on_error: bool,
    display_timing: bool,
}

impl Default for GpuContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Gravity".to_string(),
            app_version: 0,
            enable_validation: false,
            break_on_error: false,
            display_timing: false,
        }
    }
}

impl GpuContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the application version reported to the driver.
    #[must_use]
    pub const fn app_version(mut self, version: u32) -> Self {
        self.app_version = version;
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub const fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Make validation errors fail the offending call. Only meaningful with
    /// validation enabled.
    #[must_use]
    pub const fn break_on_error(mut self, enable: bool) -> Self {
        self.break_on_error = enable;
        self
    }

    /// Request `VK_GOOGLE_display_timing` for frame pacing.
    #[must_use]
    pub const fn display_timing(mut self, enable: bool) -> Self {
        self.display_timing = enable;
        self
    }

    /// Build the GPU context and a surface for `window`.
    pub fn build<S: SurfaceSource>(self, window: &S) -> Result<(GpuContext, SurfaceContext)> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| GpuError::Loader(e.to_string()))?;

        let window_extensions: Vec<*const c_char> = window.required_instance_extensions()?;
        let (major, minor, patch) = gravity_core::constants::ENGINE_VERSION;
        let instance = unsafe {
            create_instance(
                &entry,
                &InstanceDesc {
                    app_name: &self.app_name,
                    app_version: self.app_version,
                    engine_name: gravity_core::constants::ENGINE_NAME,
                    engine_version: vk::make_api_version(0, major, minor, patch),
                    window_extensions: &window_extensions,
                    enable_validation: self.enable_validation,
                },
            )
        }?;

        let debug = if self.enable_validation {
            match unsafe { DebugMessenger::new(&entry, &instance, self.break_on_error) } {
                Ok(messenger) => Some(messenger),
                Err(err) => {
                    tracing::warn!("Debug messenger unavailable: {err}");
                    None
                }
            }
        } else {
            None
        };

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);
        let surface = unsafe { window.create_surface(&entry, &instance) }?;

        let physical_device = unsafe { select_physical_device(&instance) }?;
        let capabilities = unsafe { DeviceCapabilities::query(&instance, physical_device) }?;
        tracing::info!("Selected GPU: {}", capabilities.summary());

        let surface = SurfaceContext::new(surface, surface_loader.clone(), physical_device);

        let extensions =
            negotiate_device_extensions(&capabilities.available_extensions, self.display_timing)?;

        let supports_present = (0..capabilities.queue_families.len() as u32)
            .map(|family| surface.supports_present(family))
            .collect::<Result<Vec<bool>>>()?;
        let families = select_queue_families(&capabilities.queue_families, &supports_present)?;
        if families.uses_separate_present_queue() {
            tracing::info!(
                "Presenting from queue family {} (graphics on {})",
                families.present,
                families.graphics
            );
        }

        let priorities = [0.0_f32];
        let queue_infos = queue_create_infos(&families, &priorities);
        let extension_names: Vec<*const c_char> =
            extensions.names.iter().map(|name| name.as_ptr()).collect();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_names);

        let device = unsafe { instance.create_device(physical_device, &device_create_info, None) }?;
        let queues = unsafe {
            QueueSetup {
                families,
                graphics: device.get_device_queue(families.graphics, 0),
                present: device.get_device_queue(families.present, 0),
            }
        };

        let extension_table =
            ExtensionTable::load(surface_loader, &instance, &device, extensions.display_timing);

        let device = Arc::new(device);
        let allocator = unsafe { GpuAllocator::new(&instance, Arc::clone(&device), physical_device) }?;

        Ok((
            GpuContext {
                entry,
                instance,
                debug,
                physical_device,
                device,
                capabilities,
                allocator: Mutex::new(allocator),
                extensions: extension_table,
                queues,
            },
            surface,
        ))
    }
}
