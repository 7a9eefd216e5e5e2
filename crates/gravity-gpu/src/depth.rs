//! The single depth attachment shared by every swapchain framebuffer.

use crate::error::{GpuError, Result};
use crate::memory::find_memory_type;
use ash::vk;

/// Depth image, its memory block and view, sized to the surface.
///
/// Recreated whenever the surface extent changes.
#[derive(Debug)]
pub struct DepthBuffer {
    pub image: vk::Image,
    pub memory: vk::DeviceMemory,
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl DepthBuffer {
    /// Format used for the depth attachment.
    pub const FORMAT: vk::Format = vk::Format::D16_UNORM;

    /// Allocate a device-local depth image covering `extent`.
    ///
    /// # Safety
    /// The device must be valid and `memory_properties` must belong to its
    /// physical device.
    pub unsafe fn new(
        device: &ash::Device,
        memory_properties: &vk::PhysicalDeviceMemoryProperties,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(Self::FORMAT)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.create_image(&image_info, None)? };

        let requirements = unsafe { device.get_image_memory_requirements(image) };
        let required = vk::MemoryPropertyFlags::DEVICE_LOCAL;
        let Some(memory_type_index) =
            find_memory_type(requirements.memory_type_bits, memory_properties, required)
        else {
            unsafe { device.destroy_image(image, None) };
            return Err(GpuError::NoCompatibleMemoryType {
                type_bits: requirements.memory_type_bits,
                required,
            });
        };

        let alloc_info = vk::MemoryAllocateInfo::default()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);
        let memory = match unsafe { device.allocate_memory(&alloc_info, None) } {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_image(image, None) };
                return Err(err.into());
            }
        };

        let view = unsafe { device.bind_image_memory(image, memory, 0) }.and_then(|()| {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(Self::FORMAT)
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::DEPTH)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1),
                );
            unsafe { device.create_image_view(&view_info, None) }
        });
        let view = match view {
            Ok(view) => view,
            Err(err) => {
                unsafe {
                    device.free_memory(memory, None);
                    device.destroy_image(image, None);
                }
                return Err(err.into());
            }
        };

        tracing::debug!(
            "Created {}x{} depth buffer ({} bytes, memory type {memory_type_index})",
            extent.width,
            extent.height,
            requirements.size
        );

        Ok(Self {
            image,
            memory,
            view,
            format: Self::FORMAT,
            extent,
        })
    }

    /// Destroy the view, image and memory.
    ///
    /// # Safety
    /// No submitted work may still reference the image.
    pub unsafe fn destroy(self, device: &ash::Device) {
        unsafe {
            device.destroy_image_view(self.view, None);
            device.destroy_image(self.image, None);
            device.free_memory(self.memory, None);
        }
    }
}
