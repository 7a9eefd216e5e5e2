//! Queue family and device extension negotiation.
//!
//! These are pure functions over data queried from the physical device, so
//! the selection rules can be tested without a GPU.

use crate::error::{GpuError, Result};
use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

/// Queue families chosen for rendering and presentation.
///
/// Fixed for the lifetime of the logical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilySelection {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilySelection {
    /// Whether presentation happens on a different family than rendering,
    /// which requires queue ownership transfers of swapchain images.
    #[must_use]
    pub const fn uses_separate_present_queue(&self) -> bool {
        self.graphics != self.present
    }

    /// One entry per distinct family, graphics first.
    #[must_use]
    pub fn unique_families(&self) -> Vec<u32> {
        if self.uses_separate_present_queue() {
            vec![self.graphics, self.present]
        } else {
            vec![self.graphics]
        }
    }
}

/// Pick the graphics and present queue families.
///
/// `supports_present[i]` says whether family `i` can present to the target
/// surface. A family that does both wins; otherwise the first graphics
/// family is paired with the first present-capable one.
pub fn select_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: &[bool],
) -> Result<QueueFamilySelection> {
    let mut graphics = None;
    let mut present = None;

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;
        let can_present = supports_present.get(index as usize).copied().unwrap_or(false);

        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            if graphics.is_none() {
                graphics = Some(index);
            }
            if can_present {
                graphics = Some(index);
                present = Some(index);
                break;
            }
        }
    }

    if present.is_none() {
        present = supports_present
            .iter()
            .take(families.len())
            .position(|&supported| supported)
            .map(|index| index as u32);
    }

    let graphics = graphics.ok_or(GpuError::QueueFamilyNotFound("graphics"))?;
    let present = present.ok_or(GpuError::QueueFamilyNotFound("present"))?;

    Ok(QueueFamilySelection { graphics, present })
}

/// Queue create infos for the selected families, one queue each.
#[must_use]
pub fn queue_create_infos<'a>(
    selection: &QueueFamilySelection,
    priorities: &'a [f32],
) -> Vec<vk::DeviceQueueCreateInfo<'a>> {
    selection
        .unique_families()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(priorities)
        })
        .collect()
}

/// Device extensions to enable, and which optional ones made it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedExtensions {
    pub names: Vec<&'static CStr>,
    pub display_timing: bool,
}

/// Decide which device extensions to enable.
///
/// The swapchain extension is mandatory. Display timing is enabled only when
/// it was requested and the device offers it; otherwise frame pacing is
/// simply turned off.
pub fn negotiate_device_extensions(
    available: &HashSet<String>,
    want_display_timing: bool,
) -> Result<NegotiatedExtensions> {
    let has = |name: &CStr| {
        name.to_str()
            .is_ok_and(|name| available.contains(name))
    };

    if !has(ash::khr::swapchain::NAME) {
        return Err(GpuError::ExtensionNotSupported(
            ash::khr::swapchain::NAME.to_string_lossy().into_owned(),
        ));
    }

    let mut names = vec![ash::khr::swapchain::NAME];
    let mut display_timing = false;
    if want_display_timing {
        if has(ash::google::display_timing::NAME) {
            names.push(ash::google::display_timing::NAME);
            display_timing = true;
        } else {
            tracing::warn!(
                "{} requested but not available, frame pacing disabled",
                ash::google::display_timing::NAME.to_string_lossy()
            );
        }
    }

    Ok(NegotiatedExtensions {
        names,
        display_timing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn extensions(names: &[&CStr]) -> HashSet<String> {
        names
            .iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn prefers_family_with_graphics_and_present() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let selection = select_queue_families(&families, &[false, true, true]).unwrap();

        assert_eq!(selection, QueueFamilySelection { graphics: 2, present: 2 });
        assert!(!selection.uses_separate_present_queue());
        assert_eq!(queue_create_infos(&selection, &[1.0]).len(), 1);
    }

    #[test]
    fn falls_back_to_separate_present_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE),
        ];
        let selection = select_queue_families(&families, &[false, false, true]).unwrap();

        assert_eq!(selection, QueueFamilySelection { graphics: 0, present: 2 });
        assert!(selection.uses_separate_present_queue());

        let priorities = [1.0];
        let infos = queue_create_infos(&selection, &priorities);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].queue_family_index, 0);
        assert_eq!(infos[1].queue_family_index, 2);
    }

    #[test]
    fn missing_families_are_fatal() {
        let compute_only = [family(vk::QueueFlags::COMPUTE)];
        assert!(matches!(
            select_queue_families(&compute_only, &[true]),
            Err(GpuError::QueueFamilyNotFound("graphics"))
        ));

        let graphics_only = [family(vk::QueueFlags::GRAPHICS)];
        assert!(matches!(
            select_queue_families(&graphics_only, &[false]),
            Err(GpuError::QueueFamilyNotFound("present"))
        ));
    }

    #[test]
    fn swapchain_extension_is_required() {
        let available = extensions(&[ash::google::display_timing::NAME]);
        assert!(matches!(
            negotiate_device_extensions(&available, true),
            Err(GpuError::ExtensionNotSupported(_))
        ));
    }

    #[test]
    fn display_timing_is_opt_in_and_optional() {
        let both = extensions(&[ash::khr::swapchain::NAME, ash::google::display_timing::NAME]);
        let swapchain_only = extensions(&[ash::khr::swapchain::NAME]);

        let negotiated = negotiate_device_extensions(&both, true).unwrap();
        assert!(negotiated.display_timing);
        assert_eq!(negotiated.names.len(), 2);

        assert!(!negotiate_device_extensions(&both, false).unwrap().display_timing);

        let negotiated = negotiate_device_extensions(&swapchain_only, true).unwrap();
        assert!(!negotiated.display_timing);
        assert_eq!(negotiated.names, vec![ash::khr::swapchain::NAME]);
    }
}
