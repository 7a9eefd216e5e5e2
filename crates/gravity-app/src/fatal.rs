//! Reporting of unrecoverable errors.

use ash::vk;
use gravity_gpu::GpuError;
use tracing::error;

const DRIVER_HINT: &str = "Make sure a Vulkan capable GPU driver is installed. \
     Packages are available from your GPU vendor or distribution.";

/// Actionable advice for errors that usually mean a missing or broken driver.
fn guidance(err: &GpuError) -> Option<&'static str> {
    match err {
        GpuError::Loader(_) | GpuError::NoSuitableDevice => Some(DRIVER_HINT),
        GpuError::Vulkan(
            vk::Result::ERROR_INCOMPATIBLE_DRIVER | vk::Result::ERROR_INITIALIZATION_FAILED,
        ) => Some(DRIVER_HINT),
        GpuError::ExtensionNotSupported(_) => Some(
            "The GPU driver lacks a required extension. Updating the driver may help.",
        ),
        GpuError::SurfaceCreation(_) => Some(
            "The window system surface could not be created. \
             Check that the display server supports Vulkan presentation.",
        ),
        GpuError::QueueFamilyNotFound(_) => {
            Some("No GPU queue can both render and present to this window.")
        }
        _ => None,
    }
}

/// Log `err` with its cause chain and any driver guidance, then exit the
/// process with status 1.
pub fn report_fatal(err: &anyhow::Error) -> ! {
    error!("Fatal error: {err}");
    for cause in err.chain().skip(1) {
        error!("  caused by: {cause}");
    }
    if let Some(hint) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<GpuError>())
        .and_then(guidance)
    {
        error!("{hint}");
    }
    std::process::exit(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_problems_get_guidance() {
        assert_eq!(guidance(&GpuError::NoSuitableDevice), Some(DRIVER_HINT));
        assert_eq!(
            guidance(&GpuError::Vulkan(vk::Result::ERROR_INCOMPATIBLE_DRIVER)),
            Some(DRIVER_HINT)
        );
        assert!(guidance(&GpuError::ExtensionNotSupported("VK_KHR_swapchain".into())).is_some());
    }

    #[test]
    fn internal_errors_get_none() {
        assert!(guidance(&GpuError::InvalidState("x".into())).is_none());
        assert!(guidance(&GpuError::Vulkan(vk::Result::ERROR_OUT_OF_HOST_MEMORY)).is_none());
    }
}
