//! Application configuration and command-line parsing.

use std::path::PathBuf;

use ash::vk;
use clap::Parser;
use gravity_core::constants::DEFAULT_EVENT_QUEUE_CAPACITY;
use gravity_gpu::SwapchainRequest;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title, also reported to the driver as the application name.
    pub title: String,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Present mode, image count and surface format preferences.
    pub swapchain: SwapchainRequest,
    /// Enable Vulkan validation layers.
    pub validation: bool,
    /// Fail the offending Vulkan call on validation errors.
    pub break_on_error: bool,
    /// Pace frames with `VK_GOOGLE_display_timing` when available.
    pub display_timing: bool,
    /// Upload textures through a staging buffer.
    pub use_staging: bool,
    /// Base directory for textures and shaders.
    pub resource_dir: PathBuf,
    /// Quit after this many frames.
    pub exit_after_frames: Option<u64>,
    /// Capacity of the event queue.
    pub event_queue_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Gravity".to_string(),
            width: 500,
            height: 500,
            swapchain: SwapchainRequest::default(),
            validation: false,
            break_on_error: false,
            display_timing: false,
            use_staging: false,
            resource_dir: PathBuf::from("resources"),
            exit_after_frames: None,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the present mode.
    #[must_use]
    pub const fn with_present_mode(mut self, present_mode: vk::PresentModeKHR) -> Self {
        self.swapchain.present_mode = present_mode;
        self
    }

    /// Set the requested swapchain image count.
    #[must_use]
    pub const fn with_image_count(mut self, image_count: u32) -> Self {
        self.swapchain.image_count = image_count;
        self
    }

    /// Set the preferred and fallback surface formats.
    #[must_use]
    pub const fn with_surface_formats(mut self, preferred: vk::Format, fallback: vk::Format) -> Self {
        self.swapchain.preferred_format = preferred;
        self.swapchain.fallback_format = fallback;
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub const fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Enable or disable display-timing frame pacing.
    #[must_use]
    pub const fn with_display_timing(mut self, display_timing: bool) -> Self {
        self.display_timing = display_timing;
        self
    }

    /// Quit after `frames` frames.
    #[must_use]
    pub const fn with_exit_after_frames(mut self, frames: u64) -> Self {
        self.exit_after_frames = Some(frames);
        self
    }

    /// Set the resource directory.
    #[must_use]
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }
}

/// Command-line options shared by every Gravity application.
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Present mode as a raw `VkPresentModeKHR` value (0 immediate, 1 mailbox, 2 fifo, 3 fifo relaxed)
    #[arg(long = "present_mode", value_name = "MODE")]
    pub present_mode: Option<i32>,

    /// Number of swapchain images to request
    #[arg(long = "num_swapchain_buffers", value_name = "COUNT")]
    pub num_swapchain_buffers: Option<u32>,

    /// Upload textures through a staging buffer
    #[arg(long = "use_staging")]
    pub use_staging: bool,

    /// Enable the Khronos validation layer
    #[arg(long)]
    pub validate: bool,

    /// Make validation errors fail the offending call (implies --validate)
    #[arg(long = "break")]
    pub break_on_error: bool,

    /// Quit after this many frames (0 runs forever)
    #[arg(long = "c", value_name = "FRAMES")]
    pub frame_count: Option<u64>,

    /// Base directory for textures and shaders
    #[arg(long = "resource_dir", value_name = "DIR")]
    pub resource_dir: Option<PathBuf>,

    /// Pace frames with VK_GOOGLE_display_timing when the driver offers it
    #[arg(long = "display_timing")]
    pub display_timing: bool,
}

impl CliArgs {
    /// Merge the options into `config`. Options not given keep the
    /// config's values.
    #[must_use]
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(mode) = self.present_mode {
            config.swapchain.present_mode = vk::PresentModeKHR::from_raw(mode);
        }
        if let Some(count) = self.num_swapchain_buffers {
            config.swapchain.image_count = count;
        }
        if let Some(frames) = self.frame_count {
            config.exit_after_frames = (frames > 0).then_some(frames);
        }
        if let Some(dir) = self.resource_dir {
            config.resource_dir = dir;
        }
        config.use_staging |= self.use_staging;
        config.validation |= self.validate || self.break_on_error;
        config.break_on_error |= self.break_on_error;
        config.display_timing |= self.display_timing;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("gravity").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = AppConfig::default();
        assert_eq!((config.width, config.height), (500, 500));
        assert_eq!(config.swapchain.present_mode, vk::PresentModeKHR::FIFO);
        assert_eq!(config.swapchain.image_count, 3);
        assert_eq!(config.swapchain.preferred_format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(config.swapchain.fallback_format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(config.resource_dir, PathBuf::from("resources"));
        assert_eq!(config.event_queue_capacity, 100);
        assert!(config.exit_after_frames.is_none());
    }

    #[test]
    fn no_arguments_keep_config() {
        let config = parse(&[]).apply(AppConfig::new("demo").with_image_count(4));
        assert_eq!(config.title, "demo");
        assert_eq!(config.swapchain.image_count, 4);
        assert!(!config.validation);
    }

    #[test]
    fn recognized_options() {
        let config = parse(&[
            "--present_mode",
            "1",
            "--num_swapchain_buffers",
            "2",
            "--use_staging",
            "--c",
            "120",
            "--resource_dir",
            "/tmp/res",
            "--display_timing",
        ])
        .apply(AppConfig::default());

        assert_eq!(config.swapchain.present_mode, vk::PresentModeKHR::MAILBOX);
        assert_eq!(config.swapchain.image_count, 2);
        assert!(config.use_staging);
        assert_eq!(config.exit_after_frames, Some(120));
        assert_eq!(config.resource_dir, PathBuf::from("/tmp/res"));
        assert!(config.display_timing);
    }

    #[test]
    fn zero_frame_count_runs_forever() {
        let config = parse(&["--c", "0"]).apply(AppConfig::default().with_exit_after_frames(10));
        assert!(config.exit_after_frames.is_none());
    }

    #[test]
    fn break_enables_validation() {
        let config = parse(&["--break"]).apply(AppConfig::default());
        assert!(config.validation);
        assert!(config.break_on_error);

        let config = parse(&["--validate"]).apply(AppConfig::default());
        assert!(config.validation);
        assert!(!config.break_on_error);
    }

    #[test]
    fn rejects_unknown_options() {
        assert!(CliArgs::try_parse_from(["gravity", "--fullscreen"]).is_err());
    }
}
