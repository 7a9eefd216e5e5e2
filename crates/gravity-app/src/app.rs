//! `GravityApp` trait definition.

use ash::vk;
use gravity_core::Event;

use crate::context::AppContext;
use crate::frame::FrameContext;

/// Trait for Gravity applications.
///
/// The framework owns the window, the GPU context, the swapchain and the
/// depth buffer. An application owns everything it renders with: render
/// pass, pipelines, per-image buffers and the commands recorded into the
/// swapchain's render command buffers.
pub trait GravityApp: Sized {
    /// Initialize the application.
    ///
    /// Called once after the window, GPU context and swapchain negotiation,
    /// before the first swapchain is created. Size-independent resources
    /// belong here.
    fn init(ctx: &mut AppContext) -> anyhow::Result<Self>;

    /// Create size-dependent resources.
    ///
    /// Called after every swapchain (re)creation. `setup_cmd` is recording
    /// and is submitted, and waited on, right after this returns; use it for
    /// uploads and layout transitions. This is the place to call
    /// [`gravity_gpu::SwapchainManager::attach_render_pass_and_depth_buffer`]
    /// and record the per-image render command buffers.
    fn setup(&mut self, ctx: &mut AppContext, setup_cmd: vk::CommandBuffer) -> anyhow::Result<()>;

    /// Prepare the acquired image for submission.
    ///
    /// Called with the image already acquired. The framework submits the
    /// image's render command buffer and presents once this returns.
    fn draw(&mut self, ctx: &AppContext, frame: &FrameContext) -> anyhow::Result<()>;

    /// Release what [`GravityApp::setup`] created.
    ///
    /// Called with the device idle, before the depth buffer and swapchain
    /// resources go away on resize and at shutdown.
    #[allow(unused_variables)]
    fn release_size_dependent(&mut self, ctx: &mut AppContext) {}

    /// Handle an event before the framework does.
    ///
    /// Return `true` to stop the framework's default handling.
    #[allow(unused_variables)]
    fn handle_event(&mut self, ctx: &mut AppContext, event: &Event) -> bool {
        false
    }

    /// Release what [`GravityApp::init`] created. The device is idle.
    #[allow(unused_variables)]
    fn cleanup(&mut self, ctx: &mut AppContext) {}
}
