//! Application runner and main loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ash::vk;
use gravity_core::{Event, EventQueue};
use gravity_gpu::{
    AcquireOutcome, AshSwapchainDriver, GpuContextBuilder, PresentOutcome, SwapchainManager,
};
use gravity_platform::{PlatformConfig, WindowBackend, WinitBackend};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::app::GravityApp;
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::frame::FrameContext;
use crate::loop_state::{LoopAction, LoopState};

/// Initialise `tracing` output, honouring `RUST_LOG`. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init();
}

/// Run a [`GravityApp`] with the given configuration.
///
/// Initializes logging, creates the window, GPU context and swapchain, and
/// runs the main loop until the application exits. Errors are fatal; pass
/// them to [`crate::report_fatal`].
pub fn run_app<A: GravityApp>(config: AppConfig) -> anyhow::Result<()> {
    init_tracing();
    info!("{} starting...", config.title);

    let mut state = AppState::<A>::new(config)?;
    state.run()?;
    state.shutdown()
}

struct AppState<A: GravityApp> {
    // Dropped before the context it was created against.
    app: A,
    ctx: AppContext,
    loop_state: LoopState,
    shut_down: bool,
}

impl<A: GravityApp> AppState<A> {
    fn new(config: AppConfig) -> anyhow::Result<Self> {
        let events = Arc::new(EventQueue::with_capacity(config.event_queue_capacity)?);
        let window = WinitBackend::new(
            PlatformConfig {
                title: config.title.clone(),
                width: config.width,
                height: config.height,
                resizable: true,
            },
            Arc::clone(&events),
        )?;

        let (gpu, surface) = GpuContextBuilder::new()
            .app_name(&config.title)
            .validation(config.validation)
            .break_on_error(config.break_on_error)
            .display_timing(config.display_timing)
            .build(&window)?;

        let (width, height) = window.size();
        let driver = AshSwapchainDriver::new(&gpu, surface);
        let mut swapchain =
            SwapchainManager::new(driver, gpu.queues(), vk::Extent2D { width, height });
        swapchain.prepare(&config.swapchain)?;

        let loop_state = LoopState::new(width, height, config.exit_after_frames);
        let mut ctx = AppContext::new(swapchain, gpu, window, events, config);
        let app = A::init(&mut ctx)?;

        let mut state = Self {
            app,
            ctx,
            loop_state,
            shut_down: false,
        };
        state.prepare()?;
        info!("Application ready");
        Ok(state)
    }

    /// Create the swapchain and everything sized by it.
    fn prepare(&mut self) -> anyhow::Result<()> {
        self.ctx.pre_setup()?;
        if self.ctx.is_prepared() {
            let setup_cmd = self.ctx.setup_command_buffer();
            self.app.setup(&mut self.ctx, setup_cmd)?;
        }
        self.ctx.post_setup()
    }

    fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let timeout = if self.loop_state.can_draw() {
                Duration::ZERO
            } else {
                Duration::from_millis(16)
            };
            if !self.ctx.window.pump_events(Some(timeout)) {
                info!("Window system closed the event loop");
                return Ok(());
            }

            for event in self.ctx.events.drain_all() {
                if !self.handle_event(&event)? {
                    return Ok(());
                }
            }
        }
    }

    /// Returns `false` when the loop should exit.
    fn handle_event(&mut self, event: &Event) -> anyhow::Result<bool> {
        if self.app.handle_event(&mut self.ctx, event) {
            return Ok(true);
        }

        match self.loop_state.on_event(event) {
            LoopAction::Exit => {
                info!("Exit requested ({})", event.kind());
                return Ok(false);
            }
            LoopAction::Draw => self.draw()?,
            LoopAction::Resize { width, height } => {
                self.ctx.swapchain.set_window_extent(width, height);
                self.resize()?;
            }
            LoopAction::Ignore => {}
        }
        Ok(true)
    }

    fn draw(&mut self) -> anyhow::Result<()> {
        if !self.ctx.is_prepared() {
            return Ok(());
        }

        let image_index = loop {
            match self.ctx.swapchain.acquire_next_image_index()? {
                AcquireOutcome::Acquired { image_index, .. } => break image_index,
                AcquireOutcome::OutOfDate => {
                    self.resize()?;
                    if !self.ctx.is_prepared() {
                        return Ok(());
                    }
                }
            }
        };

        let now = Instant::now();
        let dt = if self.loop_state.paused() {
            0.0
        } else {
            now.duration_since(self.ctx.last_frame_time).as_secs_f32()
        };
        self.ctx.last_frame_time = now;

        let frame = FrameContext {
            image_index,
            command_buffer: self.ctx.swapchain.render_command_buffer(image_index)?,
            framebuffer: self.ctx.swapchain.framebuffer(image_index)?,
            extent: self.ctx.swapchain.extent(),
            dt,
            frame_number: self.ctx.frame_count,
            paused: self.loop_state.paused(),
        };
        self.app.draw(&self.ctx, &frame)?;

        match self.ctx.swapchain.submit_and_present()? {
            PresentOutcome::Presented => {}
            PresentOutcome::Suboptimal => debug!("Presented to a suboptimal swapchain"),
            PresentOutcome::OutOfDate => debug!("Swapchain out of date after present"),
        }

        self.ctx.frame_count += 1;
        if self.loop_state.frame_presented() {
            info!("Reached {} frames, quitting", self.ctx.frame_count);
            self.ctx.events.try_insert(Event::Quit);
        }

        if self.ctx.swapchain.take_resize_pending() {
            self.resize()?;
        }
        Ok(())
    }

    fn resize(&mut self) -> anyhow::Result<()> {
        self.ctx.gpu.wait_idle()?;
        self.app.release_size_dependent(&mut self.ctx);
        self.ctx.cleanup_command_objects(true)?;
        self.prepare()?;
        info!(
            "Resized to {}x{}",
            self.ctx.swapchain.width(),
            self.ctx.swapchain.height()
        );
        Ok(())
    }

    fn shutdown(&mut self) -> anyhow::Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;

        info!("Shutting down after {} frames", self.ctx.frame_count);
        self.ctx.gpu.wait_idle()?;
        self.app.release_size_dependent(&mut self.ctx);
        self.app.cleanup(&mut self.ctx);
        self.ctx.cleanup_command_objects(false)?;
        self.ctx.events.teardown();
        Ok(())
    }
}

impl<A: GravityApp> Drop for AppState<A> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("Cleanup failed: {e}");
        }
    }
}
