//! Application framework for Gravity Vulkan demos.
//!
//! This crate provides a trait-based application framework that handles
//! common boilerplate like:
//! - Window creation and the event loop
//! - GPU context initialization
//! - Swapchain creation, resize and teardown
//! - The depth buffer and one-shot setup commands
//! - Command-line options
//!
//! # Example
//!
//! ```no_run
//! use gravity_app::{ash::vk, run_app, AppConfig, AppContext, FrameContext, GravityApp};
//!
//! struct MyApp;
//!
//! impl GravityApp for MyApp {
//!     fn init(_ctx: &mut AppContext) -> anyhow::Result<Self> {
//!         Ok(MyApp)
//!     }
//!
//!     fn setup(&mut self, _ctx: &mut AppContext, _cmd: vk::CommandBuffer) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     fn draw(&mut self, _ctx: &AppContext, _frame: &FrameContext) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() {
//!     if let Err(e) = run_app::<MyApp>(AppConfig::default()) {
//!         gravity_app::report_fatal(&e);
//!     }
//! }
//! ```

mod app;
mod config;
mod context;
mod fatal;
mod frame;
mod loop_state;
mod runner;
mod setup;

pub use app::GravityApp;
pub use config::{AppConfig, CliArgs};
pub use context::AppContext;
pub use fatal::report_fatal;
pub use frame::FrameContext;
pub use runner::{init_tracing, run_app};

// Re-export commonly used types for convenience
pub use gravity_core::{Event, KeyName};
pub use gravity_gpu::ash;
pub use gravity_gpu::{GpuContext, SwapchainManager};
