//! Platform abstraction for the Gravity framework.
//!
//! A [`WindowBackend`] owns the native window, feeds window-system events
//! into the shared [`EventQueue`] and creates the Vulkan surface. The winit
//! backend covers every desktop platform winit supports.

pub mod keys;
pub mod winit_backend;

use std::time::Duration;

use gravity_core::EventQueue;
use gravity_gpu::SurfaceSource;
use thiserror::Error;

pub use winit_backend::WinitBackend;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Window creation failed: {0}")]
    WindowCreation(String),
    #[error("Event loop error: {0}")]
    EventLoop(String),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Platform configuration.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Gravity".to_string(),
            width: 500,
            height: 500,
            resizable: true,
        }
    }
}

/// A native window that the framework renders into.
///
/// Events are delivered asynchronously through the [`EventQueue`] handed to
/// the backend at construction; the main loop drains that queue after each
/// call to [`WindowBackend::pump_events`].
pub trait WindowBackend: SurfaceSource {
    /// Dispatch pending window-system events into the event queue, waiting at
    /// most `timeout` for new ones. Returns `false` once the window system
    /// has shut the event loop down.
    fn pump_events(&mut self, timeout: Option<Duration>) -> bool;

    /// Current client area size in pixels.
    fn size(&self) -> (u32, u32);

    /// The queue this backend delivers events into.
    fn events(&self) -> &EventQueue;
}
