//! Core types for the Gravity framework.
//!
//! This crate provides the pieces shared by every other Gravity crate:
//! - The tagged [`Event`] type delivered by platform windows
//! - The fixed-capacity [`EventQueue`] that carries events to the main loop

pub mod event;
pub mod event_queue;

pub use event::{Event, KeyName, FIRST_CUSTOM_EVENT_ID};
pub use event_queue::{EventQueue, EventQueueError};

/// Framework-wide constants.
pub mod constants {
    /// Event queue capacity used by the application framework.
    pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 100;
    /// Engine name reported to the Vulkan driver.
    pub const ENGINE_NAME: &str = "Gravity Engine";
    /// Engine version reported to the Vulkan driver (major, minor, patch).
    pub const ENGINE_VERSION: (u32, u32, u32) = (0, 0, 1);
}
