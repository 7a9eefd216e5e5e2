//! winit-based window backend.

use std::ffi::c_char;
use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use gravity_core::{Event, EventQueue};
use gravity_gpu::{GpuError, SurfaceSource};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, info};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::keys::key_name;
use crate::{PlatformConfig, PlatformError, Result, WindowBackend};

/// Translate a window event into a framework event.
///
/// Key repeats and keys without a [`gravity_core::KeyName`] are dropped.
#[must_use]
pub fn translate_window_event(event: &WindowEvent) -> Option<Event> {
    match event {
        WindowEvent::Resized(size) => Some(Event::WindowResize {
            width: size.width,
            height: size.height,
        }),
        WindowEvent::CloseRequested => Some(Event::WindowClose),
        WindowEvent::RedrawRequested => Some(Event::WindowDraw),
        WindowEvent::KeyboardInput { event, .. } => translate_key(event),
        _ => None,
    }
}

fn translate_key(event: &KeyEvent) -> Option<Event> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let name = key_name(code)?;
    match event.state {
        ElementState::Pressed if event.repeat => None,
        ElementState::Pressed => Some(Event::KeyPress(name)),
        ElementState::Released => Some(Event::KeyRelease(name)),
    }
}

/// Receives winit callbacks while the backend pumps the event loop.
struct WindowHandler {
    config: PlatformConfig,
    events: Arc<EventQueue>,
    window: Option<Window>,
    suspended: bool,
    error: Option<PlatformError>,
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            if self.suspended {
                self.suspended = false;
                self.events.try_insert(Event::PlatformPauseStop);
            }
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height))
            .with_resizable(self.config.resizable);

        match event_loop.create_window(attributes) {
            Ok(window) => {
                info!(
                    "Created window \"{}\" ({}x{})",
                    self.config.title, self.config.width, self.config.height
                );
                self.window = Some(window);
            }
            Err(e) => {
                self.error = Some(PlatformError::WindowCreation(e.to_string()));
                event_loop.exit();
            }
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.suspended {
            self.suspended = true;
            self.events.try_insert(Event::PlatformPauseStart);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(event) = translate_window_event(&event) {
            self.events.try_insert(event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

/// A single winit window driven by pumping its event loop from the
/// framework's main loop.
pub struct WinitBackend {
    event_loop: EventLoop<()>,
    handler: WindowHandler,
    running: bool,
}

impl WinitBackend {
    /// Open a window and wait until it exists.
    pub fn new(config: PlatformConfig, events: Arc<EventQueue>) -> Result<Self> {
        let mut event_loop =
            EventLoop::new().map_err(|e| PlatformError::EventLoop(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut handler = WindowHandler {
            config,
            events,
            window: None,
            suspended: false,
            error: None,
        };

        while handler.window.is_none() {
            let status = event_loop.pump_app_events(Some(Duration::from_millis(16)), &mut handler);
            if let Some(err) = handler.error.take() {
                return Err(err);
            }
            if let PumpStatus::Exit(code) = status {
                return Err(PlatformError::EventLoop(format!(
                    "event loop exited with code {code} before the window opened"
                )));
            }
        }

        Ok(Self {
            event_loop,
            handler,
            running: true,
        })
    }

    fn window(&self) -> gravity_gpu::Result<&Window> {
        self.handler
            .window
            .as_ref()
            .ok_or_else(|| GpuError::SurfaceCreation("window has not been created".to_string()))
    }
}

impl WindowBackend for WinitBackend {
    fn pump_events(&mut self, timeout: Option<Duration>) -> bool {
        if !self.running {
            return false;
        }
        if let PumpStatus::Exit(code) = self
            .event_loop
            .pump_app_events(timeout, &mut self.handler)
        {
            debug!("Window event loop exited with code {code}");
            self.running = false;
        }
        self.running
    }

    fn size(&self) -> (u32, u32) {
        self.handler.window.as_ref().map_or(
            (self.handler.config.width, self.handler.config.height),
            |window| {
                let size = window.inner_size();
                (size.width, size.height)
            },
        )
    }

    fn events(&self) -> &EventQueue {
        &self.handler.events
    }
}

impl SurfaceSource for WinitBackend {
    fn required_instance_extensions(&self) -> gravity_gpu::Result<Vec<*const c_char>> {
        let display = self
            .window()?
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;
        let extensions = ash_window::enumerate_required_extensions(display.as_raw())?;
        Ok(extensions.to_vec())
    }

    unsafe fn create_surface(
        &self,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> gravity_gpu::Result<vk::SurfaceKHR> {
        let window = self.window()?;
        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;
        let handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?;

        ash_window::create_surface(entry, instance, display.as_raw(), handle.as_raw(), None)
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_carries_new_size() {
        let event = translate_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)));
        assert!(matches!(
            event,
            Some(Event::WindowResize {
                width: 800,
                height: 600
            })
        ));
    }

    #[test]
    fn close_and_redraw() {
        assert!(matches!(
            translate_window_event(&WindowEvent::CloseRequested),
            Some(Event::WindowClose)
        ));
        assert!(matches!(
            translate_window_event(&WindowEvent::RedrawRequested),
            Some(Event::WindowDraw)
        ));
    }

    #[test]
    fn unrelated_events_are_ignored() {
        assert!(translate_window_event(&WindowEvent::Focused(true)).is_none());
        assert!(translate_window_event(&WindowEvent::Destroyed).is_none());
    }
}
