//! Default event handling of the main loop.

use gravity_core::{Event, KeyName};
use tracing::info;

/// What the main loop should do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopAction {
    Ignore,
    Exit,
    Draw,
    Resize { width: u32, height: u32 },
}

/// Window and pacing flags tracked across events.
#[derive(Debug)]
pub(crate) struct LoopState {
    width: u32,
    height: u32,
    minimized: bool,
    focused: bool,
    paused: bool,
    frames: u64,
    exit_after_frames: Option<u64>,
}

impl LoopState {
    pub(crate) fn new(width: u32, height: u32, exit_after_frames: Option<u64>) -> Self {
        Self {
            width,
            height,
            minimized: width == 0 || height == 0,
            focused: true,
            paused: false,
            frames: 0,
            exit_after_frames,
        }
    }

    pub(crate) fn on_event(&mut self, event: &Event) -> LoopAction {
        match *event {
            Event::Quit | Event::WindowClose | Event::KeyRelease(KeyName::Escape) => {
                LoopAction::Exit
            }
            Event::KeyRelease(KeyName::Space) => {
                self.paused = !self.paused;
                info!("{}", if self.paused { "Paused" } else { "Resumed" });
                LoopAction::Ignore
            }
            Event::PlatformPauseStart => {
                self.focused = false;
                LoopAction::Ignore
            }
            Event::PlatformPauseStop => {
                self.focused = true;
                LoopAction::Ignore
            }
            Event::WindowDraw if self.can_draw() => LoopAction::Draw,
            Event::WindowResize { width, height } => {
                if (width, height) == (self.width, self.height) {
                    info!("Ignoring resize to unchanged size {width}x{height}");
                    return LoopAction::Ignore;
                }
                self.width = width;
                self.height = height;
                self.minimized = width == 0 || height == 0;
                LoopAction::Resize { width, height }
            }
            _ => LoopAction::Ignore,
        }
    }

    /// Count a presented frame. Returns `true` when the configured frame
    /// limit has just been reached.
    pub(crate) fn frame_presented(&mut self) -> bool {
        self.frames += 1;
        self.exit_after_frames == Some(self.frames)
    }

    pub(crate) const fn can_draw(&self) -> bool {
        self.focused && !self.minimized
    }

    pub(crate) const fn paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_events() {
        let mut state = LoopState::new(500, 500, None);
        assert_eq!(state.on_event(&Event::Quit), LoopAction::Exit);
        assert_eq!(state.on_event(&Event::WindowClose), LoopAction::Exit);
        assert_eq!(
            state.on_event(&Event::KeyRelease(KeyName::Escape)),
            LoopAction::Exit
        );
        assert_eq!(
            state.on_event(&Event::KeyPress(KeyName::Escape)),
            LoopAction::Ignore
        );
    }

    #[test]
    fn space_toggles_pause() {
        let mut state = LoopState::new(500, 500, None);
        state.on_event(&Event::KeyRelease(KeyName::Space));
        assert!(state.paused());
        state.on_event(&Event::KeyRelease(KeyName::Space));
        assert!(!state.paused());
    }

    #[test]
    fn redundant_resize_is_ignored() {
        let mut state = LoopState::new(500, 500, None);
        assert_eq!(
            state.on_event(&Event::WindowResize {
                width: 500,
                height: 500
            }),
            LoopAction::Ignore
        );
        assert_eq!(
            state.on_event(&Event::WindowResize {
                width: 800,
                height: 600
            }),
            LoopAction::Resize {
                width: 800,
                height: 600
            }
        );
        assert_eq!(
            state.on_event(&Event::WindowResize {
                width: 800,
                height: 600
            }),
            LoopAction::Ignore
        );
    }

    #[test]
    fn minimized_or_unfocused_window_does_not_draw() {
        let mut state = LoopState::new(500, 500, None);
        assert_eq!(state.on_event(&Event::WindowDraw), LoopAction::Draw);

        state.on_event(&Event::WindowResize {
            width: 0,
            height: 0,
        });
        assert_eq!(state.on_event(&Event::WindowDraw), LoopAction::Ignore);

        state.on_event(&Event::WindowResize {
            width: 640,
            height: 480,
        });
        state.on_event(&Event::PlatformPauseStart);
        assert_eq!(state.on_event(&Event::WindowDraw), LoopAction::Ignore);
        state.on_event(&Event::PlatformPauseStop);
        assert_eq!(state.on_event(&Event::WindowDraw), LoopAction::Draw);
    }

    #[test]
    fn frame_limit_fires_once() {
        let mut state = LoopState::new(500, 500, Some(3));
        assert!(!state.frame_presented());
        assert!(!state.frame_presented());
        assert!(state.frame_presented());
        assert!(!state.frame_presented());

        let mut unlimited = LoopState::new(500, 500, None);
        assert!((0..1000).all(|_| !unlimited.frame_presented()));
    }

    #[test]
    fn custom_events_fall_through() {
        let mut state = LoopState::new(500, 500, None);
        let event = Event::custom(0x1000, ()).unwrap();
        assert_eq!(state.on_event(&event), LoopAction::Ignore);
    }
}
