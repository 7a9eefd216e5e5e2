//! Events produced by platform windows and consumed by the main loop.

use std::any::Any;
use std::fmt;

/// First event id available to applications.
///
/// Ids below this value are reserved for the framework.
pub const FIRST_CUSTOM_EVENT_ID: u32 = 0x0000_1000;

/// Logical key names, independent of the platform's key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyName {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Space,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Tilde,
    Dash,
    Plus,
    LeftBracket,
    RightBracket,
    Colon,
    Quote,
    Comma,
    Period,
    ForwardSlash,
    Backslash,
    Tab,
    Backspace,
    LeftCtrl,
    RightCtrl,
    LeftShift,
    RightShift,
    LeftAlt,
    RightAlt,
    PageUp,
    PageDown,
    Home,
    End,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

/// Application-owned payload carried by [`Event::Custom`].
pub struct CustomPayload(Box<dyn Any + Send>);

impl CustomPayload {
    /// Wrap an arbitrary value.
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrow the payload as `T`, if that is its type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Take the payload back as `T`.
    pub fn downcast<T: Any>(self) -> Result<Box<T>, Self> {
        self.0.downcast::<T>().map_err(Self)
    }
}

impl fmt::Debug for CustomPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomPayload(..)")
    }
}

/// A single framework event.
///
/// The payload is part of the variant, so the event kind and its data
/// can never disagree.
#[derive(Debug)]
pub enum Event {
    /// The application should shut down.
    Quit,
    /// The platform suspended the application.
    PlatformPauseStart,
    /// The platform resumed the application.
    PlatformPauseStop,
    /// The window asks for a redraw.
    WindowDraw,
    /// The window surface changed size.
    WindowResize { width: u32, height: u32 },
    /// The window was closed by the user.
    WindowClose,
    /// A key went down.
    KeyPress(KeyName),
    /// A key went up.
    KeyRelease(KeyName),
    /// Application-defined event. `id` must be at least [`FIRST_CUSTOM_EVENT_ID`].
    Custom { id: u32, payload: CustomPayload },
}

impl Event {
    /// Build an application-defined event.
    ///
    /// Returns `None` if `id` falls in the framework-reserved range.
    pub fn custom<T: Any + Send>(id: u32, payload: T) -> Option<Self> {
        (id >= FIRST_CUSTOM_EVENT_ID).then(|| Self::Custom {
            id,
            payload: CustomPayload::new(payload),
        })
    }

    /// Short name of the event kind, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Quit => "quit",
            Self::PlatformPauseStart => "pause-start",
            Self::PlatformPauseStop => "pause-stop",
            Self::WindowDraw => "draw",
            Self::WindowResize { .. } => "resize",
            Self::WindowClose => "close",
            Self::KeyPress(_) => "key-press",
            Self::KeyRelease(_) => "key-release",
            Self::Custom { .. } => "custom",
        }
    }
}
