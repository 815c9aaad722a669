//! Abstract event model
//!
//! Every native backend reports its input through these types, so windows and
//! widgets never see backend specific events. Positions are in physical pixels
//! of the window; the window rescales them into widget space before dispatch
//! when automatic scaling is active.

use std::path::PathBuf;
use std::time::Duration;

use dpi::{PhysicalPosition, PhysicalSize};
use keyboard_types::{Code, Key, Modifiers};

/// How a focus change came about. Baseview only reports regular crossings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum CrossingMode {
    #[default]
    Normal,
}

/// Pointer buttons, independent of the backend numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Back,
    Forward,
    Other(u8),
}

/// Direction of a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
    /// Continuous (pixel precise) scrolling, see the deltas
    Smooth,
}

/// A printable key (or one of the ASCII control keys) was pressed or released.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardEvent {
    pub press: bool,
    /// The character the key produces, lower-cased where applicable
    pub key: char,
    /// Physical key code
    pub code: Code,
    pub modifiers: Modifiers,
    /// Auto-repeat from the OS while the key is held
    pub repeat: bool,
    /// Time since the translator started
    pub time: Duration,
}

/// A non printable key (function keys, arrows, modifiers, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialEvent {
    pub press: bool,
    pub key: Key,
    pub code: Code,
    pub modifiers: Modifiers,
    pub repeat: bool,
    pub time: Duration,
}

/// Text input, already composed by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterInputEvent {
    pub text: String,
    pub code: Code,
    pub modifiers: Modifiers,
    pub time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MouseEvent {
    pub press: bool,
    pub button: MouseButton,
    pub position: PhysicalPosition<f64>,
    pub modifiers: Modifiers,
    pub time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    pub position: PhysicalPosition<f64>,
    pub modifiers: Modifiers,
    pub time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrollEvent {
    pub position: PhysicalPosition<f64>,
    /// Scroll amount, in lines for discrete directions and pixels for smooth ones
    pub delta: (f64, f64),
    pub direction: ScrollDirection,
    pub modifiers: Modifiers,
    pub time: Duration,
}

/// Delivered to every top-level widget when the window is reconfigured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeEvent {
    /// New size in widget space
    pub size: PhysicalSize<u32>,
    pub old_size: PhysicalSize<u32>,
}

/// The normalized event stream a native backend produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The view was resized (physical pixels) or moved to a screen with a
    /// different scale factor
    Configure {
        size: PhysicalSize<u32>,
        scale_factor: f64,
    },
    /// The view needs to be painted
    Expose,
    /// The user asked to close the view
    Close,
    /// The native view is gone. The window closes without asking its listener.
    Destroyed,
    Focus {
        focused: bool,
        mode: CrossingMode,
    },
    Keyboard(KeyboardEvent),
    Special(SpecialEvent),
    CharacterInput(CharacterInputEvent),
    Mouse(MouseEvent),
    Motion(MotionEvent),
    Scroll(ScrollEvent),
    /// A file dialog finished, with or without a selection
    FileSelected(Option<PathBuf>),
}
