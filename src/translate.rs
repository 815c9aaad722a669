//! Event translation from baseview to the abstract event model
//!
//! Converts baseview callbacks into configure/expose/close/focus, key,
//! special-key, text and pointer events. Baseview reports pointer positions in
//! logical units; they are converted to physical pixels here.

use std::time::{Duration, Instant};

use baseview::{
    Event as NativeEvent, MouseButton as NativeButton, MouseEvent as NativeMouseEvent,
    ScrollDelta, WindowEvent,
};
use dpi::{PhysicalPosition, PhysicalSize};
use keyboard_types::{Key, KeyState, Modifiers};

use crate::event::{
    CharacterInputEvent, CrossingMode, Event, KeyboardEvent, MotionEvent, MouseButton,
    MouseEvent, ScrollDirection, ScrollEvent, SpecialEvent,
};

/// Translate a baseview mouse button
pub fn translate_mouse_button(button: NativeButton) -> MouseButton {
    match button {
        NativeButton::Left => MouseButton::Left,
        NativeButton::Right => MouseButton::Right,
        NativeButton::Middle => MouseButton::Middle,
        NativeButton::Back => MouseButton::Back,
        NativeButton::Forward => MouseButton::Forward,
        NativeButton::Other(id) => MouseButton::Other(id),
    }
}

/// ASCII control keys reported as regular key events
fn control_character(key: &Key) -> Option<char> {
    match key {
        Key::Backspace => Some('\u{08}'),
        Key::Tab => Some('\t'),
        Key::Enter => Some('\r'),
        Key::Escape => Some('\u{1b}'),
        Key::Delete => Some('\u{7f}'),
        _ => None,
    }
}

/// Event translator that maintains pointer state between events
pub struct EventTranslator {
    pointer: PhysicalPosition<f64>,
    modifiers: Modifiers,
    scale_factor: f64,
    start_time: Instant,
}

impl EventTranslator {
    pub fn new(scale_factor: f64) -> Self {
        Self {
            pointer: PhysicalPosition::new(0.0, 0.0),
            modifiers: Modifiers::empty(),
            scale_factor,
            start_time: Instant::now(),
        }
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Translate a baseview event into zero or more abstract events
    pub fn translate(&mut self, event: &NativeEvent) -> Vec<Event> {
        match event {
            NativeEvent::Mouse(mouse) => self.translate_mouse(mouse).into_iter().collect(),
            NativeEvent::Keyboard(kb) => self.translate_keyboard(kb),
            NativeEvent::Window(win) => self.translate_window(win),
        }
    }

    fn time(&self) -> Duration {
        self.start_time.elapsed()
    }

    fn translate_mouse(&mut self, event: &NativeMouseEvent) -> Option<Event> {
        match event {
            NativeMouseEvent::CursorMoved {
                position,
                modifiers,
            } => {
                self.pointer = PhysicalPosition::new(
                    position.x * self.scale_factor,
                    position.y * self.scale_factor,
                );
                self.modifiers = *modifiers;

                Some(Event::Motion(MotionEvent {
                    position: self.pointer,
                    modifiers: self.modifiers,
                    time: self.time(),
                }))
            }

            NativeMouseEvent::ButtonPressed { button, modifiers }
            | NativeMouseEvent::ButtonReleased { button, modifiers } => {
                self.modifiers = *modifiers;

                Some(Event::Mouse(MouseEvent {
                    press: matches!(event, NativeMouseEvent::ButtonPressed { .. }),
                    button: translate_mouse_button(*button),
                    position: self.pointer,
                    modifiers: self.modifiers,
                    time: self.time(),
                }))
            }

            NativeMouseEvent::WheelScrolled { delta, modifiers } => {
                self.modifiers = *modifiers;

                let (dx, dy, direction) = match delta {
                    ScrollDelta::Lines { x, y } => {
                        let (x, y) = (*x as f64, *y as f64);
                        let direction = if y > 0.0 {
                            ScrollDirection::Up
                        } else if y < 0.0 {
                            ScrollDirection::Down
                        } else if x > 0.0 {
                            ScrollDirection::Right
                        } else if x < 0.0 {
                            ScrollDirection::Left
                        } else {
                            return None;
                        };
                        (x, y, direction)
                    }
                    ScrollDelta::Pixels { x, y } => (
                        *x as f64 * self.scale_factor,
                        *y as f64 * self.scale_factor,
                        ScrollDirection::Smooth,
                    ),
                };

                Some(Event::Scroll(ScrollEvent {
                    position: self.pointer,
                    delta: (dx, dy),
                    direction,
                    modifiers: self.modifiers,
                    time: self.time(),
                }))
            }

            // Crossing and drag-and-drop events have no counterpart yet
            _ => None,
        }
    }

    fn translate_keyboard(&mut self, event: &keyboard_types::KeyboardEvent) -> Vec<Event> {
        self.modifiers = event.modifiers;
        let press = event.state == KeyState::Down;
        let time = self.time();

        if let Some(key) = control_character(&event.key) {
            return vec![Event::Keyboard(KeyboardEvent {
                press,
                key,
                code: event.code,
                modifiers: event.modifiers,
                repeat: event.repeat,
                time,
            })];
        }

        match &event.key {
            Key::Character(text) => {
                let Some(first) = text.chars().next() else {
                    return Vec::new();
                };
                let mut events = vec![Event::Keyboard(KeyboardEvent {
                    press,
                    key: first.to_lowercase().next().unwrap_or(first),
                    code: event.code,
                    modifiers: event.modifiers,
                    repeat: event.repeat,
                    time,
                })];

                // Shortcuts are not text
                let shortcut = event
                    .modifiers
                    .intersects(Modifiers::CONTROL | Modifiers::META);
                if press && !shortcut && !event.is_composing {
                    events.push(Event::CharacterInput(CharacterInputEvent {
                        text: text.clone(),
                        code: event.code,
                        modifiers: event.modifiers,
                        time,
                    }));
                }
                events
            }
            Key::Unidentified => Vec::new(),
            key => vec![Event::Special(SpecialEvent {
                press,
                key: key.clone(),
                code: event.code,
                modifiers: event.modifiers,
                repeat: event.repeat,
                time,
            })],
        }
    }

    fn translate_window(&mut self, event: &WindowEvent) -> Vec<Event> {
        match event {
            WindowEvent::Resized(info) => {
                self.scale_factor = info.scale();
                let size = info.physical_size();
                vec![
                    Event::Configure {
                        size: PhysicalSize::new(size.width, size.height),
                        scale_factor: info.scale(),
                    },
                    Event::Expose,
                ]
            }
            WindowEvent::Focused => vec![Event::Focus {
                focused: true,
                mode: CrossingMode::Normal,
            }],
            WindowEvent::Unfocused => vec![Event::Focus {
                focused: false,
                mode: CrossingMode::Normal,
            }],
            WindowEvent::WillClose => vec![Event::Close],
        }
    }
}
