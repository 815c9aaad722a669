//! Top-level widget contract and the ordered widget tree of a window
//!
//! Widgets are painted in insertion order (back to front) and offered input in
//! reverse insertion order (front to back). The first widget that reports an
//! input event as consumed stops propagation.

use crate::event::{
    CharacterInputEvent, KeyboardEvent, MotionEvent, MouseEvent, ResizeEvent, ScrollEvent,
    SpecialEvent,
};
use crate::graphics::GraphicsContext;

/// A widget attached directly to a window.
///
/// Input handlers return true when they consumed the event.
pub trait Widget {
    fn on_display(&mut self, context: &mut GraphicsContext<'_>);

    fn on_resize(&mut self, _event: &ResizeEvent) {}

    fn on_keyboard(&mut self, _event: &KeyboardEvent) -> bool {
        false
    }

    fn on_special(&mut self, _event: &SpecialEvent) -> bool {
        false
    }

    fn on_character_input(&mut self, _event: &CharacterInputEvent) -> bool {
        false
    }

    fn on_mouse(&mut self, _event: &MouseEvent) -> bool {
        false
    }

    fn on_motion(&mut self, _event: &MotionEvent) -> bool {
        false
    }

    fn on_scroll(&mut self, _event: &ScrollEvent) -> bool {
        false
    }

    /// Hidden widgets are neither painted nor offered input
    fn is_visible(&self) -> bool {
        true
    }

    /// Polled by the window once per pump, after events and idle callbacks.
    /// Return true to have the window painted again; the request is consumed.
    fn take_repaint(&mut self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

#[derive(Default)]
pub struct WidgetTree {
    widgets: Vec<(WidgetId, Box<dyn Widget>)>,
    next_id: u64,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append on top of the existing widgets
    pub fn push(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        let id = WidgetId(self.next_id);
        self.next_id += 1;
        self.widgets.push((id, widget));
        id
    }

    pub fn remove(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let index = self.widgets.iter().position(|(wid, _)| *wid == id)?;
        Some(self.widgets.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    /// Visit every widget in insertion order
    pub fn for_each(&mut self, mut f: impl FnMut(&mut dyn Widget)) {
        for (_, widget) in &mut self.widgets {
            f(widget.as_mut());
        }
    }

    /// Offer an event to visible widgets, topmost first, until one consumes it
    pub fn dispatch(&mut self, mut f: impl FnMut(&mut dyn Widget) -> bool) -> bool {
        self.widgets
            .iter_mut()
            .rev()
            .any(|(_, widget)| widget.is_visible() && f(widget.as_mut()))
    }

    /// Collect repaint requests from every widget, hidden ones included
    pub fn take_repaint(&mut self) -> bool {
        self.widgets
            .iter_mut()
            .fold(false, |requested, (_, widget)| widget.take_repaint() | requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MouseButton;
    use dpi::PhysicalPosition;
    use keyboard_types::Modifiers;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    struct Stub {
        name: &'static str,
        accepts: bool,
        visible: bool,
        dirty: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Widget for Stub {
        fn on_display(&mut self, _context: &mut GraphicsContext<'_>) {}

        fn on_mouse(&mut self, _event: &MouseEvent) -> bool {
            self.log.borrow_mut().push(self.name);
            self.dirty = self.accepts;
            self.accepts
        }

        fn is_visible(&self) -> bool {
            self.visible
        }

        fn take_repaint(&mut self) -> bool {
            std::mem::take(&mut self.dirty)
        }
    }

    fn click() -> MouseEvent {
        MouseEvent {
            press: true,
            button: MouseButton::Left,
            position: PhysicalPosition::new(1.0, 1.0),
            modifiers: Modifiers::empty(),
            time: Duration::ZERO,
        }
    }

    fn tree(layout: &[(&'static str, bool, bool)]) -> (WidgetTree, Rc<RefCell<Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = WidgetTree::new();
        for &(name, accepts, visible) in layout {
            tree.push(Box::new(Stub {
                name,
                accepts,
                visible,
                dirty: false,
                log: Rc::clone(&log),
            }));
        }
        (tree, log)
    }

    #[test]
    fn input_reaches_bottom_widget_after_upper_ones_reject() {
        let (mut tree, log) = tree(&[
            ("bottom", true, true),
            ("middle", false, true),
            ("top", false, true),
        ]);

        let event = click();
        assert!(tree.dispatch(|w| w.on_mouse(&event)));
        assert_eq!(*log.borrow(), ["top", "middle", "bottom"]);
    }

    #[test]
    fn first_consumer_stops_propagation() {
        let (mut tree, log) = tree(&[("bottom", true, true), ("top", true, true)]);

        let event = click();
        assert!(tree.dispatch(|w| w.on_mouse(&event)));
        assert_eq!(*log.borrow(), ["top"]);
    }

    #[test]
    fn unconsumed_events_are_dropped() {
        let (mut tree, log) = tree(&[("only", false, true)]);

        let event = click();
        assert!(!tree.dispatch(|w| w.on_mouse(&event)));
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn hidden_widgets_are_skipped() {
        let (mut tree, log) = tree(&[("bottom", true, true), ("hidden", true, false)]);

        let event = click();
        assert!(tree.dispatch(|w| w.on_mouse(&event)));
        assert_eq!(*log.borrow(), ["bottom"]);
    }

    #[test]
    fn removed_widgets_no_longer_receive_events() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tree = WidgetTree::new();
        let gone = tree.push(Box::new(Stub {
            name: "gone",
            accepts: true,
            visible: true,
            dirty: false,
            log: Rc::clone(&log),
        }));
        assert!(tree.remove(gone).is_some());
        assert!(tree.remove(gone).is_none());

        let event = click();
        assert!(!tree.dispatch(|w| w.on_mouse(&event)));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn repaint_requests_are_collected_once() {
        let (mut tree, _log) = tree(&[("bottom", true, true), ("top", false, true)]);
        assert!(!tree.take_repaint());

        let event = click();
        assert!(tree.dispatch(|w| w.on_mouse(&event)));
        assert!(tree.take_repaint());
        assert!(!tree.take_repaint());
    }
}
