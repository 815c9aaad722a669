//! Masonry widget tree hosted as a top-level widget
//!
//! Wraps a masonry [`RenderRoot`] so a whole masonry UI can sit in a window
//! next to hand-painted widgets. Pointer input is forwarded as masonry pointer
//! events and the tree's scene is appended to the window frame on paint.
//! Pointer events masonry leaves unhandled fall through to the widgets below.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dpi::PhysicalSize;
use keyboard_types::Modifiers as KbModifiers;
use masonry::app::{RenderRoot, RenderRootOptions, RenderRootSignal, WindowSizePolicy};
use masonry::core::pointer::PointerButtons;
use masonry::core::{
    Modifiers, NewWidget, PointerButton, PointerButtonEvent, PointerEvent, PointerId,
    PointerInfo, PointerScrollEvent, PointerState, PointerType, PointerUpdate,
    Widget as MasonryWidgetTrait, WindowEvent as MasonryWindowEvent,
};
use masonry::theme::default_property_set;

use crate::event::{MotionEvent, MouseButton, MouseEvent, ResizeEvent, ScrollDirection, ScrollEvent};
use crate::graphics::GraphicsContext;
use crate::widget::Widget;

fn translate_mouse_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Auxiliary,
        MouseButton::Back => PointerButton::X1,
        MouseButton::Forward => PointerButton::X2,
        MouseButton::Other(_) => PointerButton::Primary,
    }
}

fn translate_modifiers(mods: KbModifiers) -> Modifiers {
    let mut result = Modifiers::empty();
    if mods.contains(KbModifiers::SHIFT) {
        result |= Modifiers::SHIFT;
    }
    if mods.contains(KbModifiers::CONTROL) {
        result |= Modifiers::CONTROL;
    }
    if mods.contains(KbModifiers::ALT) {
        result |= Modifiers::ALT;
    }
    if mods.contains(KbModifiers::META) {
        result |= Modifiers::META;
    }
    result
}

/// A masonry UI attached to a window as one widget
pub struct MasonryWidget {
    render_root: RenderRoot,
    /// Set from the render root's signal sink on redraw and anim-frame requests
    repaint: Arc<AtomicBool>,
    buttons: PointerButtons,
    scale_factor: f64,
    last_frame: Instant,
}

impl MasonryWidget {
    /// Build the masonry tree at the given widget-space size
    pub fn new<W>(widget: W, size: PhysicalSize<u32>, scale_factor: f64) -> Self
    where
        W: MasonryWidgetTrait + 'static,
    {
        let options = RenderRootOptions {
            default_properties: Arc::new(default_property_set()),
            use_system_fonts: true,
            size_policy: WindowSizePolicy::User,
            size: masonry::dpi::PhysicalSize::new(size.width, size.height),
            scale_factor,
            test_font: None,
        };
        let repaint = Arc::new(AtomicBool::new(false));
        let sink = Arc::clone(&repaint);
        let render_root = RenderRoot::new(
            NewWidget::new(widget),
            move |signal| match signal {
                RenderRootSignal::RequestRedraw | RenderRootSignal::RequestAnimFrame => {
                    sink.store(true, Ordering::Relaxed);
                }
                _ => {}
            },
            options,
        );
        tracing::debug!(?size, scale_factor, "masonry tree initialized");

        Self {
            render_root,
            repaint,
            buttons: PointerButtons::default(),
            scale_factor,
            last_frame: Instant::now(),
        }
    }

    pub fn render_root(&mut self) -> &mut RenderRoot {
        &mut self.render_root
    }

    fn pointer_info() -> PointerInfo {
        PointerInfo {
            pointer_id: Some(PointerId::PRIMARY),
            persistent_device_id: None,
            pointer_type: PointerType::Mouse,
        }
    }

    fn pointer_state(
        &self,
        position: dpi::PhysicalPosition<f64>,
        modifiers: KbModifiers,
        time: Duration,
    ) -> PointerState {
        PointerState {
            time: time.as_nanos() as u64,
            position: masonry::dpi::PhysicalPosition::new(position.x, position.y),
            buttons: self.buttons.clone(),
            modifiers: translate_modifiers(modifiers),
            count: 1,
            contact_geometry: masonry::dpi::PhysicalSize::new(1.0, 1.0),
            orientation: Default::default(),
            pressure: 0.0,
            tangential_pressure: 0.0,
            scale_factor: self.scale_factor,
        }
    }

    fn rescale(&mut self, scale_factor: f64) {
        if (scale_factor - self.scale_factor).abs() <= f64::EPSILON {
            return;
        }
        self.scale_factor = scale_factor;
        let _ = self
            .render_root
            .handle_window_event(MasonryWindowEvent::Rescale(scale_factor));
    }
}

impl Widget for MasonryWidget {
    fn on_display(&mut self, context: &mut GraphicsContext<'_>) {
        // requests raised while painting this frame ask for the next one
        self.repaint.store(false, Ordering::Relaxed);
        self.rescale(context.scale_factor());

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame);
        self.last_frame = now;
        let _ = self
            .render_root
            .handle_window_event(MasonryWindowEvent::AnimFrame(dt));

        let (scene, _accessibility) = self.render_root.redraw();
        context.scene().append(&scene, None);
    }

    fn on_resize(&mut self, event: &ResizeEvent) {
        let _ = self
            .render_root
            .handle_window_event(MasonryWindowEvent::Resize(masonry::dpi::PhysicalSize::new(
                event.size.width,
                event.size.height,
            )));
    }

    fn on_mouse(&mut self, event: &MouseEvent) -> bool {
        let button = translate_mouse_button(event.button);
        if event.press {
            self.buttons |= button;
        } else {
            self.buttons.remove(button);
        }

        let button_event = PointerButtonEvent {
            button: Some(button),
            pointer: Self::pointer_info(),
            state: self.pointer_state(event.position, event.modifiers, event.time),
        };
        let pointer_event = if event.press {
            PointerEvent::Down(button_event)
        } else {
            PointerEvent::Up(button_event)
        };
        self.render_root
            .handle_pointer_event(pointer_event)
            .is_handled()
    }

    fn on_motion(&mut self, event: &MotionEvent) -> bool {
        let update = PointerUpdate {
            pointer: Self::pointer_info(),
            current: self.pointer_state(event.position, event.modifiers, event.time),
            coalesced: vec![],
            predicted: vec![],
        };
        self.render_root
            .handle_pointer_event(PointerEvent::Move(update))
            .is_handled()
    }

    fn on_scroll(&mut self, event: &ScrollEvent) -> bool {
        let (dx, dy) = event.delta;
        let delta = match event.direction {
            ScrollDirection::Smooth => masonry::core::ScrollDelta::PixelDelta(
                masonry::dpi::PhysicalPosition::new(dx, dy),
            ),
            _ => masonry::core::ScrollDelta::LineDelta(dx as f32, dy as f32),
        };

        let scroll = PointerScrollEvent {
            pointer: Self::pointer_info(),
            state: self.pointer_state(event.position, event.modifiers, event.time),
            delta,
        };
        self.render_root
            .handle_pointer_event(PointerEvent::Scroll(scroll))
            .is_handled()
    }

    fn take_repaint(&mut self) -> bool {
        self.repaint.swap(false, Ordering::Relaxed)
    }
}
