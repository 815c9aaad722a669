//! Window state and per-window event handling
//!
//! A [`Window`] owns one native view and the top-level widgets drawn into it.
//! Anything that can affect another window (showing, closing, focusing, modal
//! sessions) goes through the [`Application`](crate::Application), which owns
//! every window and routes translated native events to them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use dpi::{PhysicalPosition, PhysicalSize};
use vello::kurbo::Affine;
use vello::Scene;

use crate::backend::{FileBrowserOptions, NativeHandle, NativeView};
use crate::config::WindowConfig;
use crate::event::{CrossingMode, Event, ResizeEvent};
use crate::graphics::GraphicsContext;
use crate::idle::{IdleScheduler, SharedIdleCallback};
use crate::modal::Modal;
use crate::widget::{Widget, WidgetId, WidgetTree};

/// Notifications a window raises towards its owner (usually a host bridge).
///
/// All methods have empty defaults.
pub trait WindowListener {
    /// The user asked to close the window. Return false to keep it open.
    fn on_close(&mut self) -> bool {
        true
    }

    fn on_focus(&mut self, _focused: bool, _mode: CrossingMode) {}

    /// New physical size of the window
    fn on_size_changed(&mut self, _width: u32, _height: u32) {}

    fn on_scale_factor_changed(&mut self, _scale_factor: f64) {}

    /// A file dialog finished; `None` when it was cancelled
    fn on_file_selected(&mut self, _path: Option<&Path>) {}
}

pub struct Window {
    view: Box<dyn NativeView>,
    widgets: WidgetTree,
    listener: Option<Box<dyn WindowListener>>,
    pub(crate) modal: Modal,
    pub(crate) idle: IdleScheduler,

    /// Not visible and not counted by the application. Embedded windows are
    /// never closed.
    pub(crate) is_closed: bool,
    pub(crate) is_visible: bool,
    is_embed: bool,

    /// Reported to widgets, purely informational
    scale_factor: f64,
    auto_scaling: bool,
    auto_scale_factor: f64,

    min_width: u32,
    min_height: u32,
    keep_aspect_ratio: bool,
    resizable: bool,
    ignoring_key_repeat: bool,

    size: PhysicalSize<u32>,
    needs_display: bool,
    file_browser_pending: bool,
}

impl Window {
    pub(crate) fn new(view: Box<dyn NativeView>, config: &WindowConfig, scale_factor: f64) -> Self {
        let is_embed = config.is_embedded();
        let modal = match config.modal_parent {
            Some(parent) => Modal::with_parent(parent),
            None => Modal::default(),
        };

        Self {
            view,
            widgets: WidgetTree::new(),
            listener: None,
            modal,
            idle: IdleScheduler::new(),
            is_closed: !is_embed,
            is_visible: false,
            is_embed,
            scale_factor,
            auto_scaling: false,
            auto_scale_factor: 1.0,
            min_width: 0,
            min_height: 0,
            keep_aspect_ratio: false,
            resizable: config.resizable,
            ignoring_key_repeat: config.ignore_key_repeat,
            size: config.initial_size(),
            needs_display: false,
            file_browser_pending: false,
        }
    }

    pub(crate) fn view_mut(&mut self) -> &mut dyn NativeView {
        self.view.as_mut()
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn is_embed(&self) -> bool {
        self.is_embed
    }

    pub fn set_listener(&mut self, listener: Box<dyn WindowListener>) {
        self.listener = Some(listener);
    }

    // -------------------------------------------------------------------
    // geometry

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn auto_scale_factor(&self) -> f64 {
        self.auto_scale_factor
    }

    /// Minimum size and aspect-ratio lock, as last set
    pub fn geometry_constraints(&self) -> (u32, u32, bool) {
        (self.min_width, self.min_height, self.keep_aspect_ratio)
    }

    /// Resize the native view. Sizes of one pixel or less are rejected; sizes
    /// below the minimum or off the locked aspect ratio are corrected.
    pub fn set_size(&mut self, width: u32, height: u32) -> bool {
        if width <= 1 || height <= 1 {
            tracing::warn!(width, height, "rejecting degenerate window size");
            return false;
        }

        let (width, height) = self.constrain(width, height);
        self.view.set_size(PhysicalSize::new(width, height));
        true
    }

    fn constrain(&self, mut width: u32, mut height: u32) -> (u32, u32) {
        let mut min_width = self.min_width;
        let mut min_height = self.min_height;
        if self.auto_scaling && self.scale_factor != 1.0 {
            min_width = (f64::from(min_width) * self.scale_factor).round() as u32;
            min_height = (f64::from(min_height) * self.scale_factor).round() as u32;
        }

        width = width.max(min_width);
        height = height.max(min_height);

        if self.keep_aspect_ratio && self.min_width > 0 && self.min_height > 0 {
            let ratio = f64::from(self.min_width) / f64::from(self.min_height);
            let requested = f64::from(width) / f64::from(height);
            if (ratio - requested).abs() > f64::EPSILON {
                if requested > ratio {
                    width = (f64::from(height) * ratio + 0.5) as u32;
                } else {
                    height = (f64::from(width) / ratio + 0.5) as u32;
                }
            }
        }

        (width, height)
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.view.set_position(x, y);
    }

    /// Set the minimum size and whether the aspect ratio is locked to it.
    ///
    /// With `automatically_scale`, widget geometry is scaled by how much the
    /// window is larger than the minimum size. `(0, 0, false, false)` clears
    /// the constraints. A zero side together with aspect lock or automatic
    /// scaling is rejected.
    pub fn set_geometry_constraints(
        &mut self,
        min_width: u32,
        min_height: u32,
        keep_aspect_ratio: bool,
        automatically_scale: bool,
    ) -> bool {
        if (min_width == 0 || min_height == 0) && (keep_aspect_ratio || automatically_scale) {
            tracing::warn!(
                min_width,
                min_height,
                "geometry constraints need a non-zero minimum size"
            );
            return false;
        }

        self.min_width = min_width;
        self.min_height = min_height;
        self.keep_aspect_ratio = keep_aspect_ratio;
        self.auto_scaling = automatically_scale;

        if min_width == 0 && min_height == 0 {
            self.auto_scale_factor = 1.0;
            self.view.set_geometry_constraints(None, false);
            return true;
        }

        let scaled = PhysicalSize::new(
            (f64::from(min_width) * self.scale_factor).round() as u32,
            (f64::from(min_height) * self.scale_factor).round() as u32,
        );
        self.view
            .set_geometry_constraints(Some(scaled), keep_aspect_ratio);

        if automatically_scale {
            self.update_auto_scale_factor();
            if self.scale_factor != 1.0 {
                self.set_size(scaled.width, scaled.height);
            }
        } else {
            self.auto_scale_factor = 1.0;
        }
        true
    }

    fn update_auto_scale_factor(&mut self) {
        if !self.auto_scaling || self.min_width == 0 || self.min_height == 0 {
            return;
        }
        let horizontal = f64::from(self.size.width) / f64::from(self.min_width);
        let vertical = f64::from(self.size.height) / f64::from(self.min_height);
        self.auto_scale_factor = horizontal.min(vertical);
    }

    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// Embedded windows are resized by their host; the request is ignored.
    pub fn set_resizable(&mut self, resizable: bool) -> bool {
        if self.is_embed {
            tracing::debug!("embedded window resizability is decided by the host");
            return false;
        }
        self.resizable = resizable;
        self.view.set_resizable(resizable);
        true
    }

    /// Size the widgets see: the window size divided by the auto-scale factor
    fn widget_size(&self) -> PhysicalSize<u32> {
        if self.auto_scaling && self.auto_scale_factor > 0.0 {
            PhysicalSize::new(
                (f64::from(self.size.width) / self.auto_scale_factor).round() as u32,
                (f64::from(self.size.height) / self.auto_scale_factor).round() as u32,
            )
        } else {
            self.size
        }
    }

    fn to_widget_space(&self, position: PhysicalPosition<f64>) -> PhysicalPosition<f64> {
        if self.auto_scaling && self.auto_scale_factor > 0.0 {
            PhysicalPosition::new(
                position.x / self.auto_scale_factor,
                position.y / self.auto_scale_factor,
            )
        } else {
            position
        }
    }

    // -------------------------------------------------------------------
    // native properties

    pub fn title(&self) -> &str {
        self.view.title()
    }

    pub fn set_title(&mut self, title: &str) {
        self.view.set_title(title);
    }

    pub fn transient_parent(&self) -> Option<NativeHandle> {
        self.view.transient_parent()
    }

    pub fn set_transient_parent(&mut self, parent: Option<NativeHandle>) {
        self.view.set_transient_parent(parent);
    }

    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.view.native_handle()
    }

    pub fn is_ignoring_key_repeat(&self) -> bool {
        self.ignoring_key_repeat
    }

    pub fn set_ignoring_key_repeat(&mut self, ignore: bool) {
        self.ignoring_key_repeat = ignore;
    }

    /// Schedule a paint at the end of the next pump
    pub fn repaint(&mut self) {
        self.needs_display = true;
    }

    /// Whether a paint is due, taking pending widget requests into account
    pub(crate) fn needs_display(&mut self) -> bool {
        if self.widgets.take_repaint() {
            self.needs_display = true;
        }
        self.needs_display
    }

    // -------------------------------------------------------------------
    // modal relationships

    /// Window this one was created to run modally on top of
    pub fn modal_parent(&self) -> Option<crate::WindowId> {
        self.modal.parent()
    }

    /// Window currently running modally on top of this one
    pub fn modal_child(&self) -> Option<crate::WindowId> {
        self.modal.child()
    }

    pub fn is_modal(&self) -> bool {
        self.modal.is_enabled()
    }

    // -------------------------------------------------------------------
    // idle callbacks

    /// Returns false if the callback is already registered on this window
    pub fn add_idle_callback(&mut self, callback: SharedIdleCallback, period_ms: u32) -> bool {
        self.idle.add(callback, period_ms)
    }

    /// Returns false if the callback is not registered on this window
    pub fn remove_idle_callback(&mut self, callback: &SharedIdleCallback) -> bool {
        self.idle.remove(callback)
    }

    pub(crate) fn tick_idle(&mut self, now: Instant) {
        self.idle.tick(now);
    }

    /// Forget the time spent closed so reopening does not fire every callback
    pub(crate) fn reset_idle_time_base(&mut self) {
        self.idle.reset_time_base();
    }

    // -------------------------------------------------------------------
    // file browser

    /// Ask the backend for a file dialog. The outcome is reported through
    /// [`WindowListener::on_file_selected`]. Returns false while another
    /// dialog is pending or if the backend has no file dialog.
    pub fn open_file_browser(&mut self, mut options: FileBrowserOptions) -> bool {
        if self.file_browser_pending {
            tracing::debug!("file browser already open");
            return false;
        }
        if options.title.is_none() {
            options.title = Some(self.view.title().to_owned());
        }
        self.file_browser_pending = self.view.open_file_browser(&options);
        self.file_browser_pending
    }

    pub(crate) fn on_file_selected(&mut self, path: Option<PathBuf>) {
        self.file_browser_pending = false;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_file_selected(path.as_deref());
        }
    }

    // -------------------------------------------------------------------
    // widgets

    /// Attach a top-level widget above the existing ones
    pub fn add_widget(&mut self, widget: Box<dyn Widget>) -> WidgetId {
        let id = self.widgets.push(widget);
        self.needs_display = true;
        id
    }

    pub fn remove_widget(&mut self, id: WidgetId) -> Option<Box<dyn Widget>> {
        let widget = self.widgets.remove(id);
        if widget.is_some() {
            self.needs_display = true;
        }
        widget
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    // -------------------------------------------------------------------
    // native event handlers, called by the application dispatch

    pub(crate) fn on_configure(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if size.width <= 1 || size.height <= 1 {
            tracing::warn!(?size, "ignoring degenerate configure event");
            return;
        }

        // Embedded windows get their scale factor from the host
        if !self.is_embed
            && scale_factor > 0.0
            && (scale_factor - self.scale_factor).abs() > f64::EPSILON
        {
            self.scale_factor = scale_factor;
            if let Some(listener) = self.listener.as_mut() {
                listener.on_scale_factor_changed(scale_factor);
            }
        }

        let old_size = self.widget_size();
        self.size = size;
        self.update_auto_scale_factor();

        if let Some(listener) = self.listener.as_mut() {
            listener.on_size_changed(size.width, size.height);
        }

        let event = ResizeEvent {
            size: self.widget_size(),
            old_size,
        };
        self.widgets.for_each(|widget| widget.on_resize(&event));

        self.needs_display = true;
    }

    /// Set by the host for embedded windows
    pub(crate) fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor <= 0.0 || (scale_factor - self.scale_factor).abs() <= f64::EPSILON {
            return;
        }
        self.scale_factor = scale_factor;
        if let Some(listener) = self.listener.as_mut() {
            listener.on_scale_factor_changed(scale_factor);
        }
        self.needs_display = true;
    }

    pub(crate) fn on_expose(&mut self) {
        if self.is_closed || !self.is_visible {
            return;
        }
        if !self.view.enter_context() {
            tracing::trace!("no graphics context yet, skipping frame");
            return;
        }

        let size = self.widget_size();
        let scale_factor = self.scale_factor;
        let transform = if self.auto_scaling {
            Affine::scale(self.auto_scale_factor)
        } else {
            Affine::IDENTITY
        };

        let mut frame = Scene::new();
        self.widgets.for_each(|widget| {
            if !widget.is_visible() {
                return;
            }
            let mut layer = Scene::new();
            widget.on_display(&mut GraphicsContext::new(&mut layer, size, scale_factor));
            frame.append(&layer, Some(transform));
        });

        self.view.leave_context(frame);
        self.needs_display = false;
    }

    pub(crate) fn on_focus(&mut self, focused: bool, mode: CrossingMode) {
        if let Some(listener) = self.listener.as_mut() {
            listener.on_focus(focused, mode);
        }
    }

    /// Ask the listener whether a user close request may proceed
    pub(crate) fn accept_close(&mut self) -> bool {
        self.listener
            .as_mut()
            .map_or(true, |listener| listener.on_close())
    }

    /// Offer an input event to the widgets, topmost first
    pub(crate) fn dispatch_input(&mut self, event: Event) -> bool {
        match event {
            Event::Keyboard(ev) => {
                if ev.repeat && self.ignoring_key_repeat {
                    return false;
                }
                self.widgets.dispatch(|w| w.on_keyboard(&ev))
            }
            Event::Special(ev) => {
                if ev.repeat && self.ignoring_key_repeat {
                    return false;
                }
                self.widgets.dispatch(|w| w.on_special(&ev))
            }
            Event::CharacterInput(ev) => self.widgets.dispatch(|w| w.on_character_input(&ev)),
            Event::Mouse(mut ev) => {
                ev.position = self.to_widget_space(ev.position);
                self.widgets.dispatch(|w| w.on_mouse(&ev))
            }
            Event::Motion(mut ev) => {
                ev.position = self.to_widget_space(ev.position);
                self.widgets.dispatch(|w| w.on_motion(&ev))
            }
            Event::Scroll(mut ev) => {
                ev.position = self.to_widget_space(ev.position);
                self.widgets.dispatch(|w| w.on_scroll(&ev))
            }
            _ => false,
        }
    }
}
