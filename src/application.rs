//! Window registry and event pump
//!
//! The [`Application`] owns every window, keeps the set of open standalone
//! windows, and drives everything through [`Application::pump`]: one cycle
//! drains each window's native events, runs due idle callbacks and paints
//! windows that asked for it. The pump can be called from the owned loop
//! ([`Application::run`]), from a blocking modal, or once per host idle call.
//! It never blocks and assumes it is always called from the same thread.

use std::time::Instant;

use slotmap::{new_key_type, SlotMap};

use crate::backend::{Platform, ViewConfig};
use crate::config::{AppConfig, WindowConfig};
use crate::error::{Result, WindowError};
use crate::event::Event;
use crate::idle::{IdleScheduler, SharedIdleCallback};
use crate::window::Window;

new_key_type! {
    /// Identifies a window within its application
    pub struct WindowId;
}

pub struct Application {
    platform: Box<dyn Platform>,
    config: AppConfig,
    windows: SlotMap<WindowId, Window>,
    /// Shown, non-closed standalone windows, in the order they were opened
    open: Vec<WindowId>,
    idle: IdleScheduler,
    quitting: bool,
    events: Vec<Event>,
}

impl Application {
    pub fn new(platform: impl Platform + 'static, config: AppConfig) -> Self {
        Self {
            platform: Box::new(platform),
            config,
            windows: SlotMap::with_key(),
            open: Vec::new(),
            idle: IdleScheduler::new(),
            quitting: false,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_standalone(&self) -> bool {
        self.config.standalone
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    // -------------------------------------------------------------------
    // registry

    /// Create a window. Standalone windows start closed until shown, embedded
    /// windows are realized right away and start open but hidden.
    pub fn create_window(&mut self, config: WindowConfig) -> Result<WindowId> {
        let mut transient_parent = config.transient_parent;
        if let Some(parent) = config.modal_parent {
            let parent_window = self.windows.get(parent).ok_or(WindowError::UnknownWindow)?;
            transient_parent = transient_parent.or_else(|| parent_window.native_handle());
        }

        let view_config = ViewConfig {
            title: config.title.clone(),
            size: config.initial_size(),
            scale_factor: config.scale_factor.unwrap_or(1.0),
            resizable: config.resizable,
            parent: config.parent,
            transient_parent,
        };

        let mut view = self.platform.create_view(&view_config)?;
        if config.is_embedded() {
            view.realize()?;
        }

        let scale_factor = config
            .scale_factor
            .unwrap_or_else(|| view.desktop_scale_factor());
        let id = self
            .windows
            .insert(Window::new(view, &config, scale_factor));

        tracing::debug!(
            ?id,
            embedded = config.is_embedded(),
            modal = config.modal_parent.is_some(),
            "window created"
        );
        Ok(id)
    }

    /// Destroy a window and its native view.
    ///
    /// # Panics
    ///
    /// If the window is running a modal session, or another window is running
    /// modally on top of it.
    pub fn destroy_window(&mut self, id: WindowId) -> bool {
        let Some(window) = self.windows.get(id) else {
            return false;
        };
        assert!(
            !window.modal.is_enabled(),
            "window destroyed while its modal session is still active"
        );
        assert!(
            self.active_modal_child(id).is_none(),
            "window destroyed while a modal child is running on top of it"
        );

        self.forget_open(id);
        self.windows.remove(id);
        tracing::debug!(?id, "window destroyed");
        true
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id)
    }

    pub fn window_ids(&self) -> impl Iterator<Item = WindowId> + '_ {
        self.windows.keys()
    }

    pub fn open_window_count(&self) -> usize {
        self.open.len()
    }

    fn forget_open(&mut self, id: WindowId) {
        let before = self.open.len();
        self.open.retain(|open| *open != id);
        if before != self.open.len() && self.open.is_empty() {
            tracing::debug!("last window closed, application quitting");
            self.quitting = true;
        }
    }

    // -------------------------------------------------------------------
    // visibility

    /// Show a window, reopening it if it was closed. Returns false if the
    /// native view could not be realized.
    pub fn show(&mut self, id: WindowId) -> bool {
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        if window.is_visible {
            return true;
        }

        let view = window.view_mut();
        if !view.is_realized() {
            if let Err(err) = view.realize() {
                tracing::error!(?id, "cannot show window: {}", err);
                return false;
            }
        }

        if window.is_closed {
            window.is_closed = false;
            window.reset_idle_time_base();
            self.open.push(id);
            if self.open.len() == 1 {
                self.quitting = false;
            }
        }

        window.view_mut().show();
        window.is_visible = true;
        window.repaint();
        tracing::debug!(?id, "window shown");
        true
    }

    /// Hide a window without closing it. A running modal session ends.
    pub fn hide(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        if !window.is_visible {
            return;
        }
        if window.modal.is_enabled() {
            self.stop_modal(id);
        }

        if let Some(window) = self.windows.get_mut(id) {
            window.view_mut().hide();
            window.is_visible = false;
            tracing::debug!(?id, "window hidden");
        }
    }

    /// Hide a standalone window and remove it from the open set. Does nothing
    /// for embedded or already closed windows. When the last open window
    /// closes the application starts quitting.
    pub fn close(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        if window.is_embed() || window.is_closed {
            return;
        }

        if window.modal.is_enabled() {
            self.stop_modal(id);
        }
        if let Some(child) = self.active_modal_child(id) {
            self.close(child);
        }

        if let Some(window) = self.windows.get_mut(id) {
            window.is_closed = true;
        }
        self.hide(id);
        self.forget_open(id);
        tracing::debug!(?id, "window closed");
    }

    /// Give input focus to a window, or to the modal child running on top of it
    pub fn focus(&mut self, id: WindowId) {
        if let Some(child) = self.active_modal_child(id) {
            tracing::trace!(?id, ?child, "redirecting focus to modal child");
            self.focus(child);
            return;
        }

        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        if window.is_closed {
            return;
        }
        let embedded = window.is_embed();
        let view = window.view_mut();
        if !embedded {
            view.raise();
        }
        view.grab_focus();
    }

    /// Terminate the loop and close every open window, most recent first
    pub fn quit(&mut self) {
        tracing::info!("application quit requested");
        self.quitting = true;
        for id in self.open.clone().into_iter().rev() {
            self.close(id);
        }
    }

    // -------------------------------------------------------------------
    // modal sessions

    fn active_modal_child(&self, id: WindowId) -> Option<WindowId> {
        self.windows
            .get(id)?
            .modal
            .child()
            .filter(|child| self.windows.get(*child).is_some_and(|w| w.modal.is_enabled()))
    }

    fn modal_running(&self, id: WindowId) -> bool {
        self.windows
            .get(id)
            .is_some_and(|w| !w.is_closed && w.modal.is_enabled())
    }

    /// Make the window modal to its parent: the parent hands focus and input
    /// to it until the session stops. A window created without a modal parent
    /// is only shown.
    ///
    /// # Panics
    ///
    /// If a session is already active for this window.
    pub fn start_modal(&mut self, id: WindowId) {
        let Some(window) = self.windows.get(id) else {
            return;
        };
        assert!(
            !window.modal.is_enabled(),
            "modal session started twice for the same window"
        );

        let parent = window
            .modal
            .parent()
            .filter(|parent| self.windows.contains_key(*parent));
        let Some(parent) = parent else {
            tracing::warn!(?id, "window has no modal parent, showing it normally");
            self.show(id);
            return;
        };

        if let Some(window) = self.windows.get_mut(id) {
            window.modal.enabled = true;
        }
        if let Some(parent_window) = self.windows.get_mut(parent) {
            if let Some(previous) = parent_window.modal.child.replace(id) {
                if previous != id {
                    tracing::warn!(?parent, ?previous, "replacing running modal child");
                }
            }
        }

        self.show(parent);
        self.show(id);
        self.focus(id);
        tracing::debug!(?id, ?parent, "modal session started");
    }

    /// End the modal session of a window and release its parent.
    ///
    /// # Panics
    ///
    /// If no session is active for this window.
    pub fn stop_modal(&mut self, id: WindowId) {
        let Some(window) = self.windows.get_mut(id) else {
            return;
        };
        assert!(
            window.modal.is_enabled(),
            "stop_modal called without an active modal session"
        );
        window.modal.enabled = false;

        if let Some(parent) = window.modal.parent() {
            if let Some(parent_window) = self.windows.get_mut(parent) {
                if parent_window.modal.child == Some(id) {
                    parent_window.modal.child = None;
                }
            }
        }
        tracing::debug!(?id, "modal session stopped");
    }

    /// Run a window as a modal dialog, starting the session if needed.
    ///
    /// With `block_wait` on a standalone application this pumps until the
    /// dialog closes and returns false. Otherwise it pumps once and returns
    /// whether the session is still running; host-driven callers keep calling
    /// it until it returns false.
    pub fn run_as_modal(&mut self, id: WindowId, block_wait: bool) -> bool {
        let Some(window) = self.windows.get(id) else {
            return false;
        };
        if !window.modal.is_enabled() {
            self.start_modal(id);
        }

        if block_wait && !self.config.standalone {
            tracing::warn!("blocking modal loop needs a standalone application, pumping once");
        }

        if block_wait && self.config.standalone {
            while self.modal_running(id) && !self.quitting {
                self.pump();
                if self.modal_running(id) {
                    std::thread::sleep(self.config.pump_interval);
                }
            }
            if self.windows.get(id).is_some_and(|w| w.modal.is_enabled()) {
                self.stop_modal(id);
            }
            return false;
        }

        self.pump();
        self.modal_running(id)
    }

    // -------------------------------------------------------------------
    // idle callbacks not tied to a window

    pub fn add_idle_callback(&mut self, callback: SharedIdleCallback, period_ms: u32) -> bool {
        self.idle.add(callback, period_ms)
    }

    pub fn remove_idle_callback(&mut self, callback: &SharedIdleCallback) -> bool {
        self.idle.remove(callback)
    }

    // -------------------------------------------------------------------
    // event loop

    /// One pump cycle at the current time. Returns false once quitting.
    pub fn pump(&mut self) -> bool {
        self.pump_at(Instant::now())
    }

    /// One pump cycle with an explicit timestamp for the idle schedulers
    pub fn pump_at(&mut self, now: Instant) -> bool {
        let ids: Vec<WindowId> = self.windows.keys().collect();
        let mut events = std::mem::take(&mut self.events);

        for &id in &ids {
            let Some(window) = self.windows.get_mut(id) else {
                continue;
            };
            window.view_mut().poll_events(&mut events);
            for event in events.drain(..) {
                self.dispatch(id, event);
            }
        }
        self.events = events;

        for &id in &ids {
            if let Some(window) = self.windows.get_mut(id) {
                if !window.is_closed {
                    window.tick_idle(now);
                }
            }
        }
        self.idle.tick(now);

        for &id in &ids {
            if let Some(window) = self.windows.get_mut(id) {
                if window.needs_display() {
                    window.on_expose();
                }
            }
        }

        !self.quitting
    }

    /// Owned blocking loop for standalone use. Returns once no window is open
    /// or [`quit`](Self::quit) was called.
    pub fn run(&mut self) {
        tracing::info!(windows = self.open.len(), "entering application loop");
        while !self.quitting && !self.open.is_empty() {
            self.pump();
            if !self.quitting && !self.open.is_empty() {
                std::thread::sleep(self.config.pump_interval);
            }
        }
        tracing::info!("application loop finished");
    }

    /// Route one translated native event to a window. Returns whether the
    /// event was handled.
    pub(crate) fn dispatch(&mut self, id: WindowId, event: Event) -> bool {
        let Some(window) = self.windows.get_mut(id) else {
            return false;
        };
        if window.is_closed {
            tracing::trace!(?id, ?event, "dropping event for closed window");
            return false;
        }

        match event {
            Event::Configure { size, scale_factor } => {
                window.on_configure(size, scale_factor);
                true
            }
            Event::Expose => {
                window.on_expose();
                true
            }
            Event::Close => {
                if window.accept_close() {
                    self.close(id);
                } else {
                    tracing::debug!(?id, "close request vetoed");
                }
                true
            }
            // The native view is already gone, so there is nothing left to veto
            Event::Destroyed => {
                tracing::debug!(?id, "native view destroyed");
                if window.is_embed() {
                    window.is_visible = false;
                } else {
                    self.close(id);
                }
                true
            }
            Event::FileSelected(path) => {
                window.on_file_selected(path);
                true
            }
            // Losing focus is always reported to the window itself
            Event::Focus {
                focused: false,
                mode,
            } => {
                window.on_focus(false, mode);
                true
            }
            Event::Focus {
                focused: true,
                mode,
            } => match self.active_modal_child(id) {
                Some(child) => {
                    self.focus(child);
                    false
                }
                None => {
                    if let Some(window) = self.windows.get_mut(id) {
                        window.on_focus(true, mode);
                    }
                    true
                }
            },
            input => match self.active_modal_child(id) {
                Some(child) => {
                    tracing::trace!(?id, "input blocked by modal child");
                    self.focus(child);
                    false
                }
                None => self
                    .windows
                    .get_mut(id)
                    .is_some_and(|window| window.dispatch_input(input)),
            },
        }
    }
}
