//! Plugin UI entry point
//!
//! A [`PluginWindow`] is what a host-format bridge (CLAP, VST3, LV2) holds on
//! to: one application driven by the host's idle calls and the window it
//! shows, either embedded into the view the host hands over or standalone.

use crate::application::{Application, WindowId};
use crate::backend::{NativeHandle, Platform};
use crate::config::{AppConfig, WindowConfig};
use crate::error::{Result, WindowError};
use crate::widget::{Widget, WidgetId};
use crate::window::{Window, WindowListener};

/// What the host tells us about the UI it wants
#[derive(Debug, Clone, PartialEq)]
pub struct PluginWindowOptions {
    /// Raw host view to embed into, a standalone window when unset
    pub parent: Option<usize>,
    pub width: u32,
    pub height: u32,
    /// Host-provided scale factor, the desktop one when unset
    pub scale_factor: Option<f64>,
    pub resizable: bool,
    pub title: String,
    /// Raw host window a standalone UI should stay on top of
    pub transient_parent: Option<usize>,
}

impl Default for PluginWindowOptions {
    fn default() -> Self {
        Self {
            parent: None,
            width: crate::config::DEFAULT_WIDTH,
            height: crate::config::DEFAULT_HEIGHT,
            scale_factor: None,
            resizable: false,
            title: String::from("baseview_shell"),
            transient_parent: None,
        }
    }
}

fn host_handle(raw: usize) -> Result<NativeHandle> {
    NativeHandle::new(raw).ok_or(WindowError::InvalidParent(raw))
}

pub struct PluginWindow {
    app: Application,
    window: WindowId,
}

impl PluginWindow {
    /// Create the UI window. Embedded windows are realized right away,
    /// standalone ones on the first `set_window_visible(true)`.
    pub fn create(
        platform: impl Platform + 'static,
        options: PluginWindowOptions,
        listener: Option<Box<dyn WindowListener>>,
    ) -> Result<Self> {
        let mut config = match options.parent {
            Some(parent) => WindowConfig::embedded(host_handle(parent)?),
            None => WindowConfig::new(),
        }
        .with_title(options.title)
        .with_size(options.width, options.height)
        .with_resizable(options.resizable);

        if let Some(scale_factor) = options.scale_factor {
            config = config.with_scale_factor(scale_factor);
        }
        if let Some(transient) = options.transient_parent {
            config = config.with_transient_parent(host_handle(transient)?);
        }

        let mut app = Application::new(platform, AppConfig::hosted());
        let window = app.create_window(config)?;
        if let Some(listener) = listener {
            if let Some(w) = app.window_mut(window) {
                w.set_listener(listener);
            }
        }

        tracing::info!(embedded = options.parent.is_some(), "plugin window created");
        Ok(Self { app, window })
    }

    /// Show or hide the UI. Returns false once the application is quitting.
    pub fn set_window_visible(&mut self, visible: bool) -> bool {
        if visible {
            self.app.show(self.window);
        } else {
            self.app.hide(self.window);
        }
        !self.app.is_quitting()
    }

    /// Run one pump cycle from the host's idle call. Returns false once the
    /// window has been closed or the application is quitting.
    pub fn idle(&mut self) -> bool {
        let running = self.app.pump();
        running && self.window().is_some_and(|w| !w.is_closed())
    }

    pub fn native_window_handle(&self) -> Option<NativeHandle> {
        self.window().and_then(Window::native_handle)
    }

    pub fn set_window_title(&mut self, title: &str) {
        if let Some(window) = self.window_mut() {
            window.set_title(title);
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) -> bool {
        self.window_mut()
            .is_some_and(|window| window.set_size(width, height))
    }

    pub fn set_window_transient_parent(&mut self, parent: usize) {
        let parent = NativeHandle::new(parent);
        if let Some(window) = self.window_mut() {
            window.set_transient_parent(parent);
        }
    }

    /// Scale factor chosen by the host
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if let Some(window) = self.window_mut() {
            window.set_scale_factor(scale_factor);
        }
    }

    pub fn focus(&mut self) {
        self.app.focus(self.window);
    }

    pub fn add_widget(&mut self, widget: Box<dyn Widget>) -> Option<WidgetId> {
        self.window_mut().map(|window| window.add_widget(widget))
    }

    pub fn window_id(&self) -> WindowId {
        self.window
    }

    pub fn window(&self) -> Option<&Window> {
        self.app.window(self.window)
    }

    pub fn window_mut(&mut self) -> Option<&mut Window> {
        self.app.window_mut(self.window)
    }

    /// The application behind the window, to open dialogs on top of it
    pub fn application_mut(&mut self) -> &mut Application {
        &mut self.app
    }
}
