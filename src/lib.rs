//! Baseview Shell
//!
//! Window, event, modal and idle substrate for audio plugin UIs. A window is
//! either a standalone OS window or a view embedded into one the plugin host
//! owns; native events from either are translated into one event model and
//! offered to the widgets attached to the window.
//!
//! # Status
//!
//! **Experimental** - This is a work-in-progress integration.
//!
//! # Architecture
//!
//! Audio plugin hosts own the main thread and its event loop, so nothing here
//! blocks unless asked to. Everything is driven by [`Application::pump`]:
//!
//! 1. From [`Application::run`] for standalone applications
//! 2. From [`Application::run_as_modal`] while a dialog runs modally
//! 3. From the host's idle calls through [`PluginWindow::idle`]
//!
//! Native windows come from a [`backend::Platform`]. The baseview backend
//! renders with Vello/wgpu; the headless backend keeps everything in memory
//! and is what the tests run against.
//!
//! # Usage
//!
//! ```ignore
//! use baseview_shell::backend::baseview::BaseviewPlatform;
//! use baseview_shell::{PluginWindow, PluginWindowOptions};
//!
//! // For CLAP plugins with parent window:
//! let mut ui = PluginWindow::create(
//!     BaseviewPlatform::new(),
//!     PluginWindowOptions {
//!         parent: Some(parent_handle),
//!         width: 800,
//!         height: 600,
//!         ..Default::default()
//!     },
//!     None,
//! )?;
//! ui.set_window_visible(true);
//!
//! // from the host's timer or idle callback
//! ui.idle();
//! ```

mod application;
pub mod backend;
mod config;
mod error;
mod event;
mod graphics;
mod idle;
mod masonry_widget;
mod modal;
mod plugin;
mod render;
mod translate;
mod widget;
mod window;

pub use application::{Application, WindowId};
pub use backend::{FileBrowserOptions, NativeHandle};
pub use config::{AppConfig, WindowConfig, DEFAULT_HEIGHT, DEFAULT_WIDTH};
pub use error::{Result, WindowError};
pub use event::{
    CharacterInputEvent, CrossingMode, Event, KeyboardEvent, MotionEvent, MouseButton,
    MouseEvent, ResizeEvent, ScrollDirection, ScrollEvent, SpecialEvent,
};
pub use graphics::GraphicsContext;
pub use idle::{IdleCallback, SharedIdleCallback};
pub use masonry_widget::MasonryWidget;
pub use plugin::{PluginWindow, PluginWindowOptions};
pub use render::RenderError;
pub use translate::EventTranslator;
pub use widget::{Widget, WidgetId};
pub use window::{Window, WindowListener};

pub use keyboard_types::{Code, Key, Modifiers};
