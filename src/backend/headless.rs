//! In-memory backend without an OS window
//!
//! Views record every request made to them and behave like a well-mannered
//! window system: showing a view for the first time configures and exposes it,
//! resizing queues a configure event, grabbing focus queues a focus event.
//! A [`HeadlessHandle`] shares the state of a view so the embedder can inject
//! native events (a user closing the window, a file dialog result, key
//! presses), destroy the view behind the window's back, and inspect what the
//! window layer asked for.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use dpi::PhysicalSize;
use vello::Scene;

use super::{FileBrowserOptions, NativeHandle, NativeView, Platform, ViewConfig};
use crate::error::{Result, WindowError};
use crate::event::{CrossingMode, Event};

/// Observable state of a headless view
#[derive(Debug, Default)]
pub struct HeadlessState {
    pub config: Option<ViewConfig>,
    pub realized: bool,
    pub mapped: bool,
    pub size: PhysicalSize<u32>,
    pub position: (i32, i32),
    pub min_size: Option<PhysicalSize<u32>>,
    pub keep_aspect: bool,
    pub resizable: bool,
    pub title: String,
    pub transient_parent: Option<NativeHandle>,
    pub raise_count: usize,
    pub focus_grabs: usize,
    pub has_focus: bool,
    pub frames_presented: usize,
    pub file_browser_requests: Vec<FileBrowserOptions>,
    pub queue: VecDeque<Event>,
}

/// Shared access to one headless view
#[derive(Debug, Clone, Default)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHandle {
    /// Queue a native event, delivered on the next pump
    pub fn push_event(&self, event: Event) {
        self.state.borrow_mut().queue.push_back(event);
    }

    pub fn state(&self) -> Ref<'_, HeadlessState> {
        self.state.borrow()
    }

    pub fn is_mapped(&self) -> bool {
        self.state.borrow().mapped
    }

    pub fn focus_grabs(&self) -> usize {
        self.state.borrow().focus_grabs
    }

    pub fn frames_presented(&self) -> usize {
        self.state.borrow().frames_presented
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.state.borrow().size
    }

    /// Tear the view down as a window system would after the user closed it,
    /// without waiting for the window layer to agree
    pub fn destroy(&self) {
        let mut state = self.state.borrow_mut();
        state.realized = false;
        state.mapped = false;
        state.has_focus = false;
        state.queue.push_back(Event::Destroyed);
    }
}

/// A view that lives only in memory
pub struct HeadlessView {
    state: Rc<RefCell<HeadlessState>>,
    handle: NativeHandle,
    title: String,
    desktop_scale: f64,
    file_dialogs: bool,
    graphics: bool,
}

impl HeadlessView {
    fn queue(&self, event: Event) {
        self.state.borrow_mut().queue.push_back(event);
    }
}

impl NativeView for HeadlessView {
    fn realize(&mut self) -> Result<()> {
        if !self.graphics {
            return Err(WindowError::GraphicsContext(
                "headless platform has no graphics context".into(),
            ));
        }
        let mut state = self.state.borrow_mut();
        if !state.realized {
            state.realized = true;
            tracing::debug!(handle = self.handle.as_raw(), "headless view realized");
        }
        Ok(())
    }

    fn is_realized(&self) -> bool {
        self.state.borrow().realized
    }

    fn show(&mut self) {
        let first_map = {
            let mut state = self.state.borrow_mut();
            let first = !state.mapped;
            state.mapped = true;
            first
        };
        if first_map {
            let size = self.state.borrow().size;
            self.queue(Event::Configure {
                size,
                scale_factor: self.desktop_scale,
            });
            self.queue(Event::Expose);
        }
    }

    fn hide(&mut self) {
        let mut state = self.state.borrow_mut();
        state.mapped = false;
        state.has_focus = false;
    }

    fn raise(&mut self) {
        self.state.borrow_mut().raise_count += 1;
    }

    fn grab_focus(&mut self) {
        let already_focused = {
            let mut state = self.state.borrow_mut();
            state.focus_grabs += 1;
            std::mem::replace(&mut state.has_focus, true)
        };
        if !already_focused {
            self.queue(Event::Focus {
                focused: true,
                mode: CrossingMode::Normal,
            });
        }
    }

    fn set_size(&mut self, size: PhysicalSize<u32>) {
        let changed = {
            let mut state = self.state.borrow_mut();
            std::mem::replace(&mut state.size, size) != size
        };
        if changed {
            self.queue(Event::Configure {
                size,
                scale_factor: self.desktop_scale,
            });
        }
    }

    fn set_position(&mut self, x: i32, y: i32) {
        self.state.borrow_mut().position = (x, y);
    }

    fn set_geometry_constraints(&mut self, min_size: Option<PhysicalSize<u32>>, keep_aspect: bool) {
        let mut state = self.state.borrow_mut();
        state.min_size = min_size;
        state.keep_aspect = keep_aspect;
    }

    fn set_resizable(&mut self, resizable: bool) {
        self.state.borrow_mut().resizable = resizable;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_owned();
        self.state.borrow_mut().title = title.to_owned();
    }

    fn transient_parent(&self) -> Option<NativeHandle> {
        self.state.borrow().transient_parent
    }

    fn set_transient_parent(&mut self, parent: Option<NativeHandle>) {
        self.state.borrow_mut().transient_parent = parent;
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        self.is_realized().then_some(self.handle)
    }

    fn desktop_scale_factor(&self) -> f64 {
        self.desktop_scale
    }

    fn enter_context(&mut self) -> bool {
        let state = self.state.borrow();
        state.realized && state.mapped
    }

    fn leave_context(&mut self, _frame: Scene) {
        self.state.borrow_mut().frames_presented += 1;
    }

    fn open_file_browser(&mut self, options: &FileBrowserOptions) -> bool {
        if !self.file_dialogs {
            return false;
        }
        self.state
            .borrow_mut()
            .file_browser_requests
            .push(options.clone());
        true
    }

    fn poll_events(&mut self, events: &mut Vec<Event>) {
        events.extend(self.state.borrow_mut().queue.drain(..));
    }
}

/// Platform creating [`HeadlessView`]s
pub struct HeadlessPlatform {
    views: Rc<RefCell<Vec<HeadlessHandle>>>,
    next_handle: usize,
    desktop_scale: f64,
    file_dialogs: bool,
    graphics: bool,
    fail_creation: bool,
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            views: Rc::new(RefCell::new(Vec::new())),
            next_handle: 0x1000,
            desktop_scale: 1.0,
            file_dialogs: true,
            graphics: true,
            fail_creation: false,
        }
    }

    /// Scale factor reported as the desktop scale of every view
    pub fn with_desktop_scale(mut self, scale: f64) -> Self {
        self.desktop_scale = scale;
        self
    }

    /// Views report that no file dialog is available
    pub fn without_file_dialogs(mut self) -> Self {
        self.file_dialogs = false;
        self
    }

    /// Views are created but cannot get a graphics context, so realizing
    /// them fails
    pub fn without_graphics(mut self) -> Self {
        self.graphics = false;
        self
    }

    /// Every view creation fails, like a display server refusing a window
    pub fn failing() -> Self {
        Self {
            fail_creation: true,
            ..Self::new()
        }
    }

    /// Handles of all views created so far, in creation order. The list keeps
    /// growing after the platform moved into an application.
    pub fn views(&self) -> HeadlessViews {
        HeadlessViews {
            views: Rc::clone(&self.views),
        }
    }
}

/// Shared list of the views a [`HeadlessPlatform`] created
#[derive(Clone)]
pub struct HeadlessViews {
    views: Rc<RefCell<Vec<HeadlessHandle>>>,
}

impl HeadlessViews {
    pub fn get(&self, index: usize) -> Option<HeadlessHandle> {
        self.views.borrow().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.views.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.borrow().is_empty()
    }
}

impl Platform for HeadlessPlatform {
    fn create_view(&mut self, config: &ViewConfig) -> Result<Box<dyn NativeView>> {
        if self.fail_creation {
            return Err(WindowError::ViewCreation(
                "headless platform configured to fail".into(),
            ));
        }

        let state = Rc::new(RefCell::new(HeadlessState {
            config: Some(config.clone()),
            size: config.size,
            resizable: config.resizable,
            title: config.title.clone(),
            transient_parent: config.transient_parent,
            ..Default::default()
        }));
        let handle = NativeHandle::new(self.next_handle)
            .ok_or_else(|| WindowError::ViewCreation("handle space exhausted".into()))?;
        self.next_handle += 1;

        self.views.borrow_mut().push(HeadlessHandle {
            state: Rc::clone(&state),
        });

        Ok(Box::new(HeadlessView {
            state,
            handle,
            title: config.title.clone(),
            desktop_scale: self.desktop_scale,
            file_dialogs: self.file_dialogs,
            graphics: self.graphics,
        }))
    }
}
