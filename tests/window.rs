use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use baseview_shell::backend::headless::{HeadlessPlatform, HeadlessViews};
use baseview_shell::{
    AppConfig, Application, Code, Event, FileBrowserOptions, GraphicsContext, KeyboardEvent,
    Modifiers, MouseButton, MouseEvent, NativeHandle, ResizeEvent, Widget, WindowConfig, WindowId,
    WindowListener,
};
use dpi::{PhysicalPosition, PhysicalSize};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

type Log = Rc<RefCell<Vec<String>>>;

/// Records what reaches it under its name
struct Recorder {
    name: &'static str,
    log: Log,
}

impl Widget for Recorder {
    fn on_display(&mut self, _context: &mut GraphicsContext<'_>) {
        self.log.borrow_mut().push(format!("{} paint", self.name));
    }

    fn on_resize(&mut self, event: &ResizeEvent) {
        self.log.borrow_mut().push(format!(
            "{} resize {}x{}",
            self.name, event.size.width, event.size.height
        ));
    }

    fn on_keyboard(&mut self, event: &KeyboardEvent) -> bool {
        self.log
            .borrow_mut()
            .push(format!("{} key {}", self.name, event.key));
        true
    }

    fn on_mouse(&mut self, event: &MouseEvent) -> bool {
        self.log.borrow_mut().push(format!(
            "{} mouse {},{}",
            self.name, event.position.x, event.position.y
        ));
        true
    }
}

/// Flips on every press and asks to be painted again
struct Toggle {
    on: bool,
    dirty: bool,
    painted: Rc<RefCell<Vec<bool>>>,
}

impl Widget for Toggle {
    fn on_display(&mut self, _context: &mut GraphicsContext<'_>) {
        self.painted.borrow_mut().push(self.on);
    }

    fn on_mouse(&mut self, event: &MouseEvent) -> bool {
        if event.press {
            self.on = !self.on;
            self.dirty = true;
        }
        true
    }

    fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

#[derive(Default)]
struct Notifications {
    sizes: Vec<(u32, u32)>,
    scale_factors: Vec<f64>,
    files: Vec<Option<PathBuf>>,
}

struct Listener(Rc<RefCell<Notifications>>);

impl WindowListener for Listener {
    fn on_size_changed(&mut self, width: u32, height: u32) {
        self.0.borrow_mut().sizes.push((width, height));
    }

    fn on_scale_factor_changed(&mut self, scale_factor: f64) {
        self.0.borrow_mut().scale_factors.push(scale_factor);
    }

    fn on_file_selected(&mut self, path: Option<&Path>) {
        self.0.borrow_mut().files.push(path.map(Path::to_path_buf));
    }
}

fn setup(config: WindowConfig) -> (Application, HeadlessViews, WindowId) {
    init_tracing();
    let platform = HeadlessPlatform::new();
    let views = platform.views();
    let mut app = Application::new(platform, AppConfig::default());
    let id = app.create_window(config).unwrap();
    (app, views, id)
}

fn add_recorder(app: &mut Application, id: WindowId, name: &'static str, log: &Log) {
    app.window_mut(id).unwrap().add_widget(Box::new(Recorder {
        name,
        log: Rc::clone(log),
    }));
}

fn key(key: char, repeat: bool) -> Event {
    Event::Keyboard(KeyboardEvent {
        press: true,
        key,
        code: Code::KeyA,
        modifiers: Modifiers::empty(),
        repeat,
        time: Duration::ZERO,
    })
}

#[test]
fn configure_resizes_widgets_in_insertion_order() {
    let (mut app, views, id) = setup(WindowConfig::new().with_size(300, 200));
    let log = Log::default();
    add_recorder(&mut app, id, "first", &log);
    add_recorder(&mut app, id, "second", &log);
    app.show(id);
    app.pump();
    log.borrow_mut().clear();

    views.get(0).unwrap().push_event(Event::Configure {
        size: PhysicalSize::new(500, 400),
        scale_factor: 1.0,
    });
    app.pump();

    assert_eq!(
        *log.borrow(),
        [
            "first resize 500x400",
            "second resize 500x400",
            "first paint",
            "second paint",
        ]
    );
    assert_eq!(app.window(id).unwrap().size(), PhysicalSize::new(500, 400));
}

#[test]
fn degenerate_configure_is_ignored() {
    let (mut app, views, id) = setup(WindowConfig::new().with_size(300, 200));
    app.show(id);
    app.pump();

    views.get(0).unwrap().push_event(Event::Configure {
        size: PhysicalSize::new(1, 400),
        scale_factor: 1.0,
    });
    app.pump();
    assert_eq!(app.window(id).unwrap().size(), PhysicalSize::new(300, 200));
}

#[test]
fn automatic_scaling_follows_the_window_size() {
    let (mut app, views, id) = setup(WindowConfig::new().with_size(400, 200));
    let log = Log::default();
    add_recorder(&mut app, id, "ui", &log);

    let window = app.window_mut(id).unwrap();
    assert!(window.set_geometry_constraints(200, 100, true, true));
    assert_eq!(window.auto_scale_factor(), 2.0);

    app.show(id);
    app.pump();
    assert!(log.borrow().contains(&"ui resize 200x100".to_string()));

    views.get(0).unwrap().push_event(Event::Configure {
        size: PhysicalSize::new(600, 300),
        scale_factor: 1.0,
    });
    app.pump();
    assert_eq!(app.window(id).unwrap().auto_scale_factor(), 3.0);

    // pointer positions arrive in unscaled widget space
    log.borrow_mut().clear();
    views.get(0).unwrap().push_event(Event::Mouse(MouseEvent {
        press: true,
        button: MouseButton::Left,
        position: PhysicalPosition::new(300.0, 150.0),
        modifiers: Modifiers::empty(),
        time: Duration::ZERO,
    }));
    app.pump();
    assert_eq!(*log.borrow(), ["ui mouse 100,50"]);
}

#[test]
fn zero_sized_constraints_with_aspect_lock_are_rejected() {
    let (mut app, views, id) = setup(WindowConfig::new());
    let window = app.window_mut(id).unwrap();

    assert!(!window.set_geometry_constraints(0, 100, true, false));
    assert!(!window.set_geometry_constraints(100, 0, false, true));
    assert_eq!(window.geometry_constraints(), (0, 0, false));
    assert_eq!(views.get(0).unwrap().state().min_size, None);

    assert!(window.set_geometry_constraints(100, 50, true, false));
    assert_eq!(
        views.get(0).unwrap().state().min_size,
        Some(PhysicalSize::new(100, 50))
    );

    assert!(window.set_geometry_constraints(0, 0, false, false));
    assert_eq!(views.get(0).unwrap().state().min_size, None);
}

#[test]
fn set_size_is_clamped_to_constraints() {
    let (mut app, views, id) = setup(WindowConfig::new());
    let window = app.window_mut(id).unwrap();

    assert!(!window.set_size(1, 100));

    window.set_geometry_constraints(300, 200, false, false);
    assert!(window.set_size(100, 100));
    assert_eq!(views.get(0).unwrap().size(), PhysicalSize::new(300, 200));

    window.set_geometry_constraints(200, 100, true, false);
    assert!(window.set_size(400, 400));
    assert_eq!(views.get(0).unwrap().size(), PhysicalSize::new(400, 200));
}

#[test]
fn repeated_keys_can_be_ignored() {
    let (mut app, views, id) = setup(WindowConfig::new().with_ignore_key_repeat(true));
    let log = Log::default();
    add_recorder(&mut app, id, "ui", &log);
    app.show(id);
    app.pump();
    log.borrow_mut().clear();

    let view = views.get(0).unwrap();
    view.push_event(key('a', false));
    view.push_event(key('a', true));
    app.pump();
    assert_eq!(*log.borrow(), ["ui key a"]);

    app.window_mut(id).unwrap().set_ignoring_key_repeat(false);
    view.push_event(key('a', true));
    app.pump();
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn hidden_windows_do_not_paint() {
    let (mut app, views, id) = setup(WindowConfig::new());
    let log = Log::default();
    add_recorder(&mut app, id, "ui", &log);
    app.show(id);
    app.pump();
    let frames = views.get(0).unwrap().frames_presented();

    app.hide(id);
    app.window_mut(id).unwrap().repaint();
    app.pump();
    assert_eq!(views.get(0).unwrap().frames_presented(), frames);

    app.show(id);
    app.pump();
    assert!(views.get(0).unwrap().frames_presented() > frames);
}

#[test]
fn events_for_closed_windows_are_dropped() {
    let (mut app, views, id) = setup(WindowConfig::new());
    let log = Log::default();
    add_recorder(&mut app, id, "ui", &log);
    let keep = app.create_window(WindowConfig::new()).unwrap();
    app.show(keep);
    app.show(id);
    app.pump();
    app.close(id);
    log.borrow_mut().clear();

    views.get(0).unwrap().push_event(key('x', false));
    app.pump();
    assert!(log.borrow().is_empty());
}

#[test]
fn listener_hears_size_and_scale_changes() {
    let (mut app, views, id) = setup(WindowConfig::new().with_size(300, 200));
    let notes = Rc::new(RefCell::new(Notifications::default()));
    app.window_mut(id)
        .unwrap()
        .set_listener(Box::new(Listener(Rc::clone(&notes))));
    app.show(id);
    app.pump();

    views.get(0).unwrap().push_event(Event::Configure {
        size: PhysicalSize::new(600, 400),
        scale_factor: 2.0,
    });
    app.pump();

    let notes = notes.borrow();
    assert_eq!(notes.sizes, [(300, 200), (600, 400)]);
    assert_eq!(notes.scale_factors, [2.0]);
    assert_eq!(app.window(id).unwrap().scale_factor(), 2.0);
}

#[test]
fn embedded_windows_keep_the_host_scale_factor() {
    init_tracing();
    let platform = HeadlessPlatform::new();
    let views = platform.views();
    let mut app = Application::new(platform, AppConfig::hosted());
    let parent = NativeHandle::new(0x77).unwrap();
    let id = app
        .create_window(WindowConfig::embedded(parent).with_scale_factor(1.5))
        .unwrap();
    app.show(id);

    views.get(0).unwrap().push_event(Event::Configure {
        size: PhysicalSize::new(600, 400),
        scale_factor: 3.0,
    });
    app.pump();
    assert_eq!(app.window(id).unwrap().scale_factor(), 1.5);
    assert!(!app.window_mut(id).unwrap().set_resizable(true));
}

#[test]
fn file_browser_result_reaches_the_listener() {
    let (mut app, views, id) = setup(WindowConfig::new().with_title("Synth"));
    let notes = Rc::new(RefCell::new(Notifications::default()));
    app.window_mut(id)
        .unwrap()
        .set_listener(Box::new(Listener(Rc::clone(&notes))));
    app.show(id);

    let window = app.window_mut(id).unwrap();
    assert!(window.open_file_browser(FileBrowserOptions::default()));
    assert!(!window.open_file_browser(FileBrowserOptions::default()));
    assert_eq!(
        views.get(0).unwrap().state().file_browser_requests[0].title,
        Some("Synth".to_string())
    );

    views
        .get(0)
        .unwrap()
        .push_event(Event::FileSelected(Some(PathBuf::from("/tmp/patch.fxp"))));
    app.pump();
    assert_eq!(
        notes.borrow().files,
        [Some(PathBuf::from("/tmp/patch.fxp"))]
    );

    assert!(app
        .window_mut(id)
        .unwrap()
        .open_file_browser(FileBrowserOptions::default()));
}

#[test]
fn backends_without_file_dialogs_refuse() {
    init_tracing();
    let mut app = Application::new(
        HeadlessPlatform::new().without_file_dialogs(),
        AppConfig::default(),
    );
    let id = app.create_window(WindowConfig::new()).unwrap();
    assert!(!app
        .window_mut(id)
        .unwrap()
        .open_file_browser(FileBrowserOptions::default()));
}

#[test]
fn removed_widgets_stop_painting() {
    let (mut app, _views, id) = setup(WindowConfig::new());
    let log = Log::default();
    let window = app.window_mut(id).unwrap();
    let widget = window.add_widget(Box::new(Recorder {
        name: "gone",
        log: Rc::clone(&log),
    }));
    assert_eq!(window.widget_count(), 1);
    assert!(window.remove_widget(widget).is_some());
    assert_eq!(window.widget_count(), 0);

    app.show(id);
    app.pump();
    assert!(log.borrow().is_empty());
}

#[test]
fn widget_repaint_requests_paint_the_new_state() {
    let (mut app, views, id) = setup(WindowConfig::new());
    let painted = Rc::new(RefCell::new(Vec::new()));
    app.window_mut(id).unwrap().add_widget(Box::new(Toggle {
        on: false,
        dirty: false,
        painted: Rc::clone(&painted),
    }));
    app.show(id);
    app.pump();
    let view = views.get(0).unwrap();
    let frames = view.frames_presented();
    assert_eq!(*painted.borrow(), [false]);

    view.push_event(Event::Mouse(MouseEvent {
        press: true,
        button: MouseButton::Left,
        position: PhysicalPosition::new(5.0, 5.0),
        modifiers: Modifiers::empty(),
        time: Duration::ZERO,
    }));
    app.pump();
    assert_eq!(*painted.borrow(), [false, true]);
    assert_eq!(view.frames_presented(), frames + 1);

    // nothing changed, nothing painted
    for _ in 0..5 {
        app.pump();
    }
    assert_eq!(view.frames_presented(), frames + 1);
}
