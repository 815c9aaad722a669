use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use baseview_shell::backend::headless::{HeadlessPlatform, HeadlessViews};
use baseview_shell::{
    AppConfig, Application, CrossingMode, Event, GraphicsContext, Modifiers, MouseButton,
    MouseEvent, Widget, WindowConfig, WindowId, WindowListener,
};
use dpi::PhysicalPosition;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[derive(Default)]
struct FocusLog {
    events: Rc<RefCell<Vec<bool>>>,
}

impl WindowListener for FocusLog {
    fn on_focus(&mut self, focused: bool, _mode: CrossingMode) {
        self.events.borrow_mut().push(focused);
    }
}

struct Veto;

impl WindowListener for Veto {
    fn on_close(&mut self) -> bool {
        false
    }
}

struct ClickCounter {
    clicks: Rc<RefCell<u32>>,
}

impl Widget for ClickCounter {
    fn on_display(&mut self, _context: &mut GraphicsContext<'_>) {}

    fn on_mouse(&mut self, _event: &MouseEvent) -> bool {
        *self.clicks.borrow_mut() += 1;
        true
    }
}

fn click() -> Event {
    Event::Mouse(MouseEvent {
        press: true,
        button: MouseButton::Left,
        position: PhysicalPosition::new(10.0, 10.0),
        modifiers: Modifiers::empty(),
        time: Duration::ZERO,
    })
}

/// A shown parent window and a dialog created modal to it
fn setup(config: AppConfig) -> (Application, HeadlessViews, WindowId, WindowId) {
    init_tracing();
    let platform = HeadlessPlatform::new();
    let views = platform.views();
    let mut app = Application::new(platform, config.with_pump_interval(Duration::from_millis(1)));

    let parent = app.create_window(WindowConfig::new()).unwrap();
    app.show(parent);
    let dialog = app
        .create_window(WindowConfig::new().with_modal_parent(parent))
        .unwrap();
    (app, views, parent, dialog)
}

#[test]
fn start_and_stop_maintain_both_links() {
    let (mut app, _views, parent, dialog) = setup(AppConfig::default());

    app.start_modal(dialog);
    assert!(app.window(dialog).unwrap().is_modal());
    assert!(app.window(dialog).unwrap().is_visible());
    assert_eq!(app.window(parent).unwrap().modal_child(), Some(dialog));

    app.stop_modal(dialog);
    assert!(!app.window(dialog).unwrap().is_modal());
    assert_eq!(app.window(parent).unwrap().modal_child(), None);
    assert_eq!(app.window(dialog).unwrap().modal_parent(), Some(parent));
}

#[test]
fn start_and_stop_work_for_hidden_parents() {
    init_tracing();
    let mut app = Application::new(HeadlessPlatform::new(), AppConfig::default());
    let parent = app.create_window(WindowConfig::new()).unwrap();
    let dialog = app
        .create_window(WindowConfig::new().with_modal_parent(parent))
        .unwrap();

    app.start_modal(dialog);
    app.stop_modal(dialog);
    assert!(!app.window(dialog).unwrap().is_modal());
    assert_eq!(app.window(parent).unwrap().modal_child(), None);
}

#[test]
fn windows_without_modal_parent_are_only_shown() {
    init_tracing();
    let mut app = Application::new(HeadlessPlatform::new(), AppConfig::default());
    let lonely = app.create_window(WindowConfig::new()).unwrap();

    app.start_modal(lonely);
    assert!(!app.window(lonely).unwrap().is_modal());
    assert!(app.window(lonely).unwrap().is_visible());
}

#[test]
#[should_panic(expected = "modal session is still active")]
fn destroying_an_active_modal_panics() {
    let (mut app, _views, _parent, dialog) = setup(AppConfig::default());
    app.start_modal(dialog);
    app.destroy_window(dialog);
}

#[test]
#[should_panic(expected = "modal child is running on top of it")]
fn destroying_the_parent_of_an_active_modal_panics() {
    let (mut app, _views, parent, dialog) = setup(AppConfig::default());
    app.start_modal(dialog);
    app.destroy_window(parent);
}

#[test]
#[should_panic(expected = "started twice")]
fn starting_twice_panics() {
    let (mut app, _views, _parent, dialog) = setup(AppConfig::default());
    app.start_modal(dialog);
    app.start_modal(dialog);
}

#[test]
#[should_panic(expected = "without an active modal session")]
fn stopping_an_inactive_session_panics() {
    let (mut app, _views, _parent, dialog) = setup(AppConfig::default());
    app.stop_modal(dialog);
}

#[test]
fn focus_on_parent_goes_to_modal_child() {
    let (mut app, views, parent, dialog) = setup(AppConfig::default());
    let parent_log = FocusLog::default();
    let dialog_log = FocusLog::default();
    let parent_events = Rc::clone(&parent_log.events);
    let dialog_events = Rc::clone(&dialog_log.events);
    app.window_mut(parent).unwrap().set_listener(Box::new(parent_log));
    app.window_mut(dialog).unwrap().set_listener(Box::new(dialog_log));

    app.start_modal(dialog);
    app.pump();
    let parent_view = views.get(0).unwrap();
    let dialog_view = views.get(1).unwrap();
    let grabs = dialog_view.focus_grabs();

    app.focus(parent);
    app.pump();
    assert_eq!(parent_view.focus_grabs(), 0);
    assert_eq!(dialog_view.focus_grabs(), grabs + 1);

    // the window system focusing the parent is redirected too
    parent_view.push_event(Event::Focus {
        focused: true,
        mode: CrossingMode::Normal,
    });
    app.pump();
    assert_eq!(dialog_view.focus_grabs(), grabs + 2);

    assert!(parent_events.borrow().is_empty());
    assert_eq!(*dialog_events.borrow(), [true]);

    app.stop_modal(dialog);
}

#[test]
fn focus_loss_still_reaches_the_parent() {
    let (mut app, views, parent, dialog) = setup(AppConfig::default());
    let parent_log = FocusLog::default();
    let parent_events = Rc::clone(&parent_log.events);
    app.window_mut(parent).unwrap().set_listener(Box::new(parent_log));

    app.start_modal(dialog);
    views.get(0).unwrap().push_event(Event::Focus {
        focused: false,
        mode: CrossingMode::Normal,
    });
    app.pump();
    assert_eq!(*parent_events.borrow(), [false]);

    app.stop_modal(dialog);
}

#[test]
fn nested_modals_redirect_focus_to_the_innermost() {
    let (mut app, views, parent, dialog) = setup(AppConfig::default());
    let inner = app
        .create_window(WindowConfig::new().with_modal_parent(dialog))
        .unwrap();
    app.start_modal(dialog);
    app.start_modal(inner);
    let inner_view = views.get(2).unwrap();
    let grabs = inner_view.focus_grabs();

    app.focus(parent);
    assert_eq!(inner_view.focus_grabs(), grabs + 1);

    app.stop_modal(inner);
    app.stop_modal(dialog);
}

#[test]
fn input_to_the_parent_is_blocked_while_modal() {
    let (mut app, views, parent, dialog) = setup(AppConfig::default());
    let clicks = Rc::new(RefCell::new(0));
    app.window_mut(parent).unwrap().add_widget(Box::new(ClickCounter {
        clicks: Rc::clone(&clicks),
    }));
    let parent_view = views.get(0).unwrap();

    app.start_modal(dialog);
    parent_view.push_event(click());
    app.pump();
    assert_eq!(*clicks.borrow(), 0);

    app.stop_modal(dialog);
    parent_view.push_event(click());
    app.pump();
    assert_eq!(*clicks.borrow(), 1);
}

#[test]
fn closing_the_parent_closes_the_modal_child() {
    let (mut app, _views, parent, dialog) = setup(AppConfig::default());
    app.start_modal(dialog);

    app.close(parent);
    assert!(app.window(dialog).unwrap().is_closed());
    assert!(!app.window(dialog).unwrap().is_modal());
    assert_eq!(app.window(parent).unwrap().modal_child(), None);
    assert!(app.is_quitting());
}

#[test]
fn hiding_a_modal_stops_its_session() {
    let (mut app, _views, parent, dialog) = setup(AppConfig::default());
    app.start_modal(dialog);

    app.hide(dialog);
    assert!(!app.window(dialog).unwrap().is_modal());
    assert!(!app.window(dialog).unwrap().is_closed());
    assert_eq!(app.window(parent).unwrap().modal_child(), None);
}

#[test]
fn blocking_modal_returns_when_the_dialog_is_closed() {
    let (mut app, views, parent, dialog) = setup(AppConfig::default());
    views.get(1).unwrap().push_event(Event::Close);

    assert!(!app.run_as_modal(dialog, true));

    let window = app.window(dialog).unwrap();
    assert!(window.is_closed());
    assert!(!window.is_modal());
    assert_eq!(app.window(parent).unwrap().modal_child(), None);
    assert!(!app.is_quitting());
}

#[test]
fn cooperative_modal_reports_until_closed() {
    let (mut app, views, _parent, dialog) = setup(AppConfig::hosted());

    assert!(app.run_as_modal(dialog, false));
    assert!(app.run_as_modal(dialog, false));

    views.get(1).unwrap().push_event(Event::Close);
    assert!(!app.run_as_modal(dialog, false));
    assert!(!app.window(dialog).unwrap().is_modal());
}

#[test]
fn blocking_on_a_hosted_application_pumps_once() {
    let (mut app, _views, _parent, dialog) = setup(AppConfig::hosted());

    assert!(app.run_as_modal(dialog, true));
    app.stop_modal(dialog);
}

#[test]
fn vetoed_close_keeps_the_modal_running() {
    let (mut app, views, _parent, dialog) = setup(AppConfig::hosted());
    app.window_mut(dialog).unwrap().set_listener(Box::new(Veto));

    app.start_modal(dialog);
    views.get(1).unwrap().push_event(Event::Close);
    assert!(app.run_as_modal(dialog, false));
    assert!(!app.window(dialog).unwrap().is_closed());

    app.stop_modal(dialog);
}
