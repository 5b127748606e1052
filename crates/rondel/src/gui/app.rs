use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::editor::{EditorModel, EditorMsg, EditorOutput};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::view::{self, IconCache};
use crate::gui::window;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use hostlink::wm;
use relm4::prelude::*;
use rondel_core::{
    CommandEdit, DragPayload, KeyInput, MenuAction, MenuCoordinator, MenuEvent, Modifiers,
    MouseButton, NodeId, Point,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct AppModel {
    pub menu: Rc<RefCell<MenuCoordinator>>,
    pub icons: Rc<RefCell<IconCache>>,
    /// Window position of the menu surface's top-left corner.
    pub origin: Rc<Cell<Point>>,
    pub visible: bool,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    editor: Controller<EditorModel>,
    editor_open: bool,
    ticking: Rc<Cell<bool>>,
}

#[derive(Debug)]
pub enum AppMsg {
    Show { edit: bool },
    Hide,
    ConfigReload,
    PointerMove(Point),
    PointerLeave,
    Press(Point, u32, Modifiers),
    Release,
    Key(KeyInput),
    DragEnd(bool),
    /// Result of a call the drag and drop handlers made synchronously.
    Apply(MenuAction),
    EditorSaved(NodeId, CommandEdit),
    EditorClosed,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show { edit: false },
            AppEvent::Edit => AppMsg::Show { edit: true },
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

impl From<EditorOutput> for AppMsg {
    fn from(output: EditorOutput) -> Self {
        match output {
            EditorOutput::Saved(node, edit) => AppMsg::EditorSaved(node, edit),
            EditorOutput::Closed => AppMsg::EditorClosed,
        }
    }
}

fn mouse_button(button: u32) -> Option<MouseButton> {
    match button {
        gdk::BUTTON_PRIMARY => Some(MouseButton::Primary),
        gdk::BUTTON_MIDDLE => Some(MouseButton::Middle),
        gdk::BUTTON_SECONDARY => Some(MouseButton::Secondary),
        _ => None,
    }
}

fn modifiers(state: gdk::ModifierType) -> Modifiers {
    Modifiers {
        control: state.contains(gdk::ModifierType::CONTROL_MASK),
        alt: state.contains(gdk::ModifierType::ALT_MASK),
        shift: state.contains(gdk::ModifierType::SHIFT_MASK),
        logo: state.contains(gdk::ModifierType::SUPER_MASK),
    }
}

fn key_input(key: gdk::Key) -> KeyInput {
    if key == gdk::Key::Escape {
        return KeyInput::Escape;
    }
    key.to_unicode()
        .filter(|c| c.is_alphanumeric())
        .map_or(KeyInput::Other, KeyInput::Char)
}

fn to_menu(window_point: Point, origin: Point) -> Point {
    Point::new(window_point.x - origin.x, window_point.y - origin.y)
}

/// Dropped strings pass through as-is; file lists yield their first URI.
fn payload_text(value: &glib::Value) -> Option<String> {
    if let Ok(text) = value.get::<String>() {
        return Some(text);
    }
    let files = value.get::<gdk::FileList>().ok()?;
    files.files().first().map(|f| f.uri().to_string())
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (MenuCoordinator, Config, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Rondel"),
            #[watch]
            set_visible: model.visible,
            add_css_class: "rondel-window",
            set_decorated: false,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    match key_input(key) {
                        KeyInput::Other => glib::Propagation::Proceed,
                        input => {
                            sender.input(AppMsg::Key(input));
                            glib::Propagation::Stop
                        }
                    }
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "rondel-drawing-area",

                add_controller = gtk::EventControllerMotion {
                    connect_motion[sender] => move |_, x, y| {
                        sender.input(AppMsg::PointerMove(Point::new(x, y)));
                    },
                    connect_leave[sender] => move |_| {
                        sender.input(AppMsg::PointerLeave);
                    }
                },

                add_controller = gtk::GestureClick {
                    set_button: 0, // all buttons
                    connect_pressed[sender] => move |gesture, _, x, y| {
                        let mods = modifiers(gesture.current_event_state());
                        sender.input(AppMsg::Press(Point::new(x, y), gesture.current_button(), mods));
                    },
                    connect_released[sender] => move |_, _, _, _| {
                        sender.input(AppMsg::Release);
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (mut menu, config, rx) = init;

        theme::load_css();
        window::init_layer_shell(&root);

        let base_theme = theme::sector_theme_from_context(&root.style_context());
        if let Err(e) = menu.rebuild(config.checked_layout(base_theme)) {
            log::error!("Failed to apply theme: {}", e);
        }

        let editor = EditorModel::builder()
            .launch(())
            .forward(sender.input_sender(), AppMsg::from);

        let model = AppModel {
            menu: Rc::new(RefCell::new(menu)),
            icons: Rc::new(RefCell::new(IconCache::default())),
            origin: Rc::new(Cell::new(Point::default())),
            visible: false,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            editor,
            editor_open: false,
            ticking: Rc::new(Cell::new(false)),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        {
            let menu = model.menu.clone();
            let icons = model.icons.clone();
            let origin = model.origin.clone();
            widgets
                .drawing_area
                .set_draw_func(move |drawing_area, cr, _, _| {
                    let colors = ThemeColors::from_context(&drawing_area.style_context());
                    if let Err(e) = view::draw(
                        cr,
                        &menu.borrow(),
                        origin.get(),
                        &mut icons.borrow_mut(),
                        &colors,
                    ) {
                        log::error!("Drawing error: {}", e);
                    }
                });
        }

        widgets
            .drawing_area
            .add_controller(model.drag_source(&sender));
        widgets
            .drawing_area
            .add_controller(model.drop_target(&sender));

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        root.set_visible(false);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        let action = match msg {
            AppMsg::Show { edit } => self.show(edit),
            AppMsg::Hide => self.menu.borrow_mut().close(),
            AppMsg::ConfigReload => match self.reload() {
                Some(action) => action,
                None => return,
            },
            AppMsg::PointerMove(p) => {
                if !self.visible {
                    return;
                }
                let world = to_menu(p, self.origin.get());
                self.menu.borrow_mut().pointer_move(world)
            }
            AppMsg::PointerLeave => self.menu.borrow_mut().pointer_leave(),
            AppMsg::Press(p, button, mods) => {
                let Some(button) = mouse_button(button).filter(|_| self.visible) else {
                    return;
                };
                let world = to_menu(p, self.origin.get());
                self.menu.borrow_mut().press(world, button, mods)
            }
            AppMsg::Release => self.menu.borrow_mut().release(),
            AppMsg::Key(key) => self.menu.borrow_mut().key_press(key),
            AppMsg::DragEnd(accepted) => self.menu.borrow_mut().end_drag(accepted),
            AppMsg::Apply(action) => action,
            AppMsg::EditorSaved(node, edit) => {
                let mut menu = self.menu.borrow_mut();
                let mut action = menu.update_command(node, edit);
                let closed = menu.close_editor();
                action.redraw |= closed.redraw;
                action.events.extend(closed.events);
                action
            }
            AppMsg::EditorClosed => self.menu.borrow_mut().close_editor(),
        };
        self.apply(action);
    }
}

impl AppModel {
    fn show(&mut self, edit: bool) -> MenuAction {
        if let Some(name) = wm::get_active_monitor() {
            window::set_window_monitor(&self.root, &name);
        }

        let cursor = window::get_cursor_position(&self.root)
            .or_else(wm::get_cursor_pos_on_active_monitor)
            .unwrap_or_else(|| {
                Point::new(
                    self.drawing_area.width() as f64 / 2.0,
                    self.drawing_area.height() as f64 / 2.0,
                )
            });

        let mut menu = self.menu.borrow_mut();
        let center = menu.layout().center();
        self.origin
            .set(Point::new(cursor.x - center.x, cursor.y - center.y));
        self.visible = true;
        window::grab_keyboard(&self.root, true);

        let mut action = menu.open();
        if edit != menu.is_edit_mode() {
            let toggled = menu.set_edit_mode(edit);
            action.events.extend(toggled.events);
            action.redraw |= toggled.redraw;
        }
        action
    }

    fn reload(&mut self) -> Option<MenuAction> {
        let config = match config::load_config() {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to reload config: {}", e);
                return None;
            }
        };
        let base_theme = theme::sector_theme_from_context(&self.root.style_context());
        match self
            .menu
            .borrow_mut()
            .rebuild(config.checked_layout(base_theme))
        {
            Ok(action) => {
                log::info!("Configuration reloaded");
                Some(action)
            }
            Err(e) => {
                log::error!("Failed to rebuild menu: {}", e);
                None
            }
        }
    }

    fn apply(&mut self, action: MenuAction) {
        for event in &action.events {
            match event {
                MenuEvent::ContextMenuRequested { node, .. } => self.open_editor(*node),
                MenuEvent::Invoked { command, .. } => {
                    log::info!("Invoked '{}'", command.script);
                }
                MenuEvent::MenuClosed => self.visible = false,
                other => log::trace!("{:?}", other),
            }
        }

        if self.editor_open && self.menu.borrow().editing().is_none() {
            self.editor_open = false;
            self.editor.emit(EditorMsg::Dismiss);
            window::grab_keyboard(&self.root, self.visible);
        }

        if action.hide {
            self.visible = false;
            window::grab_keyboard(&self.root, false);
        }
        if action.redraw {
            self.drawing_area.queue_draw();
            self.start_ticker();
        }
    }

    fn open_editor(&mut self, node: NodeId) {
        let (path, properties) = {
            let mut menu = self.menu.borrow_mut();
            let ctx = menu.context_mut();
            (ctx.registry().path(node).to_string(), ctx.properties(node))
        };
        // The editor surface needs the keyboard while it is up.
        window::grab_keyboard(&self.root, false);
        self.editor_open = true;
        self.editor.emit(EditorMsg::Open {
            node,
            path,
            properties: Box::new(properties),
        });
    }

    /// Redraws every frame until all fades have settled.
    fn start_ticker(&self) {
        if self.ticking.replace(true) {
            return;
        }
        let menu = self.menu.clone();
        let drawing_area = self.drawing_area.clone();
        let ticking = self.ticking.clone();
        glib::timeout_add_local(FRAME_INTERVAL, move || {
            drawing_area.queue_draw();
            let animating = menu
                .try_borrow()
                .map(|m| m.is_animating(Instant::now()))
                .unwrap_or(true);
            if animating {
                glib::ControlFlow::Continue
            } else {
                ticking.set(false);
                glib::ControlFlow::Break
            }
        });
    }

    /// Carries a dragged command out of the menu. The drag only starts when
    /// the press that preceded it opened a drag session.
    fn drag_source(&self, sender: &ComponentSender<Self>) -> gtk::DragSource {
        let source = gtk::DragSource::new();
        source.set_actions(gdk::DragAction::MOVE);

        let menu = self.menu.clone();
        source.connect_prepare(move |_, _, _| {
            let session = menu.borrow().drag_session()?;
            let text = DragPayload::encode_command(session.source);
            Some(gdk::ContentProvider::for_value(&text.to_value()))
        });

        let menu = self.menu.clone();
        let icons = self.icons.clone();
        source.connect_drag_begin(move |source, _| {
            let menu = menu.borrow();
            let icon = menu.drag_session().and_then(|s| {
                menu.context()
                    .registry()
                    .get(s.source)
                    .and_then(|n| n.properties().icon.clone())
            });
            if let Some(pixbuf) = icon.and_then(|i| icons.borrow_mut().get(&i)) {
                let texture = gdk::Texture::for_pixbuf(&pixbuf);
                source.set_icon(Some(&texture), pixbuf.width() / 2, pixbuf.height() / 2);
            }
        });

        let sender = sender.clone();
        source.connect_drag_end(move |_, _, delete_data| {
            sender.input(AppMsg::DragEnd(delete_data));
        });
        source
    }

    /// Accepts commands dragged inside the menu and payloads from other
    /// applications while edit mode is on.
    fn drop_target(&self, sender: &ComponentSender<Self>) -> gtk::DropTarget {
        let target = gtk::DropTarget::new(
            glib::Type::INVALID,
            gdk::DragAction::COPY | gdk::DragAction::MOVE,
        );
        target.set_types(&[glib::Type::STRING, gdk::FileList::static_type()]);
        target.set_preload(true);

        {
            let menu = self.menu.clone();
            let origin = self.origin.clone();
            let sender = sender.clone();
            target.connect_motion(move |target, x, y| {
                let Some(text) = target.value().as_ref().and_then(payload_text) else {
                    return gdk::DragAction::empty();
                };
                let world = to_menu(Point::new(x, y), origin.get());
                let action = {
                    let mut menu = menu.borrow_mut();
                    let payload = DragPayload::decode(&text, menu.context().registry());
                    menu.drag_motion(world, &payload)
                };
                let accepted = action.handled;
                sender.input(AppMsg::Apply(action));
                if accepted {
                    gdk::DragAction::MOVE
                } else {
                    gdk::DragAction::empty()
                }
            });
        }

        {
            let menu = self.menu.clone();
            let sender = sender.clone();
            target.connect_leave(move |_| {
                let action = menu.borrow_mut().drag_leave();
                sender.input(AppMsg::Apply(action));
            });
        }

        {
            let menu = self.menu.clone();
            let origin = self.origin.clone();
            let sender = sender.clone();
            target.connect_drop(move |_, value, x, y| {
                let Some(text) = payload_text(value) else {
                    return false;
                };
                let world = to_menu(Point::new(x, y), origin.get());
                let action = {
                    let mut menu = menu.borrow_mut();
                    let payload = DragPayload::decode(&text, menu.context().registry());
                    menu.drop_payload(world, &payload)
                };
                let accepted = action.handled;
                sender.input(AppMsg::Apply(action));
                accepted
            });
        }
        target
    }
}
