use crate::gui::window;
use gtk::prelude::*;
use gtk4 as gtk;
use hostlink::icon::{self, IconName};
use relm4::prelude::*;
use rondel_core::{CommandEdit, CommandProperties, Macro, NodeId};

/// Property editor for one menu slot.
pub struct EditorModel {
    node: Option<NodeId>,
    visible: bool,
    title: String,
    left_script: gtk::EntryBuffer,
    left_tooltip: gtk::EntryBuffer,
    right_script: gtk::EntryBuffer,
    right_tooltip: gtk::EntryBuffer,
    trigger: gtk::EntryBuffer,
    icon: gtk::EntryBuffer,
}

#[derive(Debug)]
pub enum EditorMsg {
    Open {
        node: NodeId,
        path: String,
        properties: Box<CommandProperties>,
    },
    Save,
    Cancel,
    /// Hide without reporting back, after the menu already ended editing.
    Dismiss,
}

#[derive(Debug)]
pub enum EditorOutput {
    Saved(NodeId, CommandEdit),
    Closed,
}

impl EditorModel {
    fn fill(&self, props: &CommandProperties) {
        self.left_script.set_text(&props.left_macro.script);
        self.left_tooltip.set_text(&props.left_macro.tooltip);
        self.right_script.set_text(&props.right_macro.script);
        self.right_tooltip.set_text(&props.right_macro.tooltip);
        self.trigger
            .set_text(&props.trigger.map(String::from).unwrap_or_default());
        self.icon.set_text("");
    }

    fn collect(&self) -> CommandEdit {
        let text = |b: &gtk::EntryBuffer| b.text().trim().to_string();
        let icon_name = text(&self.icon);
        CommandEdit {
            left_macro: Macro::new(text(&self.left_script), text(&self.left_tooltip)),
            right_macro: Macro::new(text(&self.right_script), text(&self.right_tooltip)),
            trigger: text(&self.trigger).chars().next(),
            icon: (!icon_name.is_empty())
                .then(|| icon::load_icon(&IconName::new(icon_name)))
                .flatten(),
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for EditorModel {
    type Init = ();
    type Input = EditorMsg;
    type Output = EditorOutput;

    view! {
        #[root]
        gtk::Window {
            set_title: Some("Edit command"),
            set_default_width: 380,
            set_resizable: false,
            #[watch]
            set_visible: model.visible,

            connect_close_request[sender] => move |_| {
                sender.input(EditorMsg::Cancel);
                glib::Propagation::Stop
            },

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(EditorMsg::Cancel);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,
                set_spacing: 10,
                set_margin_all: 14,

                gtk::Label {
                    #[watch]
                    set_label: &model.title,
                    set_xalign: 0.0,
                    add_css_class: "heading",
                },

                gtk::Grid {
                    set_row_spacing: 6,
                    set_column_spacing: 8,

                    attach[0, 0, 1, 1] = &gtk::Label {
                        set_label: "Left click",
                        set_xalign: 0.0,
                    },
                    attach[1, 0, 1, 1] = &gtk::Entry {
                        set_buffer: &model.left_script,
                        set_placeholder_text: Some("command"),
                        set_hexpand: true,
                    },
                    attach[1, 1, 1, 1] = &gtk::Entry {
                        set_buffer: &model.left_tooltip,
                        set_placeholder_text: Some("tooltip"),
                    },
                    attach[0, 2, 1, 1] = &gtk::Label {
                        set_label: "Right click",
                        set_xalign: 0.0,
                    },
                    attach[1, 2, 1, 1] = &gtk::Entry {
                        set_buffer: &model.right_script,
                        set_placeholder_text: Some("command"),
                    },
                    attach[1, 3, 1, 1] = &gtk::Entry {
                        set_buffer: &model.right_tooltip,
                        set_placeholder_text: Some("tooltip"),
                    },
                    attach[0, 4, 1, 1] = &gtk::Label {
                        set_label: "Trigger",
                        set_xalign: 0.0,
                    },
                    attach[1, 4, 1, 1] = &gtk::Entry {
                        set_buffer: &model.trigger,
                        set_max_length: 1,
                        set_placeholder_text: Some("letter"),
                    },
                    attach[0, 5, 1, 1] = &gtk::Label {
                        set_label: "Icon",
                        set_xalign: 0.0,
                    },
                    attach[1, 5, 1, 1] = &gtk::Entry {
                        set_buffer: &model.icon,
                        set_placeholder_text: Some("icon name or path, empty keeps current"),
                    },
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Horizontal,
                    set_halign: gtk::Align::End,
                    set_spacing: 6,

                    gtk::Button {
                        set_label: "Cancel",
                        connect_clicked => EditorMsg::Cancel,
                    },
                    gtk::Button {
                        set_label: "Save",
                        add_css_class: "suggested-action",
                        connect_clicked => EditorMsg::Save,
                    },
                },
            }
        }
    }

    fn init(
        _init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        window::init_editor_layer_shell(&root);

        let model = EditorModel {
            node: None,
            visible: false,
            title: String::new(),
            left_script: gtk::EntryBuffer::default(),
            left_tooltip: gtk::EntryBuffer::default(),
            right_script: gtk::EntryBuffer::default(),
            right_tooltip: gtk::EntryBuffer::default(),
            trigger: gtk::EntryBuffer::default(),
            icon: gtk::EntryBuffer::default(),
        };

        let widgets = view_output!();

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            EditorMsg::Open {
                node,
                path,
                properties,
            } => {
                self.fill(&properties);
                self.title = format!("Command {}", path);
                self.node = Some(node);
                self.visible = true;
            }
            EditorMsg::Save => {
                if let Some(node) = self.node.take() {
                    let _ = sender.output(EditorOutput::Saved(node, self.collect()));
                }
                self.visible = false;
            }
            EditorMsg::Cancel => {
                if self.node.take().is_some() {
                    let _ = sender.output(EditorOutput::Closed);
                }
                self.visible = false;
            }
            EditorMsg::Dismiss => {
                self.node = None;
                self.visible = false;
            }
        }
    }
}
