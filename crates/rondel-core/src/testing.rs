use crate::context::MenuContext;
use crate::coordinator::{MenuCoordinator, MenuLayout};
use crate::error::PersistError;
use crate::fsm::{ButtonRenderer, RenderAction};
use crate::geometry::Point;
use crate::model::{CommandProperties, Macro, NodePath};
use crate::ports::{
    CommandStore, ExtractedCommand, ForeignPayload, HostExecutor, MemoryStore, PayloadAdapter,
};
use serde::Deserialize;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Vec<RenderAction>,
}

impl ButtonRenderer for RecordingRenderer {
    fn render_default(&mut self) {
        self.calls.push(RenderAction::Default);
    }

    fn render_hover(&mut self) {
        self.calls.push(RenderAction::Hover);
    }

    fn render_selected(&mut self) {
        self.calls.push(RenderAction::Selected);
    }

    fn render_disabled(&mut self) {
        self.calls.push(RenderAction::Disabled);
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub inner: MemoryStore,
    pub saves: Vec<NodePath>,
    pub fail_saves: bool,
}

/// Store whose contents stay observable after it is boxed into a context.
#[derive(Debug, Clone, Default)]
pub struct SharedStore(pub Rc<RefCell<StoreState>>);

impl SharedStore {
    pub fn get(&self, path: &str) -> Option<CommandProperties> {
        let path: NodePath = path.parse().ok()?;
        self.0.borrow().inner.get(&path).cloned()
    }

    pub fn seed(&self, path: &str, props: CommandProperties) {
        if let Ok(path) = path.parse::<NodePath>() {
            let _ = self.0.borrow_mut().inner.save(&path, &props);
        }
    }
}

impl CommandStore for SharedStore {
    fn keys(&self) -> Result<Vec<NodePath>, PersistError> {
        self.0.borrow().inner.keys()
    }

    fn load(&self, path: &NodePath) -> Result<Option<CommandProperties>, PersistError> {
        self.0.borrow().inner.load(path)
    }

    fn save(&mut self, path: &NodePath, properties: &CommandProperties) -> Result<(), PersistError> {
        let mut state = self.0.borrow_mut();
        if state.fail_saves {
            return Err(PersistError::new(format!("refusing to save {path}")));
        }
        state.saves.push(path.clone());
        state.inner.save(path, properties)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingHost(pub Rc<RefCell<Vec<Macro>>>);

impl RecordingHost {
    pub fn scripts(&self) -> Vec<String> {
        self.0.borrow().iter().map(|m| m.script.clone()).collect()
    }
}

impl HostExecutor for RecordingHost {
    fn invoke(&self, command: &Macro) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.borrow_mut().push(command.clone());
        Ok(())
    }
}

#[derive(Deserialize)]
struct JsonCommand {
    script: String,
    #[serde(default)]
    tooltip: String,
}

/// Recognises `application/json` payloads of the form `{"script": ..}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPayloads;

impl PayloadAdapter for JsonPayloads {
    fn try_extract_command(&self, payload: &ForeignPayload) -> Option<ExtractedCommand> {
        if payload.mime_type != "application/json" {
            return None;
        }
        let cmd: JsonCommand = serde_json::from_slice(&payload.data).ok()?;
        Some(ExtractedCommand {
            script: cmd.script,
            tooltip: cmd.tooltip,
            icon: None,
            id: None,
        })
    }
}

pub fn json_payload(script: &str) -> ForeignPayload {
    ForeignPayload {
        mime_type: "application/json".to_owned(),
        data: serde_json::json!({ "script": script, "tooltip": script }).to_string().into_bytes(),
    }
}

pub fn leaf(script: &str) -> CommandProperties {
    CommandProperties {
        left_macro: Macro::new(script, script),
        is_active: true,
        ..Default::default()
    }
}

pub fn folder() -> CommandProperties {
    CommandProperties {
        is_folder: true,
        is_active: true,
        ..Default::default()
    }
}

pub struct Harness {
    pub store: SharedStore,
    pub host: RecordingHost,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: SharedStore::default(),
            host: RecordingHost::default(),
        }
    }

    pub fn context(&self) -> MenuContext {
        MenuContext::new(
            Box::new(self.store.clone()),
            Box::new(self.host.clone()),
            Box::new(JsonPayloads),
        )
    }

    pub fn coordinator(&self) -> MenuCoordinator {
        let layout = MenuLayout {
            button_fade: Duration::ZERO,
            ring_fade: Duration::ZERO,
            ..Default::default()
        };
        MenuCoordinator::new(layout, self.context()).unwrap()
    }
}

pub fn slot_point(menu: &MenuCoordinator, level: usize, slot: usize) -> Point {
    let g = menu.ring(level).unwrap().button(slot).unwrap().geometry();
    g.to_world(g.sector_center_point())
}
