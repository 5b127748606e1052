#![allow(dead_code)]

use rondel_core::error::PersistError;
use rondel_core::ports::MemoryStore;
use rondel_core::{
    CommandProperties, CommandStore, ExtractedCommand, ForeignPayload, HostExecutor, Macro,
    MenuContext, MenuCoordinator, MenuLayout, NodeId, NodePath, PayloadAdapter, Point,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Default)]
pub struct SharedStore(pub Rc<RefCell<MemoryStore>>);

impl SharedStore {
    pub fn get(&self, path: &str) -> Option<CommandProperties> {
        let path: NodePath = path.parse().ok()?;
        self.0.borrow().get(&path).cloned()
    }

    pub fn seed(&self, path: &str, props: CommandProperties) {
        let path: NodePath = path.parse().unwrap();
        self.0.borrow_mut().save(&path, &props).unwrap();
    }
}

impl CommandStore for SharedStore {
    fn keys(&self) -> Result<Vec<NodePath>, PersistError> {
        self.0.borrow().keys()
    }

    fn load(&self, path: &NodePath) -> Result<Option<CommandProperties>, PersistError> {
        self.0.borrow().load(path)
    }

    fn save(&mut self, path: &NodePath, properties: &CommandProperties) -> Result<(), PersistError> {
        self.0.borrow_mut().save(path, properties)
    }
}

#[derive(Clone, Default)]
pub struct RecordingHost(pub Rc<RefCell<Vec<String>>>);

impl HostExecutor for RecordingHost {
    fn invoke(&self, command: &Macro) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.0.borrow_mut().push(command.script.clone());
        Ok(())
    }
}

pub struct JsonPayloads;

impl PayloadAdapter for JsonPayloads {
    fn try_extract_command(&self, payload: &ForeignPayload) -> Option<ExtractedCommand> {
        if payload.mime_type != "application/json" {
            return None;
        }
        let value: serde_json::Value = serde_json::from_slice(&payload.data).ok()?;
        Some(ExtractedCommand {
            script: value.get("script")?.as_str()?.to_owned(),
            tooltip: value
                .get("tooltip")
                .and_then(|t| t.as_str())
                .unwrap_or_default()
                .to_owned(),
            icon: None,
            id: None,
        })
    }
}

pub fn json_payload(script: &str) -> ForeignPayload {
    ForeignPayload {
        mime_type: "application/json".to_owned(),
        data: serde_json::json!({ "script": script }).to_string().into_bytes(),
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

pub struct Fixture {
    pub store: SharedStore,
    pub host: RecordingHost,
    pub menu: MenuCoordinator,
}

impl Fixture {
    /// Builds a menu over `seed`, given as `(path, properties)` pairs.
    pub fn new(seed: &[(&str, CommandProperties)]) -> Self {
        let store = SharedStore::default();
        for (path, props) in seed {
            store.seed(path, props.clone());
        }
        let host = RecordingHost::default();
        let ctx = MenuContext::new(
            Box::new(store.clone()),
            Box::new(host.clone()),
            Box::new(JsonPayloads),
        );
        let layout = MenuLayout {
            button_fade: Duration::ZERO,
            ring_fade: Duration::ZERO,
            ..Default::default()
        };
        let menu = MenuCoordinator::new(layout, ctx).unwrap();
        Self { store, host, menu }
    }

    pub fn at(&self, level: usize, slot: usize) -> Point {
        let g = self.menu.ring(level).unwrap().button(slot).unwrap().geometry();
        g.to_world(g.sector_center_point())
    }

    pub fn node(&self, level: usize, slot: usize) -> NodeId {
        self.menu
            .ring(level)
            .unwrap()
            .button(slot)
            .unwrap()
            .node()
            .unwrap()
    }

    pub fn invoked(&self) -> Vec<String> {
        self.host.0.borrow().clone()
    }
}
