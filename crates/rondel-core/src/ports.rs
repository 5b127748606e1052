//! Seams to the host environment: persistence, command execution, and
//! decoding of foreign drag payloads.

use crate::error::PersistError;
use crate::model::{CommandProperties, IconData, Macro, NodePath};
use std::collections::BTreeMap;

pub trait CommandStore {
    /// Every path the store holds properties for.
    fn keys(&self) -> Result<Vec<NodePath>, PersistError>;
    fn load(&self, path: &NodePath) -> Result<Option<CommandProperties>, PersistError>;
    fn save(&mut self, path: &NodePath, properties: &CommandProperties) -> Result<(), PersistError>;
}

pub trait HostExecutor {
    fn invoke(&self, command: &Macro) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Payload of a drag that started outside the menu, as delivered by the
/// toolkit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignPayload {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl ForeignPayload {
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            mime_type: "text/plain".to_owned(),
            data: data.into().into_bytes(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedCommand {
    pub script: String,
    pub tooltip: String,
    pub icon: Option<IconData>,
    pub id: Option<String>,
}

pub trait PayloadAdapter {
    /// Recognises a payload as a command, or declines with `None`.
    fn try_extract_command(&self, payload: &ForeignPayload) -> Option<ExtractedCommand>;
}

/// Keeps everything in memory. Used when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<NodePath, CommandProperties>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: impl IntoIterator<Item = (NodePath, CommandProperties)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, path: &NodePath) -> Option<&CommandProperties> {
        self.entries.get(path)
    }
}

impl CommandStore for MemoryStore {
    fn keys(&self) -> Result<Vec<NodePath>, PersistError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn load(&self, path: &NodePath) -> Result<Option<CommandProperties>, PersistError> {
        Ok(self.entries.get(path).cloned())
    }

    fn save(&mut self, path: &NodePath, properties: &CommandProperties) -> Result<(), PersistError> {
        if properties.is_cleared() {
            self.entries.remove(path);
        } else {
            self.entries.insert(path.clone(), properties.clone());
        }
        Ok(())
    }
}

/// Ignores invocations. Useful for menus that only edit their layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExecutor;

impl HostExecutor for NoopExecutor {
    fn invoke(&self, command: &Macro) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        log::debug!("Ignoring invocation of '{}'", command.script);
        Ok(())
    }
}

/// Declines every foreign payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPayloads;

impl PayloadAdapter for NoPayloads {
    fn try_extract_command(&self, _payload: &ForeignPayload) -> Option<ExtractedCommand> {
        None
    }
}
