//! Command persistence as one TOML table per menu slot, with icon blobs kept
//! beside it in an `icons/` directory.
//!
//! ```toml
//! [commands."2/5"]
//! left = { script = "kitty", tooltip = "Terminal" }
//! folder = false
//! active = true
//! trigger = "K"
//! id = "3f0c9a2e-..."
//! ```

use crate::icon;
use directories::ProjectDirs;
use fs_err as fs;
use rondel_core::{CommandId, CommandProperties, CommandStore, Macro, NodePath, PersistError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

const COMMANDS_FILE: &str = "commands.toml";
const ICON_DIR: &str = "icons";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to determine data directory")]
    DataDirNotFound,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed command file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to encode commands: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Invalid command path '{0}'")]
    InvalidPath(String),
}

impl From<StoreError> for PersistError {
    fn from(e: StoreError) -> Self {
        PersistError::with_source("command store", e)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct StoredCommand {
    #[serde(skip_serializing_if = "Macro::is_empty")]
    left: Macro,
    #[serde(skip_serializing_if = "Macro::is_empty")]
    right: Macro,
    folder: bool,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    trigger: Option<char>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<CommandId>,
}

impl StoredCommand {
    fn from_properties(props: &CommandProperties) -> Self {
        Self {
            left: props.left_macro.clone(),
            right: props.right_macro.clone(),
            folder: props.is_folder,
            active: props.is_active,
            trigger: props.trigger,
            id: props.command_id.clone(),
        }
    }

    fn into_properties(self) -> CommandProperties {
        let mut props = CommandProperties {
            left_macro: self.left,
            right_macro: self.right,
            icon: None,
            is_folder: self.folder,
            is_active: self.active,
            trigger: None,
            command_id: self.id,
        };
        props.set_trigger(self.trigger);
        props
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CommandFile {
    #[serde(default)]
    commands: BTreeMap<String, StoredCommand>,
}

#[derive(Debug)]
pub struct TomlStore {
    root: PathBuf,
    commands: BTreeMap<String, StoredCommand>,
}

impl TomlStore {
    pub fn default_location() -> Result<PathBuf, StoreError> {
        let proj_dirs =
            ProjectDirs::from("org", "rondel", "rondel").ok_or(StoreError::DataDirNotFound)?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_location()?)
    }

    /// Reads `commands.toml` under `root`. A missing file is an empty store.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let path = root.join(COMMANDS_FILE);
        let commands = if path.exists() {
            let file: CommandFile = toml::from_str(&fs::read_to_string(&path)?)?;
            file.commands
        } else {
            BTreeMap::new()
        };
        log::debug!("Loaded {} commands from {}", commands.len(), path.display());
        Ok(Self { root, commands })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn icon_path(&self, path: &NodePath) -> PathBuf {
        self.root
            .join(ICON_DIR)
            .join(format!("{}.icon", path.join("_")))
    }

    fn flush(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let file = CommandFile {
            commands: self.commands.clone(),
        };
        let target = self.root.join(COMMANDS_FILE);
        let staging = target.with_extension("toml.tmp");
        fs::write(&staging, toml::to_string_pretty(&file)?)?;
        fs::rename(&staging, &target)?;
        Ok(())
    }

    fn write_icon(&self, path: &NodePath, props: &CommandProperties) -> Result<(), StoreError> {
        let icon_path = self.icon_path(path);
        match &props.icon {
            Some(icon) => {
                fs::create_dir_all(self.root.join(ICON_DIR))?;
                fs::write(&icon_path, icon.as_bytes())?;
            }
            None if icon_path.exists() => fs::remove_file(&icon_path)?,
            None => {}
        }
        Ok(())
    }

    fn read(&self, path: &NodePath) -> Option<CommandProperties> {
        let stored = self.commands.get(&path.to_string())?.clone();
        let mut props = stored.into_properties();
        props.icon = icon::read_icon(&self.icon_path(path));
        Some(props)
    }

    fn write(&mut self, path: &NodePath, props: &CommandProperties) -> Result<(), StoreError> {
        let key = path.to_string();
        if props.is_cleared() {
            self.commands.remove(&key);
        } else {
            self.commands
                .insert(key, StoredCommand::from_properties(props));
        }
        self.write_icon(path, props)?;
        self.flush()
    }
}

impl CommandStore for TomlStore {
    fn keys(&self) -> Result<Vec<NodePath>, PersistError> {
        self.commands
            .keys()
            .map(|k| {
                k.parse::<NodePath>()
                    .map_err(|_| PersistError::from(StoreError::InvalidPath(k.clone())))
            })
            .collect()
    }

    fn load(&self, path: &NodePath) -> Result<Option<CommandProperties>, PersistError> {
        Ok(self.read(path))
    }

    fn save(&mut self, path: &NodePath, properties: &CommandProperties) -> Result<(), PersistError> {
        self.write(path, properties)
            .map_err(|e| PersistError::with_source(format!("saving {path}"), e))
    }
}
