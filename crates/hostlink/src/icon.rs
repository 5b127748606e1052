use derive_more::{AsRef, Deref, Display, From, Into};
use freedesktop_icons::lookup;
use fs_err as fs;
use rondel_core::IconData;
use std::path::{Path, PathBuf};

const ICON_SIZE: u16 = 128;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct IconName(String);

rondel_core::impl_string_newtype!(IconName);

/// Resolves a themed icon name, or passes an existing absolute path through.
pub fn find_icon_path(icon_name: &IconName) -> Option<PathBuf> {
    if icon_name.is_empty() {
        return None;
    }

    let path = Path::new(icon_name.as_ref());
    if path.is_absolute() && path.exists() {
        return Some(path.to_path_buf());
    }

    lookup(icon_name.as_ref())
        .with_size(ICON_SIZE)
        .with_scale(1)
        .find()
}

/// Reads an icon file into memory. Missing or unreadable files yield `None`.
pub fn read_icon(path: &Path) -> Option<IconData> {
    match fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Some(IconData::from(bytes)),
        Ok(_) => None,
        Err(e) => {
            log::debug!("No icon at {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_icon(icon_name: &IconName) -> Option<IconData> {
    find_icon_path(icon_name).and_then(|p| read_icon(&p))
}
