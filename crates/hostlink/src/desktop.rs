use crate::icon::{self, IconName};
use derive_more::{AsRef, Deref, Display, From, Into};
use freedesktop_entry_parser::parse_entry;
use fs_err as fs;
use parking_lot::RwLock;
use rondel_core::ExtractedCommand;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct AppName(String);

rondel_core::impl_string_newtype!(AppName);

/// File name of a desktop entry, e.g. `org.gnome.Nautilus.desktop`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct DesktopId(String);

rondel_core::impl_string_newtype!(DesktopId);

#[derive(Debug, Clone)]
pub struct AppInfo {
    pub id: DesktopId,
    pub name: AppName,
    pub icon: PathBuf,
    pub exec: String,
}

impl AppInfo {
    /// The command this application contributes when dropped on the menu.
    pub fn to_command(&self) -> ExtractedCommand {
        ExtractedCommand {
            script: self.exec.clone(),
            tooltip: self.name.to_string(),
            icon: (!self.icon.as_os_str().is_empty())
                .then(|| icon::read_icon(&self.icon))
                .flatten(),
            id: Some(self.id.trim_end_matches(".desktop").to_string()),
        }
    }
}

static ENTRIES: OnceLock<RwLock<Vec<AppInfo>>> = OnceLock::new();

pub fn refresh_cache() {
    let apps = scan_entries();
    let lock = ENTRIES.get_or_init(|| RwLock::new(Vec::new()));
    *lock.write() = apps;
}

fn get_all_entries() -> Vec<AppInfo> {
    let lock = ENTRIES.get_or_init(|| RwLock::new(scan_entries()));
    lock.read().clone()
}

fn get_desktop_directories() -> Vec<PathBuf> {
    let xdg = xdg::BaseDirectories::new();
    let mut dirs = Vec::new();

    if let Some(home) = xdg.get_data_home() {
        dirs.push(home.join("applications"));
    }

    dirs.extend(
        xdg.get_data_dirs()
            .into_iter()
            .map(|p| p.join("applications")),
    );
    dirs
}

/// Later directories lose to earlier ones, so user entries shadow system ones.
fn collect_desktop_files() -> Vec<PathBuf> {
    let mut entries = HashMap::new();

    for dir in get_desktop_directories().iter().rev() {
        if let Ok(read_dir) = fs::read_dir(dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if is_desktop_file(&path)
                    && let Some(id) = path.file_name().and_then(|s| s.to_str())
                {
                    entries.insert(id.to_string(), path);
                }
            }
        }
    }
    entries.into_values().collect()
}

pub fn is_desktop_file(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()) == Some("desktop")
}

pub fn scan_entries() -> Vec<AppInfo> {
    collect_desktop_files()
        .into_iter()
        .filter_map(|path| parse_desktop_file(&path))
        .collect()
}

pub fn parse_desktop_file(path: &Path) -> Option<AppInfo> {
    let entry = parse_entry(path).ok()?;
    let section = entry.section("Desktop Entry")?;

    let entry_type = section.attr("Type").first()?;
    if entry_type != "Application" {
        return None;
    }

    if let Some(no_display) = section.attr("NoDisplay").first()
        && no_display == "true"
    {
        return None;
    }

    let name = section.attr("Name").first()?.to_string();

    let icon_path = match section.attr("Icon").first() {
        Some(icon) => icon::find_icon_path(&IconName::new(icon.to_string()))
            .unwrap_or_else(|| PathBuf::from(icon)),
        None => PathBuf::new(),
    };

    let exec = strip_field_codes(section.attr("Exec").first()?);
    let id = path.file_name()?.to_str()?;

    Some(AppInfo {
        id: DesktopId::new(id),
        name: AppName::new(name),
        icon: icon_path,
        exec,
    })
}

fn strip_field_codes(exec: &str) -> String {
    shell_words::split(exec)
        .map(|args| {
            let clean_args: Vec<_> = args
                .into_iter()
                .filter(|arg| !arg.starts_with('%'))
                .collect();
            shell_words::join(clean_args)
        })
        .unwrap_or_else(|_| exec.to_string())
}

/// Looks an installed application up by desktop id, name, or id stem.
pub fn find_desktop_entry(query: &str) -> Option<AppInfo> {
    find_desktop_entry_in_list(query, &get_all_entries())
}

pub fn find_desktop_entry_in_list(query: &str, entries: &[AppInfo]) -> Option<AppInfo> {
    let lower_query = query.to_lowercase();
    let stem = lower_query.trim_end_matches(".desktop");
    entries
        .iter()
        .find(|app| {
            app.id.to_lowercase().trim_end_matches(".desktop") == stem
                || app.name.to_lowercase() == lower_query
        })
        .cloned()
}
