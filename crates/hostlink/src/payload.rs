use crate::desktop;
use crate::icon::{self, IconName};
use rondel_core::{ExtractedCommand, ForeignPayload, PayloadAdapter};
use serde::Deserialize;
use std::path::PathBuf;

/// `{"script": "...", "tooltip": "...", "icon": "name-or-path", "id": "..."}`
#[derive(Debug, Deserialize)]
struct JsonCommand {
    script: String,
    #[serde(default)]
    tooltip: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl JsonCommand {
    fn into_command(self) -> Option<ExtractedCommand> {
        if self.script.trim().is_empty() {
            return None;
        }
        Some(ExtractedCommand {
            script: self.script,
            tooltip: self.tooltip,
            icon: self
                .icon
                .and_then(|name| icon::load_icon(&IconName::new(name))),
            id: self.id,
        })
    }
}

/// Recognises commands dropped from other applications: JSON command
/// objects, desktop entry files, and installed desktop ids.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopPayloads;

impl DesktopPayloads {
    fn from_json(text: &str) -> Option<ExtractedCommand> {
        serde_json::from_str::<JsonCommand>(text)
            .ok()?
            .into_command()
    }

    fn from_desktop_reference(text: &str) -> Option<ExtractedCommand> {
        let line = text.lines().map(str::trim).find(|l| !l.is_empty() && !l.starts_with('#'))?;
        let path = file_uri_to_path(line).unwrap_or_else(|| PathBuf::from(line));
        if !desktop::is_desktop_file(&path) {
            return None;
        }
        let app = if path.is_absolute() {
            desktop::parse_desktop_file(&path)
        } else {
            desktop::find_desktop_entry(line)
        }?;
        Some(app.to_command())
    }
}

impl PayloadAdapter for DesktopPayloads {
    fn try_extract_command(&self, payload: &ForeignPayload) -> Option<ExtractedCommand> {
        let text = payload.as_text()?.trim();
        if text.is_empty() {
            return None;
        }
        let command = match payload.mime_type.as_str() {
            "application/json" => Self::from_json(text),
            "text/uri-list" => Self::from_desktop_reference(text),
            _ => Self::from_json(text).or_else(|| Self::from_desktop_reference(text)),
        };
        if command.is_none() {
            log::debug!("Ignoring {} payload of {} bytes", payload.mime_type, payload.data.len());
        }
        command
    }
}

/// Decodes a `file://` URI, including `%XX` escapes.
fn file_uri_to_path(uri: &str) -> Option<PathBuf> {
    let rest = uri.strip_prefix("file://")?;
    let rest = rest.strip_prefix("localhost").unwrap_or(rest);
    let mut bytes = Vec::with_capacity(rest.len());
    let mut iter = rest.bytes();
    while let Some(b) = iter.next() {
        if b == b'%' {
            let hi = iter.next()?;
            let lo = iter.next()?;
            let hex = [hi, lo];
            let decoded = u8::from_str_radix(std::str::from_utf8(&hex).ok()?, 16).ok()?;
            bytes.push(decoded);
        } else {
            bytes.push(b);
        }
    }
    String::from_utf8(bytes).ok().map(PathBuf::from)
}
