use directories::ProjectDirs;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use palette::Srgba;
use rondel_core::{DragModifier, MenuLayout, SectorTheme, StateColors};
use serde::Deserialize;
use serde_with::DeserializeFromStr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// `#rrggbb` or `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, DeserializeFromStr)]
pub struct HexColor(pub Srgba<f64>);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("'{0}' is not a #rrggbb or #rrggbbaa color")]
pub struct HexColorError(String);

impl FromStr for HexColor {
    type Err = HexColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || HexColorError(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(err)?;
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|_| err())
        };
        let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self(Srgba::new(channel(0)?, channel(2)?, channel(4)?, alpha)))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    pub inner_radius: f64,
    pub thickness: f64,
    pub ring_gap: f64,
    pub start_angle: f64,
    pub levels: usize,
    pub mask_gap: f64,
}

impl Default for MenuConfig {
    fn default() -> Self {
        let layout = MenuLayout::default();
        Self {
            inner_radius: layout.inner_radius,
            thickness: layout.thickness,
            ring_gap: layout.ring_gap,
            start_angle: layout.start_angle,
            levels: layout.levels,
            mask_gap: layout.mask_gap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub button_fade_ms: u64,
    pub ring_fade_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            button_fade_ms: 500,
            ring_fade_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub default_fill: Option<HexColor>,
    pub default_stroke: Option<HexColor>,
    pub hover_fill: Option<HexColor>,
    pub hover_stroke: Option<HexColor>,
    pub selected_fill: Option<HexColor>,
    pub selected_stroke: Option<HexColor>,
    pub disabled_fill: Option<HexColor>,
    pub disabled_stroke: Option<HexColor>,
}

fn override_colors(
    base: StateColors,
    fill: Option<HexColor>,
    stroke: Option<HexColor>,
) -> StateColors {
    StateColors {
        fill: fill.map_or(base.fill, |c| c.0),
        stroke: stroke.map_or(base.stroke, |c| c.0),
    }
}

impl ThemeConfig {
    /// Configured colors win over `base`.
    pub fn apply(&self, base: SectorTheme) -> SectorTheme {
        SectorTheme {
            default: override_colors(base.default, self.default_fill, self.default_stroke),
            hover: override_colors(base.hover, self.hover_fill, self.hover_stroke),
            selected: override_colors(base.selected, self.selected_fill, self.selected_stroke),
            disabled: override_colors(base.disabled, self.disabled_fill, self.disabled_stroke),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub drag_modifier: DragModifier,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub menu: MenuConfig,
    pub animation: AnimationConfig,
    pub theme: ThemeConfig,
    pub input: InputConfig,
}

impl Config {
    pub fn layout(&self, base_theme: SectorTheme) -> MenuLayout {
        MenuLayout {
            inner_radius: self.menu.inner_radius,
            thickness: self.menu.thickness,
            ring_gap: self.menu.ring_gap,
            start_angle: self.menu.start_angle,
            levels: self.menu.levels,
            mask_gap: self.menu.mask_gap,
            theme: self.theme.apply(base_theme),
            button_fade: Duration::from_millis(self.animation.button_fade_ms),
            ring_fade: Duration::from_millis(self.animation.ring_fade_ms),
            drag_modifier: self.input.drag_modifier,
        }
    }

    /// Like [`Config::layout`], but geometry that cannot form rings falls
    /// back to the defaults.
    pub fn checked_layout(&self, base_theme: SectorTheme) -> MenuLayout {
        let layout = self.layout(base_theme);
        match layout.ring_configs().iter().try_for_each(|c| c.validate()) {
            Ok(()) => layout,
            Err(e) => {
                log::warn!("Ignoring [menu] geometry: {}", e);
                let menu = MenuConfig::default();
                MenuLayout {
                    inner_radius: menu.inner_radius,
                    thickness: menu.thickness,
                    ring_gap: menu.ring_gap,
                    start_angle: menu.start_angle,
                    levels: menu.levels,
                    mask_gap: menu.mask_gap,
                    ..layout
                }
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine config directory")]
    ConfigDirNotFound,
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

pub fn get_config_path() -> Result<std::path::PathBuf, ConfigError> {
    let proj_dirs =
        ProjectDirs::from("org", "rondel", "rondel").ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix("RONDEL")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

pub fn load_config() -> Result<Config, ConfigError> {
    let config_path = get_config_path()?;

    let s = config::Config::builder()
        .add_source(config::File::from(config_path).required(false))
        .add_source(env_source())
        .build()?;

    Ok(s.try_deserialize()?)
}

/// Falls back to the built-in defaults when the file is unreadable.
pub fn load_or_default() -> Config {
    match load_config() {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Using default configuration: {}", e);
            Config::default()
        }
    }
}

pub fn write_default_config() -> std::io::Result<std::path::PathBuf> {
    let path =
        get_config_path().map_err(|e| std::io::Error::new(std::io::ErrorKind::NotFound, e))?;
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    if !path.exists() {
        fs_err::write(&path, DEFAULT_CONFIG)?;
    }
    Ok(path)
}

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

use crate::events::AppEvent;
use async_channel::Sender;

pub async fn run_async_watcher(tx: Sender<AppEvent>) {
    let config_path = match get_config_path() {
        Ok(p) => p,
        Err(e) => {
            log::error!("Config watcher error: {}", e);
            return;
        }
    };
    let config_dir = match config_path.parent() {
        Some(p) => p.to_path_buf(),
        None => return,
    };

    if let Err(e) = fs_err::create_dir_all(&config_dir) {
        log::error!("Failed to create config directory for watching: {}", e);
        return;
    }

    let (bridge_tx, bridge_rx) = async_channel::unbounded();

    let mut watcher = match RecommendedWatcher::new(
        move |res| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            log::error!("Failed to create watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&config_dir, RecursiveMode::NonRecursive) {
        log::error!("Failed to watch config directory: {}", e);
        return;
    }

    while let Ok(res) = bridge_rx.recv().await {
        match res {
            Ok(event) => {
                let meaningful_event = matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                );

                if meaningful_event
                    && event.paths.iter().any(|p| p == &config_path)
                    && tx.send(AppEvent::ConfigReload).await.is_err()
                {
                    break;
                }
            }
            Err(e) => log::error!("Watch error: {}", e),
        }
    }
}
