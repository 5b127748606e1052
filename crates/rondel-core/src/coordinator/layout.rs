use crate::animation::{BUTTON_FADE, RING_FADE};
use crate::button::Modifiers;
use crate::geometry::{DEFAULT_MASK_GAP, Point, RingConfig, SectorTheme};
use serde_with::DeserializeFromStr;
use std::time::Duration;
use strum::{Display, EnumIter, EnumString};

pub const MAX_LEVELS: usize = 3;
const MENU_MARGIN: f64 = 8.0;
const CENTER_BUTTON_INSET: f64 = 8.0;
const MIN_CENTER_RADIUS: f64 = 4.0;

/// Modifier that turns a primary press into a drag while editing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
    DeserializeFromStr,
)]
#[strum(ascii_case_insensitive)]
pub enum DragModifier {
    #[default]
    #[strum(serialize = "Control", serialize = "ctrl")]
    Control,
    Alt,
    Shift,
    #[strum(serialize = "Super", serialize = "logo", serialize = "meta")]
    Super,
}

impl DragModifier {
    pub fn is_held(self, mods: Modifiers) -> bool {
        match self {
            DragModifier::Control => mods.control,
            DragModifier::Alt => mods.alt,
            DragModifier::Shift => mods.shift,
            DragModifier::Super => mods.logo,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuLayout {
    pub inner_radius: f64,
    pub thickness: f64,
    pub ring_gap: f64,
    pub start_angle: f64,
    pub levels: usize,
    pub mask_gap: f64,
    pub theme: SectorTheme,
    pub button_fade: Duration,
    pub ring_fade: Duration,
    pub drag_modifier: DragModifier,
}

impl Default for MenuLayout {
    fn default() -> Self {
        Self {
            inner_radius: 50.0,
            thickness: 60.0,
            ring_gap: 8.0,
            start_angle: 0.0,
            levels: MAX_LEVELS,
            mask_gap: DEFAULT_MASK_GAP,
            theme: SectorTheme::default(),
            button_fade: BUTTON_FADE,
            ring_fade: RING_FADE,
            drag_modifier: DragModifier::default(),
        }
    }
}

impl MenuLayout {
    pub fn level_count(&self) -> usize {
        self.levels.clamp(1, MAX_LEVELS)
    }

    /// Ring `level` (1-based). Even levels are rotated by half a sector so
    /// their seams fall in the middle of the buttons below.
    pub fn ring_config(&self, level: usize) -> RingConfig {
        let steps = level.saturating_sub(1) as f64;
        let inner = self.inner_radius + steps * (self.thickness + self.ring_gap);
        let mut config = RingConfig::new(level, inner, self.thickness, self.start_angle);
        if level % 2 == 0 {
            config.start_angle += config.sweep_angle() / 2.0;
        }
        config.mask_gap = self.mask_gap;
        config
    }

    pub fn ring_configs(&self) -> Vec<RingConfig> {
        (1..=self.level_count()).map(|l| self.ring_config(l)).collect()
    }

    /// Side length of the square surface the whole menu fits in.
    pub fn menu_size(&self) -> f64 {
        let outer = self.ring_config(self.level_count()).outer_radius();
        ((outer + MENU_MARGIN) * 2.0).ceil()
    }

    pub fn center(&self) -> Point {
        let half = self.menu_size() / 2.0;
        Point::new(half, half)
    }

    pub fn center_radius(&self) -> f64 {
        (self.inner_radius - CENTER_BUTTON_INSET).max(MIN_CENTER_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ring_radii_stack_outward() {
        let layout = MenuLayout::default();
        let rings = layout.ring_configs();
        assert_eq!(rings.len(), 3);
        assert_eq!(rings[0].inner_radius, 50.0);
        assert_eq!(rings[1].inner_radius, 118.0);
        assert_eq!(rings[2].inner_radius, 186.0);
        for pair in rings.windows(2) {
            assert!(pair[1].inner_radius >= pair[0].outer_radius());
        }
    }

    #[test]
    fn test_even_levels_are_offset() {
        let layout = MenuLayout {
            start_angle: 10.0,
            ..Default::default()
        };
        assert_eq!(layout.ring_config(1).start_angle, 10.0);
        assert_eq!(layout.ring_config(2).start_angle, 32.5);
        assert_eq!(layout.ring_config(3).start_angle, 10.0);
    }

    #[test]
    fn test_level_count_is_clamped() {
        for (levels, expected) in [(0, 1), (1, 1), (3, 3), (9, MAX_LEVELS)] {
            let layout = MenuLayout {
                levels,
                ..Default::default()
            };
            assert_eq!(layout.level_count(), expected);
        }
    }

    #[test]
    fn test_menu_fits_outer_ring() {
        let layout = MenuLayout::default();
        let c = layout.center();
        assert_eq!(c.x, c.y);
        assert!(c.x >= 246.0);
    }

    #[test]
    fn test_drag_modifier_parsing() {
        let cases = [
            ("control", DragModifier::Control),
            ("CTRL", DragModifier::Control),
            ("alt", DragModifier::Alt),
            ("Shift", DragModifier::Shift),
            ("logo", DragModifier::Super),
        ];
        for (input, expected) in cases {
            assert_eq!(DragModifier::from_str(input).unwrap(), expected, "{input}");
        }
        assert!(DragModifier::from_str("hyper").is_err());
    }

    #[test]
    fn test_drag_modifier_held() {
        let mods = Modifiers {
            alt: true,
            ..Default::default()
        };
        assert!(DragModifier::Alt.is_held(mods));
        assert!(!DragModifier::Control.is_held(mods));
    }
}
