use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;
use rondel_core::{SectorTheme, StateColors};

/// Colors the view paints with outside of the pre-rendered sectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub center_circle: Srgba<f64>,
    pub center_edit: Srgba<f64>,
    pub text: Srgba<f64>,
    pub glyph: Srgba<f64>,
    pub badge: Srgba<f64>,
    pub tooltip_bg: Srgba<f64>,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            center_circle: Srgba::new(0.2, 0.2, 0.2, 0.6),
            center_edit: Srgba::new(0.8, 0.45, 0.1, 0.8),
            text: Srgba::new(1.0, 1.0, 1.0, 1.0),
            glyph: Srgba::new(0.1, 0.1, 0.1, 0.9),
            badge: Srgba::new(0.8, 0.45, 0.1, 0.9),
            tooltip_bg: Srgba::new(0.1, 0.1, 0.1, 0.85),
        }
    }
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        let fallback = Self::default();
        Self {
            center_circle: lookup_color(
                context,
                "theme_bg_color",
                fallback.center_circle,
                Some(0.6),
            ),
            center_edit: lookup_color(context, "warning_color", fallback.center_edit, Some(0.8)),
            text: lookup_color(context, "theme_fg_color", fallback.text, None),
            glyph: fallback.glyph,
            badge: lookup_color(context, "warning_color", fallback.badge, Some(0.9)),
            tooltip_bg: lookup_color(
                context,
                "theme_bg_color",
                fallback.tooltip_bg,
                Some(0.85),
            ),
        }
    }
}

/// Sector colors from the GTK theme, falling back to the engine's built-in
/// palette per color.
pub fn sector_theme_from_context(context: &gtk::StyleContext) -> SectorTheme {
    let base = SectorTheme::default();
    let stroke = |fallback| lookup_color(context, "borders", fallback, Some(0.8));
    SectorTheme {
        default: StateColors {
            fill: lookup_color(context, "theme_bg_color", base.default.fill, Some(0.85)),
            stroke: stroke(base.default.stroke),
        },
        hover: StateColors {
            fill: lookup_color(
                context,
                "theme_selected_bg_color",
                base.hover.fill,
                Some(0.6),
            ),
            stroke: stroke(base.hover.stroke),
        },
        selected: StateColors {
            fill: lookup_color(
                context,
                "theme_selected_bg_color",
                base.selected.fill,
                Some(0.95),
            ),
            stroke: stroke(base.selected.stroke),
        },
        disabled: StateColors {
            fill: lookup_color(
                context,
                "insensitive_bg_color",
                base.disabled.fill,
                Some(0.5),
            ),
            stroke: stroke(base.disabled.stroke),
        },
    }
}

fn lookup_color(
    context: &gtk::StyleContext,
    name: &str,
    fallback: Srgba<f64>,
    alpha_override: Option<f64>,
) -> Srgba<f64> {
    context
        .lookup_color(name)
        .map(|c| {
            let (r, g, b, a) = (
                c.red() as f64,
                c.green() as f64,
                c.blue() as f64,
                c.alpha() as f64,
            );
            Srgba::new(r, g, b, alpha_override.unwrap_or(a))
        })
        .unwrap_or(fallback)
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
.rondel-window, .rondel-drawing-area {
    background: none;
    background-color: transparent;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}
