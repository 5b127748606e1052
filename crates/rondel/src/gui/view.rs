use crate::gui::theme::ThemeColors;
use cairo::Context;
use gdk_pixbuf::{Pixbuf, PixbufLoader};
use gdk4::prelude::*;
use palette::Srgba;
use rondel_core::animation::Fade;
use rondel_core::{IconData, MenuButton, MenuCoordinator, Point};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Instant;

const ICON_FILL: f64 = 0.5;
const DISABLED_ICON_ALPHA: f64 = 0.4;
const GLYPH_SIZE: f64 = 6.0;
const TRIGGER_FONT_SIZE: f64 = 11.0;
const LABEL_FONT_SIZE: f64 = 14.0;
const BADGE_RADIUS: f64 = 4.0;
const TOOLTIP_PADDING: f64 = 6.0;

/// Decoded icons, keyed by their encoded bytes.
#[derive(Default)]
pub struct IconCache {
    pixbufs: HashMap<IconData, Option<Pixbuf>>,
}

impl IconCache {
    pub fn get(&mut self, icon: &IconData) -> Option<Pixbuf> {
        self.pixbufs
            .entry(icon.clone())
            .or_insert_with(|| decode_icon(icon))
            .clone()
    }

    pub fn clear(&mut self) {
        self.pixbufs.clear();
    }
}

fn decode_icon(icon: &IconData) -> Option<Pixbuf> {
    let loader = PixbufLoader::new();
    let decoded = loader
        .write(icon.as_bytes())
        .and_then(|_| loader.close())
        .map(|_| loader.pixbuf());
    match decoded {
        Ok(pixbuf) => pixbuf,
        Err(e) => {
            log::warn!("Failed to decode {:?}: {}", icon, e);
            None
        }
    }
}

fn set_color(cr: &Context, color: Srgba<f64>, alpha: f64) {
    let (r, g, b, a) = color.into_components();
    cr.set_source_rgba(r, g, b, a * alpha);
}

struct ButtonPainter<'a> {
    button: &'a MenuButton,
    opacity: f64,
    now: Instant,
}

impl<'a> ButtonPainter<'a> {
    fn new(button: &'a MenuButton, opacity: f64, now: Instant) -> Self {
        Self {
            button,
            opacity,
            now,
        }
    }

    fn draw(
        &self,
        cr: &Context,
        icons: &mut IconCache,
        colors: &ThemeColors,
    ) -> Result<(), cairo::Error> {
        self.draw_sector(cr)?;
        self.draw_content(cr, icons, colors)?;
        self.draw_glyphs(cr, colors)
    }

    /// Cross-fades the four pre-rendered state images.
    fn draw_sector(&self, cr: &Context) -> Result<(), cairo::Error> {
        let geometry = self.button.geometry();
        let bounds = geometry.bounds();
        let images = geometry.images();
        let overlays = self.button.overlays();
        let layers: [(&cairo::ImageSurface, &Fade); 4] = [
            (&images.default, &overlays.default),
            (&images.hover, &overlays.hover),
            (&images.selected, &overlays.selected),
            (&images.disabled, &overlays.disabled),
        ];
        for (image, fade) in layers {
            let alpha = fade.sample(self.now) * self.opacity;
            if alpha <= f64::EPSILON {
                continue;
            }
            cr.set_source_surface(image, bounds.x, bounds.y)?;
            cr.paint_with_alpha(alpha)?;
        }
        Ok(())
    }

    fn content_alpha(&self) -> f64 {
        if self.button.is_enabled() {
            self.opacity
        } else {
            self.opacity * DISABLED_ICON_ALPHA
        }
    }

    fn draw_content(
        &self,
        cr: &Context,
        icons: &mut IconCache,
        colors: &ThemeColors,
    ) -> Result<(), cairo::Error> {
        let face = self.button.face();
        if let Some(pixbuf) = face.icon.as_ref().and_then(|i| icons.get(i)) {
            self.draw_icon(cr, &pixbuf, face.icon_center)
        } else if let Some(label) = self.short_label() {
            self.draw_text(cr, &label, face.icon_center, LABEL_FONT_SIZE, colors.text)
        } else {
            Ok(())
        }
    }

    fn short_label(&self) -> Option<String> {
        let props = self.button.properties();
        if !props.is_active {
            return None;
        }
        let label: String = props.left_macro.label().chars().take(3).collect();
        (!label.is_empty()).then_some(label)
    }

    fn draw_icon(&self, cr: &Context, pixbuf: &Pixbuf, center: Point) -> Result<(), cairo::Error> {
        let target = self.button.geometry().thickness() * ICON_FILL;
        let longest = pixbuf.width().max(pixbuf.height()).max(1) as f64;
        let icon_scale = target / longest;
        let (iw, ih) = (
            pixbuf.width() as f64 * icon_scale,
            pixbuf.height() as f64 * icon_scale,
        );

        cr.save()?;
        cr.translate(center.x - iw / 2.0, center.y - ih / 2.0);
        cr.scale(icon_scale, icon_scale);
        cr.set_source_pixbuf(pixbuf, 0.0, 0.0);
        cr.paint_with_alpha(self.content_alpha())?;
        cr.restore()
    }

    fn draw_text(
        &self,
        cr: &Context,
        text: &str,
        center: Point,
        size: f64,
        color: Srgba<f64>,
    ) -> Result<(), cairo::Error> {
        set_color(cr, color, self.content_alpha());
        cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Bold);
        cr.set_font_size(size);
        let ext = cr.text_extents(text)?;
        cr.move_to(
            center.x - ext.width() / 2.0 - ext.x_bearing(),
            center.y - ext.height() / 2.0 - ext.y_bearing(),
        );
        cr.show_text(text)
    }

    fn draw_glyphs(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let face = self.button.face();
        if let Some(at) = face.folder_glyph {
            self.draw_folder_glyph(cr, at, colors.glyph)?;
        }
        if let Some((letter, at)) = face.trigger {
            self.draw_text(cr, &letter.to_string(), at, TRIGGER_FONT_SIZE, colors.glyph)?;
        }
        let state = self.button.runtime_state();
        if state.edit_mode && state.visible {
            set_color(cr, colors.badge, self.opacity);
            cr.arc(face.edit_badge.x, face.edit_badge.y, BADGE_RADIUS, 0.0, 2.0 * PI);
            cr.fill()?;
        }
        Ok(())
    }

    /// Small triangle pointing away from the menu center.
    fn draw_folder_glyph(
        &self,
        cr: &Context,
        at: Point,
        color: Srgba<f64>,
    ) -> Result<(), cairo::Error> {
        let center = self.button.geometry().center();
        let angle = (at.y - center.y).atan2(at.x - center.x);
        let tip = Point::new(at.x + GLYPH_SIZE * angle.cos(), at.y + GLYPH_SIZE * angle.sin());
        let side = angle + PI / 2.0;
        let (dx, dy) = (GLYPH_SIZE * side.cos(), GLYPH_SIZE * side.sin());

        set_color(cr, color, self.content_alpha());
        cr.move_to(tip.x, tip.y);
        cr.line_to(at.x + dx, at.y + dy);
        cr.line_to(at.x - dx, at.y - dy);
        cr.close_path();
        cr.fill()
    }
}

/// Paints the menu with its center at `origin` plus the layout's center.
pub fn draw(
    cr: &Context,
    menu: &MenuCoordinator,
    origin: Point,
    icons: &mut IconCache,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let now = Instant::now();
    cr.save()?;
    cr.translate(origin.x, origin.y);

    let mut outer_edge = menu.layout().inner_radius;
    for ring in menu.rings() {
        let opacity = ring.opacity(now);
        if opacity <= f64::EPSILON {
            continue;
        }
        if ring.is_visible() {
            outer_edge = ring.config().outer_radius();
        }
        for button in ring.buttons() {
            ButtonPainter::new(button, opacity, now).draw(cr, icons, colors)?;
        }
    }

    draw_center_circle(cr, menu, colors)?;
    if let Some(tooltip) = menu.tooltip() {
        draw_tooltip(cr, menu, tooltip, outer_edge, colors)?;
    }
    cr.restore()
}

fn draw_center_circle(
    cr: &Context,
    menu: &MenuCoordinator,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let center = menu.layout().center();
    let color = if menu.is_edit_mode() {
        colors.center_edit
    } else {
        colors.center_circle
    };
    set_color(cr, color, 1.0);
    cr.arc(
        center.x,
        center.y,
        menu.layout().center_radius(),
        0.0,
        2.0 * PI,
    );
    cr.fill()
}

fn draw_tooltip(
    cr: &Context,
    menu: &MenuCoordinator,
    text: &str,
    outer_edge: f64,
    colors: &ThemeColors,
) -> Result<(), cairo::Error> {
    let center = menu.layout().center();
    cr.select_font_face("Sans", cairo::FontSlant::Normal, cairo::FontWeight::Normal);
    cr.set_font_size(LABEL_FONT_SIZE);
    let ext = cr.text_extents(text)?;

    let width = ext.width() + TOOLTIP_PADDING * 2.0;
    let height = ext.height() + TOOLTIP_PADDING * 2.0;
    let x = center.x - width / 2.0;
    let y = center.y + outer_edge + TOOLTIP_PADDING;

    set_color(cr, colors.tooltip_bg, 1.0);
    cr.rectangle(x, y, width, height);
    cr.fill()?;

    set_color(cr, colors.text, 1.0);
    cr.move_to(
        x + TOOLTIP_PADDING - ext.x_bearing(),
        y + TOOLTIP_PADDING - ext.y_bearing(),
    );
    cr.show_text(text)
}
