use crate::error::MenuError;
use cairo::{Antialias, Context, Format, ImageSurface};
use palette::Srgba;
use std::fmt;

pub const DEFAULT_SECTOR_COUNT: usize = 8;
pub const DEFAULT_MASK_GAP: f64 = 2.0;

const IMAGE_PADDING: f64 = 3.0;
const OUTLINE_WIDTH: f64 = 1.0;
const CARDINAL_ANGLES: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point at `radius` from `self`, `degrees` clockwise from the positive x axis.
    pub fn polar(self, radius: f64, degrees: f64) -> Self {
        let rad = degrees.to_radians();
        Self::new(self.x + radius * rad.cos(), self.y + radius * rad.sin())
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.y >= self.y && p.x < self.x + self.width && p.y < self.y + self.height
    }
}

/// Shape parameters of one concentric ring. Angles are in degrees and grow
/// clockwise on screen, the same way cairo sweeps arcs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingConfig {
    pub level: usize,
    pub inner_radius: f64,
    pub thickness: f64,
    pub start_angle: f64,
    pub sector_count: usize,
    pub mask_gap: f64,
}

impl RingConfig {
    pub fn new(level: usize, inner_radius: f64, thickness: f64, start_angle: f64) -> Self {
        Self {
            level,
            inner_radius,
            thickness,
            start_angle,
            sector_count: DEFAULT_SECTOR_COUNT,
            mask_gap: DEFAULT_MASK_GAP,
        }
    }

    pub fn outer_radius(&self) -> f64 {
        self.inner_radius + self.thickness
    }

    pub fn sweep_angle(&self) -> f64 {
        360.0 / self.sector_count as f64
    }

    pub fn sector_start(&self, index: usize) -> f64 {
        (self.start_angle + index as f64 * self.sweep_angle()).rem_euclid(360.0)
    }

    pub fn validate(&self) -> Result<(), MenuError> {
        let reason = if self.sector_count == 0 {
            Some("ring needs at least one sector")
        } else if !(self.thickness.is_finite() && self.thickness > 0.0) {
            Some("thickness must be positive")
        } else if !(self.inner_radius.is_finite() && self.inner_radius >= 0.0) {
            Some("inner radius must not be negative")
        } else if !(self.mask_gap.is_finite() && self.mask_gap >= 0.0) {
            Some("mask gap must not be negative")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(MenuError::InvalidRing {
                level: self.level,
                reason,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateColors {
    pub fill: Srgba<f64>,
    pub stroke: Srgba<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorTheme {
    pub default: StateColors,
    pub hover: StateColors,
    pub selected: StateColors,
    pub disabled: StateColors,
}

fn rgb(r: u8, g: u8, b: u8) -> Srgba<f64> {
    Srgba::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0, 1.0)
}

impl Default for SectorTheme {
    fn default() -> Self {
        let beige = rgb(245, 245, 220);
        Self {
            default: StateColors {
                fill: rgb(169, 169, 169),
                stroke: beige,
            },
            hover: StateColors {
                fill: rgb(211, 211, 211),
                stroke: beige,
            },
            selected: StateColors {
                fill: rgb(245, 245, 245),
                stroke: beige,
            },
            disabled: StateColors {
                fill: rgb(112, 128, 144),
                stroke: rgb(211, 211, 211),
            },
        }
    }
}

/// Pre-rendered sector images, one per visual state.
#[derive(Clone)]
pub struct SectorImages {
    pub default: ImageSurface,
    pub hover: ImageSurface,
    pub selected: ImageSurface,
    pub disabled: ImageSurface,
}

/// Opaque-pixel map of the inset sector shape, in local coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMask {
    width: usize,
    height: usize,
    alpha: Vec<u8>,
}

impl HitMask {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, local: Point) -> bool {
        if !(local.x >= 0.0 && local.y >= 0.0) {
            return false;
        }
        let (x, y) = (local.x.floor() as usize, local.y.floor() as usize);
        if x >= self.width || y >= self.height {
            return false;
        }
        self.alpha[y * self.width + x] != 0
    }

    fn from_surface(mut surface: ImageSurface) -> Result<Self, MenuError> {
        surface.flush();
        let width = surface.width().max(0) as usize;
        let height = surface.height().max(0) as usize;
        let stride = surface.stride().max(0) as usize;
        let data = surface.data()?;
        let mut alpha = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = &data[y * stride..];
            for x in 0..width {
                let px = &row[x * 4..x * 4 + 4];
                // ARGB32 is a native-endian u32 with alpha in the high byte
                let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                alpha.push((argb >> 24) as u8);
            }
        }
        Ok(Self {
            width,
            height,
            alpha,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Annulus {
    center: Point,
    inner: f64,
    outer: f64,
    start: f64,
    end: f64,
}

impl Annulus {
    fn trace(&self, cr: &Context) {
        let c = self.center;
        cr.new_path();
        cr.arc(c.x, c.y, self.outer, self.start.to_radians(), self.end.to_radians());
        cr.arc_negative(c.x, c.y, self.inner, self.end.to_radians(), self.start.to_radians());
        cr.close_path();
    }

    /// Shrinks the outline by `gap` pixels on every side so neighbouring
    /// masks never share a pixel.
    fn inset(&self, gap: f64) -> InsetAnnulus {
        let inner = self.inner + gap;
        let outer = (self.outer - gap).max(inner);
        let half_sweep = (self.end - self.start) / 2.0;
        let shrink = |r: f64| {
            if r <= 0.0 || gap <= 0.0 {
                0.0
            } else {
                (gap / r).min(1.0).asin().to_degrees().min(half_sweep)
            }
        };
        InsetAnnulus {
            center: self.center,
            inner,
            outer,
            outer_span: (self.start + shrink(outer), self.end - shrink(outer)),
            inner_span: (self.start + shrink(inner), self.end - shrink(inner)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InsetAnnulus {
    center: Point,
    inner: f64,
    outer: f64,
    outer_span: (f64, f64),
    inner_span: (f64, f64),
}

impl InsetAnnulus {
    fn trace(&self, cr: &Context) {
        let c = self.center;
        cr.new_path();
        cr.arc(
            c.x,
            c.y,
            self.outer,
            self.outer_span.0.to_radians(),
            self.outer_span.1.to_radians(),
        );
        cr.arc_negative(
            c.x,
            c.y,
            self.inner,
            self.inner_span.1.to_radians(),
            self.inner_span.0.to_radians(),
        );
        cr.close_path();
    }
}

fn angle_within(angle: f64, start: f64, sweep: f64) -> bool {
    (angle - start).rem_euclid(360.0) <= sweep
}

fn sector_bounds(shape: &Annulus) -> Rect {
    let sweep = shape.end - shape.start;
    let mut points = vec![
        shape.center.polar(shape.inner, shape.start),
        shape.center.polar(shape.outer, shape.start),
        shape.center.polar(shape.inner, shape.end),
        shape.center.polar(shape.outer, shape.end),
    ];
    points.extend(
        CARDINAL_ANGLES
            .iter()
            .filter(|a| angle_within(**a, shape.start, sweep))
            .map(|a| shape.center.polar(shape.outer, *a)),
    );

    let (mut min_x, mut min_y) = (f64::MAX, f64::MAX);
    let (mut max_x, mut max_y) = (f64::MIN, f64::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let pad = IMAGE_PADDING / 2.0;
    let x = (min_x - pad).floor();
    let y = (min_y - pad).floor();
    Rect {
        x,
        y,
        width: (max_x + pad).ceil() - x,
        height: (max_y + pad).ceil() - y,
    }
}

fn render_state(bounds: &Rect, shape: &Annulus, colors: &StateColors) -> Result<ImageSurface, MenuError> {
    let surface = ImageSurface::create(Format::ARgb32, bounds.width as i32, bounds.height as i32)?;
    {
        let cr = Context::new(&surface)?;
        cr.translate(-bounds.x, -bounds.y);
        shape.trace(&cr);

        let (r, g, b, a) = colors.fill.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.fill_preserve()?;

        let (r, g, b, a) = colors.stroke.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.set_line_width(OUTLINE_WIDTH);
        cr.stroke()?;
    }
    surface.flush();
    Ok(surface)
}

fn render_mask(bounds: &Rect, shape: &InsetAnnulus) -> Result<HitMask, MenuError> {
    let surface = ImageSurface::create(Format::ARgb32, bounds.width as i32, bounds.height as i32)?;
    {
        let cr = Context::new(&surface)?;
        cr.set_antialias(Antialias::None);
        cr.translate(-bounds.x, -bounds.y);
        shape.trace(&cr);
        cr.set_source_rgba(0.0, 0.0, 1.0, 1.0);
        cr.fill()?;
    }
    HitMask::from_surface(surface)
}

/// One annular sector: its angles, bounding box, state images and hit mask.
///
/// Immutable once built. A layout change builds a replacement.
#[derive(Clone)]
pub struct SectorGeometry {
    center: Point,
    inner_radius: f64,
    thickness: f64,
    start_angle: f64,
    sweep_angle: f64,
    bounds: Rect,
    images: SectorImages,
    mask: HitMask,
}

impl fmt::Debug for SectorGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectorGeometry")
            .field("center", &self.center)
            .field("inner_radius", &self.inner_radius)
            .field("thickness", &self.thickness)
            .field("start_angle", &self.start_angle)
            .field("sweep_angle", &self.sweep_angle)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl SectorGeometry {
    pub fn build(
        center: Point,
        ring: &RingConfig,
        index: usize,
        theme: &SectorTheme,
    ) -> Result<Self, MenuError> {
        ring.validate()?;
        let start_angle = ring.sector_start(index);
        let sweep_angle = ring.sweep_angle();
        let shape = Annulus {
            center,
            inner: ring.inner_radius,
            outer: ring.outer_radius(),
            start: start_angle,
            end: start_angle + sweep_angle,
        };
        let bounds = sector_bounds(&shape);

        let images = SectorImages {
            default: render_state(&bounds, &shape, &theme.default)?,
            hover: render_state(&bounds, &shape, &theme.hover)?,
            selected: render_state(&bounds, &shape, &theme.selected)?,
            disabled: render_state(&bounds, &shape, &theme.disabled)?,
        };
        let mask = render_mask(&bounds, &shape.inset(ring.mask_gap))?;

        Ok(Self {
            center,
            inner_radius: ring.inner_radius,
            thickness: ring.thickness,
            start_angle,
            sweep_angle,
            bounds,
            images,
            mask,
        })
    }

    pub fn center(&self) -> Point {
        self.center
    }

    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn outer_radius(&self) -> f64 {
        self.inner_radius + self.thickness
    }

    pub fn start_angle(&self) -> f64 {
        self.start_angle
    }

    pub fn sweep_angle(&self) -> f64 {
        self.sweep_angle
    }

    pub fn end_angle(&self) -> f64 {
        self.start_angle + self.sweep_angle
    }

    /// World-space rectangle the sector images are laid out in.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn images(&self) -> &SectorImages {
        &self.images
    }

    pub fn mask(&self) -> &HitMask {
        &self.mask
    }

    pub fn to_local(&self, world: Point) -> Point {
        Point::new(world.x - self.bounds.x, world.y - self.bounds.y)
    }

    pub fn to_world(&self, local: Point) -> Point {
        Point::new(local.x + self.bounds.x, local.y + self.bounds.y)
    }

    /// Hit test against the inset mask. Coordinates are local to [`Self::bounds`].
    pub fn point_in_sector(&self, local: Point) -> bool {
        self.mask.contains(local)
    }

    pub fn contains_world(&self, world: Point) -> bool {
        self.bounds.contains(world) && self.point_in_sector(self.to_local(world))
    }

    /// Local point `angle_offset` degrees past the start angle and
    /// `radius_offset` pixels beyond the inner radius.
    pub fn point_at(&self, angle_offset: f64, radius_offset: f64) -> Point {
        let world = self
            .center
            .polar(self.inner_radius + radius_offset, self.start_angle + angle_offset);
        self.to_local(world)
    }

    /// Local point on the bisector halfway through the ring's thickness.
    pub fn sector_center_point(&self) -> Point {
        self.point_at(self.sweep_angle / 2.0, self.thickness / 2.0)
    }
}

pub fn build_ring_sectors(
    center: Point,
    ring: &RingConfig,
    theme: &SectorTheme,
) -> Result<Vec<SectorGeometry>, MenuError> {
    ring.validate()?;
    (0..ring.sector_count)
        .map(|index| SectorGeometry::build(center, ring, index, theme))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Point = Point::new(400.0, 400.0);

    fn level_one() -> RingConfig {
        RingConfig::new(1, 50.0, 60.0, 0.0)
    }

    fn build(ring: &RingConfig, index: usize) -> SectorGeometry {
        SectorGeometry::build(CENTER, ring, index, &SectorTheme::default()).unwrap()
    }

    #[test]
    fn test_sector_angles_tile_the_circle() {
        let ring = RingConfig::new(2, 118.0, 60.0, 22.5);
        let sectors = build_ring_sectors(CENTER, &ring, &SectorTheme::default()).unwrap();
        assert_eq!(sectors.len(), 8);
        for (i, sector) in sectors.iter().enumerate() {
            assert_eq!(sector.sweep_angle(), 45.0);
            assert_eq!(sector.start_angle(), (22.5 + i as f64 * 45.0) % 360.0);
        }
    }

    #[test]
    fn test_first_ring_starts_at_zero() {
        let sectors = build_ring_sectors(CENTER, &level_one(), &SectorTheme::default()).unwrap();
        assert_eq!(sectors[0].start_angle(), 0.0);
        assert_eq!(sectors[0].end_angle(), 45.0);
        assert_eq!(sectors[7].start_angle(), 315.0);
        assert_eq!(sectors[7].end_angle(), 360.0);
        for pair in sectors.windows(2) {
            assert_eq!(pair[1].start_angle(), pair[0].end_angle());
        }
        let total: f64 = sectors.iter().map(|s| s.sweep_angle()).sum();
        assert_eq!(total, 360.0);
    }

    #[test]
    fn test_start_angle_wraps() {
        let ring = RingConfig::new(1, 50.0, 60.0, 350.0);
        assert_eq!(ring.sector_start(1), 35.0);
        let ring = RingConfig::new(1, 50.0, 60.0, -45.0);
        assert_eq!(ring.sector_start(0), 315.0);
    }

    #[test]
    fn test_center_point_hits() {
        let ring = level_one();
        for index in 0..8 {
            let sector = build(&ring, index);
            let center = sector.sector_center_point();
            assert!(sector.point_in_sector(center), "sector {index} missed its center");
        }
    }

    #[test]
    fn test_points_outside_bounds_miss() {
        let sector = build(&level_one(), 0);
        let b = sector.bounds();
        assert!(!sector.point_in_sector(Point::new(-1.0, 5.0)));
        assert!(!sector.point_in_sector(Point::new(5.0, -0.5)));
        assert!(!sector.point_in_sector(Point::new(b.width + 1.0, 1.0)));
        assert!(!sector.point_in_sector(Point::new(1.0, b.height)));
    }

    #[test]
    fn test_gap_between_neighbours_misses() {
        let ring = level_one();
        let first = build(&ring, 0);
        let second = build(&ring, 1);
        // on the shared edge at mid thickness
        let edge = CENTER.polar(80.0, 45.0);
        assert!(!first.contains_world(edge));
        assert!(!second.contains_world(edge));
        // just inside the outer edge and the inner edge
        let outer = CENTER.polar(109.5, 22.5);
        let inner = CENTER.polar(50.5, 22.5);
        assert!(!first.contains_world(outer));
        assert!(!first.contains_world(inner));
    }

    #[test]
    fn test_masks_are_exclusive() {
        let ring = level_one();
        let sectors = build_ring_sectors(CENTER, &ring, &SectorTheme::default()).unwrap();
        for step in 0..360 {
            for radius in [55.0, 80.0, 105.0] {
                let p = CENTER.polar(radius, step as f64 + 0.5);
                let hits = sectors.iter().filter(|s| s.contains_world(p)).count();
                assert!(hits <= 1, "{hits} sectors claim angle {step} radius {radius}");
            }
        }
    }

    #[test]
    fn test_bounds_cover_outer_arc() {
        // sector 0 spans 0..45 degrees, reaching furthest right at angle 0
        let sector = build(&level_one(), 0);
        let b = sector.bounds();
        assert!(b.x + b.width >= CENTER.x + 110.0);
        // sector 2 spans 90..135 and includes the bottom cardinal point
        let sector = build(&level_one(), 2);
        let b = sector.bounds();
        assert!(b.y + b.height >= CENTER.y + 110.0);
        assert!(b.x + b.width <= CENTER.x + 2.0);
    }

    #[test]
    fn test_local_world_round_trip() {
        let sector = build(&level_one(), 3);
        let world = Point::new(321.0, 456.5);
        assert_eq!(sector.to_world(sector.to_local(world)), world);
    }

    #[test]
    fn test_point_at_lies_on_requested_radius() {
        let sector = build(&level_one(), 5);
        let p = sector.to_world(sector.point_at(sector.sweep_angle() / 2.0, 10.0));
        assert!((p.distance(CENTER) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_ring_rejected() {
        let mut ring = level_one();
        ring.sector_count = 0;
        assert!(matches!(
            ring.validate(),
            Err(MenuError::InvalidRing { level: 1, .. })
        ));
        let mut ring = level_one();
        ring.thickness = 0.0;
        assert!(ring.validate().is_err());
    }
}
