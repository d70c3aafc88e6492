//! The shield artwork, drawn once at base resolution.
//!
//! Positions are fractions of the edge length. Stroke widths, insets and blur
//! radii are tuned for a 1024px canvas and scaled linearly for other sizes.

use crate::layer::{self, composite, AlphaMask, Layer};
use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};
use tiny_skia::{Point, Rect};

/// Edge length the pixel measurements below are tuned for.
const REFERENCE_SIZE: f32 = 1024.0;

const GRADIENT_TOP: Rgba<u8> = Rgba([44, 130, 255, 255]);
const GRADIENT_BOTTOM: Rgba<u8> = Rgba([11, 24, 61, 255]);
const CORNER_RADIUS: f32 = 0.24;

const BORDER_COLOR: Rgba<u8> = Rgba([255, 255, 255, 90]);
const BORDER_INSET: f32 = 12.0;
const BORDER_WIDTH: f32 = 14.0;

const GLOW_COLOR: Rgba<u8> = Rgba([255, 255, 255, 80]);
/// left, top, right, bottom; the top sits above the canvas
const GLOW_BOUNDS: [f32; 4] = [0.08, -0.35, 0.92, 0.45];
const GLOW_BLUR: f32 = 28.0;

const SHIELD_BODY: [(f32, f32); 6] = [
    (0.50, 0.16),
    (0.76, 0.26),
    (0.74, 0.58),
    (0.50, 0.84),
    (0.26, 0.58),
    (0.24, 0.26),
];
const SHIELD_FILL: Rgba<u8> = Rgba([244, 248, 255, 255]);
const SHIELD_OUTLINE: Rgba<u8> = Rgba([210, 225, 250, 255]);
const SHIELD_OUTLINE_WIDTH: f32 = 14.0;

const SHIELD_INSET: [(f32, f32); 6] = [
    (0.50, 0.21),
    (0.70, 0.29),
    (0.68, 0.55),
    (0.50, 0.75),
    (0.32, 0.55),
    (0.30, 0.29),
];
const SHIELD_INSET_FILL: Rgba<u8> = Rgba([219, 234, 255, 220]);

const CHECK_MARK: [(f32, f32); 3] = [(0.37, 0.47), (0.47, 0.57), (0.63, 0.41)];
const CHECK_COLOR: Rgba<u8> = Rgba([18, 88, 219, 255]);
const CHECK_WIDTH: f32 = 50.0;

const BADGE_CENTER: (f32, f32) = (0.76, 0.74);
const BADGE_RADIUS: f32 = 0.14;
const BADGE_FILL: Rgba<u8> = Rgba([230, 51, 66, 255]);
const BADGE_RING: Rgba<u8> = Rgba([255, 255, 255, 245]);
const BADGE_RING_WIDTH: f32 = 22.0;
const BADGE_BAR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BADGE_BAR_WIDTH: f32 = 32.0;
/// How far the bar's ends reach along each axis, as a fraction of the radius.
const BADGE_BAR_REACH: f32 = 0.62;
const BADGE_BLUR: f32 = 0.2;

/// Maps the artwork's relative coordinates onto a canvas of a given size.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    edge: u32,
    size: f32,
}

impl Geometry {
    fn new(edge: u32) -> Self {
        Self {
            edge,
            size: edge as f32,
        }
    }

    fn at(&self, (x, y): (f32, f32)) -> Point {
        Point::from_xy(x * self.size, y * self.size)
    }

    fn points(&self, relative: &[(f32, f32)]) -> Vec<Point> {
        relative.iter().map(|&point| self.at(point)).collect()
    }

    /// Scale a measurement given in reference-canvas pixels.
    fn px(&self, reference: f32) -> f32 {
        reference * self.size / REFERENCE_SIZE
    }

    fn corner_radius(&self) -> f32 {
        (self.size * CORNER_RADIUS).floor()
    }
}

/// Draw the complete icon on a `size` x `size` canvas.
///
/// The background gradient is clipped to a rounded square, then the border,
/// glow, shield and badge layers are composited over it in that order.
pub fn generate_master_icon(size: u32) -> Result<RgbaImage> {
    if size < 2 {
        bail!("Base size must be at least 2 pixels, got {size}");
    }

    let geo = Geometry::new(size);
    let mut img = RgbaImage::new(size, size);

    fill_vertical_gradient(&mut img, GRADIENT_TOP, GRADIENT_BOTTOM);
    clip_rounded_corners(&mut img, &geo)?;

    composite(&mut img, &draw_border(&geo)?);
    composite(&mut img, &draw_glow(&geo)?);
    composite(&mut img, &draw_shield(&geo)?);
    composite(&mut img, &draw_badge(&geo)?);

    Ok(img)
}

/// Paint each row with the color interpolated between `top` and `bottom`.
pub(crate) fn fill_vertical_gradient(img: &mut RgbaImage, top: Rgba<u8>, bottom: Rgba<u8>) {
    let last_row = img.height().saturating_sub(1).max(1) as f32;

    for (y, row) in img.enumerate_rows_mut() {
        let color = blend(top, bottom, y as f32 / last_row);
        for (_, _, pixel) in row {
            *pixel = color;
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t) as u8
}

fn blend(from: Rgba<u8>, to: Rgba<u8>, t: f32) -> Rgba<u8> {
    Rgba([
        lerp(from[0], to[0], t),
        lerp(from[1], to[1], t),
        lerp(from[2], to[2], t),
        lerp(from[3], to[3], t),
    ])
}

fn clip_rounded_corners(img: &mut RgbaImage, geo: &Geometry) -> Result<()> {
    let bounds = Rect::from_ltrb(0.0, 0.0, geo.size, geo.size).context("Canvas has no area")?;

    let mut mask = AlphaMask::new(geo.edge)?;
    mask.fill(&layer::rounded_rect(bounds, geo.corner_radius())?);
    mask.apply_to(img)
}

fn draw_border(geo: &Geometry) -> Result<RgbaImage> {
    let mut border = Layer::new(geo.edge)?;

    // The stroke is centered on the path, so pull the path in by half its
    // width to keep the outer edge at the inset.
    let width = geo.px(BORDER_WIDTH);
    let near = geo.px(BORDER_INSET) + width / 2.0;
    let far = geo.size - near;
    let rect = Rect::from_ltrb(near, near, far, far).context("Border does not fit the canvas")?;
    let path = layer::rounded_rect(rect, geo.corner_radius() - width / 2.0)?;

    border.stroke(&path, &layer::solid(BORDER_COLOR), width);
    border.into_image()
}

fn draw_glow(geo: &Geometry) -> Result<RgbaImage> {
    let mut glow = Layer::new(geo.edge)?;

    let [left, top, right, bottom] = GLOW_BOUNDS.map(|v| v * geo.size);
    let bounds = Rect::from_ltrb(left, top, right, bottom).context("Glow has no area")?;
    glow.fill(&layer::oval(bounds)?, &layer::solid(GLOW_COLOR));

    glow.into_blurred_image(geo.px(GLOW_BLUR))
}

fn draw_shield(geo: &Geometry) -> Result<RgbaImage> {
    let mut shield = Layer::new(geo.edge)?;

    let body = geo.points(&SHIELD_BODY);
    shield.fill(&layer::polygon(&body)?, &layer::solid(SHIELD_FILL));
    shield.stroke(
        &layer::polyline(&layer::closed_outline(&body))?,
        &layer::solid(SHIELD_OUTLINE),
        geo.px(SHIELD_OUTLINE_WIDTH),
    );

    // The inset keeps its own translucency instead of blending onto the body.
    let inset = geo.points(&SHIELD_INSET);
    shield.fill(
        &layer::polygon(&inset)?,
        &layer::replacing(SHIELD_INSET_FILL),
    );

    let check = geo.points(&CHECK_MARK);
    shield.stroke(
        &layer::polyline(&check)?,
        &layer::solid(CHECK_COLOR),
        geo.px(CHECK_WIDTH),
    );

    shield.into_image()
}

fn draw_badge(geo: &Geometry) -> Result<RgbaImage> {
    let mut badge = Layer::new(geo.edge)?;

    let center = geo.at(BADGE_CENTER);
    let radius = BADGE_RADIUS * geo.size;
    badge.fill(&layer::circle(center, radius)?, &layer::solid(BADGE_FILL));

    let ring_width = geo.px(BADGE_RING_WIDTH);
    badge.stroke(
        &layer::circle(center, radius - ring_width / 2.0)?,
        &layer::solid(BADGE_RING),
        ring_width,
    );

    let reach = radius * BADGE_BAR_REACH;
    let bar = [
        Point::from_xy(center.x - reach, center.y + reach),
        Point::from_xy(center.x + reach, center.y - reach),
    ];
    badge.stroke(
        &layer::polyline(&bar)?,
        &layer::solid(BADGE_BAR),
        geo.px(BADGE_BAR_WIDTH),
    );

    badge.into_blurred_image(geo.px(BADGE_BLUR))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SIZE: u32 = 256;

    fn pixel_at(img: &RgbaImage, (x, y): (f32, f32)) -> Rgba<u8> {
        let size = img.width() as f32;
        *img.get_pixel((x * size) as u32, (y * size) as u32)
    }

    #[test]
    fn test_gradient_runs_from_top_to_bottom_color() {
        let mut img = RgbaImage::new(8, 64);
        fill_vertical_gradient(&mut img, GRADIENT_TOP, GRADIENT_BOTTOM);

        assert_eq!(*img.get_pixel(0, 0), GRADIENT_TOP);
        assert_eq!(*img.get_pixel(7, 0), GRADIENT_TOP);
        assert_eq!(*img.get_pixel(3, 63), GRADIENT_BOTTOM);

        // every row is uniform and the colors only darken going down
        let mut previous = GRADIENT_TOP;
        for y in 0..64 {
            let first = *img.get_pixel(0, y);
            assert!(img.rows().nth(y as usize).unwrap().all(|p| *p == first));
            assert!(first[0] <= previous[0] && first[1] <= previous[1] && first[2] <= previous[2]);
            assert_eq!(first[3], 255);
            previous = first;
        }
    }

    #[test]
    fn test_gradient_truncates_interpolated_channels() {
        // t = 1/2 on the 3-row canvas: 44 + (11 - 44) / 2 = 27.5
        let mut img = RgbaImage::new(1, 3);
        fill_vertical_gradient(&mut img, GRADIENT_TOP, GRADIENT_BOTTOM);

        assert_eq!(*img.get_pixel(0, 1), Rgba([27, 77, 158, 255]));
    }

    #[test]
    fn test_rejects_tiny_canvas() {
        assert!(generate_master_icon(0).is_err());
        assert!(generate_master_icon(1).is_err());
    }

    #[test]
    fn test_corners_clipped_and_center_opaque() {
        let img = generate_master_icon(TEST_SIZE).unwrap();
        assert_eq!(img.dimensions(), (TEST_SIZE, TEST_SIZE));

        let last = TEST_SIZE - 1;
        for (x, y) in [(0, 0), (last, 0), (0, last), (last, last)] {
            assert_eq!(img.get_pixel(x, y)[3], 0, "corner ({x}, {y})");
        }
        assert_eq!(img.get_pixel(TEST_SIZE / 2, TEST_SIZE / 2)[3], 255);
        // edges between the corners stay inside the rounded square
        assert_eq!(img.get_pixel(TEST_SIZE / 2, 1)[3], 255);
        assert_eq!(img.get_pixel(1, TEST_SIZE / 2)[3], 255);
    }

    #[test]
    fn test_shield_body_is_near_white() {
        let img = generate_master_icon(TEST_SIZE).unwrap();
        let body = pixel_at(&img, (0.50, 0.185));

        assert_eq!(body[3], 255);
        assert!(body.0[..3].iter().all(|&c| c >= 230), "body was {:?}", body);
    }

    #[test]
    fn test_check_mark_is_blue() {
        let img = generate_master_icon(TEST_SIZE).unwrap();
        let check = pixel_at(&img, CHECK_MARK[1]);

        assert_eq!(check, CHECK_COLOR);
    }

    #[test]
    fn test_badge_is_red_with_white_bar() {
        let img = generate_master_icon(TEST_SIZE).unwrap();
        let (cx, cy) = BADGE_CENTER;

        // off the bar, inside the ring
        let offset = BADGE_RADIUS * 0.4;
        let red = pixel_at(&img, (cx - offset, cy - offset));
        assert!(red[0] > 200 && red[1] < 80 && red[2] < 100, "badge was {:?}", red);
        assert_eq!(red[3], 255);

        // the bar crosses the center
        let bar = pixel_at(&img, BADGE_CENTER);
        assert!(bar.0[..3].iter().all(|&c| c >= 240), "bar was {:?}", bar);
    }

    #[test]
    fn test_inset_lets_background_through() {
        let img = generate_master_icon(TEST_SIZE).unwrap();
        let body = pixel_at(&img, (0.50, 0.185));
        let inset = pixel_at(&img, (0.50, 0.30));

        // the translucent inset picks up some of the blue gradient
        assert_eq!(inset[3], 255);
        assert!(inset[0] < body[0], "inset {:?} vs body {:?}", inset, body);
        assert!(inset[2] >= 240);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let first = generate_master_icon(64).unwrap();
        let second = generate_master_icon(64).unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }
}
