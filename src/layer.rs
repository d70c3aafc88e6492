//! Drawing surfaces for the icon artwork.
//!
//! A [`Layer`] is a transparent RGBA surface backed by a `tiny_skia::Pixmap`.
//! Shapes are rasterized onto it with anti-aliasing, then the layer is turned
//! into an [`RgbaImage`] (optionally blurred) and merged onto the accumulating
//! composite with [`composite`]. An [`AlphaMask`] is the single-channel
//! counterpart used to cut the rounded corners out of the background.

use anyhow::{ensure, Context, Result};
use image::{DynamicImage, Rgba, RgbaImage};
use tiny_skia::{
    BlendMode, FillRule, LineCap, LineJoin, Mask, Paint, Path, PathBuilder, Pixmap, Point, Rect,
    Stroke, Transform,
};

/// Control point distance for a quarter circle drawn as one cubic: 4/3 * tan(π/8)
const KAPPA: f32 = 0.552_284_8;

/// A square, initially transparent drawing surface.
///
/// Pixels are kept premultiplied while drawing, which is what both the
/// rasterizer and the blur want. They are demultiplied on the way out.
pub struct Layer {
    pixmap: Pixmap,
}

impl Layer {
    pub fn new(size: u32) -> Result<Self> {
        let pixmap = Pixmap::new(size, size)
            .with_context(|| format!("Failed to allocate {size}x{size} layer"))?;
        Ok(Self { pixmap })
    }

    pub fn size(&self) -> u32 {
        self.pixmap.width()
    }

    /// Fill the interior of `path`.
    pub fn fill(&mut self, path: &Path, paint: &Paint) {
        self.pixmap
            .fill_path(path, paint, FillRule::Winding, Transform::identity(), None);
    }

    /// Stroke `path` with a line of the given width, centered on the path.
    ///
    /// Joins are rounded; open ends are cut flat.
    pub fn stroke(&mut self, path: &Path, paint: &Paint, width: f32) {
        let stroke = Stroke {
            width,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Round,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(path, paint, &stroke, Transform::identity(), None);
    }

    /// Finish drawing and return the layer as a straight-alpha image.
    pub fn into_image(self) -> Result<RgbaImage> {
        let mut image = self.into_premultiplied()?;
        demultiply(&mut image);
        Ok(image)
    }

    /// Finish drawing, apply a Gaussian blur of standard deviation `sigma`
    /// and return the result as a straight-alpha image.
    ///
    /// Blurring happens on premultiplied pixels so that transparent
    /// neighbours don't darken the soft edge.
    pub fn into_blurred_image(self, sigma: f32) -> Result<RgbaImage> {
        let premultiplied = DynamicImage::ImageRgba8(self.into_premultiplied()?);
        let mut image = premultiplied.blur(sigma).into_rgba8();
        demultiply(&mut image);
        Ok(image)
    }

    fn into_premultiplied(self) -> Result<RgbaImage> {
        let size = self.size();
        RgbaImage::from_raw(size, size, self.pixmap.take())
            .context("Layer buffer does not match its dimensions")
    }
}

/// Alpha-only surface used to replace an image's alpha channel.
pub struct AlphaMask {
    mask: Mask,
}

impl AlphaMask {
    pub fn new(size: u32) -> Result<Self> {
        let mask = Mask::new(size, size)
            .with_context(|| format!("Failed to allocate {size}x{size} mask"))?;
        Ok(Self { mask })
    }

    /// Fill `path` with full coverage, anti-aliasing its edge.
    pub fn fill(&mut self, path: &Path) {
        self.mask
            .fill_path(path, FillRule::Winding, true, Transform::identity());
    }

    /// Overwrite the alpha channel of `image` with this mask.
    pub fn apply_to(&self, image: &mut RgbaImage) -> Result<()> {
        ensure!(
            image.dimensions() == (self.mask.width(), self.mask.height()),
            "Mask is {}x{} but image is {}x{}",
            self.mask.width(),
            self.mask.height(),
            image.width(),
            image.height()
        );

        for (pixel, &alpha) in image.pixels_mut().zip(self.mask.data()) {
            pixel[3] = alpha;
        }
        Ok(())
    }
}

/// Merge `layer` over `base` with the standard "over" operator.
///
/// Results are rounded rather than truncated so that anything composited
/// onto an opaque pixel stays exactly opaque.
pub fn composite(base: &mut RgbaImage, layer: &RgbaImage) {
    debug_assert_eq!(base.dimensions(), layer.dimensions());

    for (dst, src) in base.pixels_mut().zip(layer.pixels()) {
        match src[3] {
            0 => {}
            255 => *dst = *src,
            _ => *dst = over(*src, *dst),
        }
    }
}

fn over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let src_alpha = f32::from(src[3]) / 255.0;
    let dst_alpha = f32::from(dst[3]) / 255.0 * (1.0 - src_alpha);
    let alpha = src_alpha + dst_alpha;

    let mut out = Rgba([0, 0, 0, (alpha * 255.0).round() as u8]);
    for channel in 0..3 {
        let value = f32::from(src[channel]) * src_alpha + f32::from(dst[channel]) * dst_alpha;
        out[channel] = (value / alpha).round() as u8;
    }
    out
}

/// Paint that blends onto what is already on the layer.
pub fn solid(color: Rgba<u8>) -> Paint<'static> {
    let [r, g, b, a] = color.0;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, a);
    paint.anti_alias = true;
    paint
}

/// Paint that overwrites the layer's pixels instead of blending onto them,
/// so a translucent fill stays translucent on top of an opaque one.
pub fn replacing(color: Rgba<u8>) -> Paint<'static> {
    let mut paint = solid(color);
    paint.blend_mode = BlendMode::Source;
    paint
}

/// Closed polygon through `points`.
pub fn polygon(points: &[Point]) -> Result<Path> {
    let mut pb = trace(points);
    pb.close();
    pb.finish()
        .with_context(|| format!("Degenerate polygon of {} points", points.len()))
}

/// Open polyline through `points`.
pub fn polyline(points: &[Point]) -> Result<Path> {
    trace(points)
        .finish()
        .with_context(|| format!("Degenerate polyline of {} points", points.len()))
}

/// The outline of a polygon as a polyline: `points` with the first point repeated at the end.
pub fn closed_outline(points: &[Point]) -> Vec<Point> {
    points.iter().chain(points.first()).copied().collect()
}

pub fn circle(center: Point, radius: f32) -> Result<Path> {
    PathBuilder::from_circle(center.x, center.y, radius)
        .with_context(|| format!("Invalid circle radius {radius}"))
}

/// Ellipse inscribed in `bounds`.
pub fn oval(bounds: Rect) -> Result<Path> {
    PathBuilder::from_oval(bounds).context("Invalid ellipse bounds")
}

/// Rectangle with circular corners of `radius`, clamped to half the shorter side.
pub fn rounded_rect(rect: Rect, radius: f32) -> Result<Path> {
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let radius = radius.min(rect.width().min(rect.height()) / 2.0).max(0.0);
    // distance from the corner to each bezier control point
    let k = radius * (1.0 - KAPPA);

    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(r - radius, t);
    pb.cubic_to(r - k, t, r, t + k, r, t + radius);
    pb.line_to(r, b - radius);
    pb.cubic_to(r, b - k, r - k, b, r - radius, b);
    pb.line_to(l + radius, b);
    pb.cubic_to(l + k, b, l, b - k, l, b - radius);
    pb.line_to(l, t + radius);
    pb.cubic_to(l, t + k, l + k, t, l + radius, t);
    pb.close();
    pb.finish().context("Degenerate rounded rectangle")
}

fn trace(points: &[Point]) -> PathBuilder {
    let mut pb = PathBuilder::new();
    if let Some((first, rest)) = points.split_first() {
        pb.move_to(first.x, first.y);
        for point in rest {
            pb.line_to(point.x, point.y);
        }
    }
    pb
}

fn demultiply(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        let alpha = u32::from(pixel[3]);
        if alpha == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
            continue;
        }
        for channel in 0..3 {
            let value = (u32::from(pixel[channel]) * 255 + alpha / 2) / alpha;
            pixel[channel] = value.min(255) as u8;
        }
    }
}
