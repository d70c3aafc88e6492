use crate::artwork::generate_master_icon;
use anyhow::{bail, ensure, Context, Result};
use image::{
    codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder},
    imageops::FilterType,
    ColorType, DynamicImage, ImageEncoder, RgbaImage,
};
use std::{
    fs::{create_dir_all, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Edge length the artwork is drawn at before downsampling.
pub const BASE_SIZE: u32 = 1024;

/// Icon sizes the extension ships, in pixels.
pub const ICON_SIZES: [u32; 6] = [16, 32, 48, 128, 256, 512];

/// Everything a run of the generator needs to know.
///
/// The binary always uses [`IconConfig::default`]; the fields are public so
/// the library can be pointed at another directory.
#[derive(Debug, Clone)]
pub struct IconConfig {
    pub base_size: u32,
    pub sizes: Vec<u32>,
    pub output: PathBuf,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            base_size: BASE_SIZE,
            sizes: ICON_SIZES.to_vec(),
            output: default_output_dir(),
        }
    }
}

/// `icons/` next to the generator's own sources.
pub fn default_output_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("icons")
}

pub fn icon_file_name(size: u32) -> String {
    format!("icon{size}.png")
}

/// Draw the master icon and write every configured size.
///
/// Returns the written paths in the order of `config.sizes`.
pub fn generate_icons(config: &IconConfig) -> Result<Vec<PathBuf>> {
    println!(
        "Drawing {size}x{size} master icon...",
        size = config.base_size
    );
    let master = generate_master_icon(config.base_size)?;

    export_icons(&master, &config.sizes, &config.output)
}

/// Downsample `master` to each of `sizes` and save them as `icon<size>.png`
/// in `out_dir`, creating the directory if needed.
///
/// Existing files are overwritten. The first failure aborts the run; files
/// written before it are left in place.
pub fn export_icons(master: &RgbaImage, sizes: &[u32], out_dir: &Path) -> Result<Vec<PathBuf>> {
    if sizes.contains(&0) {
        bail!("Icon sizes must be positive, got {:?}", sizes);
    }

    create_dir_all(out_dir)
        .with_context(|| format!("Can't create output directory {}", out_dir.display()))?;

    println!("Generating PNG icons...");
    let source = DynamicImage::ImageRgba8(master.clone());
    let mut written = Vec::with_capacity(sizes.len());

    for &size in sizes {
        let resized = source
            .resize_exact(size, size, FilterType::Lanczos3)
            .into_rgba8();
        let output_path = out_dir.join(icon_file_name(size));
        save_png(&resized, &output_path)?;
        println!("  ✓ Generated {}", output_path.display());
        written.push(output_path);
    }

    Ok(written)
}

/// Check that every configured icon exists in `config.output` and decodes as
/// an RGBA image of its nominal size.
pub fn verify_icons(config: &IconConfig) -> Result<Vec<PathBuf>> {
    let mut verified = Vec::with_capacity(config.sizes.len());

    for &size in &config.sizes {
        let path = config.output.join(icon_file_name(size));
        if !path.exists() {
            bail!("Missing icon: {}", path.display());
        }

        let icon = image::open(&path)
            .with_context(|| format!("Failed to decode {}", path.display()))?;
        ensure!(
            icon.width() == size && icon.height() == size,
            "{} is {}x{}, expected {size}x{size}",
            path.display(),
            icon.width(),
            icon.height()
        );
        ensure!(
            icon.color() == ColorType::Rgba8,
            "{} is {:?}, expected RGBA",
            path.display(),
            icon.color()
        );

        println!("  ✓ {} is {size}x{size}", path.display());
        verified.push(path);
    }

    Ok(verified)
}

fn save_png(image: &RgbaImage, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create PNG file {}", path.display()))?;
    let mut out_file = BufWriter::new(file);
    write_png(image.as_raw(), &mut out_file, image.width())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    out_file.flush()?;
    Ok(())
}

// Encode square RGBA data as PNG with the strongest compression
fn write_png<W: Write>(image_data: &[u8], w: W, size: u32) -> Result<()> {
    let encoder = PngEncoder::new_with_quality(w, CompressionType::Best, PngFilterType::Adaptive);
    encoder.write_image(image_data, size, size, ColorType::Rgba8)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = IconConfig::default();
        assert_eq!(config.base_size, 1024);
        assert_eq!(config.sizes, vec![16, 32, 48, 128, 256, 512]);
        assert!(config.output.ends_with("icons"));
    }

    #[test]
    fn test_icon_file_name_embeds_size() {
        assert_eq!(icon_file_name(16), "icon16.png");
        assert_eq!(icon_file_name(512), "icon512.png");
    }

    #[test]
    fn test_export_resizes_each_size() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let master = RgbaImage::from_pixel(64, 64, Rgba([10, 200, 30, 255]));

        let written = export_icons(&master, &[8, 24], temp_dir.path()).unwrap();
        assert_eq!(
            written,
            vec![
                temp_dir.path().join("icon8.png"),
                temp_dir.path().join("icon24.png")
            ]
        );

        let icon = image::open(&written[1]).unwrap().into_rgba8();
        assert_eq!(icon.dimensions(), (24, 24));
        assert_eq!(*icon.get_pixel(12, 12), Rgba([10, 200, 30, 255]));
    }

    #[test]
    fn test_export_rejects_zero_size_before_writing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let out_dir = temp_dir.path().join("icons");
        let master = RgbaImage::new(16, 16);

        assert!(export_icons(&master, &[16, 0], &out_dir).is_err());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_export_fails_when_output_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("icons");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let master = RgbaImage::new(16, 16);
        assert!(export_icons(&master, &[16], &blocker).is_err());
    }
}
