//! Procedural generator for the extension's shield icon set.
//!
//! [`artwork`] draws the icon at base resolution, [`icon_gen`] downsamples it
//! to each shipped size and writes the PNG files.

pub mod artwork;
pub mod icon_gen;
pub mod layer;
