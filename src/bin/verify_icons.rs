use anyhow::Result;
use shield_icons::icon_gen::{verify_icons, IconConfig};
use std::path::PathBuf;

fn main() -> Result<()> {
    let mut config = IconConfig::default();
    if let Some(dir) = std::env::args_os().nth(1) {
        config.output = PathBuf::from(dir);
    }

    println!("Checking icons in: {}", config.output.display());
    let verified = verify_icons(&config)?;
    println!("✓ All {} icons present and correctly sized", verified.len());

    Ok(())
}
