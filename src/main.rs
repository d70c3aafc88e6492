use anyhow::Result;
use shield_icons::icon_gen::{self, IconConfig};

// Takes no arguments: sizes, colors and the output directory are fixed.
fn main() -> Result<()> {
    icon_gen::generate_icons(&IconConfig::default())?;
    Ok(())
}
