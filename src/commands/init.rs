use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::Config;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::template().save(path)?;

    info!("Wrote configuration template to {}", path.display());
    println!("✓ Created {}", path.display());
    println!("\nNext steps:");
    println!("  1. Edit the [paths] section to point at your data");
    println!("  2. Run 'wordindex index {}'", path.display());

    Ok(())
}
