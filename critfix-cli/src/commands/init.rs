use anyhow::Result;
use std::path::PathBuf;

use critfix::Config;

pub fn run(path: PathBuf, force: bool) -> Result<bool> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    Config::create_default_config(&path)?;
    println!("✓ Wrote default config to {}", path.display());

    Ok(true)
}
