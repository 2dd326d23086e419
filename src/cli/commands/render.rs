//! Render command - rebuild the feed from saved state.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::render;
use anyhow::Result;

pub fn run_render(settings: &Settings) -> Result<()> {
    let count = render(settings)?;
    Output::success(&format!(
        "Rendered {} episode(s) to {}",
        count,
        settings.root_dir().join(&settings.output.feed_filename).display()
    ));
    Ok(())
}
