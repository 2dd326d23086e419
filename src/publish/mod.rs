//! Output writers: media files, the podcast feed, and the index page.

mod feed;
mod index;
mod layout;
mod tags;

pub use feed::render_rss;
pub use index::render_index_html;
pub use layout::{build_public_url, slugify, MediaPaths, OutputLayout};
pub use tags::{write_id3, AudioTags};

use crate::assemble::Episode;
use crate::config::SiteSettings;
use crate::error::Result;
use std::path::Path;
use tracing::info;

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    Ok(())
}

/// Render and write both the feed and the index page.
pub fn publish_feed(layout: &OutputLayout, site: &SiteSettings, episodes: &[Episode]) -> Result<()> {
    let feed_url = layout.feed_url();
    let xml = render_rss(site, episodes, &feed_url)?;
    write_file(&layout.feed_path(), xml)?;
    write_file(
        &layout.index_path(),
        render_index_html(&site.title, &site.description, &feed_url),
    )?;
    info!(
        feed = %layout.feed_path().display(),
        episodes = episodes.len(),
        "Feed and index written"
    );
    Ok(())
}
