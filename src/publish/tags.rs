//! ID3 tags for published MP3 files.

use crate::error::{NewscastError, Result};
use chrono::{Datelike, NaiveDate};
use id3::frame::Content;
use id3::{Frame, Tag, TagLike, Timestamp, Version};
use std::path::Path;

/// Metadata written into an episode's audio file.
#[derive(Debug, Clone)]
pub struct AudioTags<'a> {
    pub title: &'a str,
    pub artist: &'a str,
    pub date: NaiveDate,
    /// Official audio file page (`WOAF`).
    pub link: &'a str,
}

/// Tag the MP3 at `path` in place. Empty artist and link are left out.
pub fn write_id3(path: &Path, tags: &AudioTags<'_>) -> Result<()> {
    let mut tag = Tag::new();
    tag.set_title(tags.title);
    if !tags.artist.trim().is_empty() {
        tag.set_artist(tags.artist);
    }
    tag.set_date_recorded(Timestamp {
        year: tags.date.year(),
        month: Some(tags.date.month() as u8),
        day: Some(tags.date.day() as u8),
        hour: None,
        minute: None,
        second: None,
    });
    if !tags.link.trim().is_empty() {
        tag.add_frame(Frame::with_content("WOAF", Content::Link(tags.link.to_string())));
    }
    tag.write_to_path(path, Version::Id3v24)
        .map_err(|e| NewscastError::Publish(format!("ID3 tagging {}: {}", path.display(), e)))
}
