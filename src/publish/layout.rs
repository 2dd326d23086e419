//! Output paths and public URLs.

use crate::config::Settings;
use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};

const MAX_SLUG_CHARS: usize = 120;

/// Lowercase alphanumerics, everything else `-`, runs collapsed.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed: String = slug.trim_matches('-').chars().take(MAX_SLUG_CHARS).collect();
    if trimmed.is_empty() {
        "episode".to_string()
    } else {
        trimmed
    }
}

/// `site_link` without its trailing slash, then `/`, then `rel_path`.
pub fn build_public_url(site_link: &str, rel_path: &str) -> String {
    format!(
        "{}/{}",
        site_link.trim_end_matches('/'),
        rel_path.trim_start_matches('/')
    )
}

/// Relative and absolute locations of one episode's media files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPaths {
    pub dir: PathBuf,
    pub audio_path: PathBuf,
    pub transcript_path: PathBuf,
    /// Site-relative, `/`-separated.
    pub audio_rel: String,
    pub transcript_rel: String,
}

/// Where everything a run writes ends up.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root_dir: PathBuf,
    audio_dir: String,
    site_link: String,
    feed_filename: String,
    index_filename: String,
}

impl OutputLayout {
    pub fn new(root_dir: impl Into<PathBuf>, audio_dir: &str, site_link: &str) -> Self {
        Self {
            root_dir: root_dir.into(),
            audio_dir: audio_dir.trim_matches('/').to_string(),
            site_link: site_link.to_string(),
            feed_filename: "feed.xml".to_string(),
            index_filename: "index.html".to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut layout = Self::new(
            settings.root_dir(),
            &settings.output.audio_dir,
            &settings.site.link,
        );
        layout.feed_filename = settings.output.feed_filename.clone();
        layout.index_filename = settings.output.index_filename.clone();
        layout
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// `<audio_dir>/<yyyy>/<mm>/<stem>.{mp3,txt}` for an episode dated `date`.
    pub fn media_paths(&self, date: NaiveDate, stem: &str) -> MediaPaths {
        let folder = format!("{}/{:04}/{:02}", self.audio_dir, date.year(), date.month());
        let audio_rel = format!("{}/{}.mp3", folder, stem);
        let transcript_rel = format!("{}/{}.txt", folder, stem);
        MediaPaths {
            dir: self.resolve(&folder),
            audio_path: self.resolve(&audio_rel),
            transcript_path: self.resolve(&transcript_rel),
            audio_rel,
            transcript_rel,
        }
    }

    /// Absolute path of a site-relative path.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        rel.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root_dir.clone(), |path, part| path.join(part))
    }

    pub fn public_url(&self, rel: &str) -> String {
        build_public_url(&self.site_link, rel)
    }

    pub fn feed_path(&self) -> PathBuf {
        self.resolve(&self.feed_filename)
    }

    pub fn feed_url(&self) -> String {
        self.public_url(&self.feed_filename)
    }

    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("2025-10-15-Big News: AI & You!"), "2025-10-15-big-news-ai-you");
        assert_eq!(slugify("  --  "), "episode");
        assert_eq!(slugify(&"a".repeat(300)).len(), 120);
    }

    #[test]
    fn test_public_url_joins_single_slash() {
        assert_eq!(build_public_url("https://x.io/pod/", "/audio/a.mp3"), "https://x.io/pod/audio/a.mp3");
        assert_eq!(build_public_url("https://x.io", "feed.xml"), "https://x.io/feed.xml");
    }

    #[test]
    fn test_media_paths() {
        let layout = OutputLayout::new("/site", "audio", "https://x.io/");
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let paths = layout.media_paths(date, "2025-03-07");
        assert_eq!(paths.audio_rel, "audio/2025/03/2025-03-07.mp3");
        assert_eq!(paths.transcript_path, PathBuf::from("/site/audio/2025/03/2025-03-07.txt"));
        assert_eq!(paths.dir, PathBuf::from("/site/audio/2025/03"));
        assert_eq!(
            layout.public_url(&paths.audio_rel),
            "https://x.io/audio/2025/03/2025-03-07.mp3"
        );
        assert_eq!(layout.feed_url(), "https://x.io/feed.xml");
    }
}
