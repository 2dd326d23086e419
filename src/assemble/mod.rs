//! Episode assembly for Newscast.
//!
//! Given the normalized items of a run and the persisted state, decides which
//! episodes to create under the configured [`EpisodeMode`]. Every created
//! episode gets its transcript written before synthesis is attempted, and a
//! synthesis failure is recorded on the episode instead of aborting the run.

mod dates;
mod episode;
mod modes;
mod state;

pub use dates::{extract_date_from_title, parse_datetime, parse_datetime_or, with_date};
pub use episode::{
    included_items, numbered_description, source_footer, tts_failure_note, Component, Episode,
};
pub use state::{LastIssue, ProcessingState, StateStore, MAX_EPISODES};

use crate::config::{EpisodeMode, Settings};
use crate::error::Result;
use crate::normalize::NormalizedItem;
use crate::publish::{write_file, write_id3, AudioTags, OutputLayout};
use crate::rewrite::Rewriter;
use crate::synth::Synthesizer;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use tracing::{error, info, instrument, warn};

/// What one assembly pass produced.
#[derive(Debug, Default)]
pub struct AssembleOutcome {
    pub created: Vec<Episode>,
    /// Feed and index must be rewritten even though nothing was created.
    pub force_refresh: bool,
}

impl AssembleOutcome {
    fn refreshed() -> Self {
        Self {
            created: Vec::new(),
            force_refresh: true,
        }
    }

    fn created(episode: Episode) -> Self {
        Self {
            created: vec![episode],
            force_refresh: false,
        }
    }

    /// Nothing to publish and nothing to record.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && !self.force_refresh
    }
}

/// Items whose key is not yet processed, first occurrence only.
pub fn select_new(state: &ProcessingState, items: &[NormalizedItem]) -> Vec<NormalizedItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| !state.is_processed(&item.key) && seen.insert(item.key.clone()))
        .cloned()
        .collect()
}

/// Episode fields decided by a mode, before rewrite and synthesis.
struct Draft {
    id: String,
    title: String,
    /// ID3 artist.
    artist: String,
    link: String,
    pub_date: DateTime<Utc>,
    /// Folder date for the media files.
    date: NaiveDate,
    /// Media file name without extension.
    stem: String,
    narration: String,
    description_html: String,
    components: Vec<Component>,
    content_hash: String,
}

/// Builds episodes for one run.
pub struct Assembler {
    mode: EpisodeMode,
    feed_name: String,
    site_author: String,
    site_link: String,
    layout: OutputLayout,
    rewriter: Rewriter,
    synthesizer: Option<Synthesizer>,
}

impl Assembler {
    pub fn new(settings: &Settings, layout: OutputLayout, rewriter: Rewriter, synthesizer: Option<Synthesizer>) -> Self {
        Self {
            mode: settings.mode,
            feed_name: settings.feed.name.clone(),
            site_author: settings.site.author.clone(),
            site_link: settings.site.link.clone(),
            layout,
            rewriter,
            synthesizer,
        }
    }

    pub fn with_mode(mut self, mode: EpisodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> EpisodeMode {
        self.mode
    }

    /// Run the configured mode over `all` items, of which `new_items` are unseen.
    ///
    /// May replace or refresh episodes already in `state`; created episodes are
    /// returned for the caller to merge.
    #[instrument(skip_all, fields(mode = %self.mode, items = all.len(), new = new_items.len()))]
    pub async fn assemble(
        &self,
        state: &mut ProcessingState,
        all: &[NormalizedItem],
        new_items: &[NormalizedItem],
        now: DateTime<Utc>,
    ) -> Result<AssembleOutcome> {
        let outcome = match self.mode {
            EpisodeMode::Separate => self.separate(new_items, now).await?,
            EpisodeMode::Compilation => self.compilation(state, new_items, now).await?,
            EpisodeMode::ForcedCompilation => self.forced(state, all, new_items, now).await?,
        };
        info!(
            created = outcome.created.len(),
            force_refresh = outcome.force_refresh,
            "Assembly done"
        );
        Ok(outcome)
    }

    fn author_or_site<'a>(&'a self, author: &'a str) -> &'a str {
        if author.trim().is_empty() {
            &self.site_author
        } else {
            author
        }
    }

    /// Rewrite the narration, write the transcript, then synthesize.
    async fn produce(&self, draft: Draft) -> Result<Episode> {
        let text = self.rewriter.apply(&draft.narration).await;

        let paths = self.layout.media_paths(draft.date, &draft.stem);
        write_file(&paths.transcript_path, &text)?;
        let transcript_url = Some(self.layout.public_url(&paths.transcript_rel));

        let mut audio_url = None;
        let mut audio_bytes = 0u64;
        let mut tts_error = None;
        if let Some(synth) = &self.synthesizer {
            match synth.synthesize(&text).await {
                Ok(mp3) => {
                    write_file(&paths.audio_path, &mp3)?;
                    let tags = AudioTags {
                        title: &draft.title,
                        artist: &draft.artist,
                        date: draft.date,
                        link: &draft.link,
                    };
                    if let Err(e) = write_id3(&paths.audio_path, &tags) {
                        warn!(episode = %draft.title, error = %e, "ID3 tagging failed");
                    }
                    audio_url = Some(self.layout.public_url(&paths.audio_rel));
                    audio_bytes = std::fs::metadata(&paths.audio_path)
                        .map(|m| m.len())
                        .unwrap_or(mp3.len() as u64);
                    info!(episode = %draft.title, bytes = audio_bytes, "Audio written");
                }
                Err(e) => {
                    error!(episode = %draft.title, error = %e, "TTS failed");
                    tts_error = Some(e.to_string());
                }
            }
        }

        let mut description_html = draft.description_html;
        if let Some(err) = &tts_error {
            description_html.push_str(&tts_failure_note(err));
        }

        Ok(Episode {
            id: draft.id,
            title: draft.title,
            link: draft.link,
            pub_date: draft.pub_date,
            description_html,
            audio_url,
            audio_bytes,
            components: draft.components,
            transcript_url,
            content_hash: Some(draft.content_hash),
            tts_error,
        })
    }
}
