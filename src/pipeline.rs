//! Run orchestration for Newscast.
//!
//! One run loads state, acquires and normalizes items, assembles episodes,
//! then writes the feed, the index and the state. State is only written when
//! something was published, and never when the run fails.

use crate::acquire::Acquirer;
use crate::assemble::{select_new, Assembler, Episode, ProcessingState, StateStore};
use crate::config::{EpisodeMode, Prompts, Settings};
use crate::error::Result;
use crate::normalize::{NormalizedItem, Normalizer};
use crate::publish::{publish_feed, OutputLayout};
use crate::rewrite::Rewriter;
use crate::synth::Synthesizer;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Summary of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub new_items: usize,
    pub created: Vec<Episode>,
    pub force_refresh: bool,
    /// Feed, index and state were written.
    pub published: bool,
    /// New items per content source tag.
    pub sources: BTreeMap<String, usize>,
}

/// Count new items per content source and log each one.
pub fn summarize_sources(items: &[NormalizedItem]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        let source = item.item.content_source.to_string();
        info!(title = %item.item.title, source = %source, link = %item.item.link, "Item content source");
        *counts.entry(source).or_insert(0) += 1;
    }
    if !counts.is_empty() {
        info!(sources = ?counts, "Content sources summary");
    }
    counts
}

/// Build the synthesizer, or `None` when synthesis is off or unavailable.
pub fn build_synthesizer(settings: &Settings) -> Option<Synthesizer> {
    if !settings.tts.enabled {
        info!("TTS disabled");
        return None;
    }
    match Synthesizer::from_settings(&settings.tts) {
        Ok(synth) => {
            info!(provider = synth.provider_name(), "TTS enabled");
            Some(synth)
        }
        Err(e) => {
            warn!(error = %e, "TTS unavailable, publishing without audio");
            None
        }
    }
}

/// The acquire, normalize, assemble, publish sequence.
pub struct Pipeline {
    settings: Settings,
    acquirer: Acquirer,
    normalizer: Normalizer,
    assembler: Assembler,
    store: StateStore,
    layout: OutputLayout,
}

impl Pipeline {
    /// Create a pipeline with components configured from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let acquirer = Acquirer::from_settings(&settings)?;
        let layout = OutputLayout::from_settings(&settings);
        let rewriter = Rewriter::from_settings(&settings, &prompts);
        let assembler = Assembler::new(&settings, layout.clone(), rewriter, build_synthesizer(&settings));
        Ok(Self::with_components(settings, acquirer, assembler))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(settings: Settings, acquirer: Acquirer, assembler: Assembler) -> Self {
        Self {
            normalizer: Normalizer::new(settings.clean.clone()),
            store: StateStore::new(settings.state_path()),
            layout: OutputLayout::from_settings(&settings),
            settings,
            acquirer,
            assembler,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run with an explicit clock.
    #[instrument(skip(self), fields(feed = %self.settings.feed.url, mode = %self.assembler.mode()))]
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let mut state = self.store.load()?;

        let items = self
            .acquirer
            .acquire(&self.settings.feed.url, self.settings.feed.fetch_original)
            .await?;
        let normalized = self.normalizer.normalize_all(items);
        let new_items = select_new(&state, &normalized);

        let mut report = RunReport {
            fetched: normalized.len(),
            new_items: new_items.len(),
            sources: summarize_sources(&new_items),
            ..RunReport::default()
        };

        if new_items.is_empty() && self.assembler.mode() != EpisodeMode::ForcedCompilation {
            info!("No new items");
            return Ok(report);
        }

        let outcome = self
            .assembler
            .assemble(&mut state, &normalized, &new_items, now)
            .await?;
        if outcome.is_noop() {
            info!("Nothing to publish after filtering");
            return Ok(report);
        }

        state.record_processed(new_items.iter().map(|i| i.key.as_str()), now);
        state.merge_episodes(outcome.created.clone());

        publish_feed(&self.layout, &self.settings.site, &state.episodes)?;
        self.store.save(&state)?;

        info!(episodes = outcome.created.len(), "Publish complete");
        report.created = outcome.created;
        report.force_refresh = outcome.force_refresh;
        report.published = true;
        Ok(report)
    }
}

/// Rewrite the feed and index from saved state.
pub fn render(settings: &Settings) -> Result<usize> {
    let state = StateStore::new(settings.state_path()).load()?;
    publish_feed(&OutputLayout::from_settings(settings), &settings.site, &state.episodes)?;
    Ok(state.episodes.len())
}

/// What a maintenance prune removed.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub episodes: Vec<Episode>,
    pub files: usize,
    pub processed: usize,
}

/// Remove one date's episodes and media, and optionally old processed keys.
pub fn prune(
    settings: &Settings,
    date: Option<NaiveDate>,
    processed_before: Option<NaiveDate>,
) -> Result<PruneReport> {
    let store = StateStore::new(settings.state_path());
    let layout = OutputLayout::from_settings(settings);
    let mut state: ProcessingState = store.load()?;
    let mut report = PruneReport::default();

    if let Some(date) = date {
        report.episodes = state.prune_date(date);
        let paths = layout.media_paths(date, &date.format("%Y-%m-%d").to_string());
        for path in [&paths.audio_path, &paths.transcript_path] {
            if path.exists() {
                std::fs::remove_file(path)?;
                info!(path = %path.display(), "Removed media file");
                report.files += 1;
            }
        }
    }
    if let Some(before) = processed_before {
        report.processed = state.prune_processed_before(before);
    }

    store.save(&state)?;
    publish_feed(&layout, &settings.site, &state.episodes)?;
    info!(
        episodes = report.episodes.len(),
        files = report.files,
        processed = report.processed,
        "Prune complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::{ContentSource, SourceItem};
    use crate::assemble::Episode;
    use chrono::TimeZone;

    fn settings(root: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.output.root_dir = root.join("site").to_string_lossy().to_string();
        settings.output.state_path = root.join("data/state.json").to_string_lossy().to_string();
        settings.site.link = "https://pod.example".to_string();
        settings
    }

    fn episode(id: &str, pub_date: DateTime<Utc>) -> Episode {
        Episode {
            id: id.to_string(),
            title: id.to_string(),
            link: String::new(),
            pub_date,
            description_html: String::new(),
            audio_url: None,
            audio_bytes: 0,
            components: Vec::new(),
            transcript_url: None,
            content_hash: None,
            tts_error: None,
        }
    }

    #[test]
    fn test_source_summary_counts() {
        let normalizer = Normalizer::default();
        let make = |guid: &str, source| {
            normalizer.normalize(SourceItem {
                guid: guid.to_string(),
                link: String::new(),
                title: guid.to_string(),
                author: String::new(),
                published: String::new(),
                content_html: "<p>x</p>".to_string(),
                content_source: source,
            })
        };
        let counts = summarize_sources(&[
            make("a", ContentSource::Feed),
            make("b", ContentSource::Feed),
            make("c", ContentSource::Plaintext),
        ]);
        assert_eq!(counts["rss"], 2);
        assert_eq!(counts["plaintext"], 1);
    }

    #[test]
    fn test_prune_removes_episodes_and_media() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let day = Utc.with_ymd_and_hms(2025, 10, 15, 9, 0, 0).unwrap();

        let store = StateStore::new(settings.state_path());
        let mut state = ProcessingState::default();
        state.merge_episodes(vec![
            episode("issue::2025-10-15::a", day),
            episode("other", day + chrono::Duration::days(1)),
        ]);
        state.record_processed(["k::1"], Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        store.save(&state).unwrap();

        let media = OutputLayout::from_settings(&settings).media_paths(day.date_naive(), "2025-10-15");
        crate::publish::write_file(&media.audio_path, b"mp3").unwrap();
        crate::publish::write_file(&media.transcript_path, "text").unwrap();

        let report = prune(
            &settings,
            Some(day.date_naive()),
            NaiveDate::from_ymd_opt(2025, 6, 1),
        )
        .unwrap();

        assert_eq!(report.episodes.len(), 1);
        assert_eq!(report.files, 2);
        assert_eq!(report.processed, 1);
        assert!(!media.audio_path.exists());

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded.episodes.len(), 1);
        let feed = std::fs::read_to_string(OutputLayout::from_settings(&settings).feed_path()).unwrap();
        assert!(feed.contains("<guid isPermaLink=\"false\">other</guid>"));
    }

    #[test]
    fn test_render_from_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        assert_eq!(render(&settings).unwrap(), 0);
        assert!(dir.path().join("site/index.html").exists());
        assert!(dir.path().join("site/feed.xml").exists());
    }
}
