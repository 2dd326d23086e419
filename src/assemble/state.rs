//! Persisted processing state.
//!
//! State is loaded once at the start of a run, mutated in memory, and saved
//! once at the end. Saving writes a temporary file next to the target and
//! renames it into place.

use super::dates::parse_datetime;
use super::episode::Episode;
use crate::error::{NewscastError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Episodes kept in state and in the feed.
pub const MAX_EPISODES: usize = 200;

/// Marker for the most recently published newsletter issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastIssue {
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub guid: String,
}

/// Everything remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Dedup key to the ISO timestamp it was processed at.
    #[serde(default)]
    pub processed: BTreeMap<String, String>,
    /// Newest first.
    #[serde(default)]
    pub episodes: Vec<Episode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_issue: Option<LastIssue>,
}

impl ProcessingState {
    pub fn is_processed(&self, key: &str) -> bool {
        self.processed.contains_key(key)
    }

    /// Record keys as processed at `now`. Existing entries are kept.
    pub fn record_processed<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>, now: DateTime<Utc>) {
        let stamp = now.to_rfc3339();
        for key in keys {
            self.processed
                .entry(key.to_string())
                .or_insert_with(|| stamp.clone());
        }
    }

    /// Append episodes, re-sort newest first, and keep the newest [`MAX_EPISODES`].
    pub fn merge_episodes(&mut self, created: Vec<Episode>) {
        if created.is_empty() {
            return;
        }
        self.episodes.extend(created);
        self.sort_episodes();
        if self.episodes.len() > MAX_EPISODES {
            debug!(dropped = self.episodes.len() - MAX_EPISODES, "Trimming episode list");
            self.episodes.truncate(MAX_EPISODES);
        }
    }

    pub fn sort_episodes(&mut self) {
        self.episodes.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    }

    /// Remove every episode published on `date`, returning them.
    pub fn remove_episodes_on(&mut self, date: NaiveDate) -> Vec<Episode> {
        let (removed, kept): (Vec<Episode>, Vec<Episode>) = std::mem::take(&mut self.episodes)
            .into_iter()
            .partition(|ep| ep.date() == date);
        self.episodes = kept;
        removed
    }

    /// Maintenance removal: episodes dated `date` or carrying an issue id for it.
    pub fn prune_date(&mut self, date: NaiveDate) -> Vec<Episode> {
        let issue_prefix = format!("issue::{}::", date.format("%Y-%m-%d"));
        let (removed, kept): (Vec<Episode>, Vec<Episode>) = std::mem::take(&mut self.episodes)
            .into_iter()
            .partition(|ep| ep.date() == date || ep.id.starts_with(&issue_prefix));
        self.episodes = kept;
        self.sort_episodes();
        removed
    }

    /// Drop processed entries recorded before `date`. Unparseable stamps are kept.
    pub fn prune_processed_before(&mut self, date: NaiveDate) -> usize {
        let before = self.processed.len();
        self.processed.retain(|_, stamp| {
            parse_datetime(stamp).map_or(true, |dt| dt.date_naive() >= date)
        });
        before - self.processed.len()
    }
}

/// JSON file holding the [`ProcessingState`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, or an empty state when the file does not exist yet.
    pub fn load(&self) -> Result<ProcessingState> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No state file, starting fresh");
            return Ok(ProcessingState::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let mut state: ProcessingState = serde_json::from_str(&content).map_err(|e| {
            NewscastError::State(format!("Invalid state file {}: {}", self.path.display(), e))
        })?;
        state.sort_episodes();
        debug!(
            processed = state.processed.len(),
            episodes = state.episodes.len(),
            "Loaded state"
        );
        Ok(state)
    }

    pub fn save(&self, state: &ProcessingState) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(state)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path)
            .map_err(|e| NewscastError::State(format!("Failed to save state: {}", e)))?;

        info!(
            path = %self.path.display(),
            episodes = state.episodes.len(),
            "Saved state"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

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
    fn test_merge_keeps_200_most_recent() {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut state = ProcessingState::default();
        let created: Vec<Episode> = (0..250)
            .map(|i| episode(&format!("ep{}", i), base + Duration::hours(i)))
            .collect();

        state.merge_episodes(created);

        assert_eq!(state.episodes.len(), MAX_EPISODES);
        assert_eq!(state.episodes[0].id, "ep249");
        assert_eq!(state.episodes[MAX_EPISODES - 1].id, "ep50");
        assert!(state
            .episodes
            .windows(2)
            .all(|w| w[0].pub_date >= w[1].pub_date));
    }

    #[test]
    fn test_record_processed_is_write_once() {
        let first = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut state = ProcessingState::default();
        state.record_processed(["a::1"], first);
        state.record_processed(["a::1", "b::2"], first + Duration::days(1));
        assert_eq!(state.processed["a::1"], first.to_rfc3339());
        assert_eq!(state.processed.len(), 2);
    }

    #[test]
    fn test_prune_date_matches_issue_ids() {
        let day = Utc.with_ymd_and_hms(2025, 10, 15, 9, 0, 0).unwrap();
        let mut state = ProcessingState::default();
        state.merge_episodes(vec![
            episode("compilation::2025-10-15::a", day),
            episode("issue::2025-10-15::b", day + Duration::days(3)),
            episode("keep", day + Duration::days(1)),
        ]);

        let removed = state.prune_date(day.date_naive());
        assert_eq!(removed.len(), 2);
        assert_eq!(state.episodes.len(), 1);
        assert_eq!(state.episodes[0].id, "keep");
    }

    #[test]
    fn test_prune_processed_before() {
        let mut state = ProcessingState::default();
        state.record_processed(["old"], Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        state.record_processed(["new"], Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let removed = state.prune_processed_before(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(removed, 1);
        assert!(state.is_processed("new"));
    }

    #[test]
    fn test_store_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("data").join("state.json"));
        assert_eq!(store.load().unwrap(), ProcessingState::default());

        let mut state = ProcessingState::default();
        state.record_processed(["k::h"], Utc::now());
        state.merge_episodes(vec![episode("e", Utc.with_ymd_and_hms(2025, 2, 2, 0, 0, 0).unwrap())]);
        state.last_issue = Some(LastIssue {
            published: "October 15, 2025".to_string(),
            guid: "https://x#October 15, 2025".to_string(),
        });
        store.save(&state).unwrap();

        assert_eq!(store.load().unwrap(), state);
    }

    #[test]
    fn test_corrupt_state_is_state_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(StateStore::new(path).load(), Err(NewscastError::State(_))));
    }
}
