//! The three assembly modes.

use super::dates::{extract_date_from_title, parse_datetime_or, with_date};
use super::episode::{included_items, numbered_description, source_footer, Component};
use super::state::{LastIssue, ProcessingState};
use super::{AssembleOutcome, Assembler, Draft};
use crate::error::Result;
use crate::normalize::{content_hash, NormalizedItem};
use crate::publish::slugify;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::info;

/// `"<title>. By <author>. <text>"`, without the author part when empty.
fn item_narration(title: &str, author: &str, text: &str) -> String {
    if author.is_empty() {
        format!("{}. {}", title, text)
    } else {
        format!("{}. By {}. {}", title, author, text)
    }
}

/// Hash of the blank-line join of each item's cleaned text.
fn combined_hash(items: &[&NormalizedItem]) -> String {
    let joined: Vec<&str> = items.iter().map(|i| i.clean_text.as_str()).collect();
    content_hash(&joined.join("\n\n"))
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Assembler {
    fn compiled_narration(&self, items: &[&NormalizedItem]) -> String {
        let mut parts = Vec::with_capacity(items.len() * 2);
        for (i, item) in items.iter().enumerate() {
            let author = self.author_or_site(&item.item.author);
            let mut header = format!("Item {}: {}.", i + 1, item.item.title);
            if !author.is_empty() {
                header.push_str(&format!(" By {}.", author));
            }
            parts.push(header);
            parts.push(item.clean_text.clone());
        }
        parts.join("\n\n")
    }

    fn first_link(&self, items: &[&NormalizedItem]) -> String {
        items
            .first()
            .map(|i| i.item.link.clone())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| self.site_link.clone())
    }

    fn compilation_draft(
        &self,
        items: &[&NormalizedItem],
        id_prefix: &str,
        pub_date: DateTime<Utc>,
        hash: String,
    ) -> Draft {
        let date = pub_date.date_naive();
        let components: Vec<Component> = items.iter().map(|i| Component::from_item(i)).collect();
        let mut description_html = numbered_description(items);
        description_html.push_str(&included_items(&components));
        Draft {
            id: format!("{}::{}::{}", id_prefix, iso(date), hash),
            title: format!("{}: {}", self.feed_name, iso(date)),
            artist: self.author_or_site("").to_string(),
            link: self.first_link(items),
            pub_date,
            date,
            stem: iso(date),
            narration: self.compiled_narration(items),
            description_html,
            components,
            content_hash: hash,
        }
    }

    /// One episode per new item.
    pub(super) async fn separate(&self, new_items: &[NormalizedItem], now: DateTime<Utc>) -> Result<AssembleOutcome> {
        let mut outcome = AssembleOutcome::default();
        for item in new_items {
            let title = &item.item.title;
            let pub_date = parse_datetime_or(&item.item.published, now);
            let date = extract_date_from_title(title).unwrap_or_else(|| pub_date.date_naive());
            let author = self.author_or_site(&item.item.author);

            let draft = Draft {
                id: item.key.clone(),
                title: format!("{}: {} — {}", self.feed_name, iso(date), title),
                artist: author.to_string(),
                link: item.item.link.clone(),
                pub_date,
                date,
                stem: slugify(&format!("{}-{}", iso(date), title)),
                narration: item_narration(title, author, &item.clean_text),
                description_html: format!(
                    "{}{}",
                    item.desc_html,
                    source_footer(item.item.content_source)
                ),
                components: vec![Component::from_item(item)],
                content_hash: item.content_hash.clone(),
            };
            outcome.created.push(self.produce(draft).await?);
        }
        Ok(outcome)
    }

    /// One episode for the new items published today.
    pub(super) async fn compilation(
        &self,
        state: &mut ProcessingState,
        new_items: &[NormalizedItem],
        now: DateTime<Utc>,
    ) -> Result<AssembleOutcome> {
        let today = now.date_naive();
        let todays: Vec<&NormalizedItem> = new_items
            .iter()
            .filter(|i| parse_datetime_or(&i.item.published, now).date_naive() == today)
            .collect();
        if todays.is_empty() {
            info!(%today, "No new items published today");
            return Ok(AssembleOutcome::default());
        }

        let hash = combined_hash(&todays);
        if let Some(existing) = state
            .episodes
            .iter_mut()
            .find(|ep| ep.effective_hash() == Some(hash.as_str()) && ep.has_audio())
        {
            info!(id = %existing.id, "Today's compilation unchanged, refreshing feed");
            existing.description_html = numbered_description(&todays);
            return Ok(AssembleOutcome::refreshed());
        }

        let pub_date = Utc.from_utc_datetime(&today.and_time(NaiveTime::MIN)) + Duration::hours(9);
        let draft = self.compilation_draft(&todays, "compilation", pub_date, hash);
        Ok(AssembleOutcome::created(self.produce(draft).await?))
    }

    /// One episode per run: the newest issue item, else the whole pool.
    ///
    /// At most one episode per calendar date survives; unchanged content whose
    /// episode already has audio only refreshes that episode's description.
    pub(super) async fn forced(
        &self,
        state: &mut ProcessingState,
        all: &[NormalizedItem],
        new_items: &[NormalizedItem],
        now: DateTime<Utc>,
    ) -> Result<AssembleOutcome> {
        let pool: Vec<&NormalizedItem> = if new_items.is_empty() {
            all.iter().collect()
        } else {
            new_items.iter().collect()
        };

        let mut issue: Option<(&NormalizedItem, DateTime<Utc>)> = None;
        for item in pool.iter().filter(|i| i.item.content_source.is_issue()) {
            let published = parse_datetime_or(&item.item.published, now);
            if issue.map_or(true, |(_, best)| published > best) {
                issue = Some((*item, published));
            }
        }

        match issue {
            Some((item, published)) => self.forced_issue(state, item, published).await,
            None => self.forced_pool(state, &pool, now).await,
        }
    }

    async fn forced_issue(
        &self,
        state: &mut ProcessingState,
        item: &NormalizedItem,
        published: DateTime<Utc>,
    ) -> Result<AssembleOutcome> {
        let narration_title = if item.item.title.trim().is_empty() {
            format!("{} — Latest", self.feed_name)
        } else {
            item.item.title.clone()
        };
        let date = extract_date_from_title(&narration_title).unwrap_or_else(|| published.date_naive());
        let pub_date = with_date(published, date);
        let hash = item.content_hash.clone();

        if let Some(existing) = state.episodes.iter_mut().find(|ep| {
            ep.date() == date && ep.effective_hash() == Some(hash.as_str()) && ep.has_audio()
        }) {
            info!(id = %existing.id, %date, "Issue unchanged, refreshing feed");
            existing.description_html = item.desc_html.clone();
            return Ok(AssembleOutcome::refreshed());
        }

        let author = self.author_or_site(&item.item.author);
        let draft = Draft {
            id: format!("issue::{}::{}", iso(date), hash),
            title: format!("{}: {}", self.feed_name, iso(date)),
            artist: author.to_string(),
            link: item.item.link.clone(),
            pub_date,
            date,
            stem: iso(date),
            narration: item_narration(&narration_title, author, &item.clean_text),
            description_html: item.desc_html.clone(),
            components: vec![Component::from_item(item)],
            content_hash: hash,
        };
        let episode = self.produce(draft).await?;

        let replaced = state.remove_episodes_on(date);
        if !replaced.is_empty() {
            info!(%date, replaced = replaced.len(), "Replacing episode for date");
        }
        state.last_issue = Some(LastIssue {
            published: item.item.published.clone(),
            guid: item.item.guid.clone(),
        });
        Ok(AssembleOutcome::created(episode))
    }

    async fn forced_pool(
        &self,
        state: &mut ProcessingState,
        pool: &[&NormalizedItem],
        now: DateTime<Utc>,
    ) -> Result<AssembleOutcome> {
        if pool.is_empty() {
            info!("No items available for forced compilation");
            return Ok(AssembleOutcome::default());
        }

        let pub_date = pool
            .iter()
            .map(|i| parse_datetime_or(&i.item.published, now))
            .max()
            .unwrap_or(now);
        let date = pub_date.date_naive();
        let hash = combined_hash(pool);

        if let Some(existing) = state.episodes.iter_mut().find(|ep| {
            ep.date() == date && ep.effective_hash() == Some(hash.as_str()) && ep.has_audio()
        }) {
            info!(id = %existing.id, %date, "Forced compilation unchanged, refreshing feed");
            existing.description_html = numbered_description(pool);
            return Ok(AssembleOutcome::refreshed());
        }

        let draft = self.compilation_draft(pool, "forced", pub_date, hash);
        let episode = self.produce(draft).await?;
        let replaced = state.remove_episodes_on(date);
        if !replaced.is_empty() {
            info!(%date, replaced = replaced.len(), "Replacing episode for date");
        }
        Ok(AssembleOutcome::created(episode))
    }
}
