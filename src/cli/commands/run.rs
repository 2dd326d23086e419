//! Run command - fetch, assemble and publish.

use crate::cli::{Annotation, Output};
use crate::config::{EpisodeMode, Settings};
use crate::pipeline::Pipeline;
use anyhow::Result;
use tracing::warn;

/// Run one full pipeline pass.
pub async fn run_pipeline(
    mode: Option<EpisodeMode>,
    feed_url: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(mode) = mode {
        settings.mode = mode;
    }
    if let Some(url) = feed_url {
        settings.feed.url = url;
    }

    for msg in settings.validate() {
        warn!("Config warning: {}", msg);
        Output::annotation(Annotation::Warning, &msg);
    }

    let pipeline = Pipeline::new(settings)?;
    let spinner = Output::spinner(&format!(
        "Processing {} ({})",
        pipeline.settings().feed.name,
        pipeline.settings().mode
    ));
    let report = pipeline.run().await;
    spinner.finish_and_clear();
    let report = report?;

    for episode in &report.created {
        if let Some(err) = &episode.tts_error {
            Output::annotation(
                Annotation::Error,
                &format!("TTS failed for {}: {}", episode.title, err),
            );
        }
    }

    Output::info(&format!(
        "Fetched {} item(s), {} new",
        report.fetched, report.new_items
    ));
    for (source, count) in &report.sources {
        Output::info(&format!("  {}: {}", source, count));
    }

    if !report.published {
        Output::info("Nothing to publish.");
        return Ok(());
    }

    if report.created.is_empty() {
        Output::success("No new episodes; feed refreshed.");
    } else {
        Output::success(&format!("Published {} episode(s):", report.created.len()));
        for episode in &report.created {
            let audio = if episode.has_audio() { "audio" } else { "no audio" };
            Output::info(&format!("  {} ({})", episode.title, audio));
        }
    }
    Output::annotation(
        Annotation::Notice,
        &format!("Published {} episode(s)", report.created.len()),
    );
    Ok(())
}
