//! Prune command - maintenance removal of episodes and processed keys.

use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::prune;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

pub fn run_prune(date: Option<&str>, processed_before: Option<&str>, settings: &Settings) -> Result<()> {
    if date.is_none() && processed_before.is_none() {
        bail!("Nothing to prune: pass --date and/or --processed-before");
    }
    let date = date.map(parse_date).transpose()?;
    let processed_before = processed_before.map(parse_date).transpose()?;

    let report = prune(settings, date, processed_before)?;

    if let Some(date) = date {
        Output::success(&format!(
            "Removed {} episode(s) and {} file(s) for {}",
            report.episodes.len(),
            report.files,
            date
        ));
        for episode in &report.episodes {
            Output::list_item(&episode.title);
        }
    }
    if processed_before.is_some() {
        Output::success(&format!("Forgot {} processed item(s)", report.processed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-10-15").unwrap(), NaiveDate::from_ymd_opt(2025, 10, 15).unwrap());
        assert!(parse_date("15/10/2025").is_err());
    }
}
