//! Newscast - newsletters in, podcast out
//!
//! Turns a newsletter RSS/Atom feed or listing page into a narrated podcast
//! feed with a transcript per episode.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `acquire` - Feed/listing fetch with the extraction cascade
//! - `normalize` - HTML to speech-ready text
//! - `rewrite` - Optional LLM cleanup and rewrite passes
//! - `synth` - Text-to-speech providers and chunked synthesis
//! - `assemble` - Episode modes, dedup and persisted state
//! - `publish` - Media layout, RSS and index rendering
//! - `pipeline` - One end-to-end run
//!
//! # Example
//!
//! ```rust,no_run
//! use newscast::config::Settings;
//! use newscast::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let report = pipeline.run().await?;
//!     println!("Published {} episode(s)", report.created.len());
//!
//!     Ok(())
//! }
//! ```

pub mod acquire;
pub mod assemble;
pub mod cli;
pub mod config;
pub mod error;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod publish;
pub mod retry;
pub mod rewrite;
pub mod synth;

pub use error::{NewscastError, Result};
