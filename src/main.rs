//! Newscast CLI entry point.

use anyhow::Result;
use clap::Parser;
use newscast::cli::{commands, Annotation, Cli, Commands, Output};
use newscast::config::Settings;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging(verbose: u8, settings: Option<&Settings>) {
    let level = match verbose {
        0 => settings
            .map(|s| s.logging.level.clone())
            .unwrap_or_else(|| "info".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("newscast={}", level)));

    let json = settings.is_some_and(|s| s.logging.format == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn dispatch(cli: &Cli, config_path: Option<&PathBuf>, settings: Settings) -> Result<()> {
    match &cli.command {
        Commands::Run { mode, feed_url } => {
            commands::run_pipeline(*mode, feed_url.clone(), settings).await?;
        }

        Commands::Render => {
            commands::run_render(&settings)?;
        }

        Commands::Prune {
            date,
            processed_before,
        } => {
            commands::run_prune(date.as_deref(), processed_before.as_deref(), &settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_ref().map(PathBuf::from);

    let settings = Settings::load_from(config_path.as_ref());
    init_logging(cli.verbose, settings.as_ref().ok());

    let result = match settings {
        Ok(settings) => dispatch(&cli, config_path.as_ref(), settings).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        Output::error(&format!("{:#}", e));
        Output::annotation(Annotation::Error, &format!("Run failed: {:#}", e));
        std::process::exit(1);
    }
}
