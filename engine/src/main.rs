// mathcrew
// Main entry point for the mathcrew binary

use clap::Parser;
use mathcrew_engine::cli::{Cli, Command};
use mathcrew_engine::config::Config;
use mathcrew_engine::handlers::{handle_eval, handle_run, handle_transcribe};
use mathcrew_engine::telemetry::{effective_level, init_telemetry_with_level};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        // Evaluation is local and needs neither configuration nor a credential
        Command::Eval { expression } => {
            init_telemetry_with_level(effective_level("warn", cli.debug));
            handle_eval(expression)
        }

        Command::Run {
            prompt,
            session,
            pipeline,
        } => {
            let config = startup(cli.config.as_deref(), cli.debug)?;
            handle_run(prompt, &session.session, &session.user, pipeline, &config).await
        }

        Command::Transcribe {
            prompt,
            session,
            images,
        } => {
            let config = startup(cli.config.as_deref(), cli.debug)?;
            handle_transcribe(prompt, &session.session, &session.user, &images, &config).await
        }
    }
}

/// Load configuration once and bring up logging; the config is passed by
/// reference from here on.
fn startup(config_path: Option<&Path>, debug: bool) -> anyhow::Result<Config> {
    let config = Config::load(config_path)?;

    // RUST_LOG still overrides this inside the filter
    init_telemetry_with_level(effective_level(&config.core.log_level, debug));

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");
    tracing::debug!("mathcrew v{} ({} - {})", version, commit, timestamp);

    Ok(config)
}
