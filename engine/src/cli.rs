//! CLI interface for mathcrew
//!
//! This module provides the command-line interface using clap's derive API.
//! Each command processes exactly one turn and prints its events, one per
//! line, on stdout.

use crate::orchestrator::PipelineKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Math orchestration demo
///
/// Answers arithmetic requests by coordinating a deterministic evaluator,
/// an optional poetry specialist and a final synthesizer.
#[derive(Parser, Debug)]
#[command(name = "mathcrew")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Session flags shared by conversational commands
#[derive(clap::Args, Debug, Clone)]
pub struct SessionArgs {
    /// Session identifier
    #[arg(short, long, default_value = "demo-session")]
    pub session: String,

    /// User identifier injected into the session
    #[arg(short, long, default_value = "demo-user")]
    pub user: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute the orchestrator for a single user prompt
    Run {
        /// User request, e.g. 'What is 12 / 3 + 4?'
        prompt: String,

        #[command(flatten)]
        session: SessionArgs,

        /// Orchestration strategy (defaults to the configured one)
        #[arg(long, value_enum)]
        pipeline: Option<PipelineKind>,
    },

    /// Transcribe text from an image
    Transcribe {
        /// Instructions for the transcription
        prompt: String,

        #[command(flatten)]
        session: SessionArgs,

        /// Image file to attach (repeatable)
        #[arg(long = "image", value_name = "FILE")]
        images: Vec<PathBuf>,
    },

    /// Evaluate an arithmetic expression locally and print the tool result
    Eval {
        /// Expression using numbers, + - * / and parentheses
        expression: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["mathcrew", "run", "What is 2 + 2?"]).unwrap();
        match cli.command {
            Command::Run {
                prompt,
                session,
                pipeline,
            } => {
                assert_eq!(prompt, "What is 2 + 2?");
                assert_eq!(session.session, "demo-session");
                assert_eq!(session.user, "demo-user");
                assert_eq!(pipeline, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.debug);
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "mathcrew",
            "run",
            "2 * 3",
            "-s",
            "s1",
            "-u",
            "alice",
            "--pipeline",
            "tool-driven",
            "--debug",
        ])
        .unwrap();
        assert!(cli.debug);
        match cli.command {
            Command::Run {
                session, pipeline, ..
            } => {
                assert_eq!(session.session, "s1");
                assert_eq!(session.user, "alice");
                assert_eq!(pipeline, Some(PipelineKind::ToolDriven));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_transcribe_images() {
        let cli = Cli::try_parse_from([
            "mathcrew",
            "transcribe",
            "read it",
            "--image",
            "a.png",
            "--image",
            "b.jpg",
        ])
        .unwrap();
        match cli.command {
            Command::Transcribe { images, .. } => assert_eq!(images.len(), 2),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_eval_takes_global_flags() {
        let cli = Cli::try_parse_from([
            "mathcrew",
            "eval",
            "(10 - 4) / 3",
            "--debug",
            "--config",
            "missing.toml",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("missing.toml")));
        match cli.command {
            Command::Eval { expression } => assert_eq!(expression, "(10 - 4) / 3"),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
