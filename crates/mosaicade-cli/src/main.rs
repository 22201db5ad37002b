//! Mosaicade CLI - concatenative audio mosaicing from the command line.
//!
//! This binary drives mosaicing sessions against a pre-analyzed source
//! corpus: segment a target recording, find the best-matching source units,
//! and assemble them into a new signal.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use mosaicade_cli::commands;
use mosaicade_cli::tools::{DEFAULT_ONSET_PROGRAM, DEFAULT_STRETCH_PROGRAM};

/// Mosaicade - Hierarchical Concatenative Audio Mosaicing
#[derive(Parser)]
#[command(name = "mosaicade")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mosaicing session against a corpus
    Create {
        /// Path to the target WAV file
        #[arg(short, long)]
        target: String,

        /// Path to the corpus root directory
        #[arg(short, long)]
        corpus: String,

        /// Output WAV path
        #[arg(short, long)]
        output: String,

        /// Path to a JSON session config (defaults apply when omitted)
        #[arg(long)]
        config: Option<String>,

        /// Feature-extraction program, invoked as `<prog> in.wav out.json`
        #[arg(long)]
        extractor: String,

        /// Time-stretch program, invoked as `<prog> -D secs in.wav out.wav`
        #[arg(long, default_value = DEFAULT_STRETCH_PROGRAM)]
        stretcher: String,

        /// Onset-detection program, invoked as `<prog> -i in.wav`
        #[arg(long, default_value = DEFAULT_ONSET_PROGRAM)]
        onsets: String,
    },

    /// Print the high-level segment grouping for a target
    Segments {
        /// Path to the target WAV file
        #[arg(short, long)]
        target: String,

        /// Fixed chop size in milliseconds (onset detection when omitted)
        #[arg(long)]
        chop: Option<u32>,

        /// Onset-detection program, invoked as `<prog> -i in.wav`
        #[arg(long, default_value = DEFAULT_ONSET_PROGRAM)]
        onsets: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Create {
            target,
            corpus,
            output,
            config,
            extractor,
            stretcher,
            onsets,
        } => commands::create::run(
            &target,
            &corpus,
            &output,
            config.as_deref(),
            &extractor,
            &stretcher,
            &onsets,
        ),
        Commands::Segments {
            target,
            chop,
            onsets,
        } => commands::segments::run(&target, chop, &onsets),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e:#}", "error".red());
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_create() {
        let cli = Cli::try_parse_from([
            "mosaicade",
            "create",
            "--target",
            "target.wav",
            "--corpus",
            "corpus/",
            "--output",
            "out.wav",
            "--extractor",
            "analyze",
        ])
        .unwrap();
        match cli.command {
            Commands::Create {
                target, stretcher, ..
            } => {
                assert_eq!(target, "target.wav");
                assert_eq!(stretcher, DEFAULT_STRETCH_PROGRAM);
            }
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn cli_parses_segments_with_fixed_chop() {
        let cli =
            Cli::try_parse_from(["mosaicade", "segments", "--target", "t.wav", "--chop", "500"])
                .unwrap();
        match cli.command {
            Commands::Segments { chop, .. } => assert_eq!(chop, Some(500)),
            _ => panic!("expected segments"),
        }
    }

    #[test]
    fn create_requires_an_extractor() {
        let result = Cli::try_parse_from([
            "mosaicade",
            "create",
            "--target",
            "t.wav",
            "--corpus",
            "c/",
            "--output",
            "o.wav",
        ]);
        assert!(result.is_err());
    }
}
