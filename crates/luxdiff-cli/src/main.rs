//! luxdiff CLI - light-parameter descriptions and render-diff reports
//!
//! This binary provides commands for generating light-parameter
//! description documents from exported scene samples, and for building
//! the render comparison report from cached renders.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use luxdiff_cli::commands;
use luxdiff_desc::{ErrorsMode, OUTPUT_JSON_NAME};

/// luxdiff - UsdLux render-regression comparison
#[derive(Parser)]
#[command(name = "luxdiff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the light-descriptions JSON from exported scene samples
    Describe {
        /// A *.samples.json document, or a directory to search for them
        #[arg(default_value = ".")]
        path: String,

        /// If PATH is a directory, search sub-directories recursively
        #[arg(short, long)]
        recurse: bool,

        /// How to handle per-light errors: 'raise' halts immediately,
        /// 'warn' records a warning and continues with other lights
        #[arg(short, long, default_value = "raise", value_parser = ["raise", "warn"])]
        errors: String,

        /// Output JSON path (default: light_descriptions.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Build the render comparison web page from cached renders
    Report {
        /// Path to the descriptions JSON written by `describe`
        #[arg(short, long, default_value = OUTPUT_JSON_NAME)]
        descriptions: String,

        /// Directory containing per-renderer EXR directories
        #[arg(long, default_value = "renders")]
        renders_root: String,

        /// Output directory for the page and converted images
        #[arg(long, default_value = "web")]
        web_root: String,

        /// Renderer to compare against the reference (repeatable)
        #[arg(long = "renderer")]
        renderers: Vec<String>,

        /// Maximum concurrent oiiotool processes (default: CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Clone the render-cache repository if the renders root is missing
        #[arg(long)]
        fetch: bool,

        /// Echo external commands and their output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Check system dependencies and configuration
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Describe {
            path,
            recurse,
            errors,
            output,
        } => {
            let errors = errors
                .parse::<ErrorsMode>()
                .expect("clap should have validated errors mode");
            commands::describe::run(&path, recurse, errors, output.as_deref())
        }
        Commands::Report {
            descriptions,
            renders_root,
            web_root,
            renderers,
            jobs,
            fetch,
            verbose,
        } => {
            let renderers = if renderers.is_empty() {
                luxdiff_cli::paths::THIRD_PARTY_RENDERERS
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            } else {
                renderers
            };
            commands::report::run(
                &descriptions,
                &renders_root,
                &web_root,
                &renderers,
                jobs,
                fetch,
                verbose,
            )
        }
        Commands::Doctor => commands::doctor::run(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_describe_defaults() {
        let cli = Cli::try_parse_from(["luxdiff", "describe"]).unwrap();
        match cli.command {
            Commands::Describe {
                path,
                recurse,
                errors,
                output,
            } => {
                assert_eq!(path, ".");
                assert!(!recurse);
                assert_eq!(errors, "raise");
                assert!(output.is_none());
            }
            _ => panic!("expected describe command"),
        }
    }

    #[test]
    fn test_cli_parses_describe_with_options() {
        let cli = Cli::try_parse_from([
            "luxdiff",
            "describe",
            "usd/",
            "--recurse",
            "--errors",
            "warn",
            "--output",
            "out.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Describe {
                path,
                recurse,
                errors,
                output,
            } => {
                assert_eq!(path, "usd/");
                assert!(recurse);
                assert_eq!(errors, "warn");
                assert_eq!(output.as_deref(), Some("out.json"));
            }
            _ => panic!("expected describe command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_errors_mode() {
        let err = Cli::try_parse_from(["luxdiff", "describe", "--errors", "ignore"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("ignore"));
    }

    #[test]
    fn test_cli_parses_report_defaults() {
        let cli = Cli::try_parse_from(["luxdiff", "report"]).unwrap();
        match cli.command {
            Commands::Report {
                descriptions,
                renders_root,
                web_root,
                renderers,
                jobs,
                fetch,
                verbose,
            } => {
                assert_eq!(descriptions, OUTPUT_JSON_NAME);
                assert_eq!(renders_root, "renders");
                assert_eq!(web_root, "web");
                assert!(renderers.is_empty());
                assert!(jobs.is_none());
                assert!(!fetch);
                assert!(!verbose);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_cli_parses_report_renderers_repeatable() {
        let cli = Cli::try_parse_from([
            "luxdiff",
            "report",
            "--renderer",
            "karma",
            "--renderer",
            "arnold",
            "--jobs",
            "4",
            "--fetch",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                renderers,
                jobs,
                fetch,
                ..
            } => {
                assert_eq!(renderers, vec!["karma", "arnold"]);
                assert_eq!(jobs, Some(4));
                assert!(fetch);
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_cli_parses_doctor() {
        let cli = Cli::try_parse_from(["luxdiff", "doctor"]).unwrap();
        assert!(matches!(cli.command, Commands::Doctor));
    }
}
