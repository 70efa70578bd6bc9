//! Describe command implementation
//!
//! Generates the light-descriptions JSON document from exported scene
//! samples and prints per-light summaries.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use colored::Colorize;

use luxdiff_desc::{
    describe_scene, merge_descriptions, summarize_light, write_descriptions, Descriptions,
    ErrorsMode, GroupConfig, OUTPUT_JSON_NAME,
};

use crate::input::{find_sample_docs, load_scene};

/// Run the describe command
///
/// # Arguments
/// * `path` - A sample document, or a directory to search for them
/// * `recurse` - Whether to search sub-directories recursively
/// * `errors` - Per-light failure policy (abort or warn-and-continue)
/// * `output` - Output JSON path (default: `light_descriptions.json`)
///
/// # Returns
/// Exit code: 0 on success
pub fn run(path: &str, recurse: bool, errors: ErrorsMode, output: Option<&str>) -> Result<ExitCode> {
    let docs = find_sample_docs(Path::new(path), recurse)?;
    if docs.is_empty() {
        bail!("could not find any sample documents at path: {}", path);
    }

    let config = GroupConfig::default();
    let mut descriptions = Descriptions::new();
    let mut warnings = Vec::new();
    for doc in &docs {
        println!("{} {}", "Processing:".cyan().bold(), doc.display());
        let scene = load_scene(doc)?;
        let outcome = describe_scene(&scene, &config, errors)?;
        warnings.extend(outcome.warnings);
        merge_descriptions(&mut descriptions, outcome.descriptions)?;
    }

    for warning in &warnings {
        println!("{} {}", "WARNING:".yellow().bold(), warning);
    }

    println!("Got {} descriptions", descriptions.len());
    println!("{}", "=".repeat(80));
    for (light_name, description) in &descriptions {
        println!();
        println!("{}:", light_name.bold());
        println!(
            "{}",
            summarize_light(light_name, description, &config.override_groups)
        );
    }
    println!("{}", "=".repeat(80));

    let out_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(OUTPUT_JSON_NAME));
    println!();
    println!("{} {}", "Writing as json:".dimmed(), out_path.display());
    write_descriptions(&out_path, &descriptions)?;
    Ok(ExitCode::SUCCESS)
}
