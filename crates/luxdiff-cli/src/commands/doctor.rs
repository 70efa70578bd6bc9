//! Doctor command implementation
//!
//! Checks system dependencies and configuration.

use std::env;
use std::process::{Command, ExitCode};

use anyhow::Result;
use colored::Colorize;

use crate::oiio::{ImageTool, OIIOTOOL_ENV};

/// Run the doctor command
///
/// Checks:
/// - oiiotool availability (env override or PATH)
/// - git availability (needed for --fetch)
/// - Version information
/// - Working-directory write permissions
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run() -> Result<ExitCode> {
    println!("{}", "luxdiff Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    let mut all_ok = true;

    println!("{}", "Versions:".bold());
    println!("  {} luxdiff-cli v{}", "->".green(), env!("CARGO_PKG_VERSION"));
    match get_rustc_version() {
        Some(version) => println!("  {} rustc {}", "->".green(), version),
        None => println!("  {} rustc (not found)", "->".yellow()),
    }
    println!();

    println!("{}", "Dependencies:".bold());
    match ImageTool::locate(false) {
        Ok(tool) => {
            println!("  {} oiiotool ({})", "ok".green(), tool.exe().display());
        }
        Err(e) => {
            println!("  {} oiiotool not found: {}", "!!".red(), e);
            println!(
                "     {}",
                format!(
                    "oiiotool is required for image conversion; install OpenImageIO or set {}.",
                    OIIOTOOL_ENV
                )
                .dimmed()
            );
            all_ok = false;
        }
    }
    match get_git_version() {
        Some(version) => println!("  {} git {}", "ok".green(), version),
        None => {
            println!("  {} git not found in PATH", "!!".yellow());
            println!(
                "     {}",
                "git is only needed to fetch the render cache (--fetch).".dimmed()
            );
            // not a hard failure; renders may already be on disk
        }
    }
    println!();

    println!("{}", "Permissions:".bold());
    match env::current_dir() {
        Ok(dir) => {
            let test_file = dir.join(".luxdiff_write_test");
            match std::fs::write(&test_file, "test") {
                Ok(_) => {
                    let _ = std::fs::remove_file(&test_file);
                    println!(
                        "  {} Current directory is writable ({})",
                        "ok".green(),
                        dir.display()
                    );
                }
                Err(e) => {
                    println!("  {} Cannot write to current directory: {}", "!!".red(), e);
                    all_ok = false;
                }
            }
        }
        Err(e) => {
            println!("  {} Cannot determine current directory: {}", "!!".red(), e);
            all_ok = false;
        }
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

fn parse_version_word(output: &str, index: usize) -> Option<String> {
    output.split_whitespace().nth(index).map(|s| s.to_string())
}

/// Get the rustc version
fn get_rustc_version() -> Option<String> {
    let output = Command::new("rustc").arg("--version").output().ok()?;
    if output.status.success() {
        // "rustc 1.75.0 (...)"
        parse_version_word(&String::from_utf8_lossy(&output.stdout), 1)
    } else {
        None
    }
}

/// Get the git version
fn get_git_version() -> Option<String> {
    let output = Command::new("git").arg("--version").output().ok()?;
    if output.status.success() {
        // "git version 2.43.0"
        parse_version_word(&String::from_utf8_lossy(&output.stdout), 2)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_word() {
        assert_eq!(
            parse_version_word("rustc 1.75.0 (82e1608df 2023-12-21)", 1).as_deref(),
            Some("1.75.0")
        );
        assert_eq!(
            parse_version_word("git version 2.43.0", 2).as_deref(),
            Some("2.43.0")
        );
        assert_eq!(parse_version_word("rustc", 1), None);
    }
}
