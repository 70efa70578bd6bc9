//! oiiotool invocation: EXR -> PNG conversion and diff heat maps.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{bail, Context, Result};
use tokio::process::Command;

/// Environment variable overriding the oiiotool executable.
pub const OIIOTOOL_ENV: &str = "LUXDIFF_OIIOTOOL";

/// Default executable name when no override is set.
pub const OIIOTOOL_DEFAULT: &str = "oiiotool";

/// Colormap applied to difference images.
const DIFF_COLORMAP: &str = "magma";

/// Handle on a located oiiotool executable.
#[derive(Debug, Clone)]
pub struct ImageTool {
    exe: PathBuf,
    verbose: bool,
}

impl ImageTool {
    /// Locates oiiotool: the `LUXDIFF_OIIOTOOL` env var if set, else a
    /// PATH lookup.
    pub fn locate(verbose: bool) -> Result<Self> {
        let exe = match std::env::var_os(OIIOTOOL_ENV) {
            Some(exe) => PathBuf::from(exe),
            None => which::which(OIIOTOOL_DEFAULT)
                .with_context(|| format!("could not find {} on PATH", OIIOTOOL_DEFAULT))?,
        };
        Ok(Self { exe, verbose })
    }

    /// Creates a tool handle for a known executable path.
    pub fn at(exe: impl Into<PathBuf>, verbose: bool) -> Self {
        Self {
            exe: exe.into(),
            verbose,
        }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    async fn run(&self, args: &[String], check: bool) -> Result<Output> {
        if self.verbose {
            println!("Running: {} {}", self.exe.display(), args.join(" "));
        }
        let output = Command::new(&self.exe)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to spawn {}", self.exe.display()))?;
        if self.verbose || (check && !output.status.success()) {
            print_streams(&output);
        }
        if check && !output.status.success() {
            bail!(
                "error running command: {} {} (exit code {:?})",
                self.exe.display(),
                args.join(" "),
                output.status.code()
            );
        }
        Ok(output)
    }

    /// Converts an EXR to an sRGB PNG, skipping when already up to date.
    /// Returns true when a conversion actually ran.
    pub async fn update_png(&self, exr_path: &Path, png_path: &Path) -> Result<bool> {
        if !needs_update(exr_path, png_path) {
            return Ok(false);
        }
        let args = png_args(exr_path, png_path);
        self.run(&args, true).await?;
        if !png_path.is_file() {
            bail!("output png did not exist: {}", png_path.display());
        }
        Ok(true)
    }

    /// Produces an amplified absolute-difference heat map of two EXRs,
    /// skipping when already up to date. Returns true when a conversion
    /// actually ran.
    ///
    /// oiiotool's `--diff` exits non-zero when the images differ, which
    /// is the expected case here, so the exit status is not checked; a
    /// missing output file is.
    pub async fn update_diff(
        &self,
        exr_path1: &Path,
        exr_path2: &Path,
        diff_path: &Path,
    ) -> Result<bool> {
        if !needs_update(exr_path1, diff_path) && !needs_update(exr_path2, diff_path) {
            return Ok(false);
        }
        let args = diff_args(exr_path1, exr_path2, diff_path);
        let output = self.run(&args, false).await?;
        if !diff_path.is_file() {
            print_streams(&output);
            bail!("output diff png did not exist: {}", diff_path.display());
        }
        Ok(true)
    }
}

fn print_streams(output: &Output) {
    for (name, bytes) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        println!("{}", "=".repeat(80));
        println!("{}:", name);
        println!();
        println!("{}", String::from_utf8_lossy(bytes));
    }
}

/// True when `dependent` is missing or older than `existing`.
pub fn needs_update(existing: &Path, dependent: &Path) -> bool {
    let Ok(dependent_meta) = dependent.metadata() else {
        return true;
    };
    let Ok(existing_meta) = existing.metadata() else {
        // missing input; let the tool invocation report it loudly
        return true;
    };
    match (existing_meta.modified(), dependent_meta.modified()) {
        (Ok(existing_mtime), Ok(dependent_mtime)) => existing_mtime > dependent_mtime,
        _ => true,
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Arguments converting one EXR to an sRGB PNG.
pub fn png_args(exr_path: &Path, png_path: &Path) -> Vec<String> {
    vec![
        path_arg(exr_path),
        "--ch".to_string(),
        "R,G,B".to_string(),
        "--colorconvert".to_string(),
        "linear".to_string(),
        "sRGB".to_string(),
        "-o".to_string(),
        path_arg(png_path),
    ]
}

/// Arguments producing the amplified absolute-difference heat map.
pub fn diff_args(exr_path1: &Path, exr_path2: &Path, diff_path: &Path) -> Vec<String> {
    vec![
        path_arg(exr_path1),
        path_arg(exr_path2),
        "--diff".to_string(),
        "--absdiff".to_string(),
        "--mulc".to_string(),
        "2,2,2,1".to_string(),
        "--colormap".to_string(),
        DIFF_COLORMAP.to_string(),
        "--colorconvert".to_string(),
        "linear".to_string(),
        "sRGB".to_string(),
        "-o".to_string(),
        path_arg(diff_path),
    ]
}
