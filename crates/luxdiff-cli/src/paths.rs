//! Render and report path bookkeeping.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// The reference renderer every other renderer is diffed against.
pub const REFERENCE_RENDERER: &str = "embree";

/// Renderers compared against the reference, in report column order.
pub const THIRD_PARTY_RENDERERS: [&str; 3] = ["karma", "ris", "arnold"];

/// Git repository holding the shared render cache.
pub const RENDERS_REPO_URL: &str = "https://github.com/pmolodo/luxtest_renders.git";

/// Subdirectory of the web root holding converted images.
pub const WEB_IMG_DIR_NAME: &str = "img";

/// Where rendered EXRs live and where the web report is assembled.
#[derive(Debug, Clone)]
pub struct ReportPaths {
    renders_root: PathBuf,
    web_root: PathBuf,
}

impl ReportPaths {
    pub fn new(renders_root: impl Into<PathBuf>, web_root: impl Into<PathBuf>) -> Self {
        Self {
            renders_root: renders_root.into(),
            web_root: web_root.into(),
        }
    }

    pub fn renders_root(&self) -> &Path {
        &self.renders_root
    }

    pub fn web_root(&self) -> &Path {
        &self.web_root
    }

    pub fn web_img_root(&self) -> PathBuf {
        self.web_root.join(WEB_IMG_DIR_NAME)
    }

    fn image_name(light: &str, renderer: &str, frame: i64, ext: &str, prefix: &str) -> String {
        format!("{}{}-{}.{:04}.{}", prefix, light, renderer, frame, ext)
    }

    /// Path of a rendered EXR frame.
    pub fn exr_path(&self, light: &str, renderer: &str, frame: i64) -> PathBuf {
        self.renders_root
            .join(renderer)
            .join(Self::image_name(light, renderer, frame, "exr", ""))
    }

    /// Path of a converted (or diff) PNG under the web image root.
    pub fn png_path(&self, light: &str, renderer: &str, frame: i64, prefix: &str) -> PathBuf {
        self.web_img_root()
            .join(Self::image_name(light, renderer, frame, "png", prefix))
    }

    /// URL of a PNG relative to the web root, always forward-slashed.
    pub fn png_url(&self, light: &str, renderer: &str, frame: i64, prefix: &str) -> String {
        format!(
            "{}/{}",
            WEB_IMG_DIR_NAME,
            Self::image_name(light, renderer, frame, "png", prefix)
        )
    }
}

/// Makes sure the renders root exists, cloning the render-cache
/// repository when allowed.
///
/// The clone is blob-filtered so only the commit graph downloads up
/// front; blobs stream in as files are checked out.
pub fn ensure_renders_root(root: &Path, fetch: bool) -> Result<()> {
    if root.is_dir() {
        return Ok(());
    }
    if !fetch {
        bail!(
            "renders root does not exist: {} (pass --fetch to clone {})",
            root.display(),
            RENDERS_REPO_URL
        );
    }
    let status = Command::new("git")
        .args(["clone", "--filter=blob:none", RENDERS_REPO_URL])
        .arg(root)
        .status()
        .context("failed to run git")?;
    if !status.success() || !root.is_dir() {
        bail!(
            "error cloning repo {:?} to {:?}",
            RENDERS_REPO_URL,
            root.display()
        );
    }
    Ok(())
}
