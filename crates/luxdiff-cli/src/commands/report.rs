//! Report command implementation
//!
//! Converts rendered EXRs to web PNGs, produces per-renderer difference
//! heat maps against the reference renderer, and assembles the static
//! HTML comparison page.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use luxdiff_desc::{
    group_summaries, read_descriptions, Descriptions, GroupConfig, LightDescription,
};

use crate::oiio::ImageTool;
use crate::paths::{ensure_renders_root, ReportPaths, REFERENCE_RENDERER};

/// File name of the assembled report page.
const HTML_NAME: &str = "index.html";

/// File name of the report stylesheet.
const CSS_NAME: &str = "luxdiff.css";

const HTML_START: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>UsdLux Comparison</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Comparison of hydra delegates to the hdEmbree UsdLux reference">
    <link rel="stylesheet" href="luxdiff.css">
  </head>
  <body>
"#;

const HTML_END: &str = "  </body>\n</html>\n";

const CSS: &str = r#"body {
  font-family: sans-serif;
  background: #1d1d1d;
  color: #e8e8e8;
}
table {
  border-collapse: collapse;
}
td {
  padding: 2px 4px;
  text-align: center;
}
img {
  display: block;
  max-width: 200px;
}
em {
  color: #9fc6ff;
}
"#;

/// One pending oiiotool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageJob {
    /// Convert a rendered EXR to a web PNG.
    Convert { exr: PathBuf, png: PathBuf },
    /// Diff a renderer's EXR against the reference EXR.
    Diff {
        reference: PathBuf,
        render: PathBuf,
        out: PathBuf,
    },
}

/// Flattens the descriptions into every conversion and diff the report
/// needs, in light/frame order.
pub fn build_jobs(
    paths: &ReportPaths,
    descriptions: &Descriptions,
    renderers: &[String],
) -> Vec<ImageJob> {
    let mut jobs = Vec::new();
    for (light, description) in descriptions {
        for frame in description.frames.iter_frames() {
            let reference_exr = paths.exr_path(light, REFERENCE_RENDERER, frame);
            jobs.push(ImageJob::Convert {
                exr: reference_exr.clone(),
                png: paths.png_path(light, REFERENCE_RENDERER, frame, ""),
            });
            for renderer in renderers {
                let renderer_exr = paths.exr_path(light, renderer, frame);
                jobs.push(ImageJob::Convert {
                    exr: renderer_exr.clone(),
                    png: paths.png_path(light, renderer, frame, ""),
                });
                jobs.push(ImageJob::Diff {
                    reference: reference_exr.clone(),
                    render: renderer_exr,
                    out: paths.png_path(light, renderer, frame, "diff-"),
                });
            }
        }
    }
    jobs
}

/// Runs the jobs under a bounded-concurrency semaphore, returning how
/// many images were actually (re)generated.
async fn run_jobs(tool: ImageTool, jobs: Vec<ImageJob>, limit: usize) -> Result<usize> {
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let progress = ProgressBar::new(jobs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{wide_bar} {pos}/{len} {msg}")
            .expect("invalid progress template"),
    );

    let mut set = JoinSet::new();
    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let tool = tool.clone();
        let progress = progress.clone();
        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore never closed");
            let updated = match &job {
                ImageJob::Convert { exr, png } => tool.update_png(exr, png).await,
                ImageJob::Diff {
                    reference,
                    render,
                    out,
                } => tool.update_diff(reference, render, out).await,
            };
            progress.inc(1);
            updated
        });
    }

    let mut updated = 0usize;
    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined.context("image task panicked")? {
            Ok(true) => updated += 1,
            Ok(false) => {}
            Err(err) => errors.push(err),
        }
    }
    progress.finish_and_clear();

    if !errors.is_empty() {
        for err in &errors {
            eprintln!("{} {:#}", "error:".red(), err);
        }
        bail!("{} image job(s) failed", errors.len());
    }
    Ok(updated)
}

fn push_light_table(
    html: &mut String,
    paths: &ReportPaths,
    config: &GroupConfig,
    light: &str,
    description: &LightDescription,
    renderers: &[String],
) {
    let summaries = group_summaries(light, description, &config.override_groups);

    write!(html, "<h1>{}</h1>\n\n<table>\n<tr>\n", light).expect("write to string");
    html.push_str("  <td>Frame</td>\n  <td>Ref</td>\n");
    for renderer in renderers {
        write!(html, "  <td>{}</td>\n  <td>{} diff</td>\n", renderer, renderer)
            .expect("write to string");
    }
    html.push_str("</tr>\n");

    for frame in description.frames.iter_frames() {
        if let Some(summary) = summaries.get(&frame) {
            html.push_str("  <tr></tr>\n  <tr>\n");
            write!(
                html,
                "    <td></td><td colspan='{}'><em>{}</em></td>\n  </tr>\n",
                renderers.len() * 2 + 1,
                summary
            )
            .expect("write to string");
        }

        html.push_str("  <tr>\n");
        write!(html, "    <td>{:04}</td>\n", frame).expect("write to string");
        write!(
            html,
            "    <td><img src=\"{}\"></td>\n",
            paths.png_url(light, REFERENCE_RENDERER, frame, "")
        )
        .expect("write to string");
        for renderer in renderers {
            write!(
                html,
                "    <td><img src=\"{}\"></td>\n    <td><img src=\"{}\"></td>\n",
                paths.png_url(light, renderer, frame, ""),
                paths.png_url(light, renderer, frame, "diff-")
            )
            .expect("write to string");
        }
        html.push_str("  </tr>\n");
    }
    html.push_str("</table>\n");
}

/// Assembles and writes the HTML page and stylesheet, returning the page
/// path.
pub fn gen_html(
    paths: &ReportPaths,
    config: &GroupConfig,
    descriptions: &Descriptions,
    renderers: &[String],
) -> Result<PathBuf> {
    let mut html = String::from(HTML_START);
    for (light, description) in descriptions {
        push_light_table(&mut html, paths, config, light, description, renderers);
    }
    html.push_str(HTML_END);

    let html_path = paths.web_root().join(HTML_NAME);
    std::fs::write(&html_path, html)
        .with_context(|| format!("failed to write {}", html_path.display()))?;
    std::fs::write(paths.web_root().join(CSS_NAME), CSS)?;
    Ok(html_path)
}

/// Run the report command
///
/// # Arguments
/// * `descriptions_path` - The descriptions JSON written by `describe`
/// * `renders_root` - Directory of per-renderer EXR directories
/// * `web_root` - Output directory for the page and images
/// * `renderers` - Renderers to compare against the reference
/// * `jobs` - Concurrent oiiotool process limit (default: CPU count)
/// * `fetch` - Clone the render-cache repository if `renders_root` is missing
/// * `verbose` - Echo every external command and its output
///
/// # Returns
/// Exit code: 0 on success
pub fn run(
    descriptions_path: &str,
    renders_root: &str,
    web_root: &str,
    renderers: &[String],
    jobs: Option<usize>,
    fetch: bool,
    verbose: bool,
) -> Result<ExitCode> {
    let start = Instant::now();

    let descriptions = read_descriptions(Path::new(descriptions_path))
        .with_context(|| format!("failed to read descriptions: {}", descriptions_path))?;
    let paths = ReportPaths::new(renders_root, web_root);
    ensure_renders_root(paths.renders_root(), fetch)?;
    std::fs::create_dir_all(paths.web_img_root())?;

    let tool = ImageTool::locate(verbose)?;
    let limit = jobs.unwrap_or_else(num_cpus::get);
    let job_list = build_jobs(&paths, &descriptions, renderers);
    println!(
        "Generating {} images ({} concurrent jobs):",
        job_list.len(),
        limit
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    let updated = runtime.block_on(run_jobs(tool, job_list, limit))?;
    println!("Updated {} images", updated);

    let config = GroupConfig::default();
    let html_path = gen_html(&paths, &config, &descriptions, renderers)?;
    println!("{} {}", "Report written to:".dimmed(), html_path.display());

    println!(
        "{} Done generating report - took: {:.1?}",
        "SUCCESS".green().bold(),
        start.elapsed()
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use luxdiff_desc::{FrameGroup, FrameRange, Value};
    use std::collections::BTreeMap;

    fn renderers() -> Vec<String> {
        vec!["karma".to_string(), "ris".to_string()]
    }

    fn small_descriptions() -> Descriptions {
        let mut varying = BTreeMap::new();
        varying.insert(
            "inputs:intensity".to_string(),
            BTreeMap::from([(1, Value::Float(1.0)), (2, Value::Float(2.0))]),
        );
        let description = LightDescription {
            frames: FrameRange(1, 2),
            attrs: vec!["inputs:intensity".to_string()],
            frame_groups: vec![FrameGroup {
                frames: FrameRange(1, 2),
                varying,
                non_default_constants: BTreeMap::new(),
            }],
            usd_path: "usd/sphere.usda".to_string(),
        };
        BTreeMap::from([("sphere".to_string(), description)])
    }

    #[test]
    fn test_build_jobs_counts() {
        let paths = ReportPaths::new("/renders", "/web");
        let jobs = build_jobs(&paths, &small_descriptions(), &renderers());
        // per frame: 1 ref convert + per renderer (convert + diff) = 5; 2 frames
        assert_eq!(jobs.len(), 10);
        assert!(matches!(&jobs[0], ImageJob::Convert { png, .. }
            if png.ends_with("sphere-embree.0001.png")));
        assert!(matches!(&jobs[2], ImageJob::Diff { out, .. }
            if out.ends_with("diff-sphere-karma.0001.png")));
    }

    #[test]
    fn test_gen_html_page() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ReportPaths::new(tmp.path().join("renders"), tmp.path());
        let config = GroupConfig::default();

        let html_path = gen_html(&paths, &config, &small_descriptions(), &renderers()).unwrap();
        let html = std::fs::read_to_string(&html_path).unwrap();

        assert!(html.contains("<h1>sphere</h1>"));
        assert!(html.contains("img/sphere-embree.0001.png"));
        assert!(html.contains("img/diff-sphere-ris.0002.png"));
        // the group summary row precedes frame 1
        assert!(html.contains("<em>1-2: intensity from 1 to 2</em>"));
        assert!(tmp.path().join(CSS_NAME).is_file());
    }

    #[test]
    fn test_run_jobs_empty_list() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let tool = ImageTool::at("oiiotool-not-called", false);
        let updated = runtime.block_on(run_jobs(tool, Vec::new(), 4)).unwrap();
        assert_eq!(updated, 0);
    }
}
