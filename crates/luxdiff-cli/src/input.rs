//! Sample-document discovery and loading.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;

use luxdiff_desc::SceneSamples;

/// File suffix the external exporter writes scene sample dumps with.
pub const SAMPLES_SUFFIX: &str = ".samples.json";

/// Finds sample documents at `path`: the file itself, or every matching
/// file in the directory (recursively with `recurse`). Results are
/// sorted for stable processing order.
pub fn find_sample_docs(path: &Path, recurse: bool) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("path was not a file or directory: {}", path.display());
    }

    let max_depth = if recurse { usize::MAX } else { 1 };
    let mut docs: Vec<PathBuf> = WalkDir::new(path)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.ends_with(SAMPLES_SUFFIX))
        })
        .map(|entry| entry.into_path())
        .collect();
    docs.sort();
    Ok(docs)
}

/// Loads one scene document, defaulting its source to the file path when
/// the exporter left it blank.
pub fn load_scene(path: &Path) -> Result<SceneSamples> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sample document: {}", path.display()))?;
    let mut scene = SceneSamples::from_json(&json)
        .with_context(|| format!("failed to parse sample document: {}", path.display()))?;
    if scene.source.is_empty() {
        scene.source = path.display().to_string();
    }
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    const MINIMAL_SCENE: &str = r#"{
        "lights": {
            "sphere_light": {
                "attrs": {
                    "inputs:intensity": {"samples": {"1": 1.0, "2": 2.0}}
                }
            }
        }
    }"#;

    #[test]
    fn test_find_single_file() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = write(tmp.path(), "scene.samples.json", MINIMAL_SCENE);
        let found = find_sample_docs(&doc, false).unwrap();
        assert_eq!(found, vec![doc]);
    }

    #[test]
    fn test_find_in_directory_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let b = write(tmp.path(), "b.samples.json", MINIMAL_SCENE);
        let a = write(tmp.path(), "a.samples.json", MINIMAL_SCENE);
        write(tmp.path(), "notes.txt", "not a sample doc");
        let found = find_sample_docs(tmp.path(), false).unwrap();
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn test_find_recurse_flag() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let deep = write(&nested, "deep.samples.json", MINIMAL_SCENE);

        assert!(find_sample_docs(tmp.path(), false).unwrap().is_empty());
        assert_eq!(find_sample_docs(tmp.path(), true).unwrap(), vec![deep]);
    }

    #[test]
    fn test_find_missing_path_errors() {
        let err = find_sample_docs(Path::new("/no/such/path"), false).unwrap_err();
        assert!(err.to_string().contains("not a file or directory"));
    }

    #[test]
    fn test_load_scene_defaults_source() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = write(tmp.path(), "scene.samples.json", MINIMAL_SCENE);
        let scene = load_scene(&doc).unwrap();
        assert_eq!(scene.source, doc.display().to_string());
        assert!(scene.lights.contains_key("sphere_light"));
    }

    #[test]
    fn test_load_scene_bad_json() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = write(tmp.path(), "broken.samples.json", "{not json");
        let err = load_scene(&doc).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }
}
