//! Per-light description records.
//!
//! A [`LightDescription`] is the persisted unit consumed by the report
//! generator: the light's frame range, its interesting attributes, and
//! the inferred frame groups.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DescribeError, DescribeWarning, GroupError};
use crate::frame::FrameRange;
use crate::group::{FrameGroup, FrameGroupFinder, GroupConfig};
use crate::samples::{strip_light_name, LightSamples, SceneSamples};

/// Default file name for the persisted descriptions document.
pub const OUTPUT_JSON_NAME: &str = "light_descriptions.json";

/// Attribute namespace for transform ops; these are commonly authored to
/// non-default values yet uninteresting unless actually animated.
const XFORM_OP_NAMESPACE: &str = "xformOp:";

/// How per-light failures are handled while describing a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorsMode {
    /// Any error immediately halts processing.
    #[default]
    Raise,
    /// Record a warning and continue with the remaining lights.
    Warn,
}

impl ErrorsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorsMode::Raise => "raise",
            ErrorsMode::Warn => "warn",
        }
    }
}

impl FromStr for ErrorsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raise" => Ok(ErrorsMode::Raise),
            "warn" => Ok(ErrorsMode::Warn),
            _ => Err(format!("unknown errors mode: {}", s)),
        }
    }
}

/// Everything the report generator needs to know about one light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightDescription {
    /// Covered frame range. Lights with no animated attributes collapse
    /// to the single frame 1.
    pub frames: FrameRange,
    /// Attribute names considered for this light, sorted.
    pub attrs: Vec<String>,
    /// Inferred groups in frame order.
    pub frame_groups: Vec<FrameGroup>,
    /// Scene file the light was described from.
    #[serde(default)]
    pub usd_path: String,
}

/// Descriptions for every light, keyed by stripped light name.
pub type Descriptions = BTreeMap<String, LightDescription>;

/// The result of describing a scene: the descriptions plus any per-light
/// warnings recorded under [`ErrorsMode::Warn`].
#[derive(Debug, Default)]
pub struct DescribeOutcome {
    pub descriptions: Descriptions,
    pub warnings: Vec<DescribeWarning>,
}

/// Describes a single light from its sampled attributes.
pub fn describe_light(
    light_name: &str,
    light: &LightSamples,
    config: &GroupConfig,
) -> Result<LightDescription, GroupError> {
    let mut attr_names = light.animated_attr_names();
    let Some(range) = light.unioned_frame_range(&attr_names) else {
        return Ok(LightDescription {
            frames: FrameRange::single(1),
            attrs: Vec::new(),
            frame_groups: Vec::new(),
            usd_path: String::new(),
        });
    };
    let frames: Vec<i64> = range.iter_frames().collect();

    let mut frame_groups =
        FrameGroupFinder::find(light_name, &attr_names, &frames, light, config)?;

    // Transform ops are commonly non-default and uninteresting; drop them
    // from the constants output unless they actually vary somewhere.
    let mut all_varying: BTreeSet<String> = BTreeSet::new();
    let mut removed: BTreeSet<String> = BTreeSet::new();
    for group in &mut frame_groups {
        all_varying.extend(group.varying.keys().cloned());
        let xform_consts: Vec<String> = group
            .non_default_constants
            .keys()
            .filter(|name| name.starts_with(XFORM_OP_NAMESPACE))
            .cloned()
            .collect();
        for name in xform_consts {
            group.non_default_constants.remove(&name);
            removed.insert(name);
        }
    }
    let dropped: BTreeSet<String> = removed.difference(&all_varying).cloned().collect();
    if !dropped.is_empty() {
        attr_names.retain(|name| !dropped.contains(name));
    }

    Ok(LightDescription {
        frames: range,
        attrs: attr_names,
        frame_groups,
        usd_path: String::new(),
    })
}

/// Describes every light in a sampled scene.
///
/// Per-light failures either abort ([`ErrorsMode::Raise`]) or become
/// warnings in the outcome ([`ErrorsMode::Warn`]), always carrying the
/// light name and scene path for context.
pub fn describe_scene(
    scene: &SceneSamples,
    config: &GroupConfig,
    errors: ErrorsMode,
) -> Result<DescribeOutcome, DescribeError> {
    if scene.lights.is_empty() {
        return Err(DescribeError::NoLights(scene.source.clone()));
    }

    let mut outcome = DescribeOutcome::default();
    for (prim_name, light) in &scene.lights {
        let described = strip_light_name(prim_name).map_err(|err| (prim_name.as_str(), err)).and_then(
            |light_name| {
                describe_light(light_name, light, config)
                    .map(|desc| (light_name, desc))
                    .map_err(|err| {
                        (
                            light_name,
                            DescribeError::Light {
                                light: light_name.to_string(),
                                source: err,
                            },
                        )
                    })
            },
        );
        match described {
            Ok((light_name, mut desc)) => {
                desc.usd_path = scene.source.clone();
                if outcome
                    .descriptions
                    .insert(light_name.to_string(), desc)
                    .is_some()
                {
                    return Err(DescribeError::DuplicateLight(light_name.to_string()));
                }
            }
            Err((light_name, err)) => match errors {
                ErrorsMode::Raise => return Err(err),
                ErrorsMode::Warn => outcome.warnings.push(DescribeWarning {
                    light: light_name.to_string(),
                    source: scene.source.clone(),
                    message: err.to_string(),
                }),
            },
        }
    }
    Ok(outcome)
}

/// Merges one scene's descriptions into an accumulated document,
/// rejecting lights that appear in more than one scene.
pub fn merge_descriptions(
    all: &mut Descriptions,
    scene_descriptions: Descriptions,
) -> Result<(), DescribeError> {
    for (name, desc) in scene_descriptions {
        if all.insert(name.clone(), desc).is_some() {
            return Err(DescribeError::DuplicateLight(name));
        }
    }
    Ok(())
}

/// Reads a persisted descriptions document.
pub fn read_descriptions(path: &Path) -> Result<Descriptions, DescribeError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Writes a descriptions document as pretty-printed JSON with stable key
/// ordering.
pub fn write_descriptions(path: &Path, descriptions: &Descriptions) -> Result<(), DescribeError> {
    let json = serde_json::to_string_pretty(descriptions)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::AttrSamples;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn attr(samples: &[(i64, Value)]) -> AttrSamples {
        AttrSamples {
            type_name: None,
            default: None,
            samples: samples.iter().cloned().collect(),
        }
    }

    fn floats(vals: &[(i64, f64)]) -> Vec<(i64, Value)> {
        vals.iter().map(|(f, v)| (*f, Value::Float(*v))).collect()
    }

    fn scene_with(lights: &[(&str, LightSamples)]) -> SceneSamples {
        SceneSamples {
            source: "usd/test.usda".to_string(),
            lights: lights
                .iter()
                .map(|(name, light)| (name.to_string(), light.clone()))
                .collect(),
        }
    }

    fn simple_light() -> LightSamples {
        let mut light = LightSamples::default();
        light.attrs.insert(
            "inputs:intensity".to_string(),
            attr(&floats(&[(1, 1.0), (2, 2.0), (3, 3.0)])),
        );
        light
    }

    #[test]
    fn test_describe_light_basic() {
        let desc = describe_light("sphere", &simple_light(), &GroupConfig::bare()).unwrap();
        assert_eq!(desc.frames, FrameRange(1, 3));
        assert_eq!(desc.attrs, vec!["inputs:intensity".to_string()]);
        assert_eq!(desc.frame_groups.len(), 1);
        assert!(desc.frame_groups[0].varying.contains_key("inputs:intensity"));
    }

    #[test]
    fn test_describe_light_without_animation() {
        let mut light = LightSamples::default();
        light
            .attrs
            .insert("inputs:exposure".to_string(), attr(&floats(&[(1, 3.5)])));
        let desc = describe_light("rect", &light, &GroupConfig::bare()).unwrap();
        assert_eq!(desc.frames, FrameRange::single(1));
        assert!(desc.attrs.is_empty());
        assert!(desc.frame_groups.is_empty());
    }

    #[test]
    fn test_describe_light_drops_unvarying_xform_constants() {
        let mut light = simple_light();
        // animated but never moving once grouped: classified constant
        light.attrs.insert(
            "xformOp:translate".to_string(),
            attr(&floats(&[(1, 4.0), (3, 4.0)])),
        );
        let desc = describe_light("sphere", &light, &GroupConfig::bare()).unwrap();

        assert_eq!(desc.attrs, vec!["inputs:intensity".to_string()]);
        for group in &desc.frame_groups {
            assert!(!group.non_default_constants.contains_key("xformOp:translate"));
        }
    }

    #[test]
    fn test_describe_light_keeps_varying_xform() {
        let mut light = LightSamples::default();
        light.attrs.insert(
            "xformOp:rotateX".to_string(),
            attr(&floats(&[(1, 0.0), (2, 40.0), (3, 80.0)])),
        );
        let desc = describe_light("distant", &light, &GroupConfig::bare()).unwrap();
        assert_eq!(desc.attrs, vec!["xformOp:rotateX".to_string()]);
        assert!(desc.frame_groups[0].varying.contains_key("xformOp:rotateX"));
    }

    #[test]
    fn test_describe_scene_sets_path_and_strips_names() {
        let scene = scene_with(&[("sphere_light", simple_light())]);
        let outcome = describe_scene(&scene, &GroupConfig::bare(), ErrorsMode::Raise).unwrap();
        assert!(outcome.warnings.is_empty());
        let desc = &outcome.descriptions["sphere"];
        assert_eq!(desc.usd_path, "usd/test.usda");
    }

    #[test]
    fn test_describe_scene_empty_is_error() {
        let scene = SceneSamples {
            source: "usd/empty.usda".to_string(),
            lights: BTreeMap::new(),
        };
        let err = describe_scene(&scene, &GroupConfig::bare(), ErrorsMode::Raise).unwrap_err();
        assert!(matches!(err, DescribeError::NoLights(_)));
    }

    #[test]
    fn test_describe_scene_bad_name_raise_vs_warn() {
        let scene = scene_with(&[("sphere", simple_light())]);

        let err = describe_scene(&scene, &GroupConfig::bare(), ErrorsMode::Raise).unwrap_err();
        assert!(matches!(err, DescribeError::BadLightName { .. }));

        let outcome = describe_scene(&scene, &GroupConfig::bare(), ErrorsMode::Warn).unwrap();
        assert!(outcome.descriptions.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].source, "usd/test.usda");
    }

    #[test]
    fn test_merge_rejects_duplicate_lights() {
        let scene = scene_with(&[("sphere_light", simple_light())]);
        let config = GroupConfig::bare();
        let first = describe_scene(&scene, &config, ErrorsMode::Raise).unwrap();
        let second = describe_scene(&scene, &config, ErrorsMode::Raise).unwrap();

        let mut all = Descriptions::new();
        merge_descriptions(&mut all, first.descriptions).unwrap();
        let err = merge_descriptions(&mut all, second.descriptions).unwrap_err();
        assert!(matches!(err, DescribeError::DuplicateLight(name) if name == "sphere"));
    }

    #[test]
    fn test_descriptions_file_round_trip() {
        let scene = scene_with(&[("sphere_light", simple_light())]);
        let outcome = describe_scene(&scene, &GroupConfig::bare(), ErrorsMode::Raise).unwrap();

        let dir = std::env::temp_dir().join("luxdiff-desc-round-trip");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(OUTPUT_JSON_NAME);
        write_descriptions(&path, &outcome.descriptions).unwrap();
        let back = read_descriptions(&path).unwrap();
        assert_eq!(outcome.descriptions, back);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_errors_mode_from_str() {
        assert_eq!("raise".parse::<ErrorsMode>().unwrap(), ErrorsMode::Raise);
        assert_eq!("warn".parse::<ErrorsMode>().unwrap(), ErrorsMode::Warn);
        assert!("ignore".parse::<ErrorsMode>().is_err());
    }
}
