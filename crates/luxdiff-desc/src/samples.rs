//! Time-sampled scene input.
//!
//! The grouping core never touches a scene file itself: an external
//! exporter walks the stage and dumps each light's authored, time-sampled
//! attributes into a `*.samples.json` document. These types are that
//! contract.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::DescribeError;
use crate::frame::FrameRange;
use crate::value::Value;

/// Suffix every light prim name must carry; stripped for reporting.
pub const LIGHT_NAME_SUFFIX: &str = "_light";

/// Attribute namespace that is tool-internal and never considered.
const HOUDINI_NAMESPACE: &str = "houdini";

/// Attribute that is derived bookkeeping, never an input parameter.
const EXTENT_ATTR: &str = "extent";

const LIGHT_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*_light$";

static LIGHT_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn light_name_regex() -> &'static Regex {
    LIGHT_NAME_REGEX.get_or_init(|| Regex::new(LIGHT_NAME_PATTERN).expect("invalid regex pattern"))
}

/// Strips the `_light` suffix from a prim name, validating its shape.
pub fn strip_light_name(name: &str) -> Result<&str, DescribeError> {
    if !light_name_regex().is_match(name) {
        return Err(DescribeError::BadLightName {
            name: name.to_string(),
            suffix: LIGHT_NAME_SUFFIX,
        });
    }
    Ok(&name[..name.len() - LIGHT_NAME_SUFFIX.len()])
}

/// One attribute's time samples, plus what the schema says about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrSamples {
    /// Declared value type (e.g. `float`, `color3f`, `matrix4d`, `asset`),
    /// used only for fallback-default resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Schema-declared default, when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Authored time samples, keyed by frame.
    pub samples: BTreeMap<i64, Value>,
}

impl AttrSamples {
    /// Value at `frame` with held interpolation: the sample at the
    /// greatest key at or before `frame`, else the first sample.
    pub fn value_at(&self, frame: i64) -> Option<&Value> {
        self.samples
            .range(..=frame)
            .next_back()
            .or_else(|| self.samples.iter().next())
            .map(|(_, v)| v)
    }

    /// An attribute is animated once it carries more than one sample.
    pub fn is_animated(&self) -> bool {
        self.samples.len() > 1
    }

    /// First and last sampled frames, if any samples exist.
    pub fn sampled_range(&self) -> Option<FrameRange> {
        let first = *self.samples.keys().next()?;
        let last = *self.samples.keys().next_back()?;
        Some(FrameRange(first, last))
    }
}

/// All sampled attributes of one light.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightSamples {
    pub attrs: BTreeMap<String, AttrSamples>,
}

impl LightSamples {
    /// Names of the attributes worth grouping: animated, outside the
    /// tool-internal namespace, and not derived bookkeeping. Sorted.
    pub fn animated_attr_names(&self) -> Vec<String> {
        self.attrs
            .iter()
            .filter(|(name, samples)| {
                let namespace = name.split(':').next().unwrap_or("");
                namespace != HOUDINI_NAMESPACE && name.as_str() != EXTENT_ATTR && samples.is_animated()
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Union of the selected attributes' sampled ranges, widened to whole
    /// frames. Renders happen at fixed frames, not at sample times, so
    /// the range is iterated frame by frame.
    pub fn unioned_frame_range(&self, attr_names: &[String]) -> Option<FrameRange> {
        let mut range: Option<FrameRange> = None;
        for name in attr_names {
            let sampled = self.attrs.get(name)?.sampled_range()?;
            range = Some(match range {
                None => sampled,
                Some(r) => FrameRange(r.0.min(sampled.0), r.1.max(sampled.1)),
            });
        }
        range
    }
}

/// A whole sampled scene: every light in one exported document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneSamples {
    /// Identifier of the scene the samples came from, usually the scene
    /// file path.
    #[serde(default)]
    pub source: String,

    /// Lights keyed by prim name (with the `_light` suffix).
    pub lights: BTreeMap<String, LightSamples>,
}

impl SceneSamples {
    /// Parses a scene document from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serializes the scene document to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
