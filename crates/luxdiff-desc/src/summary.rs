//! Human-readable one-line-per-group summaries.
//!
//! `"11-20: cone angle from 90 to 10 (exposure=3.5)"` -- terse enough to
//! sit above a row of render thumbnails.

use std::collections::{BTreeMap, BTreeSet};

use crate::describe::LightDescription;
use crate::frame::FrameRange;
use crate::group::{FrameGroup, OverrideGroups};
use crate::value::{Tolerance, Value};

/// Exact-match color names for 3-vector values.
const COLOR_NAMES: &[([f64; 3], &str)] = &[
    ([0.0, 0.0, 0.0], "black"),
    ([1.0, 1.0, 1.0], "white"),
    ([1.0, 0.0, 0.0], "red"),
    ([0.0, 1.0, 0.0], "green"),
    ([0.0, 0.0, 1.0], "blue"),
    ([1.0, 1.0, 0.0], "yellow"),
    ([1.0, 0.0, 1.0], "magenta"),
    ([0.0, 1.0, 1.0], "cyan"),
    ([0.5, 0.5, 0.5], "grey"),
];

/// Looks up a color name for a numeric 3-vector.
fn color_name(val: &Value) -> Option<&'static str> {
    let flat = val.flatten_numeric()?;
    let rgb: [f64; 3] = flat.try_into().ok()?;
    let tol = Tolerance::default();
    COLOR_NAMES
        .iter()
        .find(|(named, _)| {
            named.iter().zip(rgb.iter()).all(|(a, b)| tol.isclose(*a, *b))
        })
        .map(|(_, name)| *name)
}

/// Strips the `inputs:` and `shaping:` namespace prefixes for display.
pub fn format_attr(attr_name: &str) -> String {
    let mut parts: Vec<&str> = attr_name.split(':').collect();
    if parts.first() == Some(&"inputs") {
        parts.remove(0);
    }
    if parts.first() == Some(&"shaping") {
        parts.remove(0);
    }
    parts.join(":")
}

/// Renders a value for summary text.
///
/// Floats collapse to integers when close; booleans read on/off (shorter
/// than true/false); strings lose leading `./`/`../` components; numeric
/// 3-vectors go through the color-name table.
pub fn format_val(val: &Value) -> String {
    match val {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            let truncated = f.trunc();
            if Tolerance::default().isclose(*f, truncated) {
                format!("{}", truncated as i64)
            } else {
                let s = format!("{:.1}", f);
                s.trim_start_matches('0').to_string()
            }
        }
        Value::Bool(b) => {
            if *b {
                "on".to_string()
            } else {
                "off".to_string()
            }
        }
        Value::Text(s) => {
            let mut parts: Vec<&str> = s.split('/').collect();
            while matches!(parts.first(), Some(&".") | Some(&"..")) {
                parts.remove(0);
            }
            format!("'{}'", parts.join("/"))
        }
        Value::Sequence(items) => {
            if let Some(name) = color_name(val) {
                return name.to_string();
            }
            let inner: Vec<String> = items.iter().map(format_val).collect();
            format!("({})", inner.join(", "))
        }
        Value::Mapping(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{}: {}", key, format_val(value)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

/// Builds the summary line body for one group (everything after the
/// frame prefix).
fn group_body(group: &FrameGroup) -> String {
    if group.varying.is_empty() {
        return "(constant)".to_string();
    }

    let varying_descs: Vec<String> = group
        .varying
        .iter()
        .filter_map(|(attr, vals)| {
            let first = vals.values().next()?;
            let last = vals.values().next_back()?;
            Some(format!(
                "{} from {} to {}",
                format_attr(attr),
                format_val(first),
                format_val(last)
            ))
        })
        .collect();

    let mut body = varying_descs.join(", ");
    if !group.non_default_constants.is_empty() {
        let constant_descs: Vec<String> = group
            .non_default_constants
            .iter()
            .map(|(name, val)| format!("{}={}", format_attr(name), format_val(val)))
            .collect();
        body.push_str(&format!(" ({})", constant_descs.join(", ")));
    }
    body
}

/// Per-group summary lines for a light, keyed by start frame.
///
/// Groups inside an override range take the override's fixed text, which
/// is emitted only once per range even when several groups fall inside
/// it.
pub fn group_summaries(
    light_name: &str,
    description: &LightDescription,
    overrides: &OverrideGroups,
) -> BTreeMap<i64, String> {
    let mut summaries = BTreeMap::new();
    let mut printed_overrides: BTreeSet<FrameRange> = BTreeSet::new();

    for group in &description.frame_groups {
        let (range, body) = match overrides.range_for_span(light_name, &group.frames) {
            Some(override_range) => {
                if !printed_overrides.insert(override_range.frames) {
                    continue;
                }
                (override_range.frames, override_range.text.clone())
            }
            None => (group.frames, group_body(group)),
        };
        summaries.insert(range.start(), format!("{}: {}", range.display_str(), body));
    }
    summaries
}

/// Joins a light's group summaries, one line per group.
pub fn summarize_light(
    light_name: &str,
    description: &LightDescription,
    overrides: &OverrideGroups,
) -> String {
    group_summaries(light_name, description, overrides)
        .values()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}
