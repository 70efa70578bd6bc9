//! Per-frame attribute classification.
//!
//! A [`FrameSnapshot`] looks at a single frame and splits the attribute
//! set into "at default" and "constant but non-default". Varying status
//! can only be discovered later, once two snapshots disagree; that is the
//! group tracker's job.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::GroupError;
use crate::samples::{AttrSamples, LightSamples};
use crate::value::{Tolerance, Value};

/// Builds the global attribute-default override table.
///
/// These apply regardless of light schema: the cone angle rest pose for
/// the test scenes is a full 180-degree (disabled) cone, not the schema
/// fallback of 90.
pub fn builtin_default_overrides() -> BTreeMap<String, Value> {
    BTreeMap::from([("inputs:shaping:cone:angle".to_string(), Value::Int(180))])
}

/// Lazily-resolved default values for one light's attributes.
///
/// Owned by the caller and threaded through a full light's processing;
/// never shared across lights. Resolution order: the override table, then
/// the schema-declared default, then a deterministic type-shaped fallback.
#[derive(Debug, Clone, Default)]
pub struct DefaultCache {
    overrides: BTreeMap<String, Value>,
    resolved: BTreeMap<String, Option<Value>>,
}

impl DefaultCache {
    /// Cache with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache seeded with an override table (attr name -> forced default).
    pub fn with_overrides(overrides: BTreeMap<String, Value>) -> Self {
        Self {
            overrides,
            resolved: BTreeMap::new(),
        }
    }

    /// Resolves (and memoizes) the default for `name`.
    ///
    /// `None` means the attribute has no meaningful default, so no value
    /// of it will ever classify as "at default".
    pub fn resolve(&mut self, name: &str, attr: &AttrSamples) -> Option<Value> {
        if let Some(cached) = self.resolved.get(name) {
            return cached.clone();
        }
        let default = self
            .overrides
            .get(name)
            .cloned()
            .or_else(|| attr.default.clone())
            .or_else(|| attr.type_name.as_deref().and_then(type_fallback));
        self.resolved.insert(name.to_string(), default.clone());
        default
    }
}

/// Fallback default for attributes whose schema declares none.
///
/// Transform-shaped attributes rest at identity; asset paths rest empty.
/// Everything else genuinely has no default.
fn type_fallback(type_name: &str) -> Option<Value> {
    if let Some(rest) = type_name.strip_prefix("matrix") {
        let dim = rest
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .filter(|d| (2..=4).contains(d))? as usize;
        let rows = (0..dim)
            .map(|r| {
                Value::Sequence(
                    (0..dim)
                        .map(|c| Value::Float(if r == c { 1.0 } else { 0.0 }))
                        .collect(),
                )
            })
            .collect();
        return Some(Value::Sequence(rows));
    }
    if type_name == "asset" {
        return Some(Value::Text(String::new()));
    }
    None
}

/// One frame's worth of classified attribute values.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    frame: i64,
    vals: BTreeMap<String, Value>,
    constants: BTreeSet<String>,
    defaults: BTreeSet<String>,
}

impl FrameSnapshot {
    /// Classifies `attr_names` at `frame`.
    ///
    /// Each attribute lands in `defaults` when its value is close to its
    /// resolved default, otherwise in `constants`. Fails on duplicate
    /// names, unknown attributes, or attributes with no samples at all.
    pub fn classify(
        frame: i64,
        attr_names: &[String],
        light: &LightSamples,
        cache: &mut DefaultCache,
        tol: &Tolerance,
    ) -> Result<Self, GroupError> {
        let mut vals = BTreeMap::new();
        let mut constants = BTreeSet::new();
        let mut defaults = BTreeSet::new();

        for name in attr_names {
            let attr = light
                .attrs
                .get(name)
                .ok_or_else(|| GroupError::UnknownAttr(name.clone()))?;
            let val = attr
                .value_at(frame)
                .ok_or_else(|| GroupError::NoValue {
                    attr: name.clone(),
                    frame,
                })?
                .clone();

            let at_default = match cache.resolve(name, attr) {
                Some(default) => val.close(&default, tol),
                None => false,
            };
            if at_default {
                defaults.insert(name.clone());
            } else {
                constants.insert(name.clone());
            }
            if vals.insert(name.clone(), val).is_some() {
                return Err(GroupError::NameClash(name.clone()));
            }
        }

        Ok(Self {
            frame,
            vals,
            constants,
            defaults,
        })
    }

    pub fn frame(&self) -> i64 {
        self.frame
    }

    pub fn vals(&self) -> &BTreeMap<String, Value> {
        &self.vals
    }

    pub fn constants(&self) -> &BTreeSet<String> {
        &self.constants
    }

    pub fn defaults(&self) -> &BTreeSet<String> {
        &self.defaults
    }

    /// The full attribute set of this snapshot.
    pub fn attr_names(&self) -> BTreeSet<String> {
        self.vals.keys().cloned().collect()
    }

    /// Consumes the snapshot into its parts: (frame, values, constants,
    /// defaults).
    pub(crate) fn into_parts(
        self,
    ) -> (i64, BTreeMap<String, Value>, BTreeSet<String>, BTreeSet<String>) {
        (self.frame, self.vals, self.constants, self.defaults)
    }
}
