//! Frame-group inference.
//!
//! A frame group is a maximal contiguous frame range over which at most
//! one attribute is varying, and in the same direction. The
//! [`FrameGroupFinder`] walks a light's frames in order, classifying each
//! frame (see [`FrameSnapshot`]) and folding it into the open
//! [`GroupTracker`]; a refused merge closes the group and opens the next
//! one at the refusing frame.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::GroupError;
use crate::frame::FrameRange;
use crate::samples::LightSamples;
use crate::snapshot::{builtin_default_overrides, DefaultCache, FrameSnapshot};
use crate::value::{Direction, Tolerance, Value};

/// Externally supplied forced frame ranges, keyed by light name.
///
/// A frame belongs to the override range that contains it; frames in the
/// same range are always grouped together regardless of which attributes
/// move, and the range's text replaces the generated summary line.
/// Overlapping ranges are not validated; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideGroups {
    pub lights: BTreeMap<String, Vec<OverrideRange>>,
}

/// One forced range and its fixed summary text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRange {
    pub frames: FrameRange,
    pub text: String,
}

impl OverrideGroups {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The override table for the stock test scenes: the distant light
    /// interleaves camera and light rotations that read identically in
    /// the renders, so both stretches get hand-written descriptions.
    pub fn builtin() -> Self {
        let mut groups = Self::default();
        groups.insert(
            "distant",
            FrameRange(21, 25),
            "cam rotate from 0 to 80 (intensity 3720)",
        );
        groups.insert(
            "distant",
            FrameRange(26, 30),
            "light rotate from 0 to 80 (intensity 3720)",
        );
        groups
    }

    pub fn insert(&mut self, light: &str, frames: FrameRange, text: &str) {
        self.lights.entry(light.to_string()).or_default().push(OverrideRange {
            frames,
            text: text.to_string(),
        });
    }

    /// The first range of `light` containing `frame`, if any.
    pub fn range_for_frame(&self, light: &str, frame: i64) -> Option<&OverrideRange> {
        self.lights
            .get(light)?
            .iter()
            .find(|range| range.frames.contains(frame))
    }

    /// The first range of `light` fully covering `span`, if any.
    pub fn range_for_span(&self, light: &str, span: &FrameRange) -> Option<&OverrideRange> {
        self.lights
            .get(light)?
            .iter()
            .find(|range| range.frames.is_superset(span))
    }
}

/// Tunable configuration for the finder.
#[derive(Debug, Clone)]
pub struct GroupConfig {
    /// Closeness tolerance for float comparisons.
    pub tolerance: Tolerance,
    /// Global attr-name -> forced default table.
    pub default_overrides: BTreeMap<String, Value>,
    /// Forced frame ranges per light.
    pub override_groups: OverrideGroups,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            default_overrides: builtin_default_overrides(),
            override_groups: OverrideGroups::builtin(),
        }
    }
}

impl GroupConfig {
    /// Configuration with no built-in override tables.
    pub fn bare() -> Self {
        Self {
            tolerance: Tolerance::default(),
            default_overrides: BTreeMap::new(),
            override_groups: OverrideGroups::empty(),
        }
    }
}

/// A finalized, immutable frame group, in the shape it is persisted.
///
/// Direction is not persisted; consumers read change from the per-frame
/// varying tables. JSON stringifies the frame keys and they parse back
/// to numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameGroup {
    /// Covered frame range, endpoints inclusive.
    pub frames: FrameRange,
    /// Per varying attribute, the frame -> value table over the range.
    pub varying: BTreeMap<String, BTreeMap<i64, Value>>,
    /// Constant, non-default attribute values (from the first frame;
    /// constants by definition do not change within a group).
    pub non_default_constants: BTreeMap<String, Value>,
}

impl FrameGroup {
    /// True when nothing varies over the group (always true for
    /// single-frame groups).
    pub fn is_constant(&self) -> bool {
        self.varying.is_empty()
    }
}

/// Mutable accumulator for one group under construction.
///
/// Every mutation re-checks the structural invariants; a tracker can only
/// leave this state by being consumed into a [`FrameGroup`] via
/// [`GroupTracker::finish`].
#[derive(Debug, Clone)]
pub struct GroupTracker {
    frame_vals: BTreeMap<i64, BTreeMap<String, Value>>,
    varying: BTreeMap<String, Direction>,
    constants: BTreeSet<String>,
    defaults: BTreeSet<String>,
    override_range: Option<FrameRange>,
}

impl GroupTracker {
    /// Opens a tracker from a single-frame snapshot.
    pub fn open(
        snapshot: FrameSnapshot,
        override_range: Option<FrameRange>,
    ) -> Result<Self, GroupError> {
        let (frame, vals, constants, defaults) = snapshot.into_parts();
        let tracker = Self {
            frame_vals: BTreeMap::from([(frame, vals)]),
            varying: BTreeMap::new(),
            constants,
            defaults,
            override_range,
        };
        tracker.validate()?;
        Ok(tracker)
    }

    /// All tracked attribute names: varying, constants, and defaults.
    pub fn attr_names(&self) -> BTreeSet<String> {
        self.varying
            .keys()
            .chain(self.constants.iter())
            .chain(self.defaults.iter())
            .cloned()
            .collect()
    }

    pub fn varying(&self) -> &BTreeMap<String, Direction> {
        &self.varying
    }

    pub fn constants(&self) -> &BTreeSet<String> {
        &self.constants
    }

    pub fn defaults(&self) -> &BTreeSet<String> {
        &self.defaults
    }

    pub fn first_frame(&self) -> i64 {
        *self.frame_vals.keys().next().expect("validated non-empty")
    }

    pub fn last_frame(&self) -> i64 {
        *self.frame_vals.keys().next_back().expect("validated non-empty")
    }

    /// Checks the structural invariants, returning the first violation.
    pub fn validate(&self) -> Result<(), GroupError> {
        // the three partitions must be disjoint
        let mut seen = BTreeSet::new();
        for name in self
            .varying
            .keys()
            .chain(self.constants.iter())
            .chain(self.defaults.iter())
        {
            if !seen.insert(name.clone()) {
                return Err(GroupError::DuplicateAttr(name.clone()));
            }
        }

        if self.frame_vals.is_empty() {
            return Err(GroupError::EmptyFrames);
        }
        if self.frame_vals.len() == 1 {
            if let Some(name) = self.varying.keys().next() {
                return Err(GroupError::VaryingSingleFrame(name.clone()));
            }
        } else if self.varying.is_empty() && self.override_range.is_none() {
            // only an override range may hold non-varying frames together
            return Err(GroupError::MissingVarying);
        }

        let attrs = self.attr_names();
        for (frame, vals) in &self.frame_vals {
            let keys: BTreeSet<String> = vals.keys().cloned().collect();
            if keys != attrs {
                let missing: Vec<_> = attrs.difference(&keys).cloned().collect();
                if !missing.is_empty() {
                    return Err(GroupError::MissingAttrs {
                        frame: *frame,
                        names: missing.join(", "),
                    });
                }
                let extra: Vec<_> = keys.difference(&attrs).cloned().collect();
                return Err(GroupError::ExtraAttrs {
                    frame: *frame,
                    names: extra.join(", "),
                });
            }
            if let Some(range) = self.override_range {
                if !range.contains(*frame) {
                    return Err(GroupError::OutsideOverrideRange { frame: *frame, range });
                }
            }
        }
        Ok(())
    }

    /// Attributes whose values moved between the last tracked frame and
    /// the snapshot, each with its implied direction.
    fn diff_against(&self, snapshot: &FrameSnapshot, tol: &Tolerance) -> BTreeMap<String, Direction> {
        let last_vals = &self.frame_vals[&self.last_frame()];
        let mut diff = BTreeMap::new();
        for (name, old) in last_vals {
            let new = &snapshot.vals()[name];
            if !old.close(new, tol) {
                diff.insert(name.clone(), Direction::of(old, new));
            }
        }
        diff
    }

    /// Attempts to absorb a single-frame snapshot into this group.
    ///
    /// Returns `Ok(true)` when absorbed (the snapshot can be discarded),
    /// `Ok(false)` when the snapshot must start a new group, and `Err`
    /// only for contract violations: mismatched attribute sets or a frame
    /// that is not strictly beyond every tracked frame.
    pub fn combine(
        &mut self,
        snapshot: &FrameSnapshot,
        snapshot_range: Option<FrameRange>,
        tol: &Tolerance,
    ) -> Result<bool, GroupError> {
        let attrs = self.attr_names();
        let snapshot_attrs = snapshot.attr_names();
        if attrs != snapshot_attrs {
            let join = |set: &BTreeSet<String>| set.iter().cloned().collect::<Vec<_>>().join(", ");
            return Err(GroupError::AttrSetMismatch {
                ours: join(&attrs),
                theirs: join(&snapshot_attrs),
            });
        }
        let last = self.last_frame();
        if snapshot.frame() <= last {
            return Err(GroupError::NonMonotonicFrame {
                new: snapshot.frame(),
                last,
            });
        }

        let diff = self.diff_against(snapshot, tol);

        // Override ranges take precedence over the varying-attribute rule:
        // frames in the same range always merge, frames straddling a range
        // boundary never do.
        if self.override_range.is_some() || snapshot_range.is_some() {
            if self.override_range != snapshot_range {
                return Ok(false);
            }
            for (name, direction) in diff {
                if self.varying.contains_key(&name) {
                    continue;
                }
                self.start_varying(name, direction)?;
            }
            self.push_frame(snapshot)?;
            return Ok(true);
        }

        if self.varying.is_empty() {
            // First divergence: only a single moving attribute may open
            // the varying slot. Two or more moving at once splits instead;
            // no attempt is made to detect attributes that always move
            // together.
            if diff.len() != 1 {
                return Ok(false);
            }
            let (name, direction) = diff.into_iter().next().expect("len checked");
            self.start_varying(name, direction)?;
            self.push_frame(snapshot)?;
            return Ok(true);
        }

        // Continuation: the exact same attributes moving in the exact
        // same directions, nothing else.
        if !diff.is_empty() && diff == self.varying {
            self.push_frame(snapshot)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Moves an attribute out of constants/defaults into varying.
    fn start_varying(&mut self, name: String, direction: Direction) -> Result<(), GroupError> {
        if !self.constants.remove(&name) && !self.defaults.remove(&name) {
            return Err(GroupError::VaryingNotTracked(name));
        }
        self.varying.insert(name, direction);
        Ok(())
    }

    fn push_frame(&mut self, snapshot: &FrameSnapshot) -> Result<(), GroupError> {
        self.frame_vals
            .insert(snapshot.frame(), snapshot.vals().clone());
        self.validate()
    }

    /// Consumes the tracker into its immutable record.
    pub fn finish(self) -> FrameGroup {
        let frames = FrameRange(self.first_frame(), self.last_frame());
        let varying = self
            .varying
            .keys()
            .map(|name| {
                let vals = self
                    .frame_vals
                    .iter()
                    .map(|(frame, vals)| (*frame, vals[name].clone()))
                    .collect();
                (name.clone(), vals)
            })
            .collect();
        let first_vals = self.frame_vals.values().next().expect("validated non-empty");
        let non_default_constants = self
            .constants
            .iter()
            .map(|name| (name.clone(), first_vals[name].clone()))
            .collect();
        FrameGroup {
            frames,
            varying,
            non_default_constants,
        }
    }
}

/// Single forward pass over a light's frames, producing the ordered list
/// of finalized frame groups.
#[derive(Debug)]
pub struct FrameGroupFinder<'a> {
    light: &'a str,
    attr_names: &'a [String],
    samples: &'a LightSamples,
    config: &'a GroupConfig,
    cache: DefaultCache,
    open: Option<GroupTracker>,
    finished: Vec<FrameGroup>,
}

impl<'a> FrameGroupFinder<'a> {
    /// Runs the full pass. `frames` must be sorted ascending.
    pub fn find(
        light: &str,
        attr_names: &[String],
        frames: &[i64],
        samples: &LightSamples,
        config: &GroupConfig,
    ) -> Result<Vec<FrameGroup>, GroupError> {
        let mut finder = FrameGroupFinder {
            light,
            attr_names,
            samples,
            config,
            cache: DefaultCache::with_overrides(config.default_overrides.clone()),
            open: None,
            finished: Vec::new(),
        };
        for &frame in frames {
            finder.step(frame)?;
        }
        Ok(finder.into_groups())
    }

    fn step(&mut self, frame: i64) -> Result<(), GroupError> {
        let snapshot = FrameSnapshot::classify(
            frame,
            self.attr_names,
            self.samples,
            &mut self.cache,
            &self.config.tolerance,
        )?;
        let range = self
            .config
            .override_groups
            .range_for_frame(self.light, frame)
            .map(|r| r.frames);

        match self.open.take() {
            None => {
                self.open = Some(GroupTracker::open(snapshot, range)?);
            }
            Some(mut tracker) => {
                if tracker.combine(&snapshot, range, &self.config.tolerance)? {
                    self.open = Some(tracker);
                } else {
                    self.finished.push(tracker.finish());
                    self.open = Some(GroupTracker::open(snapshot, range)?);
                }
            }
        }
        Ok(())
    }

    fn into_groups(mut self) -> Vec<FrameGroup> {
        if let Some(tracker) = self.open.take() {
            self.finished.push(tracker.finish());
        }
        self.finished
    }
}
