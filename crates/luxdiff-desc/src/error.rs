//! Error types for frame grouping and description generation.
//!
//! Structural invariant violations are programming-contract failures and
//! always fatal to the light being processed; a refused merge is a normal
//! control-flow outcome and never surfaces here.

use thiserror::Error;

use crate::frame::FrameRange;

/// Fatal errors raised while building or validating a frame group.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GroupError {
    /// The same attribute name appeared in more than one of the
    /// varying/constants/defaults partitions.
    #[error("duplicate attribute: {0}")]
    DuplicateAttr(String),

    /// A group must always cover at least one frame.
    #[error("frame group has no frames")]
    EmptyFrames,

    /// A single-frame group can never have established a varying attribute.
    #[error("had only 1 frame, but had a varying attr: {0}")]
    VaryingSingleFrame(String),

    /// A multi-frame group must have at least one varying attribute
    /// (unless it was forced together by an override range).
    #[error("had more than 1 frame, but did not have a varying attr")]
    MissingVarying,

    /// A frame's value table lacked attributes the group tracks.
    #[error("frame {frame} missing attributes: {names}")]
    MissingAttrs { frame: i64, names: String },

    /// A frame's value table carried attributes the group does not track.
    #[error("frame {frame} had extra attributes: {names}")]
    ExtraAttrs { frame: i64, names: String },

    /// Two groups over different attribute sets can never be combined;
    /// both sides derive from the same attribute list, so this is a
    /// caller bug.
    #[error("to combine two frame groups, must be over same set of attrs (had {ours}, got {theirs})")]
    AttrSetMismatch { ours: String, theirs: String },

    /// Frames may only ever be appended in strictly increasing order.
    #[error("frame {new} is not strictly greater than last tracked frame {last}")]
    NonMonotonicFrame { new: i64, last: i64 },

    /// Two attributes normalized to the same name.
    #[error("name clash in attrs: {0}")]
    NameClash(String),

    /// An attribute that started varying was tracked in neither the
    /// constants nor the defaults partition.
    #[error("new varying attr {0} not found in either constants or defaults")]
    VaryingNotTracked(String),

    /// An attribute name was requested that the light's sample table
    /// does not carry.
    #[error("unknown attribute: {0}")]
    UnknownAttr(String),

    /// An attribute had no resolvable value at a frame inside the
    /// sampled range.
    #[error("attribute {attr} has no value at frame {frame}")]
    NoValue { attr: String, frame: i64 },

    /// A frame landed outside the override range its group is bound to.
    #[error("frame {frame} outside override range {range}")]
    OutsideOverrideRange { frame: i64, range: FrameRange },
}

/// Errors raised while describing lights of a sampled scene.
#[derive(Debug, Error)]
pub enum DescribeError {
    /// Grouping failed for a light; carries the light name for context.
    #[error("light {light}: {source}")]
    Light {
        light: String,
        #[source]
        source: GroupError,
    },

    /// Light prim names must carry the `_light` suffix.
    #[error("light name did not end with {suffix:?}: {name}")]
    BadLightName { name: String, suffix: &'static str },

    /// The same stripped light name appeared twice across the input.
    #[error("light name appeared twice: {0}")]
    DuplicateLight(String),

    /// A scene document contained no lights at all.
    #[error("scene had no lights: {0}")]
    NoLights(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error reading or writing description documents.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A non-fatal, per-light problem recorded when the caller opts to keep
/// going instead of aborting.
#[derive(Debug, Clone, PartialEq)]
pub struct DescribeWarning {
    /// Stripped light name (or the raw prim name if stripping failed).
    pub light: String,
    /// Source document the light came from.
    pub source: String,
    /// Human-readable description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for DescribeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "error processing light {} in scene {}: {}",
            self.light, self.source, self.message
        )
    }
}
