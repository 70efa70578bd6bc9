//! Light Parameter Description Library
//!
//! This crate infers, records, and summarizes how a test scene's light
//! parameters change over time. An external exporter dumps each light's
//! time-sampled attributes to JSON; this crate partitions every light's
//! frame range into *frame groups* -- maximal contiguous segments where at
//! most one attribute is varying, and in one direction -- and renders the
//! result as persisted records and one-line summaries for the render-diff
//! report.
//!
//! # Overview
//!
//! Data flows bottom-up:
//!
//! - [`value::Value`] is the closed variant type for attribute values,
//!   with tolerance-based closeness ([`value::Tolerance`]).
//! - [`snapshot::FrameSnapshot`] classifies one frame's attributes as
//!   at-default or constant-non-default, resolving defaults through a
//!   per-light [`snapshot::DefaultCache`].
//! - [`group::FrameGroupFinder`] folds snapshots into
//!   [`group::GroupTracker`]s and finalizes them into immutable
//!   [`group::FrameGroup`] records.
//! - [`describe::describe_scene`] assembles per-light
//!   [`describe::LightDescription`] records; [`summary`] renders them as
//!   text.
//!
//! # Example
//!
//! ```
//! use luxdiff_desc::{describe_scene, ErrorsMode, GroupConfig, SceneSamples};
//!
//! let scene = SceneSamples::from_json(r#"{
//!     "source": "usd/sphere.usda",
//!     "lights": {
//!         "sphere_light": {
//!             "attrs": {
//!                 "inputs:intensity": {
//!                     "type_name": "float",
//!                     "default": 1.0,
//!                     "samples": {"1": 1.0, "2": 2.0, "3": 3.0}
//!                 }
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let outcome = describe_scene(&scene, &GroupConfig::default(), ErrorsMode::Raise).unwrap();
//! let description = &outcome.descriptions["sphere"];
//! assert_eq!(description.frame_groups.len(), 1);
//! ```

pub mod describe;
pub mod error;
pub mod frame;
pub mod group;
pub mod samples;
pub mod snapshot;
pub mod summary;
pub mod value;

// Re-export commonly used types at the crate root
pub use describe::{
    describe_light, describe_scene, merge_descriptions, read_descriptions, write_descriptions,
    DescribeOutcome, Descriptions, ErrorsMode, LightDescription, OUTPUT_JSON_NAME,
};
pub use error::{DescribeError, DescribeWarning, GroupError};
pub use frame::FrameRange;
pub use group::{FrameGroup, FrameGroupFinder, GroupConfig, GroupTracker, OverrideGroups, OverrideRange};
pub use samples::{strip_light_name, AttrSamples, LightSamples, SceneSamples, LIGHT_NAME_SUFFIX};
pub use snapshot::{builtin_default_overrides, DefaultCache, FrameSnapshot};
pub use summary::{format_attr, format_val, group_summaries, summarize_light};
pub use value::{Direction, Tolerance, Value, DEFAULT_REL_TOL};
