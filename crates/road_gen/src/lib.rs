//! Endless branching road generation.
//!
//! A [`graph::RoadGraph`] owns the live paths and their segments. Each fixed
//! step, [`graph::RoadGraph::tick`] extends paths the player is approaching,
//! picks segment kinds through [`type_selector::TypeSelector`], re-derives the
//! player's path and prunes whatever has fallen behind. The read-only queries
//! in [`spatial_query`] serve AI steering between ticks.
//!
//! [`RoadGenPlugin`] wires all of this into a Bevy `App`; the pure API works
//! without one.

pub mod config;
pub mod graph;
pub mod lifecycle;
pub mod params;
pub mod plugin;
pub mod road_rng;
pub mod segment;
pub mod segment_factory;
pub mod spatial_query;
pub mod type_selector;

#[cfg(test)]
pub mod test_harness;

pub use graph::{RoadGraph, RoadPath};
pub use lifecycle::TickReport;
pub use params::RoadGenParams;
pub use plugin::{
    PlayerPosition, RoadGenPlugin, RoadGenSet, SegmentDespawned, SegmentSpawned, SkipRoadSeed,
};
pub use road_rng::RoadRng;
pub use segment::{
    NoVisuals, PathId, Segment, SegmentId, SegmentKind, SegmentVisuals, Side, VisualHandle,
};
pub use spatial_query::{BranchOption, LaneResult, RoadAhead};
pub use type_selector::{SetSegmentWeights, TypeSelector, WeightTable};
