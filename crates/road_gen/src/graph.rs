//! The path forest: an arena of segments plus the paths that order them.
//!
//! Paths hold segment ids, never references, so removing a segment can only
//! turn a lookup into a miss. Both maps are `BTreeMap` so iteration order (and
//! therefore RNG consumption during a tick) is deterministic.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::*;

use crate::config::{DEGENERATE_EPSILON_SQ, INITIAL_DIRECTION};
use crate::params::RoadGenParams;
use crate::segment::{PathId, Segment, SegmentId, SegmentKind, SegmentVisuals, VisualHandle};
use crate::segment_factory;

/// One contiguous branch of road, segments in travel order.
#[derive(Debug, Clone)]
pub struct RoadPath {
    id: PathId,
    segments: VecDeque<SegmentId>,
    tip_position: Vec3,
    tip_direction: Vec3,
    active: bool,
    parent: Option<PathId>,
    branch_point: Option<Vec3>,
}

impl RoadPath {
    pub(crate) fn new(id: PathId, tip_position: Vec3, tip_direction: Vec3) -> Self {
        Self {
            id,
            segments: VecDeque::new(),
            tip_position,
            tip_direction,
            active: true,
            parent: None,
            branch_point: None,
        }
    }

    pub(crate) fn branched_from(mut self, parent: PathId, branch_point: Vec3) -> Self {
        self.parent = Some(parent);
        self.branch_point = Some(branch_point);
        self
    }

    pub fn id(&self) -> PathId {
        self.id
    }

    /// End of the last segment ever appended, even if it has since been pruned.
    pub fn tip_position(&self) -> Vec3 {
        self.tip_position
    }

    pub fn tip_direction(&self) -> Vec3 {
        self.tip_direction
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The path this one diverged from; `None` for the seeded trunk.
    pub fn parent(&self) -> Option<PathId> {
        self.parent
    }

    pub fn branch_point(&self) -> Option<Vec3> {
        self.branch_point
    }

    pub fn first_segment_id(&self) -> Option<SegmentId> {
        self.segments.front().copied()
    }

    pub fn last_segment_id(&self) -> Option<SegmentId> {
        self.segments.back().copied()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub(crate) fn set_tip_direction(&mut self, direction: Vec3) {
        self.tip_direction = direction;
    }
}

#[derive(Debug, Clone)]
struct SegmentEntry {
    segment: Segment,
    visual: VisualHandle,
}

#[derive(Resource, Debug, Clone)]
pub struct RoadGraph {
    params: RoadGenParams,
    paths: BTreeMap<PathId, RoadPath>,
    segments: BTreeMap<SegmentId, SegmentEntry>,
    next_path_id: u32,
    next_segment_id: u64,
    player_path: Option<PathId>,
}

impl Default for RoadGraph {
    fn default() -> Self {
        Self::new(RoadGenParams::default())
    }
}

impl RoadGraph {
    /// An empty graph with no paths. Queries on it return their neutral results.
    pub fn new(params: RoadGenParams) -> Self {
        Self {
            params,
            paths: BTreeMap::new(),
            segments: BTreeMap::new(),
            next_path_id: PathId::MAIN.0,
            next_segment_id: 0,
            player_path: None,
        }
    }

    /// A graph holding the main path: `initial_segments` straight segments from
    /// the origin along the initial heading.
    pub fn with_main_path(params: RoadGenParams, visuals: &mut dyn SegmentVisuals) -> Self {
        let initial_segments = params.initial_segments;
        let mut graph = Self::new(params);
        let main = graph.alloc_path_id();
        graph.insert_path(RoadPath::new(main, Vec3::ZERO, INITIAL_DIRECTION));
        for _ in 0..initial_segments {
            segment_factory::append_straight(&mut graph, main, visuals);
        }
        graph.player_path = Some(main);
        info!(
            "RoadGraph: seeded main path with {} segments, tip at {:?}",
            graph.live_segment_count(),
            graph.last_segment(main).map(|s| s.end)
        );
        graph
    }

    pub fn params(&self) -> &RoadGenParams {
        &self.params
    }

    pub fn path(&self, id: PathId) -> Option<&RoadPath> {
        self.paths.get(&id)
    }

    pub fn paths(&self) -> impl Iterator<Item = &RoadPath> {
        self.paths.values()
    }

    pub fn active_paths(&self) -> impl Iterator<Item = &RoadPath> {
        self.paths.values().filter(|p| p.active)
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    pub fn active_path_count(&self) -> usize {
        self.active_paths().count()
    }

    /// True while any path other than the trunk is still active.
    pub fn has_active_branch_paths(&self) -> bool {
        self.active_paths().any(|p| p.parent.is_some())
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(&id).map(|e| &e.segment)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values().map(|e| &e.segment)
    }

    /// Segments of `path_id` in travel order; empty for an unknown path.
    pub fn segments_of(&self, path_id: PathId) -> impl Iterator<Item = &Segment> + '_ {
        self.paths
            .get(&path_id)
            .into_iter()
            .flat_map(|p| p.segments.iter())
            .filter_map(|id| self.segment(*id))
    }

    pub fn last_segment(&self, path_id: PathId) -> Option<&Segment> {
        self.paths
            .get(&path_id)
            .and_then(|p| p.last_segment_id())
            .and_then(|id| self.segment(id))
    }

    pub fn live_segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total segments created over the graph's lifetime.
    pub fn segments_created(&self) -> u64 {
        self.next_segment_id
    }

    /// Path the player was last found on. A lookup label only.
    pub fn current_player_path(&self) -> Option<PathId> {
        self.player_path
    }

    /// Whether consecutive segments of `path_id` meet within `epsilon`.
    /// Unknown paths count as contiguous.
    pub fn is_contiguous(&self, path_id: PathId, epsilon: f32) -> bool {
        let segments: Vec<&Segment> = self.segments_of(path_id).collect();
        segments
            .windows(2)
            .all(|pair| pair[0].end.distance(pair[1].start) <= epsilon)
    }

    /// Stop extending a path. Its segments drain through normal pruning.
    ///
    /// Returns `false` (and does nothing) for an unknown or already inactive path.
    pub fn retire(&mut self, path_id: PathId) -> bool {
        match self.paths.get_mut(&path_id) {
            Some(path) if path.active => {
                path.active = false;
                debug!("RoadGraph: path {:?} retired", path_id);
                true
            }
            Some(_) => false,
            None => {
                debug!("RoadGraph: retire of unknown path {:?} ignored", path_id);
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Mutation, reserved for the factory and the per-tick lifecycle
    // -----------------------------------------------------------------------

    pub(crate) fn alloc_path_id(&mut self) -> PathId {
        let id = PathId(self.next_path_id);
        self.next_path_id += 1;
        id
    }

    pub(crate) fn insert_path(&mut self, path: RoadPath) {
        self.paths.insert(path.id, path);
    }

    pub(crate) fn path_mut(&mut self, id: PathId) -> Option<&mut RoadPath> {
        self.paths.get_mut(&id)
    }

    pub(crate) fn set_player_path(&mut self, id: Option<PathId>) {
        self.player_path = id;
    }

    /// Append a segment from the path's tip to `end` and move the tip there.
    ///
    /// The heading is left to the caller; a curve changes it, a straight does not.
    pub(crate) fn push_segment(
        &mut self,
        path_id: PathId,
        end: Vec3,
        kind: SegmentKind,
        visuals: &mut dyn SegmentVisuals,
    ) -> Option<SegmentId> {
        let id = SegmentId(self.next_segment_id);
        let path = self.paths.get_mut(&path_id)?;
        self.next_segment_id += 1;

        let segment = Segment {
            id,
            path_id,
            start: path.tip_position,
            end,
            kind,
        };
        path.segments.push_back(id);
        path.tip_position = end;

        let visual = visuals.add_segment_visual(&segment);
        self.segments.insert(id, SegmentEntry { segment, visual });
        Some(id)
    }

    /// Remove the oldest segment of a path.
    pub(crate) fn pop_front_segment(
        &mut self,
        path_id: PathId,
        visuals: &mut dyn SegmentVisuals,
    ) -> Option<Segment> {
        let id = self.paths.get_mut(&path_id)?.segments.pop_front()?;
        let entry = self.segments.remove(&id)?;
        visuals.remove_segment_visual(entry.visual);
        Some(entry.segment)
    }

    /// Remove a path together with every segment it still owns.
    pub(crate) fn remove_path(&mut self, path_id: PathId, visuals: &mut dyn SegmentVisuals) -> bool {
        let Some(path) = self.paths.remove(&path_id) else {
            return false;
        };
        for id in path.segments {
            if let Some(entry) = self.segments.remove(&id) {
                visuals.remove_segment_visual(entry.visual);
            }
        }
        if self.player_path == Some(path_id) {
            self.player_path = None;
        }
        true
    }

    pub(crate) fn set_path_active(&mut self, path_id: PathId, active: bool) -> bool {
        match self.paths.get_mut(&path_id) {
            Some(path) if path.active != active => {
                path.active = active;
                true
            }
            _ => false,
        }
    }
}

/// Normalize `direction`, or `None` if it is too short to carry a heading.
pub(crate) fn usable_heading(direction: Vec3) -> Option<Vec3> {
    if direction.length_squared() < DEGENERATE_EPSILON_SQ {
        None
    } else {
        Some(direction.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::NoVisuals;

    #[test]
    fn test_main_path_seed() {
        let graph = RoadGraph::with_main_path(RoadGenParams::default(), &mut NoVisuals);
        let main = graph.path(PathId::MAIN).expect("main path");
        assert_eq!(main.len(), 5);
        assert!(main.is_active());
        assert!(main.parent().is_none());
        assert!((main.tip_position() - Vec3::new(2500.0, 0.0, 0.0)).length() < 1e-3);
        assert_eq!(main.tip_direction(), Vec3::X);
        assert!(graph.is_contiguous(PathId::MAIN, 1e-3));
        assert_eq!(graph.current_player_path(), Some(PathId::MAIN));
        assert!(graph.segments().all(|s| s.kind == SegmentKind::Straight));
    }

    #[test]
    fn test_empty_graph() {
        let graph = RoadGraph::default();
        assert_eq!(graph.path_count(), 0);
        assert_eq!(graph.live_segment_count(), 0);
        assert_eq!(graph.segments_of(PathId(7)).count(), 0);
        assert!(graph.last_segment(PathId::MAIN).is_none());
        assert!(graph.current_player_path().is_none());
    }

    #[test]
    fn test_retire_unknown_is_noop() {
        let mut graph = RoadGraph::with_main_path(RoadGenParams::default(), &mut NoVisuals);
        assert!(!graph.retire(PathId(99)));
        assert!(graph.retire(PathId::MAIN));
        assert!(!graph.retire(PathId::MAIN));
        assert_eq!(graph.active_path_count(), 0);
    }

    #[test]
    fn test_pop_and_remove_keep_arena_consistent() {
        let mut graph = RoadGraph::with_main_path(RoadGenParams::default(), &mut NoVisuals);
        let first = graph.pop_front_segment(PathId::MAIN, &mut NoVisuals).unwrap();
        assert_eq!(first.start, Vec3::ZERO);
        assert!(graph.segment(first.id).is_none());
        assert_eq!(graph.live_segment_count(), 4);

        assert!(graph.remove_path(PathId::MAIN, &mut NoVisuals));
        assert_eq!(graph.live_segment_count(), 0);
        assert!(graph.current_player_path().is_none());
        assert!(!graph.remove_path(PathId::MAIN, &mut NoVisuals));
    }

    #[test]
    fn test_usable_heading() {
        assert!(usable_heading(Vec3::ZERO).is_none());
        assert_eq!(usable_heading(Vec3::new(0.0, 0.0, 3.0)), Some(Vec3::Z));
    }
}
