//! Read-only geometric queries over a [`RoadGraph`].
//!
//! Nothing here mutates the graph, so AI vehicles may call these any number
//! of times between ticks from shared `Res<RoadGraph>` access. Every query has
//! a neutral answer for an empty graph or an unknown path; callers treat
//! `None` as "assume a single straight lane".

use bevy::prelude::*;

use crate::config::{TRAVEL_AXIS, WORLD_UP};
use crate::graph::RoadGraph;
use crate::segment::{PathId, Segment, SegmentId, SegmentKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneResult {
    pub lane_center: Vec3,
    /// 0 is the leftmost lane in the direction of travel.
    pub lane_index: usize,
    pub segment_id: SegmentId,
    pub path_id: PathId,
    /// Distance from the query point to `lane_center`.
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadAhead {
    /// First curve kind ahead, or `Straight` when there is none.
    pub dominant_kind: SegmentKind,
    pub branches_ahead: bool,
}

impl Default for RoadAhead {
    fn default() -> Self {
        Self {
            dominant_kind: SegmentKind::Straight,
            branches_ahead: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchOption {
    pub position: Vec3,
    pub main_path_id: PathId,
    pub sibling_path_ids: Vec<PathId>,
    pub kind: SegmentKind,
}

fn travel(point: Vec3) -> f32 {
    point.dot(TRAVEL_AXIS)
}

/// Closest point to `point` on the segment, the projection clamped to its length.
pub fn closest_point_on_segment(point: Vec3, segment: &Segment) -> Vec3 {
    let line = segment.end - segment.start;
    let length = line.length();
    if length <= f32::EPSILON {
        return segment.start;
    }
    let direction = line / length;
    let t = direction.dot(point - segment.start).clamp(0.0, length);
    segment.start + direction * t
}

pub fn distance_to_segment(point: Vec3, segment: &Segment) -> f32 {
    point.distance(closest_point_on_segment(point, segment))
}

/// Segment of any active path closest to `point`. Ties keep the earliest segment.
pub fn nearest_segment(graph: &RoadGraph, point: Vec3) -> Option<&Segment> {
    let mut best: Option<(&Segment, f32)> = None;
    for path in graph.active_paths() {
        for segment in graph.segments_of(path.id()) {
            let distance = distance_to_segment(point, segment);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((segment, distance));
            }
        }
    }
    best.map(|(segment, _)| segment)
}

/// Lane of the nearest segment whose center is closest to `point`.
///
/// All lane centers derive from a single projection onto the segment.
pub fn nearest_lane(graph: &RoadGraph, point: Vec3) -> Option<LaneResult> {
    let segment = nearest_segment(graph, point)?;
    let on_segment = closest_point_on_segment(point, segment);
    let direction = segment.direction();
    let right = WORLD_UP.cross(direction).normalize_or_zero();

    let params = graph.params();
    let lane_width = params.lane_width();
    let middle = (params.lane_count.max(1) - 1) as f32 / 2.0;

    (0..params.lane_count.max(1))
        .map(|index| {
            let lane_center = on_segment + right * (index as f32 - middle) * lane_width;
            LaneResult {
                lane_center,
                lane_index: index,
                segment_id: segment.id,
                path_id: segment.path_id,
                distance: lane_center.distance(point),
            }
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Path owning the segment [`nearest_lane`] would pick.
pub fn player_path(graph: &RoadGraph, point: Vec3) -> Option<PathId> {
    nearest_segment(graph, point).map(|s| s.path_id)
}

/// Summarize `path_id` between `point` and `lookahead` further along the travel axis.
pub fn road_ahead(graph: &RoadGraph, path_id: PathId, point: Vec3, lookahead: f32) -> RoadAhead {
    let from = travel(point);
    let to = from + lookahead.max(0.0);

    let mut ahead = RoadAhead::default();
    let mut curve_found = false;
    for segment in graph.segments_of(path_id) {
        let start = travel(segment.start);
        if start < from || start > to {
            continue;
        }
        if segment.kind.is_branch() {
            ahead.branches_ahead = true;
        }
        if !curve_found && segment.kind.is_curve() {
            ahead.dominant_kind = segment.kind;
            curve_found = true;
        }
    }
    ahead
}

/// Branch points near `point`, one entry per point with every active sibling rooted there.
pub fn branch_options(graph: &RoadGraph, point: Vec3) -> Vec<BranchOption> {
    let params = graph.params();
    let radius = params.branch_option_radius();
    let join = params.branch_join_epsilon;

    let mut options: Vec<BranchOption> = Vec::new();
    for path in graph.active_paths() {
        let (Some(parent), Some(branch_point)) = (path.parent(), path.branch_point()) else {
            continue;
        };
        let Some(first) = graph.segments_of(path.id()).next() else {
            continue;
        };
        if !first.kind.is_branch()
            || first.start.distance(branch_point) > join
            || first.start.distance(point) >= radius
        {
            continue;
        }

        match options
            .iter_mut()
            .find(|o| o.main_path_id == parent && o.position.distance(branch_point) <= join)
        {
            Some(option) => {
                option.sibling_path_ids.push(path.id());
                option.kind = SegmentKind::BranchBoth;
            }
            None => options.push(BranchOption {
                position: branch_point,
                main_path_id: parent,
                sibling_path_ids: vec![path.id()],
                kind: first.kind,
            }),
        }
    }
    options
}

impl RoadGraph {
    pub fn nearest_lane(&self, point: Vec3) -> Option<LaneResult> {
        nearest_lane(self, point)
    }

    pub fn road_ahead(&self, path_id: PathId, point: Vec3, lookahead: f32) -> RoadAhead {
        road_ahead(self, path_id, point, lookahead)
    }

    /// [`road_ahead`] on the player's current path; neutral when there is none.
    pub fn road_ahead_of_player(&self, point: Vec3, lookahead: f32) -> RoadAhead {
        self.current_player_path()
            .map(|id| road_ahead(self, id, point, lookahead))
            .unwrap_or_default()
    }

    pub fn branch_options(&self, point: Vec3) -> Vec<BranchOption> {
        branch_options(self, point)
    }
}
