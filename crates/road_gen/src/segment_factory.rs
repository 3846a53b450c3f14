//! Creation of straight, curve and branch segments.
//!
//! Every function here addresses its path by id and returns `None` when the
//! path is gone; a miss is not an error. Degenerate headings drop the segment
//! (or fall back to the previous heading) rather than failing the tick.

use bevy::prelude::*;
use rand::Rng;

use crate::config::WORLD_UP;
use crate::graph::{usable_heading, RoadGraph, RoadPath};
use crate::segment::{PathId, SegmentId, SegmentKind, SegmentVisuals, Side};

/// What one branch append produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchOutcome {
    /// `BranchLeft`, `BranchRight`, or `BranchBoth` when both sides were spawned.
    pub kind: SegmentKind,
    /// The straight continuation appended to the parent path.
    pub main_segment: SegmentId,
    pub new_paths: Vec<PathId>,
}

/// Rotate a heading about world up. Positive angles turn left.
pub fn rotate_about_up(direction: Vec3, radians: f32) -> Vec3 {
    Quat::from_axis_angle(WORLD_UP, radians) * direction
}

fn draw_angle(rng: &mut impl Rng, range_deg: [f32; 2]) -> f32 {
    let [lo, hi] = range_deg;
    let deg = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
    deg.to_radians()
}

fn tip_heading(graph: &RoadGraph, path_id: PathId) -> Option<(Vec3, Vec3)> {
    let Some(path) = graph.path(path_id) else {
        debug!("SegmentFactory: path {:?} no longer exists", path_id);
        return None;
    };
    match usable_heading(path.tip_direction()) {
        Some(heading) => Some((path.tip_position(), heading)),
        None => {
            warn!(
                "SegmentFactory: path {:?} has a degenerate heading, dropping segment",
                path_id
            );
            None
        }
    }
}

pub(crate) fn append_straight(
    graph: &mut RoadGraph,
    path_id: PathId,
    visuals: &mut dyn SegmentVisuals,
) -> Option<SegmentId> {
    let (tip, heading) = tip_heading(graph, path_id)?;
    let end = tip + heading * graph.params().segment_length;
    graph.push_segment(path_id, end, SegmentKind::Straight, visuals)
}

/// Turn the path's heading by a random angle toward `side`, then lay one
/// segment along the new heading. The turn persists for later segments.
pub(crate) fn append_curve(
    graph: &mut RoadGraph,
    path_id: PathId,
    side: Side,
    rng: &mut impl Rng,
    visuals: &mut dyn SegmentVisuals,
) -> Option<SegmentId> {
    let (tip, heading) = tip_heading(graph, path_id)?;
    let angle = draw_angle(rng, graph.params().curve_angle_deg) * side.sign();
    let turned = usable_heading(rotate_about_up(heading, angle)).unwrap_or_else(|| {
        warn!(
            "SegmentFactory: curve on path {:?} produced a degenerate heading, keeping {}",
            path_id, heading
        );
        heading
    });

    let end = tip + turned * graph.params().segment_length;
    let id = graph.push_segment(path_id, end, SegmentKind::curve(side), visuals)?;
    if let Some(path) = graph.path_mut(path_id) {
        path.set_tip_direction(turned);
    }
    Some(id)
}

/// Continue `path_id` straight ahead and spawn one new path per side, each
/// starting at the pre-extension tip and diverging from the pre-branch heading.
pub(crate) fn append_branch(
    graph: &mut RoadGraph,
    path_id: PathId,
    sides: &[Side],
    rng: &mut impl Rng,
    visuals: &mut dyn SegmentVisuals,
) -> Option<BranchOutcome> {
    let (branch_point, heading) = tip_heading(graph, path_id)?;
    let main_segment = append_straight(graph, path_id, visuals)?;
    let length = graph.params().segment_length;

    let mut new_paths = Vec::with_capacity(sides.len());
    for &side in sides {
        let angle = draw_angle(rng, graph.params().branch_angle_deg) * side.sign();
        let direction = usable_heading(rotate_about_up(heading, angle)).unwrap_or_else(|| {
            warn!(
                "SegmentFactory: branch off {:?} produced a degenerate heading, keeping {}",
                path_id, heading
            );
            heading
        });

        let new_id = graph.alloc_path_id();
        graph.insert_path(
            RoadPath::new(new_id, branch_point, direction).branched_from(path_id, branch_point),
        );
        graph.push_segment(
            new_id,
            branch_point + direction * length,
            SegmentKind::branch(side),
            visuals,
        )?;
        info!(
            "SegmentFactory: path {:?} branched {:?} into {:?} at {}",
            path_id, side, new_id, branch_point
        );
        new_paths.push(new_id);
    }

    let kind = match sides {
        [Side::Left] => SegmentKind::BranchLeft,
        [Side::Right] => SegmentKind::BranchRight,
        _ => SegmentKind::BranchBoth,
    };
    Some(BranchOutcome {
        kind,
        main_segment,
        new_paths,
    })
}

/// Append whatever `kind` calls for. Returns the kind actually laid down.
pub(crate) fn append_kind(
    graph: &mut RoadGraph,
    path_id: PathId,
    kind: SegmentKind,
    rng: &mut impl Rng,
    visuals: &mut dyn SegmentVisuals,
) -> Option<SegmentKind> {
    match kind {
        SegmentKind::Straight => append_straight(graph, path_id, visuals).map(|_| kind),
        SegmentKind::CurveLeft => append_curve(graph, path_id, Side::Left, rng, visuals).map(|_| kind),
        SegmentKind::CurveRight => {
            append_curve(graph, path_id, Side::Right, rng, visuals).map(|_| kind)
        }
        SegmentKind::BranchLeft => {
            append_branch(graph, path_id, &[Side::Left], rng, visuals).map(|o| o.kind)
        }
        SegmentKind::BranchRight => {
            append_branch(graph, path_id, &[Side::Right], rng, visuals).map(|o| o.kind)
        }
        SegmentKind::BranchBoth => {
            append_branch(graph, path_id, &[Side::Left, Side::Right], rng, visuals).map(|o| o.kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RoadGenParams;
    use crate::road_rng::RoadRng;
    use crate::segment::{NoVisuals, Segment, VisualHandle};

    fn seeded() -> RoadGraph {
        RoadGraph::with_main_path(RoadGenParams::default(), &mut NoVisuals)
    }

    fn heading_angle_deg(a: Vec3, b: Vec3) -> f32 {
        a.angle_between(b).to_degrees()
    }

    #[derive(Default)]
    struct CountingVisuals {
        added: usize,
    }

    impl SegmentVisuals for CountingVisuals {
        fn add_segment_visual(&mut self, segment: &Segment) -> VisualHandle {
            self.added += 1;
            VisualHandle(segment.id.0)
        }

        fn remove_segment_visual(&mut self, _handle: VisualHandle) {}
    }

    #[test]
    fn test_straight_extends_along_heading() {
        let mut graph = seeded();
        let id = append_straight(&mut graph, PathId::MAIN, &mut NoVisuals).unwrap();
        let seg = *graph.segment(id).unwrap();
        assert_eq!(seg.start, Vec3::new(2500.0, 0.0, 0.0));
        assert!((seg.end - Vec3::new(3000.0, 0.0, 0.0)).length() < 1e-3);
        assert_eq!(graph.path(PathId::MAIN).unwrap().tip_position(), seg.end);
    }

    #[test]
    fn test_curve_turns_heading_permanently() {
        let mut graph = seeded();
        let mut rng = RoadRng::from_seed_u64(3);
        let id = append_curve(&mut graph, PathId::MAIN, Side::Left, &mut rng.0, &mut NoVisuals)
            .unwrap();
        let seg = *graph.segment(id).unwrap();
        assert_eq!(seg.kind, SegmentKind::CurveLeft);
        assert!((seg.length() - 500.0).abs() < 1e-2);

        let turn = heading_angle_deg(Vec3::X, seg.direction());
        assert!((15.0 - 1e-2..=30.0 + 1e-2).contains(&turn), "turn {}", turn);
        // Left turns head toward -Z when travelling +X with Y up.
        assert!(seg.direction().z < 0.0);

        let path = graph.path(PathId::MAIN).unwrap();
        assert!((path.tip_direction() - seg.direction()).length() < 1e-4);

        let next = append_straight(&mut graph, PathId::MAIN, &mut NoVisuals).unwrap();
        let next = graph.segment(next).unwrap();
        assert!((next.direction() - seg.direction()).length() < 1e-4);
        assert!(graph.is_contiguous(PathId::MAIN, 1e-3));
    }

    #[test]
    fn test_curve_right_turns_toward_positive_z() {
        let mut graph = seeded();
        let mut rng = RoadRng::from_seed_u64(4);
        let id = append_curve(&mut graph, PathId::MAIN, Side::Right, &mut rng.0, &mut NoVisuals)
            .unwrap();
        let seg = graph.segment(id).unwrap();
        assert_eq!(seg.kind, SegmentKind::CurveRight);
        assert!(seg.direction().z > 0.0);
    }

    #[test]
    fn test_branch_both_spawns_two_paths_at_branch_point() {
        let mut graph = seeded();
        let mut rng = RoadRng::from_seed_u64(11);
        let branch_point = graph.path(PathId::MAIN).unwrap().tip_position();

        let outcome = append_branch(
            &mut graph,
            PathId::MAIN,
            &[Side::Left, Side::Right],
            &mut rng.0,
            &mut NoVisuals,
        )
        .unwrap();

        assert_eq!(outcome.kind, SegmentKind::BranchBoth);
        assert_eq!(outcome.new_paths.len(), 2);
        assert_eq!(graph.path_count(), 3);

        let main_seg = graph.segment(outcome.main_segment).unwrap();
        assert_eq!(main_seg.kind, SegmentKind::Straight);
        assert_eq!(main_seg.start, branch_point);
        assert!(main_seg.direction().abs_diff_eq(Vec3::X, 1e-5));

        for (new_id, kind) in outcome
            .new_paths
            .iter()
            .zip([SegmentKind::BranchLeft, SegmentKind::BranchRight])
        {
            let path = graph.path(*new_id).unwrap();
            assert!(path.is_active());
            assert_eq!(path.parent(), Some(PathId::MAIN));
            assert_eq!(path.branch_point(), Some(branch_point));
            assert_eq!(path.len(), 1);
            let first = graph.segments_of(*new_id).next().unwrap();
            assert_eq!(first.start, branch_point);
            assert_eq!(first.kind, kind);
            let angle = heading_angle_deg(Vec3::X, first.direction());
            assert!((30.0 - 1e-2..=45.0 + 1e-2).contains(&angle), "angle {}", angle);
        }
    }

    #[test]
    fn test_single_side_branch_kind() {
        let mut graph = seeded();
        let mut rng = RoadRng::from_seed_u64(1);
        let kind = append_kind(
            &mut graph,
            PathId::MAIN,
            SegmentKind::BranchRight,
            &mut rng.0,
            &mut NoVisuals,
        );
        assert_eq!(kind, Some(SegmentKind::BranchRight));
        assert_eq!(graph.path_count(), 2);
    }

    #[test]
    fn test_unknown_path_is_noop() {
        let mut graph = seeded();
        let mut rng = RoadRng::from_seed_u64(1);
        let before = graph.live_segment_count();
        for kind in SegmentKind::ALL {
            assert!(append_kind(&mut graph, PathId(42), kind, &mut rng.0, &mut NoVisuals).is_none());
        }
        assert_eq!(graph.live_segment_count(), before);
        assert_eq!(graph.path_count(), 1);
    }

    #[test]
    fn test_degenerate_heading_drops_segment() {
        let mut graph = seeded();
        graph
            .path_mut(PathId::MAIN)
            .unwrap()
            .set_tip_direction(Vec3::ZERO);
        assert!(append_straight(&mut graph, PathId::MAIN, &mut NoVisuals).is_none());
        assert_eq!(graph.live_segment_count(), 5);
    }

    #[test]
    fn test_visuals_notified_once_per_segment() {
        let mut visuals = CountingVisuals::default();
        let mut graph = RoadGraph::with_main_path(RoadGenParams::default(), &mut visuals);
        assert_eq!(visuals.added, 5);
        let mut rng = RoadRng::from_seed_u64(2);
        append_kind(
            &mut graph,
            PathId::MAIN,
            SegmentKind::BranchBoth,
            &mut rng.0,
            &mut visuals,
        );
        assert_eq!(visuals.added, 8);
        assert_eq!(graph.live_segment_count(), 8);
    }
}
