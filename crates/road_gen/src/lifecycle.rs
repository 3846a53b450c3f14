//! Per-tick growth and pruning of the road graph.
//!
//! One call to [`RoadGraph::tick`] per fixed step, in this order:
//! 1. every active path near its tip gets at most one new segment,
//! 2. the player's path label is re-derived,
//! 3. unchosen paths at branch points the player has passed are deactivated,
//! 4. stale segments are pruned from the front of every path,
//! 5. drained inactive paths are removed.

use bevy::prelude::*;
use rand::Rng;

use crate::config::TRAVEL_AXIS;
use crate::graph::RoadGraph;
use crate::segment::{PathId, SegmentVisuals};
use crate::segment_factory;
use crate::spatial_query;
use crate::type_selector::TypeSelector;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Segments created, including the first segment of any new branch path.
    pub appended: usize,
    pub branched: Vec<PathId>,
    pub pruned: usize,
    pub deactivated: Vec<PathId>,
    pub retired: Vec<PathId>,
    pub player_path_changed: bool,
}

fn travel(point: Vec3) -> f32 {
    point.dot(TRAVEL_AXIS)
}

impl RoadGraph {
    pub fn tick(
        &mut self,
        player: Vec3,
        selector: &TypeSelector,
        rng: &mut impl Rng,
        visuals: &mut dyn SegmentVisuals,
    ) -> TickReport {
        let mut report = TickReport::default();
        let created_before = self.segments_created();

        self.extend_paths(player, selector, rng, visuals, &mut report);
        report.appended = (self.segments_created() - created_before) as usize;

        self.update_player_path(player, &mut report);
        self.settle_branch_choices(player, &mut report);
        report.pruned = self.prune_trailing(player, visuals);
        self.retire_drained(player, visuals, &mut report);

        report
    }

    fn extend_paths(
        &mut self,
        player: Vec3,
        selector: &TypeSelector,
        rng: &mut impl Rng,
        visuals: &mut dyn SegmentVisuals,
        report: &mut TickReport,
    ) {
        let extend_distance = self.params().extend_distance();
        let candidates: Vec<PathId> = self
            .active_paths()
            .filter(|p| p.tip_position().distance(player) < extend_distance)
            .map(|p| p.id())
            .collect();

        for path_id in candidates {
            // Earlier appends this tick may have spawned branches.
            let kind = selector.next_kind(self.active_path_count(), rng);
            let paths_before = self.path_count();
            if segment_factory::append_kind(self, path_id, kind, rng, visuals).is_none() {
                continue;
            }
            if kind.is_branch() {
                report.branched.push(path_id);
                debug!(
                    "Lifecycle: {:?} on path {:?} added {} path(s)",
                    kind,
                    path_id,
                    self.path_count() - paths_before
                );
            }
        }
    }

    fn update_player_path(&mut self, player: Vec3, report: &mut TickReport) {
        let Some(found) = spatial_query::player_path(self, player) else {
            return;
        };
        if self.current_player_path() != Some(found) {
            info!("Lifecycle: player now on path {:?}", found);
            self.set_player_path(Some(found));
            report.player_path_changed = true;
        }
    }

    /// Once a branch point is behind the player by the branch option radius,
    /// the player has made their choice: siblings they are not on stop
    /// growing, and if they took a branch the path they left stops too.
    fn settle_branch_choices(&mut self, player: Vec3, report: &mut TickReport) {
        let margin = self.params().branch_option_radius();
        let player_t = travel(player);
        let player_path = self.current_player_path();

        let passed: Vec<(PathId, PathId)> = self
            .active_paths()
            .filter_map(|p| {
                let branch_point = p.branch_point()?;
                let parent = p.parent()?;
                (player_t - travel(branch_point) > margin).then_some((p.id(), parent))
            })
            .collect();

        for (path_id, parent) in passed {
            let abandoned = if player_path == Some(path_id) {
                parent
            } else {
                path_id
            };
            if Some(abandoned) != player_path && self.set_path_active(abandoned, false) {
                debug!("Lifecycle: path {:?} left behind, draining", abandoned);
                report.deactivated.push(abandoned);
            }
        }
    }

    /// Drop segments from the front of each path while their end trails the
    /// player by more than the prune distance. Pruning only from the front
    /// keeps every path contiguous.
    fn prune_trailing(&mut self, player: Vec3, visuals: &mut dyn SegmentVisuals) -> usize {
        let limit = travel(player) - self.params().prune_distance();
        let ids: Vec<PathId> = self.paths().map(|p| p.id()).collect();

        let mut pruned = 0;
        for path_id in ids {
            while let Some(front_end) = self
                .path(path_id)
                .and_then(|p| p.first_segment_id())
                .and_then(|id| self.segment(id))
                .map(|s| s.end)
            {
                if travel(front_end) >= limit {
                    break;
                }
                if self.pop_front_segment(path_id, visuals).is_none() {
                    break;
                }
                pruned += 1;
            }
        }
        pruned
    }

    fn retire_drained(
        &mut self,
        player: Vec3,
        visuals: &mut dyn SegmentVisuals,
        report: &mut TickReport,
    ) {
        let retire_distance = self.params().retire_distance();
        let player_t = travel(player);

        let drained: Vec<PathId> = self
            .paths()
            .filter(|p| !p.is_active())
            .filter(|p| match self.last_segment(p.id()) {
                Some(last) => player_t - travel(last.end) > retire_distance,
                None => true,
            })
            .map(|p| p.id())
            .collect();

        for path_id in drained {
            if self.remove_path(path_id, visuals) {
                info!("Lifecycle: path {:?} removed", path_id);
                report.retired.push(path_id);
            }
        }
    }
}
