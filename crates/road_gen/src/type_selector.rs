//! Weighted choice of the next segment kind for a path.
//!
//! The draw walks a cumulative table in a fixed order. While more than one
//! path is active the branch family is dropped and the remainder renormalized,
//! which keeps branching from compounding.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::segment::SegmentKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub straight: f64,
    pub curve_left: f64,
    pub curve_right: f64,
    pub branch_left: f64,
    pub branch_right: f64,
    pub branch_both: f64,
}

impl WeightTable {
    pub const BASE: WeightTable = WeightTable {
        straight: 0.55,
        curve_left: 0.10,
        curve_right: 0.10,
        branch_left: 0.10,
        branch_right: 0.10,
        branch_both: 0.05,
    };

    pub const ALL_STRAIGHT: WeightTable = WeightTable {
        straight: 1.0,
        curve_left: 0.0,
        curve_right: 0.0,
        branch_left: 0.0,
        branch_right: 0.0,
        branch_both: 0.0,
    };

    pub fn weight(&self, kind: SegmentKind) -> f64 {
        match kind {
            SegmentKind::Straight => self.straight,
            SegmentKind::CurveLeft => self.curve_left,
            SegmentKind::CurveRight => self.curve_right,
            SegmentKind::BranchLeft => self.branch_left,
            SegmentKind::BranchRight => self.branch_right,
            SegmentKind::BranchBoth => self.branch_both,
        }
    }

    /// Entries in draw order. Negative weights count as zero.
    pub fn entries(&self) -> [(SegmentKind, f64); 6] {
        [
            SegmentKind::BranchBoth,
            SegmentKind::BranchLeft,
            SegmentKind::BranchRight,
            SegmentKind::CurveLeft,
            SegmentKind::CurveRight,
            SegmentKind::Straight,
        ]
        .map(|kind| (kind, self.weight(kind).max(0.0)))
    }

    pub fn total(&self) -> f64 {
        self.entries().iter().map(|(_, w)| w).sum()
    }

    pub fn branch_total(&self) -> f64 {
        self.entries()
            .iter()
            .filter(|(kind, _)| kind.is_branch())
            .map(|(_, w)| w)
            .sum()
    }

    /// Same table with the branch family removed and the rest scaled to sum to 1.
    ///
    /// A table with no non-branch weight left collapses to all-straight.
    pub fn without_branches(&self) -> WeightTable {
        let total = self.straight.max(0.0) + self.curve_left.max(0.0) + self.curve_right.max(0.0);
        if !(total.is_finite() && total > 0.0) {
            return Self::ALL_STRAIGHT;
        }
        WeightTable {
            straight: self.straight.max(0.0) / total,
            curve_left: self.curve_left.max(0.0) / total,
            curve_right: self.curve_right.max(0.0) / total,
            branch_left: 0.0,
            branch_right: 0.0,
            branch_both: 0.0,
        }
    }

    /// Base proportions with the branch family rescaled to sum to `chance`.
    ///
    /// This is how a difficulty scorer expresses "branching road chance".
    pub fn with_branch_chance(chance: f64) -> WeightTable {
        let chance = if chance.is_finite() { chance.clamp(0.0, 1.0) } else { 0.0 };
        let base = Self::BASE;
        let branch_scale = chance / base.branch_total();
        let rest_scale = (1.0 - chance) / (base.total() - base.branch_total());
        WeightTable {
            straight: base.straight * rest_scale,
            curve_left: base.curve_left * rest_scale,
            curve_right: base.curve_right * rest_scale,
            branch_left: base.branch_left * branch_scale,
            branch_right: base.branch_right * branch_scale,
            branch_both: base.branch_both * branch_scale,
        }
    }

    /// Map a uniform draw in `[0, 1)` to a kind. Falls back to `Straight` when
    /// rounding leaves the draw past the last cumulative entry.
    pub fn pick(&self, r: f64) -> SegmentKind {
        let mut cumulative = 0.0;
        for (kind, weight) in self.entries() {
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            if r <= cumulative {
                return kind;
            }
        }
        SegmentKind::Straight
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::BASE
    }
}

/// Segment kind policy. A difficulty collaborator may install an override table.
#[derive(Resource, Debug, Clone, Default)]
pub struct TypeSelector {
    override_weights: Option<WeightTable>,
}

impl TypeSelector {
    pub fn with_override(weights: WeightTable) -> Self {
        Self {
            override_weights: Some(weights),
        }
    }

    pub fn set_override(&mut self, weights: Option<WeightTable>) {
        self.override_weights = weights;
    }

    /// Table in force before branch suppression.
    pub fn weights(&self) -> WeightTable {
        self.override_weights.unwrap_or(WeightTable::BASE)
    }

    /// Table actually drawn from, given how many paths are currently active.
    pub fn effective_weights(&self, active_paths: usize) -> WeightTable {
        let weights = self.weights();
        if active_paths > 1 {
            weights.without_branches()
        } else {
            weights
        }
    }

    pub fn next_kind(&self, active_paths: usize, rng: &mut impl Rng) -> SegmentKind {
        let r: f64 = rng.gen();
        self.effective_weights(active_paths).pick(r)
    }
}

/// Replace (or clear, with `None`) the weight override from outside the generator.
#[derive(Event, Debug, Clone, Copy)]
pub struct SetSegmentWeights(pub Option<WeightTable>);

pub(crate) fn apply_weight_overrides(
    mut events: EventReader<SetSegmentWeights>,
    mut selector: ResMut<TypeSelector>,
) {
    for event in events.read() {
        debug!("TypeSelector: weight override set to {:?}", event.0);
        selector.set_override(event.0);
    }
}
