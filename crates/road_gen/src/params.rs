//! Data-driven road generation parameters.
//!
//! Collects the generator's tunables into a single [`RoadGenParams`] resource
//! so they can be overridden from JSON without recompilation. Fields missing
//! from the JSON keep their defaults from [`crate::config`].

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    BRANCH_ANGLE_DEG, BRANCH_JOIN_EPSILON, BRANCH_OPTION_RADIUS_FACTOR, CURVE_ANGLE_DEG,
    DEFAULT_SEED, EXTEND_FACTOR, INITIAL_SEGMENTS, LANE_COUNT, PRUNE_TRAILING_FACTOR,
    RETIRE_FACTOR, ROAD_WIDTH, SEGMENT_LENGTH,
};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadGenParams {
    /// Length of every generated segment in world units.
    pub segment_length: f32,
    /// Full road width, split evenly into `lane_count` lanes.
    pub road_width: f32,
    pub lane_count: usize,
    /// Straight segments laid on the main path before the first tick.
    pub initial_segments: usize,
    pub extend_factor: f32,
    pub prune_trailing_factor: f32,
    pub retire_factor: f32,
    /// Inclusive `[min, max]` turn applied by a curve segment, in degrees.
    pub curve_angle_deg: [f32; 2],
    /// Inclusive `[min, max]` divergence of a branch path from its parent, in degrees.
    pub branch_angle_deg: [f32; 2],
    pub branch_option_radius_factor: f32,
    pub branch_join_epsilon: f32,
    pub seed: u64,
}

impl Default for RoadGenParams {
    fn default() -> Self {
        Self {
            segment_length: SEGMENT_LENGTH,
            road_width: ROAD_WIDTH,
            lane_count: LANE_COUNT,
            initial_segments: INITIAL_SEGMENTS,
            extend_factor: EXTEND_FACTOR,
            prune_trailing_factor: PRUNE_TRAILING_FACTOR,
            retire_factor: RETIRE_FACTOR,
            curve_angle_deg: CURVE_ANGLE_DEG,
            branch_angle_deg: BRANCH_ANGLE_DEG,
            branch_option_radius_factor: BRANCH_OPTION_RADIUS_FACTOR,
            branch_join_epsilon: BRANCH_JOIN_EPSILON,
            seed: DEFAULT_SEED,
        }
    }
}

impl RoadGenParams {
    /// Parse parameter overrides from JSON and clamp them into a usable range.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let params: Self = serde_json::from_str(json)?;
        Ok(params.sanitized())
    }

    /// Distance to a path tip under which the path gets a new segment.
    pub fn extend_distance(&self) -> f32 {
        self.segment_length * self.extend_factor
    }

    pub fn prune_distance(&self) -> f32 {
        self.segment_length * self.prune_trailing_factor
    }

    pub fn retire_distance(&self) -> f32 {
        self.segment_length * self.retire_factor
    }

    pub fn lane_width(&self) -> f32 {
        self.road_width / self.lane_count.max(1) as f32
    }

    pub fn branch_option_radius(&self) -> f32 {
        self.segment_length * self.branch_option_radius_factor
    }

    /// Replace values the generator cannot work with by their defaults.
    ///
    /// Each correction is logged; nothing here is fatal.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if !(self.segment_length.is_finite() && self.segment_length > 0.0) {
            warn!(
                "RoadGenParams: segment_length {} is not positive, using {}",
                self.segment_length, defaults.segment_length
            );
            self.segment_length = defaults.segment_length;
        }
        if !(self.road_width.is_finite() && self.road_width > 0.0) {
            warn!(
                "RoadGenParams: road_width {} is not positive, using {}",
                self.road_width, defaults.road_width
            );
            self.road_width = defaults.road_width;
        }
        if self.lane_count == 0 {
            warn!("RoadGenParams: lane_count 0, using {}", defaults.lane_count);
            self.lane_count = defaults.lane_count;
        }
        if self.initial_segments == 0 {
            warn!(
                "RoadGenParams: initial_segments 0, using {}",
                defaults.initial_segments
            );
            self.initial_segments = defaults.initial_segments;
        }

        for (name, value, default) in [
            ("extend_factor", &mut self.extend_factor, defaults.extend_factor),
            (
                "prune_trailing_factor",
                &mut self.prune_trailing_factor,
                defaults.prune_trailing_factor,
            ),
            ("retire_factor", &mut self.retire_factor, defaults.retire_factor),
            (
                "branch_option_radius_factor",
                &mut self.branch_option_radius_factor,
                defaults.branch_option_radius_factor,
            ),
            (
                "branch_join_epsilon",
                &mut self.branch_join_epsilon,
                defaults.branch_join_epsilon,
            ),
        ] {
            if !(value.is_finite() && *value > 0.0) {
                warn!("RoadGenParams: {} {} is not positive, using {}", name, value, default);
                *value = default;
            }
        }

        for (name, range, default) in [
            ("curve_angle_deg", &mut self.curve_angle_deg, defaults.curve_angle_deg),
            ("branch_angle_deg", &mut self.branch_angle_deg, defaults.branch_angle_deg),
        ] {
            let [lo, hi] = *range;
            if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi && hi < 180.0) {
                warn!("RoadGenParams: {} {:?} is not a valid range, using {:?}", name, range, default);
                *range = default;
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_distances() {
        let params = RoadGenParams::default();
        assert_eq!(params.extend_distance(), 1000.0);
        assert_eq!(params.prune_distance(), 1500.0);
        assert_eq!(params.retire_distance(), 2500.0);
        assert!((params.lane_width() - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params = RoadGenParams::from_json_str(r#"{ "segment_length": 250.0, "seed": 7 }"#)
            .expect("valid json");
        assert_eq!(params.segment_length, 250.0);
        assert_eq!(params.seed, 7);
        assert_eq!(params.road_width, ROAD_WIDTH);
        assert_eq!(params.prune_trailing_factor, PRUNE_TRAILING_FACTOR);
    }

    #[test]
    fn test_prune_and_retire_are_independent() {
        let params = RoadGenParams::from_json_str(r#"{ "retire_factor": 8.0 }"#).unwrap();
        assert_eq!(params.prune_distance(), 1500.0);
        assert_eq!(params.retire_distance(), 4000.0);
    }

    #[test]
    fn test_invalid_values_are_replaced() {
        let params = RoadGenParams::from_json_str(
            r#"{ "segment_length": -3.0, "lane_count": 0, "curve_angle_deg": [40.0, 10.0] }"#,
        )
        .unwrap();
        assert_eq!(params.segment_length, SEGMENT_LENGTH);
        assert_eq!(params.lane_count, LANE_COUNT);
        assert_eq!(params.curve_angle_deg, CURVE_ANGLE_DEG);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(RoadGenParams::from_json_str("{ segment_length: }").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let params = RoadGenParams {
            seed: 99,
            ..Default::default()
        };
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(RoadGenParams::from_json_str(&json).unwrap(), params);
    }
}
