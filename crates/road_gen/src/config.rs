use bevy::math::Vec3;

pub const SEGMENT_LENGTH: f32 = 500.0;
pub const ROAD_WIDTH: f32 = 300.0;
pub const LANE_COUNT: usize = 3;
pub const INITIAL_SEGMENTS: usize = 5;

/// A path is extended when the player is closer than this many segment lengths to its tip.
pub const EXTEND_FACTOR: f32 = 2.0;
/// Segments whose end trails the player by more than this many lengths are pruned.
pub const PRUNE_TRAILING_FACTOR: f32 = 3.0;
/// Inactive paths whose last segment trails by more than this many lengths are removed.
pub const RETIRE_FACTOR: f32 = 5.0;

pub const CURVE_ANGLE_DEG: [f32; 2] = [15.0, 30.0];
pub const BRANCH_ANGLE_DEG: [f32; 2] = [30.0, 45.0];

/// Branch points within this many segment lengths of a query point are reported as options.
pub const BRANCH_OPTION_RADIUS_FACTOR: f32 = 0.8;
/// Max gap (world units) between a sibling path's first segment and the branch point.
pub const BRANCH_JOIN_EPSILON: f32 = 10.0;

/// Squared length below which a heading is treated as degenerate.
pub const DEGENERATE_EPSILON_SQ: f32 = 1e-8;

pub const WORLD_UP: Vec3 = Vec3::Y;
/// The player travels along +X; trailing distances are measured on this axis.
pub const TRAVEL_AXIS: Vec3 = Vec3::X;
pub const INITIAL_DIRECTION: Vec3 = Vec3::X;

pub const DEFAULT_SEED: u64 = 42;
