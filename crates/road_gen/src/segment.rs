use bevy::prelude::*;

/// Stable identifier of a path. Never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(pub u32);

impl PathId {
    /// The trunk path seeded when the graph is created.
    pub const MAIN: PathId = PathId(0);
}

/// Stable identifier of a segment. Never reused within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u64);

/// Which way a curve turns or a branch diverges, seen from the direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Sign of the rotation about world up. Left turns are counter-clockwise seen from above.
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Straight,
    CurveLeft,
    CurveRight,
    BranchLeft,
    BranchRight,
    BranchBoth,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 6] = [
        SegmentKind::Straight,
        SegmentKind::CurveLeft,
        SegmentKind::CurveRight,
        SegmentKind::BranchLeft,
        SegmentKind::BranchRight,
        SegmentKind::BranchBoth,
    ];

    pub fn is_branch(self) -> bool {
        matches!(
            self,
            SegmentKind::BranchLeft | SegmentKind::BranchRight | SegmentKind::BranchBoth
        )
    }

    pub fn is_curve(self) -> bool {
        matches!(self, SegmentKind::CurveLeft | SegmentKind::CurveRight)
    }

    pub fn curve(side: Side) -> Self {
        match side {
            Side::Left => SegmentKind::CurveLeft,
            Side::Right => SegmentKind::CurveRight,
        }
    }

    pub fn branch(side: Side) -> Self {
        match side {
            Side::Left => SegmentKind::BranchLeft,
            Side::Right => SegmentKind::BranchRight,
        }
    }
}

/// One fixed-length stretch of road. Immutable once created; only ever removed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub id: SegmentId,
    pub path_id: PathId,
    pub start: Vec3,
    pub end: Vec3,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Unit heading from start to end, or zero for a degenerate segment.
    pub fn direction(&self) -> Vec3 {
        (self.end - self.start).normalize_or_zero()
    }
}

/// Opaque handle returned by the render side for one segment's visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualHandle(pub u64);

/// Render collaborator notified once per segment creation and once per removal.
///
/// The generator holds no visual state besides the handle it is given back.
pub trait SegmentVisuals {
    fn add_segment_visual(&mut self, segment: &Segment) -> VisualHandle;
    fn remove_segment_visual(&mut self, handle: VisualHandle);
}

/// Discards all notifications. Used for headless simulation and benchmarks.
#[derive(Debug, Default)]
pub struct NoVisuals;

impl SegmentVisuals for NoVisuals {
    fn add_segment_visual(&mut self, segment: &Segment) -> VisualHandle {
        VisualHandle(segment.id.0)
    }

    fn remove_segment_visual(&mut self, _handle: VisualHandle) {}
}
