//! Bevy wiring: resources, events and the fixed-step generation system.

use bevy::prelude::*;

use crate::graph::RoadGraph;
use crate::params::RoadGenParams;
use crate::road_rng::RoadRng;
use crate::segment::{Segment, SegmentId, SegmentVisuals, VisualHandle};
use crate::type_selector::{apply_weight_overrides, SetSegmentWeights, TypeSelector};

/// Ordered phases for road generation inside `FixedUpdate`.
///
/// Collaborators that read the graph (AI steering, HUD) should run
/// `.after(RoadGenSet::Generate)` so they see this tick's segments.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoadGenSet {
    /// Weight overrides and player position updates.
    Input,
    /// The single mutating pass over the graph.
    Generate,
}

/// Player position written by the vehicle controller before each tick.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PlayerPosition(pub Vec3);

/// Marker: when present, startup leaves the `RoadGraph` as inserted.
#[derive(Resource)]
pub struct SkipRoadSeed;

/// A segment was created; the renderer should build its mesh.
#[derive(Event, Debug, Clone, Copy)]
pub struct SegmentSpawned {
    pub segment: Segment,
}

/// A segment was removed; the renderer should drop its mesh.
#[derive(Event, Debug, Clone, Copy)]
pub struct SegmentDespawned {
    pub segment_id: SegmentId,
}

/// Render adapter that turns graph notifications into Bevy events.
///
/// The handle is the segment id, so renderers can key meshes by it.
pub struct EventVisuals<'a, 'ws, 'wd> {
    spawned: &'a mut EventWriter<'ws, SegmentSpawned>,
    despawned: &'a mut EventWriter<'wd, SegmentDespawned>,
}

impl<'a, 'ws, 'wd> EventVisuals<'a, 'ws, 'wd> {
    pub fn new(
        spawned: &'a mut EventWriter<'ws, SegmentSpawned>,
        despawned: &'a mut EventWriter<'wd, SegmentDespawned>,
    ) -> Self {
        Self { spawned, despawned }
    }
}

impl SegmentVisuals for EventVisuals<'_, '_, '_> {
    fn add_segment_visual(&mut self, segment: &Segment) -> VisualHandle {
        self.spawned.send(SegmentSpawned { segment: *segment });
        VisualHandle(segment.id.0)
    }

    fn remove_segment_visual(&mut self, handle: VisualHandle) {
        self.despawned.send(SegmentDespawned {
            segment_id: SegmentId(handle.0),
        });
    }
}

pub fn seed_road_graph(
    params: Res<RoadGenParams>,
    skip: Option<Res<SkipRoadSeed>>,
    mut graph: ResMut<RoadGraph>,
    mut rng: ResMut<RoadRng>,
    mut spawned: EventWriter<SegmentSpawned>,
    mut despawned: EventWriter<SegmentDespawned>,
) {
    if skip.is_some() {
        return;
    }
    let params = params.clone().sanitized();
    *rng = RoadRng::from_seed_u64(params.seed);
    let mut visuals = EventVisuals::new(&mut spawned, &mut despawned);
    *graph = RoadGraph::with_main_path(params, &mut visuals);
}

pub fn tick_road_graph(
    player: Res<PlayerPosition>,
    selector: Res<TypeSelector>,
    mut rng: ResMut<RoadRng>,
    mut graph: ResMut<RoadGraph>,
    mut spawned: EventWriter<SegmentSpawned>,
    mut despawned: EventWriter<SegmentDespawned>,
) {
    let mut visuals = EventVisuals::new(&mut spawned, &mut despawned);
    let report = graph.tick(player.0, &selector, &mut rng.0, &mut visuals);
    if report.appended > 0 || report.pruned > 0 || !report.retired.is_empty() {
        debug!(
            "RoadGen tick: +{} -{} segments, {} live, {} paths ({} active)",
            report.appended,
            report.pruned,
            graph.live_segment_count(),
            graph.path_count(),
            graph.active_path_count()
        );
    }
}

pub struct RoadGenPlugin;

impl Plugin for RoadGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RoadGenParams>()
            .init_resource::<RoadRng>()
            .init_resource::<TypeSelector>()
            .init_resource::<RoadGraph>()
            .init_resource::<PlayerPosition>()
            .add_event::<SegmentSpawned>()
            .add_event::<SegmentDespawned>()
            .add_event::<SetSegmentWeights>()
            .configure_sets(FixedUpdate, (RoadGenSet::Input, RoadGenSet::Generate).chain())
            .add_systems(Startup, seed_road_graph)
            .add_systems(
                FixedUpdate,
                (
                    apply_weight_overrides.in_set(RoadGenSet::Input),
                    tick_road_graph.in_set(RoadGenSet::Generate),
                ),
            );
    }
}
