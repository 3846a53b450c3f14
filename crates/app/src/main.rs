use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use road_gen::{
    PlayerPosition, RoadGenParams, RoadGenPlugin, RoadGenSet, RoadGraph, SegmentDespawned,
    SegmentSpawned,
};

const FIXED_HZ: f64 = 60.0;
/// Forward speed in world units per second.
const PLAYER_SPEED: f32 = 6000.0;
/// Fraction of the lateral gap to the nearest lane center closed each tick.
const LANE_PULL: f32 = 0.1;
const DEFAULT_TICKS: u32 = 3600;
const REPORT_EVERY: u32 = 60;

#[derive(Resource)]
struct DriveLimit {
    elapsed: u32,
    total: u32,
}

fn main() {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / FIXED_HZ,
        ))),
    )
    .add_plugins(LogPlugin::default());

    // Logging is live from here on, so config problems are reported.
    app.insert_resource(load_params())
        .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ))
        .insert_resource(DriveLimit {
            elapsed: 0,
            total: env_ticks(),
        })
        .add_plugins(RoadGenPlugin)
        .add_systems(FixedUpdate, advance_player.in_set(RoadGenSet::Input))
        .add_systems(
            FixedUpdate,
            (report_road, stop_after_limit)
                .chain()
                .after(RoadGenSet::Generate),
        )
        .add_systems(Update, log_segment_events);

    app.run();
}

/// Parameters from the JSON file named by `ROAD_PARAMS`, else defaults.
fn load_params() -> RoadGenParams {
    let Ok(path) = std::env::var("ROAD_PARAMS") else {
        return RoadGenParams::default();
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) => {
            warn!("Could not read {}: {}, using default road parameters", path, e);
            return RoadGenParams::default();
        }
    };
    match RoadGenParams::from_json_str(&json) {
        Ok(params) => {
            info!("Loaded road parameters from {}", path);
            params
        }
        Err(e) => {
            warn!("Invalid road parameters in {}: {}, using defaults", path, e);
            RoadGenParams::default()
        }
    }
}

fn env_ticks() -> u32 {
    std::env::var("ROAD_TICKS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TICKS)
}

/// Drive forward and drift toward the nearest lane center, like an AI car would.
fn advance_player(time: Res<Time>, graph: Res<RoadGraph>, mut player: ResMut<PlayerPosition>) {
    player.0.x += PLAYER_SPEED * time.delta_secs();
    if let Some(lane) = graph.nearest_lane(player.0) {
        let gap = lane.lane_center - player.0;
        player.0.z += gap.z * LANE_PULL;
    }
}

fn report_road(limit: Res<DriveLimit>, graph: Res<RoadGraph>, player: Res<PlayerPosition>) {
    if limit.elapsed % REPORT_EVERY != 0 {
        return;
    }
    let lane = graph.nearest_lane(player.0);
    let ahead = graph.road_ahead_of_player(player.0, 2.0 * graph.params().segment_length);
    let options = graph.branch_options(player.0);
    info!(
        "tick {}: player {:?} on {:?}, lane {:?}, ahead {:?} (branches: {}), {} branch option(s), {} live segments",
        limit.elapsed,
        player.0,
        graph.current_player_path(),
        lane.map(|l| l.lane_index),
        ahead.dominant_kind,
        ahead.branches_ahead,
        options.len(),
        graph.live_segment_count()
    );
}

fn stop_after_limit(mut limit: ResMut<DriveLimit>, mut exit: EventWriter<AppExit>) {
    limit.elapsed += 1;
    if limit.elapsed >= limit.total {
        info!("Drove {} ticks, exiting", limit.elapsed);
        exit.send(AppExit::Success);
    }
}

fn log_segment_events(
    mut spawned: EventReader<SegmentSpawned>,
    mut despawned: EventReader<SegmentDespawned>,
) {
    for event in spawned.read() {
        debug!(
            "spawn {:?} {:?} on {:?}: {} -> {}",
            event.segment.id,
            event.segment.kind,
            event.segment.path_id,
            event.segment.start,
            event.segment.end
        );
    }
    for event in despawned.read() {
        debug!("despawn {:?}", event.segment_id);
    }
}
