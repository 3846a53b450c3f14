//! # TestRoad: headless harness for the road generator
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` + [`RoadGenPlugin`] so tests
//! can drive the player and inspect the graph exactly as the game would.

use bevy::app::App;
use bevy::ecs::event::Events;
use bevy::prelude::*;

use crate::graph::RoadGraph;
use crate::params::RoadGenParams;
use crate::plugin::{PlayerPosition, RoadGenPlugin, SegmentDespawned, SegmentSpawned};
use crate::type_selector::{SetSegmentWeights, TypeSelector, WeightTable};

pub struct TestRoad {
    app: App,
}

impl Default for TestRoad {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRoad {
    /// Default parameters, main path seeded.
    pub fn new() -> Self {
        Self::with_params(RoadGenParams::default())
    }

    pub fn with_params(params: RoadGenParams) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        // Insert before the plugin so init_resource keeps ours.
        app.insert_resource(params);
        app.add_plugins(RoadGenPlugin);
        // Run one update so the Startup seed executes.
        app.update();
        Self { app }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_params(RoadGenParams {
            seed,
            ..Default::default()
        })
    }

    /// Install a weight override directly on the selector.
    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.app
            .world_mut()
            .resource_mut::<TypeSelector>()
            .set_override(Some(weights));
        self
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Place the player and run one fixed step.
    pub fn tick_at(&mut self, position: Vec3) {
        self.app.world_mut().resource_mut::<PlayerPosition>().0 = position;
        self.app.world_mut().run_schedule(FixedUpdate);
    }

    /// Advance the player along +X by `step` per tick, `n` times.
    pub fn drive(&mut self, step: f32, n: u32) {
        for _ in 0..n {
            let position = self.player_position() + Vec3::X * step;
            self.tick_at(position);
        }
    }

    pub fn send_weights(&mut self, weights: Option<WeightTable>) {
        self.app.world_mut().send_event(SetSegmentWeights(weights));
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &RoadGraph {
        self.app.world().resource::<RoadGraph>()
    }

    pub fn selector(&self) -> &TypeSelector {
        self.app.world().resource::<TypeSelector>()
    }

    pub fn player_position(&self) -> Vec3 {
        self.app.world().resource::<PlayerPosition>().0
    }

    /// Drain and count spawn/despawn events seen since the last call.
    pub fn drain_visual_events(&mut self) -> (usize, usize) {
        let world = self.app.world_mut();
        let spawned = world
            .resource_mut::<Events<SegmentSpawned>>()
            .drain()
            .count();
        let despawned = world
            .resource_mut::<Events<SegmentDespawned>>()
            .drain()
            .count();
        (spawned, despawned)
    }
}
