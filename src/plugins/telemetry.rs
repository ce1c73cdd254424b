//! Frame-level telemetry and the per-frame system ordering.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, span_scope};

/// Fixed order of a simulated frame: read input, advance the world,
/// resolve collisions, then everything presentation-only (camera, HUD,
/// animation).
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Simulation,
    Collision,
    Presentation,
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                GameSet::Input,
                GameSet::Simulation,
                GameSet::Collision,
                GameSet::Presentation,
            )
                .chain(),
        );
        app.add_systems(Last, frame_telemetry);
    }
}

fn frame_telemetry(time: Res<Time>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
}
