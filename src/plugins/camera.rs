use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use super::telemetry::GameSet;
use crate::components::Player;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera);
        app.add_systems(Update, follow_player.in_set(GameSet::Presentation));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Keep the player centered in the viewport. Runs after simulation so the
/// camera never lags a frame behind the player's position.
#[span_fn]
fn follow_player(
    players: Query<&Transform, (With<Player>, Without<Camera2d>)>,
    mut cameras: Query<&mut Transform, With<Camera2d>>,
) {
    let Ok(player) = players.single() else {
        return;
    };
    let Ok(mut camera) = cameras.single_mut() else {
        return;
    };

    camera.translation.x = player.translation.x;
    camera.translation.y = player.translation.y;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_tracks_player_position() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(crate::plugins::telemetry::TelemetryPlugin);
        app.add_plugins(CameraPlugin);

        let player = app
            .world_mut()
            .spawn((Player, Transform::from_xyz(700.0, -350.0, 10.0)))
            .id();
        app.update();

        let mut cameras = app.world_mut().query_filtered::<&Transform, With<Camera2d>>();
        let cam = cameras.single(app.world()).unwrap();
        assert_eq!(cam.translation.truncate(), Vec2::new(700.0, -350.0));

        app.world_mut().entity_mut(player).insert(Transform::from_xyz(1200.0, -100.0, 10.0));
        app.update();
        let cam = cameras.single(app.world()).unwrap();
        assert_eq!(cam.translation.truncate(), Vec2::new(1200.0, -100.0));
    }
}
