//! Velocity integration and axis-separated tile collision.
//!
//! Entities with a `Velocity` move continuously. Entities that also carry
//! `TileCollider` resolve against the level's solid grid one axis at a
//! time (horizontal, then vertical), which prevents tunneling into tiles
//! at the cost of corner precision nobody notices.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::components::*;
use crate::plugins::level::{LevelMap, TILE_SIZE};
use crate::plugins::telemetry::GameSet;

/// Downward acceleration, pixels per second squared.
pub const GRAVITY: f32 = 2600.0;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (apply_gravity, move_free_bodies, move_tile_colliders)
                .chain()
                .in_set(GameSet::Simulation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// Accelerate falling entities.
#[span_fn]
fn apply_gravity(time: Res<Time>, mut query: Query<&mut Velocity, With<GravityAffected>>) {
    for mut vel in &mut query {
        vel.0.y -= GRAVITY * time.delta_secs();
    }
}

/// Plain integration for entities that ignore terrain (bullets, bees, worms).
#[span_fn]
pub fn move_free_bodies(
    time: Res<Time>,
    mut query: Query<(&Velocity, &mut Transform), Without<TileCollider>>,
) {
    for (vel, mut transform) in &mut query {
        transform.translation.x += vel.0.x * time.delta_secs();
        transform.translation.y += vel.0.y * time.delta_secs();
    }
}

/// Integrate and resolve terrain collisions, horizontal axis first.
/// Zeroes velocity on the blocked axis; landing from above sets `Grounded`.
#[span_fn]
fn move_tile_colliders(
    time: Res<Time>,
    level: Option<Res<LevelMap>>,
    mut query: Query<(&mut Velocity, &mut Transform, &Hitbox, &mut Grounded), With<TileCollider>>,
) {
    let Some(level) = level else { return };
    let dt = time.delta_secs();

    for (mut vel, mut transform, hitbox, mut grounded) in &mut query {
        let half = hitbox.0 / 2.0;

        // Horizontal
        transform.translation.x += vel.0.x * dt;
        let rect = hitbox.rect_at(transform.translation.truncate());
        if level.collides(rect) {
            if vel.0.x > 0.0 {
                let col = ((rect.max.x - 0.001) / TILE_SIZE).floor();
                transform.translation.x = col * TILE_SIZE - half.x;
            } else if vel.0.x < 0.0 {
                let col = (rect.min.x / TILE_SIZE).floor();
                transform.translation.x = (col + 1.0) * TILE_SIZE + half.x;
            }
            vel.0.x = 0.0;
        }

        // Vertical
        transform.translation.y += vel.0.y * dt;
        let rect = hitbox.rect_at(transform.translation.truncate());
        if level.collides(rect) {
            if vel.0.y < 0.0 {
                // Landed: snap the bottom edge onto the tile top.
                let row = ((-rect.min.y - 0.001) / TILE_SIZE).floor();
                transform.translation.y = -(row * TILE_SIZE) + half.y;
            } else if vel.0.y > 0.0 {
                let row = (-rect.max.y / TILE_SIZE).floor();
                transform.translation.y = -((row + 1.0) * TILE_SIZE) - half.y;
            }
            vel.0.y = 0.0;
        }

        // Standing probe: one pixel below the resolved rectangle.
        let rect = hitbox.rect_at(transform.translation.truncate());
        let below = Rect::new(rect.min.x, rect.min.y - 1.0, rect.max.x, rect.min.y);
        grounded.0 = level.collides(below);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    // One floor row at the bottom, one wall column on the right.
    const TEST_LEVEL: &str = "\
P   #
    #
#####";

    /// Headless app stepping a fixed 100ms per update.
    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            100,
        )));
        app.init_state::<AppState>();
        app.insert_resource(LevelMap::parse(TEST_LEVEL).unwrap());
        app.add_plugins(crate::plugins::telemetry::TelemetryPlugin);
        app.add_plugins(MovementPlugin);

        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::InGame);
        for _ in 0..5 {
            app.update();
        }
        app
    }

    #[test]
    fn free_body_moves_by_velocity_dt() {
        let mut app = setup_app();
        let e = app
            .world_mut()
            .spawn((
                Velocity(Vec2::new(-400.0, 0.0)),
                Transform::from_xyz(500.0, -100.0, 0.0),
            ))
            .id();

        app.update();

        let x = app.world().entity(e).get::<Transform>().unwrap().translation.x;
        assert!((x - 460.0).abs() < 0.5, "x was {}", x);
    }

    #[test]
    fn collider_lands_on_floor_and_grounds() {
        let mut app = setup_app();
        // Drop from mid-air above the floor row (row 2, top at y = -128).
        let e = app
            .world_mut()
            .spawn((
                Velocity(Vec2::new(0.0, -300.0)),
                Transform::from_xyz(96.0, -90.0, 0.0),
                Hitbox(Vec2::new(40.0, 40.0)),
                Grounded(false),
                TileCollider,
            ))
            .id();

        app.update();
        app.update();

        let entity = app.world().entity(e);
        let t = entity.get::<Transform>().unwrap();
        // Bottom edge snapped to tile top, velocity zeroed, grounded set.
        assert!(
            (t.translation.y - (-128.0 + 20.0)).abs() < 0.5,
            "y was {}",
            t.translation.y
        );
        assert_eq!(entity.get::<Velocity>().unwrap().0.y, 0.0);
        assert!(entity.get::<Grounded>().unwrap().0);
    }

    #[test]
    fn collider_blocked_by_wall_zeroes_vx() {
        let mut app = setup_app();
        // Run right into the wall column (col 4, left edge at x = 256).
        let e = app
            .world_mut()
            .spawn((
                Velocity(Vec2::new(500.0, 0.0)),
                Transform::from_xyz(200.0, -96.0, 0.0),
                Hitbox(Vec2::new(40.0, 40.0)),
                Grounded(false),
                TileCollider,
            ))
            .id();

        for _ in 0..3 {
            app.update();
        }

        let entity = app.world().entity(e);
        let t = entity.get::<Transform>().unwrap();
        assert!(
            (t.translation.x - (256.0 - 20.0)).abs() < 0.5,
            "x was {}",
            t.translation.x
        );
        assert_eq!(entity.get::<Velocity>().unwrap().0.x, 0.0);
    }

    #[test]
    fn gravity_accelerates_downward() {
        let mut app = setup_app();
        let e = app
            .world_mut()
            .spawn((
                Velocity(Vec2::ZERO),
                GravityAffected,
                Transform::from_xyz(96.0, -60.0, 0.0),
            ))
            .id();

        app.update();

        let vy = app.world().entity(e).get::<Velocity>().unwrap().0.y;
        assert!(vy < -200.0, "vy was {}", vy);
    }
}
