//! Player spawning and input handling.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::components::*;
use crate::events::ShotFired;
use crate::mask::{CollisionMask, PixelMask};
use crate::plugins::level::{LevelMap, load_level};
use crate::plugins::sprites::{
    AnimationState, AnimationTimer, CharacterSheetRef, SpriteSheetLibrary, set_animation,
};
use crate::plugins::telemetry::GameSet;

/// Horizontal run speed, pixels per second.
pub const PLAYER_SPEED: f32 = 400.0;
/// Initial upward velocity of a jump.
pub const JUMP_SPEED: f32 = 1000.0;
/// Minimum interval between shots.
pub const FIRE_COOLDOWN_SECS: f32 = 0.25;

pub const PLAYER_HITBOX: Vec2 = Vec2::new(48.0, 88.0);

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_player.after(load_level));
        app.add_systems(
            Update,
            (player_input, sync_walk_animation)
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

/// Cooldown between shots. Starts ready so the first press always fires.
#[derive(Component, Deref, DerefMut)]
pub struct ShotCooldown(pub Timer);

impl ShotCooldown {
    pub fn ready() -> Self {
        let mut timer = Timer::from_seconds(FIRE_COOLDOWN_SECS, TimerMode::Once);
        let elapsed = timer.duration();
        timer.tick(elapsed);
        Self(timer)
    }
}

/// Spawn the player entity at the level's spawn point.
#[span_fn]
pub fn spawn_player(
    mut commands: Commands,
    level: Res<LevelMap>,
    mut library: ResMut<SpriteSheetLibrary>,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    if !library.sheets.contains_key("player") {
        let _ = library.load("player", "sprites/player.png", &asset_server, &mut layouts);
    }

    let pos = level.player_spawn;

    let mut entity_commands = commands.spawn((
        Player,
        Facing::Right,
        Velocity::default(),
        Grounded(false),
        GravityAffected,
        TileCollider,
        Hitbox(PLAYER_HITBOX),
        CollisionMask(PixelMask::solid(
            PLAYER_HITBOX.x as u32,
            PLAYER_HITBOX.y as u32,
        )),
        ShotCooldown::ready(),
        crate::plugins::level::LevelEntity,
        Transform::from_xyz(pos.x, pos.y, 10.0),
    ));

    if let Some(sheet) = library.sheets.get("player") {
        let start_index = sheet
            .meta
            .animations
            .get("idle")
            .map(|r| r.start)
            .unwrap_or(0);

        entity_commands.insert((
            Sprite {
                image: sheet.image.clone(),
                texture_atlas: Some(TextureAtlas {
                    layout: sheet.layout.clone(),
                    index: start_index,
                }),
                custom_size: Some(PLAYER_HITBOX),
                ..default()
            },
            CharacterSheetRef("player".to_string()),
            AnimationState::new("idle", true),
            AnimationTimer(Timer::from_seconds(0.1, TimerMode::Repeating)),
        ));
    }
}

/// Read keyboard input: horizontal velocity and facing, jump when grounded,
/// fire subject to the cooldown. Shots become `ShotFired` events drained
/// by the combat plugin instead of a direct call back into a controller.
#[allow(clippy::type_complexity)]
#[span_fn]
fn player_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut commands: Commands,
    mut query: Query<
        (
            &mut Velocity,
            &mut Facing,
            &Grounded,
            &mut ShotCooldown,
            &Transform,
        ),
        With<Player>,
    >,
) {
    for (mut vel, mut facing, grounded, mut cooldown, transform) in &mut query {
        let left = keyboard.pressed(KeyCode::ArrowLeft) || keyboard.pressed(KeyCode::KeyA);
        let right = keyboard.pressed(KeyCode::ArrowRight) || keyboard.pressed(KeyCode::KeyD);

        vel.0.x = match (left, right) {
            (true, false) => -PLAYER_SPEED,
            (false, true) => PLAYER_SPEED,
            _ => 0.0,
        };
        if left != right {
            *facing = if left { Facing::Left } else { Facing::Right };
        }

        let jump = keyboard.just_pressed(KeyCode::Space)
            || keyboard.just_pressed(KeyCode::ArrowUp)
            || keyboard.just_pressed(KeyCode::KeyW);
        if jump && grounded.0 {
            vel.0.y = JUMP_SPEED;
        }

        cooldown.tick(time.delta());
        if keyboard.pressed(KeyCode::KeyF) && cooldown.is_finished() {
            cooldown.reset();
            commands.trigger(ShotFired {
                origin: transform.translation.truncate(),
                facing: *facing,
            });
        }
    }
}

/// Walk while moving horizontally, idle otherwise.
#[span_fn]
fn sync_walk_animation(
    library: Res<SpriteSheetLibrary>,
    mut query: Query<
        (
            &CharacterSheetRef,
            &Velocity,
            &mut AnimationState,
            &mut Sprite,
        ),
        With<Player>,
    >,
) {
    for (sheet_ref, vel, mut anim_state, mut sprite) in &mut query {
        let Some(sheet) = library.sheets.get(&sheet_ref.0) else {
            continue;
        };
        let key = if vel.0.x != 0.0 { "walk" } else { "idle" };
        set_animation(&mut sprite, &mut anim_state, key, true, &sheet.meta);
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

    /// Counts fired shots via the observer API.
    #[derive(Resource, Default)]
    struct ShotCount(u32);

    fn count_shots(_shot: On<ShotFired>, mut count: ResMut<ShotCount>) {
        count.0 += 1;
    }

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(
            100,
        )));
        app.init_state::<AppState>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.init_resource::<ShotCount>();
        app.add_observer(count_shots);
        app.add_plugins(crate::plugins::telemetry::TelemetryPlugin);
        app.add_systems(
            Update,
            player_input
                .in_set(GameSet::Input)
                .run_if(in_state(AppState::InGame)),
        );

        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::InGame);
        for _ in 0..5 {
            app.update();
        }
        app
    }

    fn spawn_test_player(app: &mut App, grounded: bool) -> Entity {
        app.world_mut()
            .spawn((
                Player,
                Facing::Right,
                Velocity::default(),
                Grounded(grounded),
                ShotCooldown::ready(),
                Transform::from_xyz(100.0, -100.0, 10.0),
            ))
            .id()
    }

    fn press(app: &mut App, key: KeyCode) {
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(key);
    }

    #[test]
    fn left_input_sets_velocity_and_facing() {
        let mut app = setup_app();
        let player = spawn_test_player(&mut app, true);
        press(&mut app, KeyCode::KeyA);
        app.update();

        let entity = app.world().entity(player);
        assert_eq!(entity.get::<Velocity>().unwrap().0.x, -PLAYER_SPEED);
        assert_eq!(*entity.get::<Facing>().unwrap(), Facing::Left);
    }

    #[test]
    fn jump_requires_grounded() {
        let mut app = setup_app();
        let airborne = spawn_test_player(&mut app, false);
        press(&mut app, KeyCode::Space);
        app.update();
        assert_eq!(
            app.world().entity(airborne).get::<Velocity>().unwrap().0.y,
            0.0
        );
    }

    #[test]
    fn grounded_jump_sets_upward_velocity() {
        let mut app = setup_app();
        let player = spawn_test_player(&mut app, true);
        press(&mut app, KeyCode::Space);
        app.update();
        assert_eq!(
            app.world().entity(player).get::<Velocity>().unwrap().0.y,
            JUMP_SPEED
        );
    }

    #[test]
    fn fire_respects_cooldown() {
        let mut app = setup_app();
        spawn_test_player(&mut app, true);
        press(&mut app, KeyCode::KeyF);

        // 100ms per update, 250ms cooldown: frames at t=0, 100, 200 may
        // only fire once; the fourth frame (t=300) fires again.
        app.update();
        app.update();
        app.update();
        assert_eq!(app.world().resource::<ShotCount>().0, 1);

        app.update();
        assert_eq!(app.world().resource::<ShotCount>().0, 2);
    }
}
