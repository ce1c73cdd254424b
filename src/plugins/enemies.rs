//! Enemy spawning and behavior: timed bee waves and patrolling worms.

use bevy::prelude::*;
use micromegas_tracing::prelude::{span_fn, span_scope};
use rand::Rng;

use crate::app_state::AppState;
use crate::components::*;
use crate::mask::{CollisionMask, PixelMask};
use crate::plugins::level::{LevelEntity, LevelMap, WINDOW_WIDTH, load_level};
use crate::plugins::movement::move_free_bodies;
use crate::plugins::sprites::{
    AnimationState, AnimationTimer, CharacterSheetRef, SpriteSheetLibrary,
};
use crate::plugins::telemetry::GameSet;

/// Seconds between bee spawns.
pub const BEE_SPAWN_SECS: f32 = 0.1;
/// Per-bee speed range, pixels per second.
pub const BEE_SPEED_RANGE: std::ops::RangeInclusive<f32> = 300.0..=500.0;
pub const BEE_SIZE: Vec2 = Vec2::new(64.0, 64.0);

pub const WORM_SPEED: f32 = 160.0;
pub const WORM_SIZE: Vec2 = Vec2::new(80.0, 44.0);

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(AppState::InGame),
            (init_bee_timer, spawn_worms.after(load_level)),
        );
        app.add_systems(OnExit(AppState::InGame), remove_bee_timer);
        app.add_systems(
            Update,
            (
                spawn_bees.before(move_free_bodies),
                worm_patrol.before(move_free_bodies),
                despawn_escaped_bees.after(move_free_bodies),
            )
                .in_set(GameSet::Simulation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

// ---------------------------------------------------------------------------
// Components and resources
// ---------------------------------------------------------------------------

/// Flies toward the level origin at a speed fixed at spawn.
#[derive(Component, Debug)]
pub struct Bee;

/// Patrols horizontally inside its spawn zone.
#[derive(Component, Debug)]
pub struct Worm {
    pub zone: Rect,
}

/// Repeating timer driving bee waves. Ticked once per frame; each elapsed
/// period spawns one bee, so N periods accumulated across any dt split
/// spawn exactly N bees.
#[derive(Resource)]
pub struct BeeSpawnTimer {
    pub timer: Timer,
}

fn init_bee_timer(mut commands: Commands) {
    commands.insert_resource(BeeSpawnTimer {
        timer: Timer::from_seconds(BEE_SPAWN_SECS, TimerMode::Repeating),
    });
}

fn remove_bee_timer(mut commands: Commands) {
    commands.remove_resource::<BeeSpawnTimer>();
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Spawn one worm per patrol zone, walking right from the zone's left edge.
pub fn spawn_worms(
    mut commands: Commands,
    level: Res<LevelMap>,
    mut library: ResMut<SpriteSheetLibrary>,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    if !library.sheets.contains_key("worm") {
        let _ = library.load("worm", "sprites/worm.png", &asset_server, &mut layouts);
    }

    for zone in &level.worm_zones {
        let pos = Vec2::new(zone.min.x + WORM_SIZE.x / 2.0, zone.center().y);
        let mut entity = commands.spawn((
            Enemy,
            Worm { zone: *zone },
            Facing::Right,
            Velocity(Vec2::new(WORM_SPEED, 0.0)),
            Hitbox(WORM_SIZE),
            CollisionMask(PixelMask::solid(WORM_SIZE.x as u32, WORM_SIZE.y as u32)),
            LevelEntity,
            Transform::from_xyz(pos.x, pos.y, 10.0),
        ));

        if let Some(sheet) = library.sheets.get("worm") {
            let start = sheet.meta.animations.get("walk").map(|r| r.start).unwrap_or(0);
            entity.insert((
                Sprite {
                    image: sheet.image.clone(),
                    texture_atlas: Some(TextureAtlas {
                        layout: sheet.layout.clone(),
                        index: start,
                    }),
                    custom_size: Some(WORM_SIZE),
                    ..default()
                },
                CharacterSheetRef("worm".to_string()),
                AnimationState::new("walk", true),
                AnimationTimer(Timer::from_seconds(0.15, TimerMode::Repeating)),
            ));
        }
    }
}

/// Tick the wave timer and spawn a bee per elapsed period, off the right
/// edge of the level at a random height and speed.
#[span_fn]
fn spawn_bees(
    time: Res<Time>,
    mut spawn_timer: ResMut<BeeSpawnTimer>,
    level: Res<LevelMap>,
    mut commands: Commands,
    mut library: ResMut<SpriteSheetLibrary>,
    asset_server: Res<AssetServer>,
    mut layouts: ResMut<Assets<TextureAtlasLayout>>,
) {
    spawn_timer.timer.tick(time.delta());
    let count = spawn_timer.timer.times_finished_this_tick();
    if count == 0 {
        return;
    }

    if !library.sheets.contains_key("bee") {
        let _ = library.load("bee", "sprites/bee.png", &asset_server, &mut layouts);
    }

    let mut rng = rand::thread_rng();
    for _ in 0..count {
        let x = level.width_px() + WINDOW_WIDTH;
        let y = -rng.gen_range(0.0..level.height_px());
        let speed = rng.gen_range(BEE_SPEED_RANGE);

        let mut entity = commands.spawn((
            Enemy,
            Bee,
            Velocity(Vec2::new(-speed, 0.0)),
            Hitbox(BEE_SIZE),
            CollisionMask(PixelMask::solid(BEE_SIZE.x as u32, BEE_SIZE.y as u32)),
            LevelEntity,
            Transform::from_xyz(x, y, 10.0),
        ));

        if let Some(sheet) = library.sheets.get("bee") {
            let start = sheet.meta.animations.get("fly").map(|r| r.start).unwrap_or(0);
            entity.insert((
                Sprite {
                    image: sheet.image.clone(),
                    texture_atlas: Some(TextureAtlas {
                        layout: sheet.layout.clone(),
                        index: start,
                    }),
                    custom_size: Some(BEE_SIZE),
                    ..default()
                },
                CharacterSheetRef("bee".to_string()),
                AnimationState::new("fly", true),
                AnimationTimer(Timer::from_seconds(0.1, TimerMode::Repeating)),
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// Reverse worms at their zone edges; they face the way they travel.
/// A zone narrower than the worm has no walkable span, so the worm
/// stands still instead of oscillating on the boundary.
#[span_fn]
fn worm_patrol(mut query: Query<(&Worm, &Transform, &Hitbox, &mut Velocity, &mut Facing)>) {
    for (worm, transform, hitbox, mut vel, mut facing) in &mut query {
        let half = hitbox.0.x / 2.0;
        let lo = worm.zone.min.x + half;
        let hi = worm.zone.max.x - half;
        if lo >= hi {
            vel.0.x = 0.0;
            continue;
        }
        let x = transform.translation.x;
        if x <= lo {
            vel.0.x = WORM_SPEED;
        } else if x >= hi {
            vel.0.x = -WORM_SPEED;
        }
        *facing = if vel.0.x < 0.0 { Facing::Left } else { Facing::Right };
    }
}

/// Despawn bees once they are fully past the left edge of the level.
#[span_fn]
fn despawn_escaped_bees(
    mut commands: Commands,
    query: Query<(Entity, &Transform, &Hitbox), With<Bee>>,
) {
    for (entity, transform, hitbox) in &query {
        if transform.translation.x + hitbox.0.x / 2.0 < 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
