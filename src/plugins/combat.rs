//! Shooting and the per-frame collision resolution.
//!
//! The player emits `ShotFired`; an observer spawns the bullet and muzzle
//! flash. After all movement, bullets are tested against enemies and
//! enemies against the player, mask-accurately, once per frame.

use bevy::prelude::*;
use micromegas_tracing::prelude::{imetric, info, span_fn, span_scope};

use crate::app_state::AppState;
use crate::components::*;
use crate::events::{EnemyHit, ShotFired};
use crate::mask::{CollisionMask, PixelMask, masks_overlap};
use crate::plugins::level::{LevelEntity, LevelMap};
use crate::plugins::telemetry::GameSet;
use crate::resources::{HitPoints, Lives};

/// Bullet travel speed, pixels per second.
pub const BULLET_SPEED: f32 = 850.0;
pub const BULLET_SIZE: Vec2 = Vec2::new(24.0, 12.0);
/// Muzzle offset from the player's center along the facing direction.
const BULLET_SPAWN_OFFSET: f32 = 34.0;
const MUZZLE_FLASH_SECS: f32 = 0.1;
const MUZZLE_FLASH_SIZE: Vec2 = Vec2::new(48.0, 36.0);

/// Damage per frame of enemy contact. There is deliberately no
/// invulnerability window: staying in contact keeps draining.
pub const CONTACT_DAMAGE: i32 = 20;

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(spawn_shot);
        app.add_systems(
            Update,
            (
                despawn_escaped_bullets.after(crate::plugins::movement::move_free_bodies),
                expire_muzzle_flashes,
            )
                .in_set(GameSet::Simulation)
                .run_if(in_state(AppState::InGame)),
        );
        app.add_systems(
            Update,
            (bullet_enemy_collision, enemy_player_collision)
                .chain()
                .in_set(GameSet::Collision)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// A projectile moving horizontally. `dir` is ±1.
#[derive(Component, Debug)]
pub struct Bullet {
    pub dir: f32,
}

/// Short-lived shot visual attached to the player. No collision shape.
#[derive(Component, Deref, DerefMut)]
pub struct MuzzleFlash(pub Timer);

// ---------------------------------------------------------------------------
// Shot spawning
// ---------------------------------------------------------------------------

/// Spawn a bullet and a muzzle flash for one `ShotFired`.
fn spawn_shot(
    shot: On<ShotFired>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    player: Query<Entity, With<Player>>,
) {
    let dir = shot.facing.dir();
    // The muzzle sits ahead of the player; left-facing shots spawn the
    // bullet flush against the muzzle rather than centered on it.
    let x = if dir > 0.0 {
        shot.origin.x + BULLET_SPAWN_OFFSET
    } else {
        shot.origin.x - BULLET_SPAWN_OFFSET - BULLET_SIZE.x
    };

    commands.spawn((
        Bullet { dir },
        LevelEntity,
        Velocity(Vec2::new(dir * BULLET_SPEED, 0.0)),
        Hitbox(BULLET_SIZE),
        CollisionMask(PixelMask::solid(BULLET_SIZE.x as u32, BULLET_SIZE.y as u32)),
        Sprite {
            image: asset_server.load("sprites/bullet.png"),
            custom_size: Some(BULLET_SIZE),
            flip_x: dir < 0.0,
            ..default()
        },
        Transform::from_xyz(x, shot.origin.y, 12.0),
    ));

    if let Ok(player_entity) = player.single() {
        let flash_x = dir * (BULLET_SPAWN_OFFSET + 6.0);
        commands.entity(player_entity).with_children(|parent| {
            parent.spawn((
                MuzzleFlash(Timer::from_seconds(MUZZLE_FLASH_SECS, TimerMode::Once)),
                Sprite {
                    image: asset_server.load("sprites/fire.png"),
                    custom_size: Some(MUZZLE_FLASH_SIZE),
                    flip_x: dir < 0.0,
                    ..default()
                },
                Transform::from_xyz(flash_x, 8.0, 2.0),
            ));
        });
    }
}

/// Despawn bullets that left the level horizontally: rightward bullets as
/// soon as their leading edge passes the level width, leftward bullets once
/// fully past zero.
#[span_fn]
fn despawn_escaped_bullets(
    mut commands: Commands,
    level: Option<Res<LevelMap>>,
    query: Query<(Entity, &Bullet, &Transform, &Hitbox)>,
) {
    let Some(level) = level else { return };
    for (entity, bullet, transform, hitbox) in &query {
        let right = transform.translation.x + hitbox.0.x / 2.0;
        if (bullet.dir > 0.0 && right > level.width_px()) || (bullet.dir < 0.0 && right < 0.0)
        {
            commands.entity(entity).despawn();
        }
    }
}

/// Tick muzzle flash timers and despawn expired ones.
#[span_fn]
fn expire_muzzle_flashes(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut MuzzleFlash)>,
) {
    for (entity, mut flash) in &mut query {
        flash.tick(time.delta());
        if flash.just_finished() {
            commands.entity(entity).despawn();
        }
    }
}

// ---------------------------------------------------------------------------
// Collision resolution
// ---------------------------------------------------------------------------

/// Bullets against enemies. A bullet dies on its first hit; every enemy it
/// overlaps that frame dies with it.
#[span_fn]
fn bullet_enemy_collision(
    mut commands: Commands,
    bullets: Query<(Entity, &Transform, &Hitbox, &CollisionMask), With<Bullet>>,
    enemies: Query<(Entity, &Transform, &Hitbox, &CollisionMask), With<Enemy>>,
) {
    let mut killed: Vec<Entity> = Vec::new();

    for (bullet_entity, bullet_tf, bullet_box, bullet_mask) in &bullets {
        let bullet_rect = bullet_box.rect_at(bullet_tf.translation.truncate());
        let mut hit = false;

        for (enemy_entity, enemy_tf, enemy_box, enemy_mask) in &enemies {
            if killed.contains(&enemy_entity) {
                continue;
            }
            let enemy_rect = enemy_box.rect_at(enemy_tf.translation.truncate());
            if masks_overlap(bullet_rect, &bullet_mask.0, enemy_rect, &enemy_mask.0) {
                hit = true;
                killed.push(enemy_entity);
                commands.entity(enemy_entity).despawn();
            }
        }

        if hit {
            commands.entity(bullet_entity).despawn();
            commands.trigger(EnemyHit);
            imetric!("kills", "count", killed.len() as u64);
        }
    }
}

/// Enemies against the player. Contact drains hit points; a depleted pool
/// costs a life and refills; zero lives ends the game.
#[allow(clippy::type_complexity)]
#[span_fn]
fn enemy_player_collision(
    player: Query<(&Transform, &Hitbox, &CollisionMask), With<Player>>,
    enemies: Query<(&Transform, &Hitbox, &CollisionMask), (With<Enemy>, Without<Player>)>,
    mut hp: ResMut<HitPoints>,
    mut lives: ResMut<Lives>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    let Ok((player_tf, player_box, player_mask)) = player.single() else {
        return;
    };
    let player_rect = player_box.rect_at(player_tf.translation.truncate());

    let touching = enemies.iter().any(|(tf, hitbox, mask)| {
        let rect = hitbox.rect_at(tf.translation.truncate());
        masks_overlap(player_rect, &player_mask.0, rect, &mask.0)
    });

    if touching && hp.take_damage(CONTACT_DAMAGE) {
        lives.0 = lives.0.saturating_sub(1);
        info!("life lost: {} remaining", lives.0);
        if lives.0 == 0 {
            next_state.set(AppState::GameOver);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
