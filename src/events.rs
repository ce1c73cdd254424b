//! Game events triggered by gameplay systems and observed by combat/audio.

use bevy::prelude::*;

use crate::components::Facing;

/// The player fired a shot this frame. Emitted by the player input system,
/// drained by combat (bullet + muzzle flash spawn) and audio observers.
#[derive(Event)]
pub struct ShotFired {
    pub origin: Vec2,
    pub facing: Facing,
}

/// A bullet connected with at least one enemy.
#[derive(Event)]
pub struct EnemyHit;
