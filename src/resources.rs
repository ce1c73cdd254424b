use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::AudioSource;

/// Lives remaining. A depleted hit point pool costs one.
#[derive(Resource, Debug)]
pub struct Lives(pub u32);

pub const STARTING_LIVES: u32 = 20;
pub const MAX_HP: i32 = 30;

/// The player's hit point pool. Enemy contact drains it; on depletion it
/// refills to max and the caller decrements a life.
#[derive(Resource, Debug)]
pub struct HitPoints {
    pub current: i32,
    pub max: i32,
}

impl HitPoints {
    pub fn full(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Subtract damage. Returns true if the pool was depleted, in which
    /// case it has already been reset to max.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.current -= amount;
        if self.current <= 0 {
            self.current = self.max;
            return true;
        }
        false
    }

    /// Fill ratio for the HUD bar, in [0, 1].
    pub fn ratio(&self) -> f32 {
        (self.current.max(0) as f32 / self.max as f32).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Audio assets
// ---------------------------------------------------------------------------

#[derive(AssetCollection, Resource)]
pub struct AudioAssets {
    #[asset(path = "audio/music.ogg")]
    pub music: Handle<AudioSource>,
    #[asset(path = "audio/shoot.ogg")]
    pub shoot: Handle<AudioSource>,
    #[asset(path = "audio/impact.ogg")]
    pub impact: Handle<AudioSource>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_decreases_hp() {
        let mut hp = HitPoints::full(30);
        assert!(!hp.take_damage(20));
        assert_eq!(hp.current, 10);
    }

    #[test]
    fn depletion_resets_to_max() {
        let mut hp = HitPoints::full(30);
        assert!(!hp.take_damage(20));
        // Second hit underflows past zero and refills.
        assert!(hp.take_damage(20));
        assert_eq!(hp.current, 30);
    }

    #[test]
    fn exact_zero_counts_as_depleted() {
        let mut hp = HitPoints::full(30);
        assert!(hp.take_damage(30));
        assert_eq!(hp.current, 30);
    }

    #[test]
    fn ratio_tracks_current() {
        let mut hp = HitPoints::full(30);
        assert!((hp.ratio() - 1.0).abs() < f32::EPSILON);
        hp.take_damage(20);
        assert!((hp.ratio() - 10.0 / 30.0).abs() < 0.001);
    }
}
