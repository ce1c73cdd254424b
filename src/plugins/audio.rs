//! Audio: looping gameplay music and SFX cued from combat events.

use bevy::prelude::*;
use bevy_kira_audio::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::events::{EnemyHit, ShotFired};
use crate::resources::AudioAssets;

#[derive(Resource)]
pub struct MusicChannel;

#[derive(Resource)]
pub struct SfxChannel;

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.add_audio_channel::<MusicChannel>()
            .add_audio_channel::<SfxChannel>();

        app.add_systems(OnEnter(AppState::InGame), start_music);
        app.add_systems(OnExit(AppState::InGame), stop_music);

        app.add_observer(on_shot_fired);
        app.add_observer(on_enemy_hit);
    }
}

// ---------------------------------------------------------------------------
// Music
// ---------------------------------------------------------------------------

#[span_fn]
fn start_music(music: Res<AudioChannel<MusicChannel>>, assets: Res<AudioAssets>) {
    music.play(assets.music.clone()).looped();
}

#[span_fn]
fn stop_music(music: Res<AudioChannel<MusicChannel>>) {
    music.stop();
}

// ---------------------------------------------------------------------------
// SFX observers
// ---------------------------------------------------------------------------

#[span_fn]
fn on_shot_fired(
    _trigger: On<ShotFired>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Res<AudioAssets>,
) {
    sfx.play(assets.shoot.clone());
}

#[span_fn]
fn on_enemy_hit(
    _trigger: On<EnemyHit>,
    sfx: Res<AudioChannel<SfxChannel>>,
    assets: Res<AudioAssets>,
) {
    sfx.play(assets.impact.clone());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
