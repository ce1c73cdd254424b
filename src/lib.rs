pub mod app_state;
pub mod components;
pub mod events;
pub mod mask;
pub mod plugins;
pub mod resources;
pub mod tracing_bridge;

use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::AudioPlugin;
use micromegas_tracing::prelude::*;

use app_state::AppState;
use plugins::audio::GameAudioPlugin;
use plugins::camera::CameraPlugin;
use plugins::combat::CombatPlugin;
use plugins::enemies::EnemyPlugin;
use plugins::game_over::GameOverPlugin;
use plugins::hud::HudPlugin;
use plugins::level::LevelPlugin;
use plugins::movement::MovementPlugin;
use plugins::player::PlayerPlugin;
use plugins::sprites::SpriteSheetPlugin;
use plugins::telemetry::TelemetryPlugin;
use resources::{AudioAssets, HitPoints, Lives, MAX_HP, STARTING_LIVES};

pub struct BramblePlugin;

impl Plugin for BramblePlugin {
    fn build(&self, app: &mut App) {
        // State machine (StatesPlugin comes from DefaultPlugins)
        app.init_state::<AppState>();

        // Audio
        app.add_plugins(AudioPlugin);

        // Game plugins
        app.add_plugins(SpriteSheetPlugin);
        app.add_plugins(CameraPlugin);
        app.add_plugins(LevelPlugin);
        app.add_plugins(MovementPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(EnemyPlugin);
        app.add_plugins(CombatPlugin);
        app.add_plugins(GameAudioPlugin);
        app.add_plugins(HudPlugin);
        app.add_plugins(GameOverPlugin);
        app.add_plugins(TelemetryPlugin);

        // Per-run resources: inserted fresh on each run start so a restart
        // from GameOver always begins with full lives and health.
        app.add_systems(OnEnter(AppState::InGame), init_run);
        app.add_systems(OnExit(AppState::GameOver), cleanup_run);

        // Asset loading
        app.add_loading_state(
            LoadingState::new(AppState::Loading)
                .continue_to_state(AppState::InGame)
                .load_collection::<AudioAssets>(),
        );
    }
}

/// Insert per-run resources with fresh defaults.
/// Runs on each `OnEnter(AppState::InGame)`. They persist through `GameOver`
/// so the HUD values are still meaningful on the overlay frame, and are
/// removed on `OnExit(GameOver)`.
#[span_fn]
pub fn init_run(mut commands: Commands) {
    commands.insert_resource(Lives(STARTING_LIVES));
    commands.insert_resource(HitPoints::full(MAX_HP));
}

/// Remove per-run resources when leaving GameOver.
#[span_fn]
pub fn cleanup_run(mut commands: Commands) {
    commands.remove_resource::<Lives>();
    commands.remove_resource::<HitPoints>();
}
