use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy_asset_loader::loading_state::LoadingStateAppExt;
use bevy_asset_loader::prelude::LoadingState;
use bevy_kira_audio::AudioPlugin;

/// The third-party stack coexists in a single headless Bevy app:
/// bevy_kira_audio channels plus a bevy_asset_loader loading state.
#[test]
fn dep_compat_all_plugins_coexist() {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, States)]
    enum TestGameState {
        #[default]
        Loading,
        Running,
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(AssetPlugin::default());
    // bevy_asset_loader
    app.add_plugins(StatesPlugin);
    // bevy_kira_audio
    app.add_plugins(AudioPlugin);
    app.init_state::<TestGameState>();
    app.add_loading_state(
        LoadingState::new(TestGameState::Loading).continue_to_state(TestGameState::Running),
    );
    app.finish();
    app.cleanup();
    for _ in 0..3 {
        app.update();
    }
}
