use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bramble::app_state::AppState;
use bramble::plugins::camera::CameraPlugin;
use bramble::resources::{HitPoints, Lives, MAX_HP, STARTING_LIVES};

// ---------------------------------------------------------------------------
// Helper: run updates until state reaches target or panic
// ---------------------------------------------------------------------------

fn wait_for_state<S: States>(app: &mut App, target: S, max_updates: usize) {
    for i in 0..max_updates {
        app.update();
        if *app.world().resource::<State<S>>().get() == target {
            return;
        }
        assert!(
            i < max_updates - 1,
            "State never reached {:?} after {max_updates} updates",
            target,
        );
    }
}

// ---------------------------------------------------------------------------
// Test 1: State machine transitions, including restart
// ---------------------------------------------------------------------------

#[test]
fn state_machine_full_cycle() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.init_state::<AppState>();
    app.finish();
    app.cleanup();

    // Initial state is Loading.
    assert_eq!(
        *app.world().resource::<State<AppState>>().get(),
        AppState::Loading,
    );

    // Loading → InGame
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    wait_for_state(&mut app, AppState::InGame, 5);

    // InGame → GameOver
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::GameOver);
    wait_for_state(&mut app, AppState::GameOver, 5);

    // GameOver → InGame (restart)
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    wait_for_state(&mut app, AppState::InGame, 5);
}

// ---------------------------------------------------------------------------
// Test 2: Per-run resources are inserted fresh and cleaned up
// ---------------------------------------------------------------------------

#[test]
fn run_resources_lifecycle() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.init_state::<AppState>();
    app.add_systems(OnEnter(AppState::InGame), bramble::init_run);
    app.add_systems(OnExit(AppState::GameOver), bramble::cleanup_run);
    app.finish();
    app.cleanup();

    // Nothing during Loading.
    app.update();
    assert!(app.world().get_resource::<Lives>().is_none());

    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    wait_for_state(&mut app, AppState::InGame, 5);
    assert_eq!(app.world().resource::<Lives>().0, STARTING_LIVES);
    assert_eq!(app.world().resource::<HitPoints>().current, MAX_HP);

    // Resources survive into GameOver for the overlay frame.
    app.world_mut().resource_mut::<Lives>().0 = 0;
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::GameOver);
    wait_for_state(&mut app, AppState::GameOver, 5);
    assert_eq!(app.world().resource::<Lives>().0, 0);

    // A restart re-enters InGame with fresh values.
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    wait_for_state(&mut app, AppState::InGame, 5);
    assert_eq!(app.world().resource::<Lives>().0, STARTING_LIVES);
    assert_eq!(app.world().resource::<HitPoints>().current, MAX_HP);
}

// ---------------------------------------------------------------------------
// Test 3: Camera entity spawns on startup
// ---------------------------------------------------------------------------

#[test]
fn camera_entity_spawns() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(CameraPlugin);
    app.finish();
    app.cleanup();
    app.update();

    let mut query = app.world_mut().query::<&Camera2d>();
    let count = query.iter(app.world()).count();
    assert_eq!(count, 1, "Expected exactly one Camera2d entity");
}
