//! Game Over screen: overlay shown when the last life is lost, with restart.

use bevy::prelude::*;
use micromegas_tracing::prelude::info;

use crate::app_state::AppState;

pub struct GameOverPlugin;

impl Plugin for GameOverPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::GameOver), spawn_game_over);
        app.add_systems(OnExit(AppState::GameOver), despawn_game_over);
        app.add_systems(
            Update,
            game_over_input.run_if(in_state(AppState::GameOver)),
        );
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component)]
pub struct GameOverRoot;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn spawn_game_over(mut commands: Commands) {
    commands
        .spawn((
            GameOverRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                flex_direction: FlexDirection::Column,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                row_gap: Val::Px(16.0),
                ..default()
            },
            BackgroundColor(Color::srgb(0.05, 0.02, 0.02)),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("GAME OVER"),
                TextColor(Color::srgb(0.86, 0.2, 0.25)),
                TextFont {
                    font_size: 48.0,
                    ..default()
                },
            ));
            parent.spawn((
                Text::new("Press R to Restart"),
                TextColor(Color::srgb(0.8, 0.8, 0.8)),
                TextFont {
                    font_size: 20.0,
                    ..default()
                },
            ));
        });
}

fn despawn_game_over(mut commands: Commands, query: Query<Entity, With<GameOverRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

/// R starts a fresh run. All per-run state is rebuilt by the InGame
/// enter systems, so a restart is just a state transition.
fn game_over_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if keyboard.just_pressed(KeyCode::KeyR) {
        info!("restarting run");
        next_state.set(AppState::InGame);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn setup_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(StatesPlugin);
        app.init_state::<AppState>();
        app.init_resource::<ButtonInput<KeyCode>>();
        app.add_plugins(GameOverPlugin);
        app
    }

    fn transition_to_game_over(app: &mut App) {
        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::GameOver);
        for _ in 0..5 {
            app.update();
        }
    }

    #[test]
    fn game_over_spawns() {
        let mut app = setup_app();
        transition_to_game_over(&mut app);

        let count = app
            .world_mut()
            .query::<&GameOverRoot>()
            .iter(app.world())
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn game_over_despawns_on_exit() {
        let mut app = setup_app();
        transition_to_game_over(&mut app);

        app.world_mut()
            .resource_mut::<NextState<AppState>>()
            .set(AppState::InGame);
        for _ in 0..5 {
            app.update();
        }

        let count = app
            .world_mut()
            .query::<&GameOverRoot>()
            .iter(app.world())
            .count();
        assert_eq!(count, 0);
    }

    #[test]
    fn r_restarts_the_run() {
        let mut app = setup_app();
        transition_to_game_over(&mut app);

        let mut input = ButtonInput::<KeyCode>::default();
        input.press(KeyCode::KeyR);
        app.insert_resource(input);
        for _ in 0..5 {
            app.update();
        }

        let state = app.world().resource::<State<AppState>>();
        assert_eq!(*state.get(), AppState::InGame);
    }
}
