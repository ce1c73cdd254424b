//! HUD overlay: remaining lives and the player's health bar.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::app_state::AppState;
use crate::plugins::telemetry::GameSet;
use crate::resources::{HitPoints, Lives, STARTING_LIVES};

const BAR_WIDTH: f32 = 200.0;
const BAR_HEIGHT: f32 = 20.0;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(AppState::InGame), spawn_hud);
        app.add_systems(OnExit(AppState::InGame), despawn_hud);
        app.add_systems(
            Update,
            update_hud
                .in_set(GameSet::Presentation)
                .run_if(in_state(AppState::InGame)),
        );
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Component)]
pub struct HudRoot;

#[derive(Component)]
pub struct LivesText;

#[derive(Component)]
pub struct HealthBarFill;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

// Run resources are inserted by commands in the same transition, so the
// initial text uses the starting value rather than reading the resource.
#[span_fn]
fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            HudRoot,
            Node {
                width: Val::Percent(100.0),
                height: Val::Auto,
                justify_content: JustifyContent::SpaceBetween,
                align_items: AlignItems::Center,
                padding: UiRect::all(Val::Px(12.0)),
                position_type: PositionType::Absolute,
                top: Val::Px(0.0),
                left: Val::Px(0.0),
                ..default()
            },
        ))
        .with_children(|parent| {
            parent.spawn((
                LivesText,
                Text::new(format!("Lives: {STARTING_LIVES}")),
                TextColor(Color::WHITE),
                TextFont {
                    font_size: 24.0,
                    ..default()
                },
            ));
            // Health bar: a fixed frame with a fill that shrinks with damage.
            parent
                .spawn((
                    Node {
                        width: Val::Px(BAR_WIDTH),
                        height: Val::Px(BAR_HEIGHT),
                        padding: UiRect::all(Val::Px(2.0)),
                        ..default()
                    },
                    BackgroundColor(Color::srgb(0.9, 0.9, 0.9)),
                ))
                .with_children(|bar| {
                    bar.spawn((
                        HealthBarFill,
                        Node {
                            width: Val::Percent(100.0),
                            height: Val::Percent(100.0),
                            ..default()
                        },
                        BackgroundColor(Color::srgb(0.86, 0.2, 0.25)),
                    ));
                });
        });
}

#[span_fn]
fn despawn_hud(mut commands: Commands, query: Query<Entity, With<HudRoot>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}

#[span_fn]
fn update_hud(
    lives: Res<Lives>,
    hp: Res<HitPoints>,
    mut lives_text: Query<&mut Text, With<LivesText>>,
    mut fill: Query<&mut Node, With<HealthBarFill>>,
) {
    if lives.is_changed()
        && let Ok(mut text) = lives_text.single_mut()
    {
        **text = format!("Lives: {}", lives.0);
    }
    if hp.is_changed()
        && let Ok(mut node) = fill.single_mut()
    {
        node.width = Val::Percent(hp.ratio() * 100.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
