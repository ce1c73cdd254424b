//! Sprite sheet loading, frame animation, and collision mask refinement.
//!
//! Each character has a PNG sprite sheet and a JSON metadata sidecar
//! describing animation frame ranges. Side-scroller orientation is a
//! horizontal mirror, so facing is expressed with `flip_x` rather than
//! per-direction animation variants.

use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;
use micromegas_tracing::prelude::*;
use std::collections::HashMap;

use crate::components::Facing;
use crate::mask::{CollisionMask, PixelMask};
use crate::plugins::telemetry::GameSet;

pub struct SpriteSheetPlugin;

impl Plugin for SpriteSheetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteSheetLibrary>().add_systems(
            Update,
            (animate_sprites, sync_facing_flip, refine_masks).in_set(GameSet::Presentation),
        );
    }
}

// ---------------------------------------------------------------------------
// JSON metadata
// ---------------------------------------------------------------------------

/// Deserialized from the JSON sidecar next to each sprite sheet PNG.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SpriteSheetMeta {
    pub frame_size: [u32; 2],
    pub columns: u32,
    pub rows: u32,
    pub animations: HashMap<String, AnimationRange>,
}

/// A contiguous range of frames in the sprite sheet.
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub struct AnimationRange {
    pub start: usize,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Loaded sprite sheet data per character, keyed by name.
#[derive(Resource, Default)]
pub struct SpriteSheetLibrary {
    pub sheets: HashMap<String, CharacterSheet>,
}

/// All data needed to spawn and animate one character's sprites.
#[derive(Debug, Clone)]
pub struct CharacterSheet {
    pub image: Handle<Image>,
    pub layout: Handle<TextureAtlasLayout>,
    pub meta: SpriteSheetMeta,
}

impl SpriteSheetLibrary {
    /// Load a character sprite sheet from a PNG path.
    ///
    /// Expects a JSON sidecar at the same path with `.json` extension.
    /// Call during setup once the asset server is available.
    pub fn load(
        &mut self,
        name: &str,
        png_path: &str,
        asset_server: &AssetServer,
        layouts: &mut Assets<TextureAtlasLayout>,
    ) -> Result<(), String> {
        let image: Handle<Image> = asset_server.load(png_path.to_string());

        let assets_dir = std::path::Path::new("assets");
        let json_path = assets_dir.join(png_path).with_extension("json");
        let json_str = std::fs::read_to_string(&json_path)
            .map_err(|e| format!("Failed to read {}: {}", json_path.display(), e))?;
        let meta: SpriteSheetMeta = serde_json::from_str(&json_str)
            .map_err(|e| format!("Failed to parse {}: {}", json_path.display(), e))?;

        let layout = TextureAtlasLayout::from_grid(
            UVec2::new(meta.frame_size[0], meta.frame_size[1]),
            meta.columns,
            meta.rows,
            None,
            None,
        );
        let layout_handle = layouts.add(layout);

        self.sheets.insert(
            name.to_string(),
            CharacterSheet {
                image,
                layout: layout_handle,
                meta,
            },
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Current animation state for a sprite entity.
#[derive(Component)]
pub struct AnimationState {
    /// Key into `SpriteSheetMeta.animations` (e.g., "walk", "fly").
    pub current: String,
    pub looping: bool,
    /// Set when a non-looping animation has played through.
    pub finished: bool,
}

impl AnimationState {
    pub fn new(animation: &str, looping: bool) -> Self {
        Self {
            current: animation.to_string(),
            looping,
            finished: false,
        }
    }
}

/// Timer that controls animation frame rate.
#[derive(Component, Deref, DerefMut)]
pub struct AnimationTimer(pub Timer);

/// Which character sheet this entity uses (key into `SpriteSheetLibrary`).
#[derive(Component)]
pub struct CharacterSheetRef(pub String);

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Advance sprite animation frames based on timer and current state.
#[span_fn]
fn animate_sprites(
    time: Res<Time>,
    library: Res<SpriteSheetLibrary>,
    mut query: Query<(
        &CharacterSheetRef,
        &mut AnimationState,
        &mut AnimationTimer,
        &mut Sprite,
    )>,
) {
    for (sheet_ref, mut anim_state, mut timer, mut sprite) in &mut query {
        if anim_state.finished {
            continue;
        }

        timer.tick(time.delta());
        if !timer.just_finished() {
            continue;
        }

        let Some(sheet) = library.sheets.get(&sheet_ref.0) else {
            continue;
        };
        let Some(range) = sheet.meta.animations.get(&anim_state.current) else {
            continue;
        };
        let Some(atlas) = &mut sprite.texture_atlas else {
            continue;
        };

        let current_offset = atlas.index.saturating_sub(range.start);
        let next_offset = current_offset + 1;

        if next_offset >= range.count {
            if anim_state.looping {
                atlas.index = range.start;
            } else {
                anim_state.finished = true;
            }
        } else {
            atlas.index = range.start + next_offset;
        }
    }
}

/// Mirror sprites to match their horizontal facing.
#[span_fn]
fn sync_facing_flip(mut query: Query<(&Facing, &mut Sprite), Changed<Facing>>) {
    for (facing, mut sprite) in &mut query {
        sprite.flip_x = *facing == Facing::Left;
    }
}

/// Keep collision masks in sync with the displayed frame. Masks start as
/// solid placeholders (full-hitbox collision, erring toward false
/// positives) until the image asset is decoded; then they are rebuilt from
/// the alpha of the current atlas frame, cropped out of the sheet, and
/// again whenever the sprite's frame changes. Plain sprites without an
/// atlas use the whole image.
#[span_fn]
fn refine_masks(
    images: Res<Assets<Image>>,
    layouts: Res<Assets<TextureAtlasLayout>>,
    mut query: Query<(Ref<Sprite>, &mut CollisionMask)>,
) {
    for (sprite, mut mask) in &mut query {
        if !mask.0.is_solid() && !sprite.is_changed() {
            continue;
        }
        let Some(image) = images.get(&sprite.image) else {
            continue;
        };
        if !matches!(
            image.texture_descriptor.format,
            TextureFormat::Rgba8UnormSrgb | TextureFormat::Rgba8Unorm
        ) {
            continue;
        }
        let Some(data) = image.data.as_ref() else {
            continue;
        };
        let size = image.size();

        let refined = match &sprite.texture_atlas {
            Some(atlas) => layouts
                .get(&atlas.layout)
                .and_then(|layout| layout.textures.get(atlas.index).copied())
                .and_then(|frame| PixelMask::from_alpha_region(size.x, size.y, data, frame)),
            None => PixelMask::from_alpha(size.x, size.y, data),
        };
        if let Some(refined) = refined {
            mask.0 = refined;
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Switch an entity's animation, resetting the frame to the range start.
pub fn set_animation(
    sprite: &mut Sprite,
    anim_state: &mut AnimationState,
    key: &str,
    looping: bool,
    meta: &SpriteSheetMeta,
) {
    if anim_state.current == key && !anim_state.finished {
        return; // Already playing this animation
    }
    anim_state.current = key.to_string();
    anim_state.looping = looping;
    anim_state.finished = false;

    if let Some(range) = meta.animations.get(key)
        && let Some(atlas) = &mut sprite.texture_atlas
    {
        atlas.index = range.start;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
