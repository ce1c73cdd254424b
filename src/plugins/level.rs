//! Level loading, tile spawning, and the solid-tile collision grid.
//!
//! Parses ASCII map files into ECS entities. Main tiles block movement,
//! decoration tiles are visual only. Worm patrol zones are encoded as
//! horizontal runs of `w`.

use bevy::prelude::*;
use micromegas_tracing::prelude::{info, span_scope};

use crate::app_state::AppState;

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(BG_COLOR));
        app.add_systems(OnEnter(AppState::InGame), load_level);
        // A restart reloads the map from scratch, so everything the level
        // spawned goes away when leaving InGame (GameOver included).
        app.add_systems(OnExit(AppState::InGame), cleanup_level);
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Size of a single tile in world units (pixels).
pub const TILE_SIZE: f32 = 64.0;

/// Fixed viewport size.
pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 720.0;

pub const LEVEL_FILE: &str = "assets/maps/world.txt";

const BG_COLOR: Color = Color::srgb(0.56, 0.78, 0.92);
const MAIN_TILE_COLOR: Color = Color::srgb(0.35, 0.25, 0.18);
const DECOR_TILE_COLOR: Color = Color::srgb(0.25, 0.5, 0.22);

// ---------------------------------------------------------------------------
// Tile types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    /// Collision-relevant terrain.
    Main,
    /// Visual-only foliage and props.
    Decoration,
    Air,
    PlayerSpawn,
    WormZone,
}

impl TileType {
    fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(TileType::Main),
            '*' => Some(TileType::Decoration),
            ' ' => Some(TileType::Air),
            'P' => Some(TileType::PlayerSpawn),
            'w' => Some(TileType::WormZone),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Level map resource
// ---------------------------------------------------------------------------

/// Parsed level: solid grid, spawn points, and pixel dimensions.
/// Read once at setup and immutable until the next restart reloads it.
#[derive(Resource, Debug, Clone)]
pub struct LevelMap {
    pub width: usize,
    pub height: usize,
    solid: Vec<Vec<bool>>,
    pub main_tiles: Vec<(usize, usize)>,
    pub decoration_tiles: Vec<(usize, usize)>,
    pub player_spawn: Vec2,
    pub worm_zones: Vec<Rect>,
}

impl LevelMap {
    /// Parse an ASCII level string.
    pub fn parse(text: &str) -> Result<Self, String> {
        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() {
            return Err("Empty level".to_string());
        }

        let height = lines.len();
        let width = lines.iter().map(|l| l.len()).max().unwrap_or(0);
        if width == 0 {
            return Err("Level has zero width".to_string());
        }

        let mut solid = vec![vec![false; width]; height];
        let mut main_tiles = Vec::new();
        let mut decoration_tiles = Vec::new();
        let mut player_spawn = None;
        let mut worm_zones = Vec::new();

        for (y, line) in lines.iter().enumerate() {
            let mut zone_start: Option<usize> = None;
            for (x, ch) in line.chars().enumerate() {
                let tile = TileType::from_char(ch).ok_or_else(|| {
                    format!("Unknown tile character '{}' at ({}, {})", ch, x, y)
                })?;

                // Close the current worm run on any non-worm tile.
                if tile != TileType::WormZone
                    && let Some(start) = zone_start.take()
                {
                    worm_zones.push(zone_rect(start, x - 1, y));
                }

                match tile {
                    TileType::Main => {
                        solid[y][x] = true;
                        main_tiles.push((x, y));
                    }
                    TileType::Decoration => decoration_tiles.push((x, y)),
                    TileType::PlayerSpawn => {
                        if player_spawn.is_some() {
                            return Err(format!("Multiple player spawns at ({}, {})", x, y));
                        }
                        player_spawn = Some(tile_to_world(x, y));
                    }
                    TileType::WormZone => {
                        if zone_start.is_none() {
                            zone_start = Some(x);
                        }
                    }
                    TileType::Air => {}
                }
            }
            if let Some(start) = zone_start {
                worm_zones.push(zone_rect(start, line.len() - 1, y));
            }
        }

        let player_spawn = player_spawn.ok_or("No player spawn ('P') found in level")?;

        Ok(LevelMap {
            width,
            height,
            solid,
            main_tiles,
            decoration_tiles,
            player_spawn,
            worm_zones,
        })
    }

    pub fn width_px(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn height_px(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    /// Whether the tile at grid coordinates is solid. Out of bounds is open,
    /// so entities can leave the map horizontally (bullets, bees).
    pub fn solid_at(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        self.solid
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
            .unwrap_or(false)
    }

    /// Whether a world-space rectangle overlaps any solid tile.
    pub fn collides(&self, rect: Rect) -> bool {
        const EPS: f32 = 0.001;
        let x0 = (rect.min.x / TILE_SIZE).floor() as i64;
        let x1 = ((rect.max.x - EPS) / TILE_SIZE).floor() as i64;
        let y0 = (-rect.max.y / TILE_SIZE).floor() as i64;
        let y1 = ((-rect.min.y - EPS) / TILE_SIZE).floor() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                if self.solid_at(x, y) {
                    return true;
                }
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Coordinate conversion
// ---------------------------------------------------------------------------

/// World-space center of a tile. Grid (0,0) is the top-left of the map at
/// world origin; world Y points up, so rows grow downward into negative Y.
pub fn tile_to_world(x: usize, y: usize) -> Vec2 {
    Vec2::new(
        x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        -(y as f32 * TILE_SIZE + TILE_SIZE / 2.0),
    )
}

/// World rectangle covered by a horizontal run of worm tiles on one row.
fn zone_rect(x0: usize, x1: usize, y: usize) -> Rect {
    Rect::new(
        x0 as f32 * TILE_SIZE,
        -((y + 1) as f32 * TILE_SIZE),
        (x1 + 1) as f32 * TILE_SIZE,
        -(y as f32 * TILE_SIZE),
    )
}

// ---------------------------------------------------------------------------
// Marker components
// ---------------------------------------------------------------------------

/// Marker for entities that belong to the current level run
/// (despawned when leaving InGame, respawned on restart).
#[derive(Component, Debug)]
pub struct LevelEntity;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Load the level file and spawn its tile entities. Tiles are spawned
/// before any dynamic entity and sit at lower Z, so they draw behind.
pub fn load_level(mut commands: Commands) {
    span_scope!("level_load");
    let text = std::fs::read_to_string(LEVEL_FILE)
        .unwrap_or_else(|e| panic!("Failed to read level file {}: {}", LEVEL_FILE, e));

    let level = LevelMap::parse(&text)
        .unwrap_or_else(|e| panic!("Failed to parse level file {}: {}", LEVEL_FILE, e));

    for &(x, y) in &level.main_tiles {
        let world = tile_to_world(x, y);
        commands.spawn((
            LevelEntity,
            Sprite::from_color(MAIN_TILE_COLOR, Vec2::splat(TILE_SIZE)),
            Transform::from_xyz(world.x, world.y, 0.0),
        ));
    }
    for &(x, y) in &level.decoration_tiles {
        let world = tile_to_world(x, y);
        commands.spawn((
            LevelEntity,
            Sprite::from_color(DECOR_TILE_COLOR, Vec2::splat(TILE_SIZE)),
            Transform::from_xyz(world.x, world.y, 1.0),
        ));
    }

    info!(
        "level loaded: {} ({}x{} tiles, {} worm zones)",
        LEVEL_FILE,
        level.width,
        level.height,
        level.worm_zones.len()
    );
    commands.insert_resource(level);
}

/// Despawn everything the level run spawned and drop the map resource.
fn cleanup_level(mut commands: Commands, query: Query<Entity, With<LevelEntity>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<LevelMap>();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_LEVEL: &str = "\
    *
P
#####
#www#";

    #[test]
    fn parse_small_level() {
        let level = LevelMap::parse(TEST_LEVEL).unwrap();
        assert_eq!(level.width, 5);
        assert_eq!(level.height, 4);
        assert_eq!(level.player_spawn, tile_to_world(0, 1));
        assert_eq!(level.main_tiles.len(), 7);
        assert_eq!(level.decoration_tiles.len(), 1);
    }

    #[test]
    fn worm_run_becomes_one_zone() {
        let level = LevelMap::parse(TEST_LEVEL).unwrap();
        assert_eq!(level.worm_zones.len(), 1);
        let zone = level.worm_zones[0];
        // Columns 1..=3 of row 3.
        assert_eq!(zone.min.x, TILE_SIZE);
        assert_eq!(zone.max.x, 4.0 * TILE_SIZE);
        assert_eq!(zone.max.y, -3.0 * TILE_SIZE);
    }

    #[test]
    fn separate_runs_become_separate_zones() {
        let level = LevelMap::parse("P\nww ww").unwrap();
        assert_eq!(level.worm_zones.len(), 2);
    }

    #[test]
    fn solid_grid() {
        let level = LevelMap::parse(TEST_LEVEL).unwrap();
        assert!(level.solid_at(0, 2));
        assert!(level.solid_at(0, 3));
        assert!(!level.solid_at(1, 3)); // worm zone is not solid
        assert!(!level.solid_at(0, 0));
        // Out of bounds is open
        assert!(!level.solid_at(-1, 0));
        assert!(!level.solid_at(100, 100));
    }

    #[test]
    fn rect_collision_against_solids() {
        let level = LevelMap::parse(TEST_LEVEL).unwrap();
        // Row 2 spans y in [-3*TS, -2*TS] and is fully solid.
        let inside = Rect::from_center_size(
            Vec2::new(TILE_SIZE * 2.5, -TILE_SIZE * 2.5),
            Vec2::splat(10.0),
        );
        assert!(level.collides(inside));

        let above = Rect::from_center_size(
            Vec2::new(TILE_SIZE * 2.5, -TILE_SIZE * 1.5),
            Vec2::splat(10.0),
        );
        assert!(!level.collides(above));

        // Resting exactly on top of the row does not collide.
        let touching = Rect::new(64.0, -2.0 * TILE_SIZE, 128.0, -TILE_SIZE);
        assert!(!level.collides(touching));
    }

    #[test]
    fn world_mapping_is_y_down_rows() {
        let p = tile_to_world(2, 1);
        assert_eq!(p, Vec2::new(2.5 * TILE_SIZE, -1.5 * TILE_SIZE));
    }

    #[test]
    fn malformed_level_no_player() {
        let result = LevelMap::parse("####");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("No player spawn"));
    }

    #[test]
    fn malformed_level_bad_char() {
        let result = LevelMap::parse("#P?#");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Unknown tile character"));
    }

    #[test]
    fn malformed_level_duplicate_player() {
        let result = LevelMap::parse("#PP#");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Multiple player spawns"));
    }

    #[test]
    fn parse_shipped_level_file() {
        let text = std::fs::read_to_string(LEVEL_FILE)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", LEVEL_FILE, e));
        let level = LevelMap::parse(&text)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", LEVEL_FILE, e));
        assert!(level.width > 0);
        assert!(level.height > 0);
        assert!(!level.worm_zones.is_empty(), "world map should have worms");
    }
}
