use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// Velocity in pixels per second. Only flying/walking entities carry one;
/// static tiles and decoration never move.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Axis-aligned collision rectangle size, centered on the transform.
#[derive(Component, Debug, Clone, Copy)]
pub struct Hitbox(pub Vec2);

impl Hitbox {
    /// World-space rectangle for this hitbox at the given position.
    pub fn rect_at(&self, center: Vec2) -> Rect {
        Rect::from_center_size(center, self.0)
    }
}

/// Horizontal facing for the side-scroller. Mirrors the sprite and
/// determines bullet direction.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    /// Numeric direction along the x axis.
    pub fn dir(&self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Physics markers
// ---------------------------------------------------------------------------

/// Entity is pulled down by gravity each frame.
#[derive(Component, Debug)]
pub struct GravityAffected;

/// Entity resolves its movement against the level's solid tiles,
/// axis by axis.
#[derive(Component, Debug)]
pub struct TileCollider;

/// Set while the entity is standing on a solid tile. Jumping requires it.
#[derive(Component, Debug, Default)]
pub struct Grounded(pub bool);

// ---------------------------------------------------------------------------
// Entity markers
// ---------------------------------------------------------------------------

#[derive(Component, Debug)]
pub struct Player;

#[derive(Component, Debug)]
pub struct Enemy;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_dir_sign() {
        assert_eq!(Facing::Right.dir(), 1.0);
        assert_eq!(Facing::Left.dir(), -1.0);
    }

    #[test]
    fn hitbox_rect_centered() {
        let rect = Hitbox(Vec2::new(40.0, 20.0)).rect_at(Vec2::new(100.0, -50.0));
        assert_eq!(rect.min, Vec2::new(80.0, -60.0));
        assert_eq!(rect.max, Vec2::new(120.0, -40.0));
    }
}
