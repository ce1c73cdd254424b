pub mod audio;
pub mod camera;
pub mod combat;
pub mod enemies;
pub mod game_over;
pub mod hud;
pub mod level;
pub mod movement;
pub mod player;
pub mod sprites;
pub mod telemetry;
