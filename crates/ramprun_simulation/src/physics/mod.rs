//! Physics simulation module
//!
//! Kinematic движение игрока поверх собственных raycast запросов
//! (SpatialQuery), без внешнего physics движка.

pub mod movement;

// Re-export основных типов
pub use movement::{
    player_movement_system,
    simulation_is_active,
    spawn_player,
    step_player,
    sync_player_transform,
    MotionState,
    MovementPlugin,
    Player,
    PlayerState,
    StepReport,
};
