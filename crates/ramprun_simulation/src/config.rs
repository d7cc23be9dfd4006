//! Конфигурация симуляции: movement + projectile константы
//!
//! Один Resource вместо разбросанных констант. Defaults = тюнинг оригинальной
//! арены (метры, секунды, градусы). Частичные overrides через JSON.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Параметры движения игрока
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct MovementConfig {
    /// Высота глаз над ногами (eye height), метры
    pub player_height: f32,
    /// Радиус игрока для проверки стен, метры
    pub player_radius: f32,
    /// Cap горизонтальной скорости (m/s)
    pub max_speed: f32,
    /// Горизонтальное ускорение от input (m/s²)
    pub acceleration: f32,
    /// Вертикальная скорость прыжка (m/s)
    pub jump_force: f32,
    /// Гравитация (m/s², положительная, вычитается из vy)
    pub gravity: f32,
    /// Коэффициент трения на земле (1/s)
    pub friction: f32,
    /// Множитель ускорения и демпфинга в воздухе (0..=1)
    pub air_control: f32,
    /// Максимальный наклон поверхности, которая ещё считается полом (градусы от up)
    pub slope_threshold_deg: f32,
    /// Запас ground ray сверх player_height
    pub ground_buffer: f32,
    /// Сдвиг origin луча вверх (чтобы не стартовать внутри пола)
    pub ray_origin_epsilon: f32,
    /// Множитель tolerance для walkable поверхностей (radius × 1.5)
    pub slope_tolerance_factor: f32,
    /// Множитель горизонтальной скорости при упоре в стену
    pub wall_velocity_damping: f32,
    /// Зазор над глазами для head bump
    pub head_clearance: f32,
    /// Safety net: ниже этого y игрок не проваливается
    pub world_floor_y: f32,
    /// Cap per-tick delta (секунды)
    pub max_delta: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            player_height: 2.0,
            player_radius: 0.4,
            max_speed: 25.0,
            acceleration: 150.0,
            jump_force: 30.0,
            gravity: 32.0,
            friction: 10.0,
            air_control: 0.3,
            slope_threshold_deg: 60.0,
            ground_buffer: 0.1,
            ray_origin_epsilon: 0.01,
            slope_tolerance_factor: 1.5,
            wall_velocity_damping: 0.5,
            head_clearance: 0.2,
            world_floor_y: -100.0,
            max_delta: 1.0 / 30.0,
        }
    }
}

/// Продолжают ли projectiles лететь, когда управление "unlocked"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum ProjectilePolicy {
    /// Projectiles замирают вместе с игроком
    #[default]
    PauseWhileInactive,
    /// Projectiles летят всегда
    AlwaysSimulate,
}

/// Параметры projectiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ProjectileConfig {
    pub radius: f32,
    /// Скорость (m/s)
    pub speed: f32,
    /// Дистанция, после которой projectile удаляется (метры)
    pub distance_limit: f32,
    pub policy: ProjectilePolicy,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            radius: 0.2,
            speed: 50.0,
            distance_limit: 115.0,
            policy: ProjectilePolicy::PauseWhileInactive,
        }
    }
}

/// Полная конфигурация симуляции (Resource)
#[derive(Resource, Debug, Clone, PartialEq, Default, Serialize, Deserialize, Reflect)]
#[reflect(Resource)]
#[serde(default)]
pub struct SimulationConfig {
    pub movement: MovementConfig,
    pub projectile: ProjectileConfig,
}

impl SimulationConfig {
    /// Загрузить конфиг из JSON (отсутствующие поля = defaults)
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить инварианты значений
    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.movement;
        let p = &self.projectile;

        positive("movement.player_height", m.player_height)?;
        positive("movement.player_radius", m.player_radius)?;
        positive("movement.max_speed", m.max_speed)?;
        positive("movement.max_delta", m.max_delta)?;
        non_negative("movement.acceleration", m.acceleration)?;
        non_negative("movement.jump_force", m.jump_force)?;
        non_negative("movement.gravity", m.gravity)?;
        non_negative("movement.friction", m.friction)?;
        non_negative("movement.ground_buffer", m.ground_buffer)?;
        non_negative("movement.ray_origin_epsilon", m.ray_origin_epsilon)?;
        non_negative("movement.head_clearance", m.head_clearance)?;
        unit_interval("movement.air_control", m.air_control)?;
        unit_interval("movement.wall_velocity_damping", m.wall_velocity_damping)?;

        if !(m.slope_threshold_deg.is_finite() && (0.0..=90.0).contains(&m.slope_threshold_deg)) {
            return Err(ConfigError::Invalid {
                field: "movement.slope_threshold_deg",
                reason: "must be within [0, 90] degrees",
            });
        }
        if !(m.slope_tolerance_factor.is_finite() && m.slope_tolerance_factor >= 1.0) {
            return Err(ConfigError::Invalid {
                field: "movement.slope_tolerance_factor",
                reason: "must be >= 1.0",
            });
        }
        if !m.world_floor_y.is_finite() {
            return Err(ConfigError::Invalid {
                field: "movement.world_floor_y",
                reason: "must be finite",
            });
        }

        positive("projectile.radius", p.radius)?;
        positive("projectile.speed", p.speed)?;
        positive("projectile.distance_limit", p.distance_limit)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: "must be positive and finite" })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: "must be non-negative and finite" })
    }
}

fn unit_interval(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason: "must be within [0, 1]" })
    }
}
