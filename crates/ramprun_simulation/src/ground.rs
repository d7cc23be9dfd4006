//! Ground/Slope Classifier
//!
//! По нормали поверхности решает, пол это (walkable), рампа или стена.
//! Walkable = угол нормали к up ≤ slope threshold.

use bevy::prelude::*;

use crate::config::MovementConfig;
use crate::math::angle_to_up_deg;
use crate::spatial::{Ray, RayHit, SpatialQuery};

/// Результат ground check
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroundContact {
    pub grounded: bool,
    /// Eye height, на которую надо поставить игрока (hit.y + player_height)
    pub support_y: Option<f32>,
    /// Нормаль опоры (если grounded)
    pub normal: Option<Vec3>,
}

impl GroundContact {
    pub const AIRBORNE: Self = Self {
        grounded: false,
        support_y: None,
        normal: None,
    };
}

/// Walkable ли поверхность с такой нормалью
pub fn is_walkable(normal: Vec3, slope_threshold_deg: f32) -> bool {
    angle_to_up_deg(normal) <= slope_threshold_deg
}

/// Classifier = SpatialQuery + movement config
#[derive(Clone, Copy)]
pub struct GroundClassifier<'a> {
    query: SpatialQuery<'a>,
    config: &'a MovementConfig,
}

impl<'a> GroundClassifier<'a> {
    pub fn new(query: SpatialQuery<'a>, config: &'a MovementConfig) -> Self {
        Self { query, config }
    }

    pub fn query(&self) -> SpatialQuery<'a> {
        self.query
    }

    /// Downward raycast от eye position на player_height + buffer
    pub fn ground_hit(&self, position: Vec3, extra_distance: f32) -> Option<RayHit> {
        let eps = self.config.ray_origin_epsilon;
        let ray = Ray::new(
            position + Vec3::Y * eps,
            Vec3::NEG_Y,
            self.config.player_height + self.config.ground_buffer + eps + extra_distance.max(0.0),
        );
        self.query.cast(&ray)
    }

    /// Стоит ли игрок на walkable поверхности
    pub fn classify_ground(&self, position: Vec3) -> GroundContact {
        self.contact_from_hit(self.ground_hit(position, 0.0))
    }

    pub(crate) fn contact_from_hit(&self, hit: Option<RayHit>) -> GroundContact {
        match hit {
            Some(hit) if is_walkable(hit.normal, self.config.slope_threshold_deg) => GroundContact {
                grounded: true,
                support_y: Some(hit.point.y + self.config.player_height),
                normal: Some(hit.normal),
            },
            _ => GroundContact::AIRBORNE,
        }
    }

    /// Заблокировано ли горизонтальное движение в сторону move_direction
    ///
    /// Стена ближе radius → blocked. Walkable поверхность (рампа) в пределах
    /// radius × tolerance не блокирует, иначе рампы были бы непроходимы.
    pub fn is_movement_blocked(&self, position: Vec3, move_direction: Vec3) -> bool {
        let radius = self.config.player_radius;
        let tolerance = radius * self.config.slope_tolerance_factor;

        let ray = Ray::new(position, move_direction, tolerance);
        let Some(hit) = self.query.cast(&ray) else {
            return false;
        };

        if is_walkable(hit.normal, self.config.slope_threshold_deg) && hit.distance <= tolerance {
            return false;
        }

        hit.distance < radius
    }

    /// Какую часть step_length можно пройти к move_direction, не подходя к стене ближе radius
    ///
    /// Луч на step_length + radius. Стена, до которой шаг доберётся за этот тик,
    /// укорачивает шаг до `hit.distance - radius`. Walkable поверхности шаг не
    /// ограничивают (по ним поднимает ground snap).
    pub fn clear_step(&self, position: Vec3, move_direction: Vec3, step_length: f32) -> f32 {
        let radius = self.config.player_radius;

        let ray = Ray::new(position, move_direction, step_length + radius);
        match self.query.cast(&ray) {
            Some(hit) if !is_walkable(hit.normal, self.config.slope_threshold_deg) => {
                (hit.distance - radius).clamp(0.0, step_length)
            }
            _ => step_length,
        }
    }
}
