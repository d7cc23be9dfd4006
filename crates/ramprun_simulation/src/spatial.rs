//! Spatial Query Service: raycast против GeometryRegistry
//!
//! Каждая shape проверяется через parry3d `RayCast` (solid), registry
//! обходится в порядке вставки. Возвращает ближайшее попадание в [min, max].
//! Равные дистанции → побеждает shape, вставленная раньше (детерминизм).
//! Origin offset (epsilon над полом) задаёт вызывающий.

use bevy::prelude::*;
use parry3d::query::{Ray as ParryRay, RayCast, RayIntersection};

use crate::geometry::{ColliderShape, GeometryRegistry, PlacedCollider, ShapeId};
use crate::math::{from_vector, to_point, to_vector};

/// Луч для запроса (transient, строится на каждый query)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit vector (или ZERO для вырожденного луча → no hit)
    pub direction: Vec3,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Ray {
    /// Луч от origin вдоль direction (нормализуется) до max_distance
    pub fn new(origin: Vec3, direction: Vec3, max_distance: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            min_distance: 0.0,
            max_distance,
        }
    }

    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Точка на луче
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Результат raycast (потребляется сразу, не хранится)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    /// Outward unit нормаль поверхности
    pub normal: Vec3,
    pub shape: ShapeId,
}

/// Read-only view на registry для raycasts
#[derive(Clone, Copy)]
pub struct SpatialQuery<'a> {
    registry: &'a GeometryRegistry,
}

impl<'a> SpatialQuery<'a> {
    pub fn new(registry: &'a GeometryRegistry) -> Self {
        Self { registry }
    }

    /// Ближайшее попадание луча или None
    pub fn cast(&self, ray: &Ray) -> Option<RayHit> {
        if ray.direction == Vec3::ZERO || ray.max_distance < ray.min_distance {
            return None;
        }

        let parry_ray = ParryRay::new(to_point(ray.origin), to_vector(ray.direction));
        let mut nearest: Option<RayHit> = None;

        for (index, collider) in self.registry.colliders().iter().enumerate() {
            let Some(intersection) = intersect_collider(collider, &parry_ray, ray.max_distance) else {
                continue;
            };
            let distance = intersection.time_of_impact;
            let normal = from_vector(&intersection.normal);

            // Solid cast изнутри shape (или shape позади луча) = toi 0 с нулевой нормалью
            if normal.length_squared() < 0.5 || distance < ray.min_distance {
                continue;
            }

            // При равенстве остаётся первая shape
            if nearest.map_or(true, |hit| distance < hit.distance) {
                nearest = Some(RayHit {
                    distance,
                    point: ray.at(distance),
                    normal: normal.normalize(),
                    shape: ShapeId(index),
                });
            }
        }

        nearest
    }
}

/// parry raycast против одного collider (solid, world frame)
fn intersect_collider(collider: &PlacedCollider, ray: &ParryRay, max_distance: f32) -> Option<RayIntersection> {
    match &collider.shape {
        ColliderShape::Cuboid(cuboid) => cuboid.cast_ray_and_get_normal(&collider.transform, ray, max_distance, true),
        ColliderShape::HalfSpace(half_space) => {
            // One-sided: только лучи, летящие навстречу нормали
            let facing = (collider.transform.rotation * half_space.normal.into_inner()).dot(&ray.dir);
            if facing > -1e-8 {
                return None;
            }
            half_space.cast_ray_and_get_normal(&collider.transform, ray, max_distance, true)
        }
    }
}
