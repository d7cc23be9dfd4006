//! Geometry Registry: статическая collision геометрия уровня
//!
//! Boxes (oriented) и бесконечные planes. Заполняется один раз при
//! построении уровня, дальше только чтение (Resource без write contention).
//! Вырожденные shapes отклоняются на вставке (GeometryError), а не молча
//! игнорируются в raycast. На вставке же строится parry3d collider.

use bevy::prelude::*;
use parry3d::math::{Isometry, Real};
use parry3d::na::Unit;
use parry3d::shape::{Cuboid, HalfSpace};

use crate::error::GeometryError;
use crate::math::{to_isometry, to_vector};

/// Индекс shape в registry (порядок вставки)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct ShapeId(pub usize);

/// Статическая collision shape
#[derive(Debug, Clone, PartialEq, Reflect)]
pub enum CollisionShape {
    /// Oriented box: размеры по локальным осям + world transform
    Box {
        width: f32,
        height: f32,
        depth: f32,
        position: Vec3,
        rotation: Quat,
    },
    /// Бесконечная one-sided plane (точка на плоскости + outward нормаль)
    Plane { point: Vec3, normal: Vec3 },
}

impl CollisionShape {
    /// Axis-aligned box (платформы, блоки)
    pub fn cuboid(width: f32, height: f32, depth: f32, position: Vec3) -> Self {
        Self::Box {
            width,
            height,
            depth,
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Box с Euler-поворотом (XYZ порядок, радианы), например рампа
    pub fn rotated_cuboid(width: f32, height: f32, depth: f32, position: Vec3, euler_xyz: Vec3) -> Self {
        Self::Box {
            width,
            height,
            depth,
            position,
            rotation: Quat::from_euler(EulerRot::XYZ, euler_xyz.x, euler_xyz.y, euler_xyz.z),
        }
    }

    /// Горизонтальный бесконечный пол на высоте `y`
    pub fn floor(y: f32) -> Self {
        Self::Plane {
            point: Vec3::new(0.0, y, 0.0),
            normal: Vec3::Y,
        }
    }

    /// Проверка + нормализация (rotation / normal) перед вставкой
    fn validated(self) -> Result<Self, GeometryError> {
        match self {
            Self::Box { width, height, depth, position, rotation } => {
                let dims_ok = [width, height, depth].iter().all(|v| v.is_finite() && *v > 0.0);
                if !dims_ok {
                    return Err(GeometryError::DegenerateBox { width, height, depth });
                }
                if !position.is_finite() {
                    return Err(GeometryError::NonFiniteTransform("box position"));
                }
                if !rotation.is_finite() || rotation.length_squared() < 1e-12 {
                    return Err(GeometryError::NonFiniteTransform("box rotation"));
                }

                Ok(Self::Box {
                    width,
                    height,
                    depth,
                    position,
                    rotation: rotation.normalize(),
                })
            }
            Self::Plane { point, normal } => {
                if !point.is_finite() {
                    return Err(GeometryError::NonFiniteTransform("plane point"));
                }
                let unit = normal.try_normalize().filter(|n| n.is_finite());
                match unit {
                    Some(normal) => Ok(Self::Plane { point, normal }),
                    None => Err(GeometryError::DegeneratePlaneNormal(normal.to_array())),
                }
            }
        }
    }
}

/// parry3d форма shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Cuboid(Cuboid),
    HalfSpace(HalfSpace),
}

/// Shape, готовая к raycast (parry форма + world transform)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedCollider {
    pub shape: ColliderShape,
    pub transform: Isometry<Real>,
}

impl PlacedCollider {
    fn from_validated(shape: &CollisionShape) -> Self {
        match shape {
            CollisionShape::Box { width, height, depth, position, rotation } => Self {
                shape: ColliderShape::Cuboid(Cuboid::new(to_vector(Vec3::new(*width, *height, *depth) * 0.5))),
                transform: to_isometry(*position, *rotation),
            },
            CollisionShape::Plane { point, normal } => Self {
                // Нормаль уже unit после validated()
                shape: ColliderShape::HalfSpace(HalfSpace::new(Unit::new_unchecked(to_vector(*normal)))),
                transform: to_isometry(*point, Quat::IDENTITY),
            },
        }
    }
}

/// Registry всех collidable shapes уровня
///
/// Descriptors и parry colliders хранятся параллельно, индекс = ShapeId.
#[derive(Resource, Debug, Clone, Default)]
pub struct GeometryRegistry {
    shapes: Vec<CollisionShape>,
    colliders: Vec<PlacedCollider>,
}

impl GeometryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Построить registry из списка descriptors (первая ошибка прерывает)
    pub fn from_shapes(shapes: impl IntoIterator<Item = CollisionShape>) -> Result<Self, GeometryError> {
        let mut registry = Self::new();
        for shape in shapes {
            registry.add_shape(shape)?;
        }
        Ok(registry)
    }

    /// Добавить shape, вернуть её ShapeId
    pub fn add_shape(&mut self, shape: CollisionShape) -> Result<ShapeId, GeometryError> {
        let shape = shape.validated()?;
        let id = ShapeId(self.shapes.len());
        self.colliders.push(PlacedCollider::from_validated(&shape));
        self.shapes.push(shape);
        Ok(id)
    }

    /// parry colliders в порядке вставки (для SpatialQuery)
    pub fn colliders(&self) -> &[PlacedCollider] {
        &self.colliders
    }

    /// Shapes в порядке вставки
    pub fn shapes(&self) -> &[CollisionShape] {
        &self.shapes
    }

    pub fn get(&self, id: ShapeId) -> Option<&CollisionShape> {
        self.shapes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
