//! Demo арена: две spawn зоны с рампами и блоками + мост между ними
//!
//! Только collision descriptors (размеры, позиция, поворот). Рендер строит
//! меши из тех же данных на своей стороне.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::geometry::CollisionShape;

/// Точка spawn игрока: eye position стоящего на центральной платформе
pub const DEMO_SPAWN: Vec3 = Vec3::new(0.0, 1.5, 0.0);

/// Наклон рамп (~28.6°)
pub const RAMP_ANGLE: f32 = PI / 6.3;

const RAMP_LENGTH: f32 = 22.4;

/// Блоки вокруг центра (x, z) на сетке 20м
const BLOCK_GRID: [(f32, f32); 20] = [
    (-40.0, -40.0), (-20.0, -40.0), (0.0, -40.0), (20.0, -40.0), (40.0, -40.0),
    (-40.0, -20.0), (-20.0, -20.0), (20.0, -20.0), (40.0, -20.0),
    (-40.0, 0.0), (40.0, 0.0),
    (-40.0, 20.0), (-20.0, 20.0), (20.0, 20.0), (40.0, 20.0),
    (-40.0, 40.0), (-20.0, 40.0), (0.0, 40.0), (20.0, 40.0), (40.0, 40.0),
];

/// Одна spawn зона: платформа, 4 рампы к блокам, кольцо блоков
pub fn spawn_area(offset_x: f32, offset_z: f32) -> Vec<CollisionShape> {
    let mut shapes = Vec::with_capacity(1 + 4 + BLOCK_GRID.len());

    // Центральная платформа (верх на y = -0.5)
    shapes.push(CollisionShape::cuboid(20.0, 1.0, 20.0, Vec3::new(offset_x, -1.0, offset_z)));

    // Рампы от края платформы вверх к крыше блоков (y = 10)
    let ramps = [
        (Vec3::new(0.0, 4.5, -20.0), Vec3::new(RAMP_ANGLE, 0.0, 0.0), Vec3::new(20.0, 1.0, RAMP_LENGTH)),
        (Vec3::new(0.0, 4.5, 20.0), Vec3::new(-RAMP_ANGLE, 0.0, 0.0), Vec3::new(20.0, 1.0, RAMP_LENGTH)),
        (Vec3::new(20.0, 4.5, 0.0), Vec3::new(0.0, 0.0, RAMP_ANGLE), Vec3::new(RAMP_LENGTH, 1.0, 20.0)),
        (Vec3::new(-20.0, 4.5, 0.0), Vec3::new(0.0, 0.0, -RAMP_ANGLE), Vec3::new(RAMP_LENGTH, 1.0, 20.0)),
    ];
    for (position, euler, size) in ramps {
        shapes.push(CollisionShape::rotated_cuboid(
            size.x,
            size.y,
            size.z,
            Vec3::new(offset_x, 0.0, offset_z) + position,
            euler,
        ));
    }

    // Блоки 20x10x20 (крыша на y = 10)
    for (x, z) in BLOCK_GRID {
        shapes.push(CollisionShape::cuboid(20.0, 10.0, 20.0, Vec3::new(offset_x + x, 5.0, offset_z + z)));
    }

    shapes
}

/// Мост между зонами (верх на y = 9.5)
pub fn bridge() -> CollisionShape {
    CollisionShape::cuboid(60.0, 1.0, 120.0, Vec3::new(0.0, 9.0, -100.0))
}

/// Полная demo арена
pub fn demo_arena() -> Vec<CollisionShape> {
    let mut shapes = spawn_area(0.0, 0.0);
    shapes.extend(spawn_area(0.0, -200.0));
    shapes.push(bridge());
    shapes
}
