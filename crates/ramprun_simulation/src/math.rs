//! Минимальный math слой поверх glam (bevy::math)
//!
//! Угол к up, горизонтальный basis от look direction, look из yaw/pitch.
//! Плюс конверсии glam ↔ parry3d (nalgebra) для raycast запросов.

use bevy::prelude::*;
use parry3d::math::{Isometry, Point, Real, Vector};
use parry3d::na::{Quaternion, Translation3, UnitQuaternion};

/// Угол между нормалью и world-up в градусах (`acos(n · up)`)
pub fn angle_to_up_deg(normal: Vec3) -> f32 {
    normal.normalize_or_zero().dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Look direction, спроецированная на горизонтальную плоскость
///
/// `Vec3::ZERO` если смотрим строго вверх/вниз.
pub fn horizontal_forward(look: Vec3) -> Vec3 {
    Vec3::new(look.x, 0.0, look.z).normalize_or_zero()
}

/// Горизонтальный basis (forward, right) для WASD
pub fn horizontal_basis(look: Vec3) -> (Vec3, Vec3) {
    let forward = horizontal_forward(look);
    let right = forward.cross(Vec3::Y).normalize_or_zero();
    (forward, right)
}

/// Look direction из yaw/pitch (радианы)
///
/// yaw = 0, pitch = 0 → смотрим в -Z. Положительный yaw поворачивает вправо,
/// положительный pitch смотрит вверх. Pitch зажат чуть меньше ±π/2, чтобы
/// горизонтальная проекция не вырождалась.
pub fn look_from_yaw_pitch(yaw: f32, pitch: f32) -> Vec3 {
    const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.001;
    let pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

    Vec3::new(
        yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
}

/// glam Vec3 → parry точка
pub fn to_point(v: Vec3) -> Point<Real> {
    Point::new(v.x, v.y, v.z)
}

/// glam Vec3 → parry вектор
pub fn to_vector(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

/// parry вектор → glam Vec3
pub fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// World transform (позиция + поворот) для parry запросов
pub fn to_isometry(position: Vec3, rotation: Quat) -> Isometry<Real> {
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(rotation.w, rotation.x, rotation.y, rotation.z));
    Isometry::from_parts(Translation3::new(position.x, position.y, position.z), rotation)
}
