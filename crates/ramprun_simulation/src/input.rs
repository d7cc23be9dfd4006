//! Input snapshot: polled раз в тик
//!
//! Клиент (рендер/окно) заполняет PlayerInput, симуляция только читает.
//! Вместо keydown/keyup callbacks берётся снимок состояния клавиш на момент тика.

use bevy::prelude::*;
use rand::Rng;

use crate::math::{horizontal_basis, look_from_yaw_pitch};
use crate::DeterministicRng;

/// Снимок input игрока на текущий тик
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Jump запрошен (пока зажат, прыгаем при каждом приземлении)
    pub jump: bool,
    /// Fire зажат (выстрел по фронту нажатия)
    pub fire: bool,
    /// Look direction камеры (unit vector, пишет клиент)
    pub look: Vec3,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            jump: false,
            fire: false,
            look: Vec3::NEG_Z,
        }
    }
}

impl PlayerInput {
    /// Пустой input, смотрим в направлении yaw/pitch
    pub fn looking(yaw: f32, pitch: f32) -> Self {
        Self {
            look: look_from_yaw_pitch(yaw, pitch),
            ..default()
        }
    }

    /// Нормализованное горизонтальное направление из WASD относительно look
    ///
    /// Противоположные клавиши гасят друг друга. ZERO если ничего не нажато
    /// или look строго вертикальный.
    pub fn wish_direction(&self) -> Vec3 {
        let (forward, right) = horizontal_basis(self.look);

        let mut wish = Vec3::ZERO;
        if self.forward {
            wish += forward;
        }
        if self.backward {
            wish -= forward;
        }
        if self.right {
            wish += right;
        }
        if self.left {
            wish -= right;
        }

        wish.normalize_or_zero()
    }
}

/// Маркер: input генерируется случайно (headless soak / determinism тесты)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RandomWalker;

/// Система: случайный input для RandomWalker (seeded RNG → детерминизм)
pub fn drive_random_walkers(
    mut rng: ResMut<DeterministicRng>,
    mut walkers: Query<&mut PlayerInput, With<RandomWalker>>,
) {
    for mut input in walkers.iter_mut() {
        let rng = &mut rng.rng;
        let yaw = rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI);
        let pitch = rng.gen_range(-0.5..0.5);

        *input = PlayerInput {
            forward: rng.gen_bool(0.7),
            backward: rng.gen_bool(0.1),
            left: rng.gen_bool(0.2),
            right: rng.gen_bool(0.2),
            jump: rng.gen_bool(0.05),
            fire: rng.gen_bool(0.1),
            look: look_from_yaw_pitch(yaw, pitch),
        };
    }
}
