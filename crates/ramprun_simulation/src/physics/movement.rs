//! Motion Integrator, kinematic контроллер игрока
//!
//! Архитектура:
//! - Своя velocity интеграция (без rigid-body сил)
//! - Ground check raycast'ом вниз + ground snap (y = опора + eye height)
//! - Горизонталь gated через GroundClassifier::is_movement_blocked
//! - Вертикаль интегрируется напрямую в position.y
//!
//! Детерминизм: FixedUpdate (60Hz), delta дополнительно clamp'ится max_delta.

use bevy::prelude::*;

use crate::config::{MovementConfig, SimulationConfig};
use crate::geometry::GeometryRegistry;
use crate::ground::GroundClassifier;
use crate::input::PlayerInput;
use crate::projectile::Shooter;
use crate::spatial::{Ray, SpatialQuery};
use crate::SimulationActive;

/// Состояние движения игрока
///
/// Инварианты:
/// - |horizontal_velocity| ≤ max_speed после каждого тика
/// - vertical_velocity ≥ 0 на тике, где установлен контакт с землёй
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PlayerState {
    /// Позиция глаз (камеры), player_height над ногами
    pub position: Vec3,
    /// Горизонтальная скорость (x, z)
    pub horizontal_velocity: Vec2,
    /// Вертикальная скорость (m/s, + вверх)
    pub vertical_velocity: f32,
    pub grounded: bool,
    /// Разрешён ровно один прыжок до следующего приземления
    pub can_jump: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

impl PlayerState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            horizontal_velocity: Vec2::ZERO,
            vertical_velocity: 0.0,
            grounded: false,
            can_jump: true,
        }
    }

    pub fn motion_state(&self) -> MotionState {
        if self.grounded {
            MotionState::Grounded
        } else {
            MotionState::Airborne
        }
    }

    pub fn horizontal_speed(&self) -> f32 {
        self.horizontal_velocity.length()
    }
}

/// Состояние FSM движения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Airborne,
    Grounded,
}

/// Что произошло за тик (для логов и тестов)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    pub jumped: bool,
    /// Приземлились (Airborne → Grounded)
    pub landed: bool,
    /// Горизонтальное смещение отменено стеной
    pub blocked: bool,
    /// Упёрлись головой в потолок
    pub head_bump: bool,
    /// Сработал safety net world floor
    pub floor_clamped: bool,
}

/// Экспоненциальное затухание скорости: v *= 1 - min(rate * dt, 1)
fn apply_damping(velocity: &mut Vec2, rate: f32, delta: f32) {
    *velocity *= 1.0 - (rate * delta).min(1.0);
}

/// Один тик движения игрока
///
/// Сначала ground check (пока летим вверх, не делается), на земле snap к опоре
/// и трение, в воздухе гравитация и air damping. Потом ускорение от input,
/// clamp скорости и прыжок. Горизонтальный шаг проверяется против стен,
/// вертикальный идёт через landing sweep / head bump. В конце world floor.
pub fn step_player(
    state: &mut PlayerState,
    input: &PlayerInput,
    classifier: &GroundClassifier,
    config: &MovementConfig,
    delta: f32,
) -> StepReport {
    let mut report = StepReport::default();
    // NaN проверяется до min(), т.к. f32::min(NaN, x) == x
    if delta.is_nan() || delta <= 0.0 {
        return report;
    }
    let delta = delta.min(config.max_delta);

    let was_grounded = state.grounded;

    // Ground check
    let contact = if state.vertical_velocity > 0.0 {
        None
    } else {
        Some(classifier.classify_ground(state.position))
    };

    // Земля / воздух
    match contact {
        Some(contact) if contact.grounded => {
            if let Some(support_y) = contact.support_y {
                state.position.y = support_y;
            }
            state.vertical_velocity = state.vertical_velocity.max(0.0);
            state.can_jump = true;
            state.grounded = true;
            apply_damping(&mut state.horizontal_velocity, config.friction, delta);
        }
        _ => {
            state.grounded = false;
            state.vertical_velocity -= config.gravity * delta;
            apply_damping(
                &mut state.horizontal_velocity,
                config.friction * config.air_control,
                delta,
            );
        }
    }

    // Ускорение (в воздухе ослаблено air_control)
    let wish = input.wish_direction();
    let acceleration = if state.grounded {
        config.acceleration
    } else {
        config.acceleration * config.air_control
    };
    state.horizontal_velocity += Vec2::new(wish.x, wish.z) * acceleration * delta;

    // Speed cap
    state.horizontal_velocity = state.horizontal_velocity.clamp_length_max(config.max_speed);

    // Прыжок
    if input.jump && state.can_jump {
        state.vertical_velocity = config.jump_force;
        state.can_jump = false;
        state.grounded = false;
        report.jumped = true;
    }

    // Стена вплотную отменяет шаг, стена на пути укорачивает его
    let step = state.horizontal_velocity * delta;
    let step_length = step.length();
    if step_length > 0.0 {
        let direction = Vec3::new(step.x, 0.0, step.y) / step_length;
        if classifier.is_movement_blocked(state.position, direction) {
            state.horizontal_velocity *= config.wall_velocity_damping;
            report.blocked = true;
        } else {
            let allowed = classifier.clear_step(state.position, direction, step_length);
            state.position += direction * allowed;
            if allowed < step_length {
                state.horizontal_velocity *= config.wall_velocity_damping;
                report.blocked = true;
            }
        }
    }

    // Вертикаль
    let dy = state.vertical_velocity * delta;
    if dy < 0.0 {
        // Landing sweep, чтобы не проскочить пол за один тик
        let landing = classifier.contact_from_hit(classifier.ground_hit(state.position, -dy));
        match landing.support_y {
            Some(support_y) if landing.grounded && state.position.y + dy <= support_y => {
                state.position.y = support_y;
                state.vertical_velocity = 0.0;
                state.grounded = true;
                state.can_jump = true;
            }
            _ => state.position.y += dy,
        }
    } else if dy > 0.0 {
        let ceiling = classifier
            .query()
            .cast(&Ray::new(state.position, Vec3::Y, dy + config.head_clearance));
        match ceiling {
            Some(hit) => {
                state.position.y += (hit.distance - config.head_clearance).max(0.0);
                state.vertical_velocity = 0.0;
                report.head_bump = true;
            }
            None => state.position.y += dy,
        }
    }

    // Safety net на случай дыры в геометрии
    if state.position.y < config.world_floor_y {
        state.position.y = config.world_floor_y;
        state.vertical_velocity = 0.0;
        report.floor_clamped = true;
    }

    report.landed = !was_grounded && state.grounded;
    report
}

/// Система: тик движения для всех игроков
///
/// Работает в FixedUpdate, только пока SimulationActive (pointer lock).
pub fn player_movement_system(
    time: Res<Time<Fixed>>,
    config: Res<SimulationConfig>,
    registry: Res<GeometryRegistry>,
    mut players: Query<(Entity, &PlayerInput, &mut PlayerState)>,
) {
    let delta = time.delta_secs();
    let movement = &config.movement;
    let classifier = GroundClassifier::new(SpatialQuery::new(&registry), movement);

    for (entity, input, mut state) in players.iter_mut() {
        let report = step_player(&mut state, input, &classifier, movement, delta);

        if report.jumped {
            crate::log(&format!("Player {:?} jumped at {:?}", entity, state.position));
        }
        if report.landed {
            crate::log(&format!("Player {:?} landed at {:?}", entity, state.position));
        }
        if report.floor_clamped {
            crate::log_warning(&format!(
                "Player {:?} fell below world floor (y = {}), clamped",
                entity, movement.world_floor_y
            ));
        }
    }
}

/// Система: PlayerState.position → Transform (для рендера камеры)
pub fn sync_player_transform(mut players: Query<(&PlayerState, &mut Transform)>) {
    for (state, mut transform) in players.iter_mut() {
        transform.translation = state.position;
    }
}

/// Run condition: симуляция игрока активна
pub fn simulation_is_active(active: Res<SimulationActive>) -> bool {
    active.0
}

/// Marker component для player-controlled entity
///
/// Required Components добавляют всё, что нужно тику движения и стрельбе.
#[derive(Component, Debug, Clone, Copy, Default)]
#[require(PlayerState, PlayerInput, Shooter, Transform)]
pub struct Player;

/// Spawn helper для игрока
///
/// Создает entity с полным набором компонентов:
/// - Transform (eye position, для камеры)
/// - PlayerState / PlayerInput
/// - Shooter (edge detection для fire)
pub fn spawn_player(commands: &mut Commands, position: Vec3) -> Entity {
    commands
        .spawn((
            Player,
            Transform::from_translation(position),
            PlayerState::new(position),
        ))
        .id()
}

/// Plugin для движения игрока
///
/// Регистрирует системы в FixedUpdate для детерминизма.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                player_movement_system.run_if(simulation_is_active),
                sync_player_transform,
            )
                .chain()
                .in_set(crate::SimulationSet::Movement),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CollisionShape, GeometryRegistry};

    const DT: f32 = 1.0 / 60.0;

    /// Платформа с верхней гранью на y = 0
    fn platform() -> GeometryRegistry {
        GeometryRegistry::from_shapes([CollisionShape::cuboid(40.0, 1.0, 40.0, Vec3::new(0.0, -0.5, 0.0))])
            .unwrap()
    }

    fn run_ticks(
        state: &mut PlayerState,
        input: &PlayerInput,
        registry: &GeometryRegistry,
        config: &MovementConfig,
        ticks: usize,
    ) {
        let classifier = GroundClassifier::new(SpatialQuery::new(registry), config);
        for _ in 0..ticks {
            step_player(state, input, &classifier, config, DT);
        }
    }

    #[test]
    fn test_settles_on_platform_under_gravity() {
        let registry = platform();
        let config = MovementConfig::default();
        let mut state = PlayerState::new(Vec3::new(0.0, 5.0, 0.0));

        run_ticks(&mut state, &PlayerInput::default(), &registry, &config, 120);

        assert!(state.grounded);
        assert_eq!(state.motion_state(), MotionState::Grounded);
        assert!((state.position.y - config.player_height).abs() < 1e-4, "y = {}", state.position.y);
        assert_eq!(state.vertical_velocity, 0.0);
    }

    #[test]
    fn test_gravity_when_airborne() {
        let registry = GeometryRegistry::new();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 50.0, 0.0));

        step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);

        // vy = -32 * (1/60) ≈ -0.533
        assert!(!state.grounded);
        assert!((state.vertical_velocity + config.gravity * DT).abs() < 1e-5);
        assert!(state.position.y < 50.0);
    }

    #[test]
    fn test_jump_then_second_request_ignored() {
        let registry = platform();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));

        // Встаём на платформу
        step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);
        assert!(state.grounded && state.can_jump);

        let jump = PlayerInput {
            jump: true,
            ..default()
        };

        // Первый тик прыжка (ground check → jump → vy = 30)
        let report = step_player(&mut state, &jump, &classifier, &config, DT);
        assert!(report.jumped);
        assert!(!state.can_jump);
        assert!(!state.grounded);
        assert_eq!(state.vertical_velocity, 30.0);

        // Второй запрос до приземления ничего не делает, работает только гравитация
        let report = step_player(&mut state, &jump, &classifier, &config, DT);
        assert!(!report.jumped);
        assert!(!state.can_jump);
        assert!((state.vertical_velocity - (30.0 - config.gravity * DT)).abs() < 1e-4);
    }

    #[test]
    fn test_can_jump_restored_after_landing() {
        let registry = platform();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        let jump = PlayerInput {
            jump: true,
            ..default()
        };

        step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);
        step_player(&mut state, &jump, &classifier, &config, DT);
        assert!(!state.can_jump);

        // Полёт 2 * 30 / 32 ≈ 1.9 сек
        run_ticks(&mut state, &PlayerInput::default(), &registry, &config, 180);
        assert!(state.grounded);
        assert!(state.can_jump);
        assert!((state.position.y - config.player_height).abs() < 1e-4);
    }

    #[test]
    fn test_grounded_ticks_have_non_negative_vertical_velocity() {
        let registry = platform();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 8.0, 0.0));
        let input = PlayerInput {
            forward: true,
            jump: true,
            ..default()
        };

        for _ in 0..600 {
            step_player(&mut state, &input, &classifier, &config, DT);
            if state.grounded {
                assert!(state.vertical_velocity >= 0.0);
            }
        }
    }

    #[test]
    fn test_horizontal_speed_never_exceeds_cap() {
        let registry = platform();
        let mut config = MovementConfig::default();
        // Без трения ускорение быстро упирается в cap
        config.friction = 0.0;
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        let input = PlayerInput {
            forward: true,
            right: true,
            ..default()
        };

        for _ in 0..120 {
            step_player(&mut state, &input, &classifier, &config, DT);
            assert!(state.horizontal_speed() <= config.max_speed + 1e-4);
        }
        assert!((state.horizontal_speed() - config.max_speed).abs() < 1e-3);
    }

    #[test]
    fn test_friction_stops_player() {
        let registry = platform();
        let config = MovementConfig::default();
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        state.horizontal_velocity = Vec2::new(10.0, 0.0);

        run_ticks(&mut state, &PlayerInput::default(), &registry, &config, 120);

        assert!(state.horizontal_speed() < 1e-3);
    }

    #[test]
    fn test_air_control_reduces_acceleration() {
        let registry = GeometryRegistry::new();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let input = PlayerInput {
            forward: true,
            ..default()
        };

        let mut airborne = PlayerState::new(Vec3::new(0.0, 50.0, 0.0));
        step_player(&mut airborne, &input, &classifier, &config, DT);

        let expected = config.acceleration * config.air_control * DT;
        assert!((airborne.horizontal_speed() - expected).abs() < 1e-4);
    }

    #[test]
    fn test_wall_blocks_and_dampens() {
        // Пол + стена с гранью на z = -2
        let registry = GeometryRegistry::from_shapes([
            CollisionShape::cuboid(40.0, 1.0, 40.0, Vec3::new(0.0, -0.5, 0.0)),
            CollisionShape::cuboid(10.0, 10.0, 1.0, Vec3::new(0.0, 5.0, -2.5)),
        ])
        .unwrap();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        let input = PlayerInput {
            forward: true,
            ..default()
        };

        let mut blocked = false;
        for _ in 0..120 {
            let report = step_player(&mut state, &input, &classifier, &config, DT);
            blocked |= report.blocked;
        }

        assert!(blocked);
        // Не прошли сквозь стену и держим дистанцию ~radius
        assert!(state.position.z > -2.0);
        assert!(state.position.z < -2.0 + config.player_radius * 1.5);
    }

    #[test]
    fn test_wall_holds_at_max_delta_from_any_start() {
        // На max_delta шаг ~0.5м больше radius, но стена всё равно не проходится
        let registry = GeometryRegistry::from_shapes([
            CollisionShape::cuboid(40.0, 1.0, 40.0, Vec3::new(0.0, -0.5, 0.0)),
            CollisionShape::cuboid(10.0, 10.0, 1.0, Vec3::new(0.0, 5.0, -2.5)),
        ])
        .unwrap();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let input = PlayerInput {
            forward: true,
            ..default()
        };

        for i in 0..40 {
            let start_z = i as f32 * 0.0137;
            let mut state = PlayerState::new(Vec3::new(0.0, 2.0, start_z));

            for _ in 0..300 {
                step_player(&mut state, &input, &classifier, &config, config.max_delta);
            }

            assert!(
                state.position.z >= -2.0 + config.player_radius - 1e-3,
                "start z = {}: z = {}",
                start_z,
                state.position.z
            );
        }
    }

    #[test]
    fn test_walks_up_ramp() {
        // Рампа 30° (поднимается к +X) на полу
        let registry = GeometryRegistry::from_shapes([
            CollisionShape::cuboid(80.0, 1.0, 40.0, Vec3::new(0.0, -0.5, 0.0)),
            CollisionShape::rotated_cuboid(20.0, 1.0, 10.0, Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 30f32.to_radians())),
        ])
        .unwrap();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        let input = PlayerInput {
            forward: true,
            look: Vec3::X,
            ..default()
        };

        for _ in 0..60 {
            step_player(&mut state, &input, &classifier, &config, DT);
        }

        // Продвинулись вдоль +X и поднялись над полом
        assert!(state.position.x > 5.0, "x = {}", state.position.x);
        assert!(state.position.y > config.player_height + 1.0, "y = {}", state.position.y);
    }

    #[test]
    fn test_landing_sweep_prevents_tunneling() {
        // Тонкая платформа, падаем очень быстро
        let registry =
            GeometryRegistry::from_shapes([CollisionShape::cuboid(10.0, 0.2, 10.0, Vec3::new(0.0, -0.1, 0.0))])
                .unwrap();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 3.5, 0.0));
        state.vertical_velocity = -240.0; // 4 метра за тик: без sweep глаза окажутся под платформой

        let report = step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);

        assert!(report.landed);
        assert!(state.grounded);
        assert!((state.position.y - config.player_height).abs() < 1e-4);
        assert_eq!(state.vertical_velocity, 0.0);
    }

    #[test]
    fn test_head_bump_stops_ascent() {
        // Пол + потолок на y = 2.5
        let registry = GeometryRegistry::from_shapes([
            CollisionShape::cuboid(20.0, 1.0, 20.0, Vec3::new(0.0, -0.5, 0.0)),
            CollisionShape::cuboid(20.0, 1.0, 20.0, Vec3::new(0.0, 3.0, 0.0)),
        ])
        .unwrap();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 2.0, 0.0));
        let jump = PlayerInput {
            jump: true,
            ..default()
        };

        step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);
        let report = step_player(&mut state, &jump, &classifier, &config, DT);

        assert!(report.jumped);
        assert!(report.head_bump);
        assert_eq!(state.vertical_velocity, 0.0);
        assert!(state.position.y <= 2.5 - config.head_clearance + 1e-4);
    }

    #[test]
    fn test_world_floor_safety_net() {
        let registry = GeometryRegistry::new();
        let mut config = MovementConfig::default();
        config.world_floor_y = -10.0;
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, -9.99, 0.0));
        state.vertical_velocity = -30.0;

        let report = step_player(&mut state, &PlayerInput::default(), &classifier, &config, DT);

        assert!(report.floor_clamped);
        assert_eq!(state.position.y, -10.0);
        assert_eq!(state.vertical_velocity, 0.0);
    }

    #[test]
    fn test_large_delta_is_clamped() {
        let registry = GeometryRegistry::new();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let mut state = PlayerState::new(Vec3::new(0.0, 50.0, 0.0));

        // 1 секунда (tab suspend) → считается как max_delta
        step_player(&mut state, &PlayerInput::default(), &classifier, &config, 1.0);

        assert!((state.vertical_velocity + config.gravity * config.max_delta).abs() < 1e-4);
    }

    #[test]
    fn test_invalid_delta_is_noop() {
        let registry = GeometryRegistry::new();
        let config = MovementConfig::default();
        let classifier = GroundClassifier::new(SpatialQuery::new(&registry), &config);
        let start = PlayerState::new(Vec3::new(0.0, 50.0, 0.0));

        for delta in [f32::NAN, 0.0, -1.0] {
            let mut state = start;
            let report = step_player(&mut state, &PlayerInput::default(), &classifier, &config, delta);
            assert_eq!(state, start, "delta = {}", delta);
            assert_eq!(report, StepReport::default());
        }
    }
}
