//! Projectile Subsystem: простые баллистические шары
//!
//! Жизненный цикл:
//! 1. Fire (фронт нажатия PlayerInput.fire) → spawn перед глазами игрока
//! 2. Каждый тик: raycast вдоль пройденного отрезка, сдвиг, накопление дистанции
//! 3. Retire: попадание в геометрию ИЛИ travel_distance ≥ distance_limit
//!
//! Урона нет, попадание просто удаляет projectile.

use bevy::prelude::*;

use crate::config::{ProjectileConfig, ProjectilePolicy, SimulationConfig};
use crate::geometry::{GeometryRegistry, ShapeId};
use crate::input::PlayerInput;
use crate::physics::PlayerState;
use crate::spatial::{Ray, SpatialQuery};
use crate::SimulationActive;

/// Projectile в полёте
///
/// Инвариант: travel_distance монотонно не убывает до удаления.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Projectile {
    pub position: Vec3,
    pub velocity: Vec3,
    pub travel_distance: f32,
}

/// Почему projectile удалён
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RetireReason {
    Hit {
        point: Vec3,
        normal: Vec3,
        shape: ShapeId,
    },
    DistanceLimit,
}

/// Результат тика projectile
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileStatus {
    Flying,
    Retired(RetireReason),
}

impl Projectile {
    /// Новый projectile от глаз игрока вдоль look
    ///
    /// Spawn на `origin + look * (player_radius + radius)`, чтобы не
    /// стартовать внутри игрока. Если до этой точки есть геометрия (стреляем
    /// в упор), spawn прямо в глазах, и первый же advance даст Hit.
    /// None если look вырожден.
    pub fn fire(
        origin: Vec3,
        look: Vec3,
        player_radius: f32,
        config: &ProjectileConfig,
        query: &SpatialQuery,
    ) -> Option<Self> {
        let direction = look.try_normalize()?;
        let muzzle_offset = player_radius + config.radius;
        let muzzle_offset = match query.cast(&Ray::new(origin, direction, muzzle_offset)) {
            Some(_) => 0.0,
            None => muzzle_offset,
        };

        Some(Self {
            position: origin + direction * muzzle_offset,
            velocity: direction * config.speed,
            travel_distance: 0.0,
        })
    }

    /// Один тик полёта
    pub fn advance(&mut self, query: &SpatialQuery, config: &ProjectileConfig, delta: f32) -> ProjectileStatus {
        if delta.is_nan() || delta <= 0.0 {
            return ProjectileStatus::Flying;
        }

        let step = self.velocity * delta;
        let step_length = step.length();

        // Отрезок, который пролетим за тик (+ радиус шара)
        let hit = query.cast(&Ray::new(self.position, self.velocity, step_length + config.radius));

        self.position += step;
        self.travel_distance += step_length;

        if let Some(hit) = hit {
            return ProjectileStatus::Retired(RetireReason::Hit {
                point: hit.point,
                normal: hit.normal,
                shape: hit.shape,
            });
        }

        if self.travel_distance >= config.distance_limit {
            return ProjectileStatus::Retired(RetireReason::DistanceLimit);
        }

        ProjectileStatus::Flying
    }
}

/// Edge detection для fire (один выстрел на нажатие)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Shooter {
    pub was_firing: bool,
}

impl Shooter {
    /// true только на тике, где fire перешёл false → true
    pub fn trigger(&mut self, firing: bool) -> bool {
        let pressed = firing && !self.was_firing;
        self.was_firing = firing;
        pressed
    }
}

/// Event: projectile удалён (для VFX / звука на стороне клиента)
#[derive(Event, Debug, Clone)]
pub struct ProjectileRetired {
    pub entity: Entity,
    pub reason: RetireReason,
    pub travel_distance: f32,
}

/// Spawn helper для projectile entity
pub fn spawn_projectile(commands: &mut Commands, projectile: Projectile) -> Entity {
    commands
        .spawn((Transform::from_translation(projectile.position), projectile))
        .id()
}

/// Система: выстрелы по фронту PlayerInput.fire
///
/// Shooter обновляется и на паузе, поэтому fire, зажатый через паузу, не стреляет
/// после неё без нового нажатия.
pub fn fire_projectiles(
    mut commands: Commands,
    active: Res<SimulationActive>,
    config: Res<SimulationConfig>,
    registry: Res<GeometryRegistry>,
    mut shooters: Query<(Entity, &PlayerState, &PlayerInput, &mut Shooter)>,
) {
    let query = SpatialQuery::new(&registry);

    for (entity, state, input, mut shooter) in shooters.iter_mut() {
        let pressed = shooter.trigger(input.fire);
        if !pressed || !active.0 {
            continue;
        }

        let Some(projectile) = Projectile::fire(
            state.position,
            input.look,
            config.movement.player_radius,
            &config.projectile,
            &query,
        ) else {
            crate::log_warning(&format!("Player {:?} fired with degenerate look direction", entity));
            continue;
        };

        let projectile_entity = spawn_projectile(&mut commands, projectile);
        crate::log(&format!(
            "Player {:?} fired projectile {:?} from {:?}",
            entity, projectile_entity, projectile.position
        ));
    }
}

/// Система: полёт projectiles + retire
///
/// Пока симуляция неактивна, поведение определяет ProjectilePolicy.
pub fn advance_projectiles(
    mut commands: Commands,
    time: Res<Time<Fixed>>,
    active: Res<SimulationActive>,
    config: Res<SimulationConfig>,
    registry: Res<GeometryRegistry>,
    mut projectiles: Query<(Entity, &mut Projectile, &mut Transform)>,
    mut retired: EventWriter<ProjectileRetired>,
) {
    if !active.0 && config.projectile.policy == ProjectilePolicy::PauseWhileInactive {
        return;
    }

    let delta = time.delta_secs();
    if delta.is_nan() || delta <= 0.0 {
        return;
    }
    let delta = delta.min(config.movement.max_delta);
    let query = SpatialQuery::new(&registry);

    for (entity, mut projectile, mut transform) in projectiles.iter_mut() {
        let status = projectile.advance(&query, &config.projectile, delta);
        transform.translation = projectile.position;

        if let ProjectileStatus::Retired(reason) = status {
            if let RetireReason::Hit { shape, point, .. } = reason {
                crate::log(&format!("Projectile {:?} hit {:?} at {:?}", entity, shape, point));
            }

            retired.write(ProjectileRetired {
                entity,
                reason,
                travel_distance: projectile.travel_distance,
            });
            commands.entity(entity).despawn();
        }
    }
}

/// Plugin для projectiles
pub struct ProjectilePlugin;

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ProjectileRetired>();

        app.add_systems(
            FixedUpdate,
            (
                fire_projectiles,
                advance_projectiles,
            )
                .chain()
                .in_set(crate::SimulationSet::Projectiles),
        );
    }
}
