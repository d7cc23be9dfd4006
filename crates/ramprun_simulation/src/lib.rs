//! RAMPRUN Simulation Core
//!
//! First-person movement/collision core на Bevy 0.16 ECS.
//! Рендер, окно и pointer lock живут в клиенте. Клиент пишет PlayerInput,
//! читает Transform/PlayerState/Projectile и рисует.
//!
//! Порядок тика (FixedUpdate, 60Hz):
//! 1. Input: RandomWalker и прочие источники input
//! 2. Movement: ground check, ускорение, прыжок, коллизии
//! 3. Projectiles: выстрелы, полёт, retire

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod config;
pub mod error;
pub mod geometry;
pub mod ground;
pub mod input;
pub mod level;
pub mod logger;
pub mod math;
pub mod physics;
pub mod projectile;
pub mod spatial;

// Re-export для удобства клиента
pub use config::{MovementConfig, ProjectileConfig, ProjectilePolicy, SimulationConfig};
pub use error::{ConfigError, GeometryError};
pub use geometry::{CollisionShape, GeometryRegistry, ShapeId};
pub use ground::{GroundClassifier, GroundContact};
pub use input::{PlayerInput, RandomWalker};
pub use logger::*;
pub use physics::{spawn_player, MovementPlugin, Player, PlayerState};
pub use projectile::{Projectile, ProjectilePlugin, ProjectileRetired, RetireReason, Shooter};
pub use spatial::{Ray, RayHit, SpatialQuery};

/// Частота simulation tick
pub const TICK_HZ: f64 = 60.0;

/// Группы систем внутри FixedUpdate (строгий порядок)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Input,
    Movement,
    Projectiles,
}

/// Активна ли симуляция (клиент снимает флаг при потере pointer lock / паузе)
///
/// Неактивная симуляция не двигает игрока и не принимает fire. Projectiles
/// в полёте ведут себя по ProjectilePolicy.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationActive(pub bool);

impl Default for SimulationActive {
    fn default() -> Self {
        Self(true)
    }
}

/// Главный plugin симуляции (объединяет все подсистемы)
///
/// SimulationConfig и GeometryRegistry можно вставить до plugin'а,
/// они не перезаписываются.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .init_resource::<SimulationConfig>()
            .init_resource::<GeometryRegistry>()
            .init_resource::<SimulationActive>()
            .insert_resource(DeterministicRng::new(42))
            .register_type::<PlayerState>()
            .register_type::<PlayerInput>()
            .register_type::<Projectile>()
            .register_type::<Shooter>()
            .register_type::<SimulationConfig>()
            .configure_sets(
                FixedUpdate,
                (SimulationSet::Input, SimulationSet::Movement, SimulationSet::Projectiles).chain(),
            )
            .add_systems(
                FixedUpdate,
                input::drive_random_walkers
                    .run_if(physics::simulation_is_active)
                    .in_set(SimulationSet::Input),
            )
            .add_plugins((MovementPlugin, ProjectilePlugin));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную, каждый `app.update()` = ровно один fixed tick,
/// независимо от wall clock.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / TICK_HZ)));

    app
}

/// Загружает уровень в GeometryRegistry (заменяет текущий)
pub fn load_level(
    app: &mut App,
    shapes: impl IntoIterator<Item = CollisionShape>,
) -> Result<usize, GeometryError> {
    let registry = GeometryRegistry::from_shapes(shapes)?;
    let count = registry.len();
    app.insert_resource(registry);
    log_info(&format!("Level loaded: {} collision shapes", count));
    Ok(count)
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
