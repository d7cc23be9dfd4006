//! Headless симуляция RAMPRUN
//!
//! Demo арена + игрок со случайным input, 1000 тиков без рендера.
//! Опционально: путь к JSON с SimulationConfig первым аргументом.

use ramprun_simulation::{
    create_headless_app, level, load_level, log_error, log_info, set_log_level, spawn_player, LogLevel, PlayerState,
    RandomWalker, SimulationConfig,
};

const TICKS: u32 = 1000;

fn main() {
    let seed = 42;
    let mut app = create_headless_app(seed);
    // Прыжки и выстрелы (DEBUG) на 1000 тиков только шумят
    set_log_level(LogLevel::Info);
    log_info(&format!("Starting RAMPRUN headless simulation (seed: {})", seed));

    if let Some(path) = std::env::args().nth(1) {
        let config = std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| SimulationConfig::from_json_str(&json).map_err(|err| err.to_string()));
        match config {
            Ok(config) => {
                log_info(&format!("Config loaded from {}", path));
                app.insert_resource(config);
            }
            Err(err) => {
                log_error(&format!("Failed to load config {}: {}", path, err));
                std::process::exit(1);
            }
        }
    }

    if let Err(err) = load_level(&mut app, level::demo_arena()) {
        log_error(&format!("Failed to build demo arena: {}", err));
        std::process::exit(1);
    }

    let player = {
        let mut commands = app.world_mut().commands();
        let player = spawn_player(&mut commands, level::DEMO_SPAWN);
        commands.entity(player).insert(RandomWalker);
        player
    };
    app.world_mut().flush();

    for tick in 0..TICKS {
        app.update();

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            if let Some(state) = app.world().get::<PlayerState>(player) {
                log_info(&format!(
                    "Tick {}: {} entities, player at {:?} ({:?})",
                    tick,
                    entity_count,
                    state.position,
                    state.motion_state()
                ));
            }
        }
    }

    log_info("Simulation complete!");
}
