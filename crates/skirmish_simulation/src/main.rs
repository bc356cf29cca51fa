//! Headless прогон Skirmish
//!
//! Usage: skirmish_simulation [config.json] [ticks] [seed]
//!
//! Config ошибка фатальна: процесс завершается до старта frame scheduler.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use skirmish_simulation::services::{AssetCatalog, FsAssetLoader, Services};
use skirmish_simulation::{
    create_headless_app, log_info, ActiveSession, AutopilotPlugin, GameConfig, Session,
    SimulationPlugin,
};

const DEFAULT_TICKS: u32 = 3600;
const DEFAULT_SEED: u64 = 42;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/config.json"))
        });
    let ticks: u32 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid tick count `{}`", raw))?,
        None => DEFAULT_TICKS,
    };
    let seed: u64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid seed `{}`", raw))?,
        None => DEFAULT_SEED,
    };

    println!("Starting Skirmish headless simulation (seed: {})", seed);
    let mut app = create_headless_app(seed);

    let config = GameConfig::load(&config_path)
        .with_context(|| format!("cannot start session from {}", config_path.display()))?;

    // Пути в manifest относительно директории config
    let asset_root = config_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    let assets = AssetCatalog::preload(&config.assets, &mut FsAssetLoader::new(asset_root));

    let session = Session::with_rapier(Arc::new(config), Services::headless(assets));
    app.insert_resource(ActiveSession(session))
        .add_plugins((SimulationPlugin, AutopilotPlugin));

    for tick in 0..ticks {
        app.update();

        let session = &app.world().resource::<ActiveSession>().0;
        if tick % 600 == 0 {
            log_info(&format!(
                "Tick {}: score {}, {} enemies, {} projectiles",
                tick,
                session.score(),
                session.enemies().len(),
                session.projectiles().len()
            ));
        }
        if let Some(reason) = session.end_reason() {
            println!("Session ended at tick {}: {:?}", tick, reason);
            break;
        }
    }

    let session = &app.world().resource::<ActiveSession>().0;
    println!("Simulation complete! Final score: {}", session.score());
    Ok(())
}
