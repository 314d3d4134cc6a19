use anyhow::Context;
use autoportal::db::init_db;
use autoportal::fixtures::load_dir;
use autoportal::init::init_lib_mods;
use autoportal::Config;
use std::path::PathBuf;

/// Loads the sample CSV files. The first argument overrides `FIXTURE_DIR`.
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = Config::from_env().context("configuration failed to load")?;
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.fixture_dir));
    let db = init_db(&config.database_url)
        .await
        .context("database failed to initialize")?;

    let report = load_dir(&db, &dir)
        .await
        .with_context(|| format!("loading fixtures from {}", dir.display()))?;
    log::info!(
        "fixtures loaded: {} users, {} cars, {} comments created",
        report.users,
        report.cars,
        report.comments
    );
    Ok(())
}
