use actix_web::HttpServer;
use anyhow::Context;
use autoportal::db::init_db;
use autoportal::init::{create_app, init_lib_mods, AppData};
use autoportal::Config;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = Config::from_env().context("configuration failed to load")?;
    let db = init_db(&config.database_url)
        .await
        .context("database failed to initialize")?;
    let bind_address = config.bind_address.to_owned();
    let data = AppData::new(config, db);

    log::info!("listening on {}", bind_address);
    HttpServer::new(move || create_app(data.clone()))
        .bind(&bind_address)
        .with_context(|| format!("cannot bind {}", bind_address))?
        .run()
        .await?;
    Ok(())
}
