use std::error::Error;

use database::{DatabaseConnectionInfo, MemoryDatabase, PgDatabase};
use tracker::{database::Database, seed::SeedDocument, server::Server};
use web::{config::WebConfig, start_web_server, WebState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if let Err(why) = dotenvy::dotenv() {
        if !why.not_found() {
            return Err(why.into());
        }
    }
    env_logger::init();

    let config = WebConfig::from_env()?;

    // database
    match DatabaseConnectionInfo::from_env() {
        Some(database_connection_info) => {
            let database = PgDatabase::connect(database_connection_info).await?;
            run(database, config).await
        }
        None => {
            log::warn!("no database connection info in env, keeping data in memory");
            run(MemoryDatabase::new(), config).await
        }
    }
}

async fn run<D: Database>(database: D, config: WebConfig) -> Result<(), Box<dyn Error>> {
    // server
    let server = Server::new(database).nearest_stops(config.nearest_stops);

    if let Some(seed_file) = &config.seed_file {
        log::info!("importing route definitions from {}", seed_file.display());
        let document = SeedDocument::from_file(seed_file).await?;
        server.client("seed").import(document).await?;
    }

    // web server
    start_web_server(
        WebState {
            client: server.client("REST API"),
        },
        config.bind_address,
    )
    .await?;

    Ok(())
}
