use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use zenova_server::auth::TokenService;
use zenova_server::config::AppConfig;
use zenova_server::db::{self, MongoProductStore};
use zenova_server::handlers;
use zenova_server::store::ProductStore;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let database = match db::connect(&config).await {
        Ok(database) => database,
        Err(e) => {
            log::error!("Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn ProductStore> = Arc::new(MongoProductStore::new(&database));
    let store = web::Data::from(store);
    let tokens = TokenService::new(&config.token_secret, config.mode);

    log::info!(
        "Zenova server is running on port: {} ({:?})",
        config.port,
        config.mode
    );

    HttpServer::new(move || {
        let tokens = tokens.clone();
        App::new()
            .wrap(Logger::default())
            .app_data(store.clone())
            .configure(|cfg| handlers::configure(cfg, tokens))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
