// src/main.rs
use actix_web::{ middleware::Logger, web, App, HttpServer };
use env_logger::Env;
use log::{ error, info };

use stonemc_status::config::Config;
use stonemc_status::handlers;
use stonemc_status::proxy::StatusProxy;
use stonemc_status::upstream::McApiClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env();

    let client = match McApiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build upstream client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let proxy = web::Data::new(StatusProxy::new(client, config.cache_ttl()));
    let bind = config.bind();

    info!("Starting server on {}", bind);
    HttpServer::new(move || {
        App::new()
            .app_data(proxy.clone())
            .wrap(Logger::default())
            .route("/", web::get().to(handlers::index::index))
            .route(
                "/api/server-status",
                web::get().to(handlers::status::get_server_status::<McApiClient>)
            )
    })
        .bind(&bind)?
        .run().await
}
