use std::io;

use dotenvy::dotenv;
use order_lifecycle::infrastructure::order_repo::DieselOrderStore;
use order_lifecycle::{
    build_server, build_service, create_pool, run_migrations, start_publisher, AppConfig,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config =
        AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let pool = create_pool(&config.database_url, &config.pool).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let (publisher, publisher_handle) =
        start_publisher(config.kafka.as_ref(), config.publish_queue_capacity).await;
    let service = build_service(DieselOrderStore::new(pool), publisher);

    log::info!("Starting server at http://{}:{}", config.host, config.port);
    let served = build_server(service, &config.host, config.port)?.await;

    publisher_handle.shutdown().await;
    log::info!("Order service stopped");
    served
}
