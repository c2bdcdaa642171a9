pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;

use std::sync::Arc;

use actix_web::{error, middleware::Logger, web, App, HttpResponse, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::order_service::{OrderService, SharedOrderService};
pub use config::AppConfig;
pub use db::{create_pool, DbPool};

use infrastructure::kafka::{KafkaSettings, KafkaSink};
use infrastructure::publisher::{BrokerPublisher, PublisherHandle};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::list_user_orders,
        handlers::orders::update_order_status,
        handlers::orders::order_stats,
        handlers::health,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::CreateOrderItemRequest,
        handlers::orders::UpdateOrderStatusRequest,
        domain::order::Order,
        domain::order::OrderItem,
        domain::order::Address,
        domain::order::OrderStatus,
        domain::stats::OrderStats,
    )),
    tags(
        (name = "orders", description = "Order lifecycle"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;

/// Connect to the broker if one is configured. Any failure degrades to a
/// publisher that reports every event as undeliverable.
pub async fn start_publisher(
    settings: Option<&KafkaSettings>,
    queue_capacity: usize,
) -> (BrokerPublisher, PublisherHandle) {
    let Some(settings) = settings else {
        log::warn!("KAFKA_BROKERS not set; order events will not be published");
        return (BrokerPublisher::unavailable(), PublisherHandle::detached());
    };

    match KafkaSink::connect(settings).await {
        Ok(sink) => BrokerPublisher::spawn(sink, queue_capacity),
        Err(e) => {
            log::warn!(
                "Event broker at {} unavailable ({}); order events will not be published",
                settings.brokers,
                e
            );
            (BrokerPublisher::unavailable(), PublisherHandle::detached())
        }
    }
}

fn json_error_handler(
    err: error::JsonPayloadError,
    _req: &actix_web::HttpRequest,
) -> actix_web::Error {
    let body = serde_json::json!({ "error": format!("Invalid request body: {err}") });
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Mount the order API on an app. `service` is shared by every worker.
pub fn configure(service: web::Data<SharedOrderService>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(service)
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(handlers::health))
                    .service(
                        web::scope("/orders")
                            .route("", web::post().to(handlers::orders::create_order))
                            .route("", web::get().to(handlers::orders::list_orders))
                            .route("/stats", web::get().to(handlers::orders::order_stats))
                            .route(
                                "/user/{user_id}",
                                web::get().to(handlers::orders::list_user_orders),
                            )
                            .route("/{id}", web::get().to(handlers::orders::get_order))
                            .route(
                                "/{id}/status",
                                web::patch().to(handlers::orders::update_order_status),
                            ),
                    ),
            );
    }
}

/// Wire the store and publisher into a shareable service.
pub fn build_service<S, P>(store: S, publisher: P) -> web::Data<SharedOrderService>
where
    S: domain::ports::OrderStore,
    P: domain::ports::EventPublisher,
{
    let store: Arc<dyn domain::ports::OrderStore> = Arc::new(store);
    let publisher: Arc<dyn domain::ports::EventPublisher> = Arc::new(publisher);
    web::Data::new(OrderService::new(
        store,
        publisher,
        domain::order_number::OrderNumberGenerator::new(),
    ))
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: web::Data<SharedOrderService>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let openapi = ApiDoc::openapi();
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure(service.clone()))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
