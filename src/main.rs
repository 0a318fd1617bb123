// Import from library crate
use videotube::{db, routes, services::MediaStorage, AppConfig};

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();

    // Initialize database
    let db = db::init_db(&config)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, format!("MongoDB: {}", e)))?;

    if let Err(e) = db::ensure_indexes(&db).await {
        log::error!("Failed to create indexes: {}", e);
    }

    if config.cloudinary.cloud_name.is_empty() {
        log::warn!("CLOUDINARY_CLOUD_NAME is not set, media uploads will fail");
    }
    let media = MediaStorage::new(config.cloudinary.clone());

    log::info!("🚀 Starting server at {}:{}", config.host, config.port);
    log::info!("🔒 CORS allowed origins: {:?}", config.cors_origins);

    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);
    let db = web::Data::new(db);
    let media = web::Data::new(media);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        // Add each allowed origin
        for origin in &config.cors_origins {
            cors = cors.allowed_origin(origin);
        }

        // Add credentials support
        cors = cors.supports_credentials();

        App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(db.clone())
            .app_data(config.clone())
            .app_data(media.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
