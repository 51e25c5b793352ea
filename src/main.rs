use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use tracing_subscriber::EnvFilter;

use storefront::config::Config;
use storefront::services::calendar::{DynCalendarClient, GoogleCalendarClient};
use storefront::services::mail::create_mail_client;
use storefront::services::storage::{DynObjectStorage, SupabaseStorage};
use storefront::{db, routes};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid configuration: {}", e)))?;

    tracing::info!("🔌 Connecting to database...");
    let conn = db::establish_connection(&config)
        .await
        .map_err(|e| io::Error::other(format!("Failed to connect to database: {}", e)))?;
    tracing::info!("✅ Database connected!");

    if config.auto_migrate {
        db::create_tables(&conn)
            .await
            .map_err(|e| io::Error::other(format!("Failed to create tables: {}", e)))?;
        tracing::info!("Tables created");
    }

    // Adaptateurs externes, partagés par tous les workers
    let mailer = create_mail_client(&config);
    let storage: DynObjectStorage = Arc::new(SupabaseStorage::from_config(&config));
    let calendar: DynCalendarClient = Arc::new(GoogleCalendarClient::from_config(&config));

    let bind = (config.host.clone(), config.port);
    tracing::info!("🚀 Starting server on http://{}:{}", bind.0, bind.1);

    let config = web::Data::new(config);
    let mailer = web::Data::from(mailer);
    let storage = web::Data::from(storage);
    let calendar = web::Data::from(calendar);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(conn.clone()))
            .app_data(config.clone())
            .app_data(mailer.clone())
            .app_data(storage.clone())
            .app_data(calendar.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind)?
        .run()
        .await
}
