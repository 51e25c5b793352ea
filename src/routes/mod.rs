pub mod drafts;
pub mod google;
pub mod health;
pub mod leads;
pub mod products;
pub mod profile;
pub mod public;
pub mod uploads;
pub mod username;
pub mod webhooks;
pub mod webinar;

use actix_web::{error, web};

use crate::error::AppError;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // Erreurs d'extraction -> corps JSON habituel
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::Validation(err.to_string())));
    let query_config = web::QueryConfig::default()
        .error_handler(|err, _req| error::Error::from(AppError::Validation(err.to_string())));
    // Identifiant illisible dans l'URL: traité comme une ressource absente
    let path_config = web::PathConfig::default().error_handler(|err, _req| {
        tracing::debug!("Rejected path parameter: {}", err);
        error::Error::from(AppError::not_found("Not found"))
    });

    cfg.service(
        web::scope("/api")
            .app_data(json_config)
            .app_data(query_config)
            .app_data(path_config)
            .service(health::health_check)
            .service(username::check_username)
            .service(public::public_page)
            .service(webhooks::payment_webhook)
            .configure(leads::leads_routes)
            .configure(profile::profile_routes)
            .configure(products::products_routes)
            .configure(drafts::drafts_routes)
            .configure(uploads::uploads_routes)
            .configure(google::google_routes)
            .configure(webinar::webinar_routes)
    );
}
