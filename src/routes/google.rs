// ============================================================================
// CONNEXION GOOGLE CALENDAR (OAuth)
// ============================================================================
//
// /auth      : redirige vers l'écran de consentement, avec un état signé
//              (userId + returnUrl, 10 minutes)
// /callback  : échange le code, stocke les jetons et renvoie vers returnUrl
//              avec google_connected=true ou google_error=<raison>
// /status    : état de la connexion
// /disconnect: efface les jetons
//
// Le callback n'a pas d'en-tête Authorization: l'utilisateur est celui de
// l'état signé.
//
// ============================================================================

use actix_web::{get, http::header, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::config::Config;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::calendar::CalendarClient;
use crate::services::user_service::UserService;
use crate::utils::jwt::{sign_oauth_state, verify_oauth_state};

const DEFAULT_RETURN_URL: &str = "/dashboard/store";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthQuery {
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Seuls les chemins relatifs au site sont acceptés
fn sanitize_return_url(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(url) if url.starts_with('/') && !url.starts_with("//") && !url.contains('\\') => url.to_string(),
        _ => DEFAULT_RETURN_URL.to_string(),
    }
}

fn redirect_to(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn back_to_app(config: &Config, return_url: &str, key: &str, value: &str) -> HttpResponse {
    let target = config.app_link(return_url);
    let location = match reqwest::Url::parse(&target) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(key, value);
            url.to_string()
        }
        Err(e) => {
            tracing::warn!("Invalid return URL {}: {}", target, e);
            config.app_link(DEFAULT_RETURN_URL)
        }
    };
    redirect_to(location)
}

/// GET /api/google/auth?returnUrl= - Redirection vers Google
#[get("/auth")]
pub async fn google_auth(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    calendar: web::Data<dyn CalendarClient>,
    query: web::Query<AuthQuery>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    let return_url = sanitize_return_url(query.return_url.as_deref());

    let state = sign_oauth_state(user.id, &return_url, &config.jwt_secret).map_err(|e| {
        tracing::error!("Failed to sign OAuth state: {}", e);
        AppError::Internal("Failed to generate auth URL".to_string())
    })?;
    let auth_url = calendar.auth_url(&state)?;

    Ok(redirect_to(auth_url))
}

/// GET /api/google/callback?code=&state=&error= - Retour de Google
#[get("/callback")]
pub async fn google_callback(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    calendar: web::Data<dyn CalendarClient>,
    query: web::Query<CallbackQuery>,
) -> HttpResponse {
    let query = query.into_inner();
    let state = query
        .state
        .as_deref()
        .map(|token| verify_oauth_state(token, &config.jwt_secret));
    let return_url = match &state {
        Some(Ok(state)) => sanitize_return_url(Some(&state.return_url)),
        _ => DEFAULT_RETURN_URL.to_string(),
    };
    let fail = |reason: &str| back_to_app(&config, &return_url, "google_error", reason);

    if let Some(error) = query.error.as_deref() {
        tracing::warn!("Google OAuth error: {}", error);
        return fail(error);
    }

    let (code, state) = match (query.code.as_deref(), state) {
        (Some(code), Some(state)) if !code.is_empty() => (code, state),
        _ => return fail("missing_code_or_state"),
    };
    let state = match state {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Rejected OAuth state: {}", e);
            return fail("unauthorized");
        }
    };

    let tokens = match calendar.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!(user_id = %state.sub, "Google token exchange failed: {}", e);
            return fail(&e.to_string());
        }
    };

    let user = match UserService::find_by_id(&db, state.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => return fail("unauthorized"),
        Err(_) => return fail("storage_failed"),
    };

    match UserService::save_google_tokens(
        &db,
        user,
        tokens.access_token,
        tokens.refresh_token,
        tokens.expires_at,
    )
        .await
    {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Google Calendar connected");
            back_to_app(&config, &return_url, "google_connected", "true")
        }
        Err(_) => fail("storage_failed"),
    }
}

/// GET /api/google/status
#[get("/status")]
pub async fn google_status(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    Ok(HttpResponse::Ok().json(UserService::google_status(&user, Utc::now())))
}

/// POST /api/google/disconnect
#[post("/disconnect")]
pub async fn google_disconnect(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let user = UserService::ensure_user(&db, &auth_user).await?;
    UserService::clear_google_tokens(&db, user).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

pub fn google_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/google")
            .service(google_auth)
            .service(google_callback)
            .service(google_status)
            .service(google_disconnect),
    );
}
