use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::utils::jwt::{self, UserMetadata};

/// Utilisateur authentifié par le fournisseur d'identité
/// Extracteur des routes protégées (Authorization: Bearer <jwt>)
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub metadata: UserMetadata,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, AppError> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::Internal("Configuration missing".to_string()))?;

    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 2. Format "Bearer <token>"
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".to_string())
    })?;

    // 3. Vérifier le token
    let claims = jwt::verify_access_token(token, &config.jwt_secret, &config.jwt_audience)
        .map_err(AppError::Unauthorized)?;

    let email = claims
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token has no email".to_string()))?;

    Ok(AuthUser {
        user_id: claims.sub,
        email,
        metadata: claims.user_metadata,
    })
}
