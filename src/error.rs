// ============================================================================
// ERREURS API
// ============================================================================
//
// Taxonomie des erreurs renvoyées par les services et les routes:
//   - Validation   : entrée invalide                    -> 400
//   - Unauthorized : session absente/invalide            -> 401
//   - Forbidden    : lien de téléchargement invalide     -> 403
//   - NotFound     : absent OU appartenant à un autre    -> 404
//   - Expired      : lien expiré (> 24h)                 -> 410
//   - NeedsReauth  : reconnexion Google nécessaire       -> 400 + needsAuth
//   - Upstream     : échec d'une API externe             -> 502
//   - Unavailable  : fonctionnalité désactivée           -> 503
//   - Persistence  : échec BD (message générique)        -> 500
//
// Le corps JSON est toujours {"success": false, "error": "..."}.
//
// ============================================================================

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::DbErr;
use thiserror::Error;

use crate::services::calendar::CalendarError;
use crate::services::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Expired(String),

    #[error("{0}")]
    NeedsReauth(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{context}")]
    Persistence {
        context: String,
        #[source]
        source: DbErr,
    },

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Journalise l'erreur BD et ne garde que le contexte pour le client
    pub fn persistence(context: impl Into<String>, source: DbErr) -> Self {
        let context = context.into();
        tracing::error!(error = %source, "{}", context);
        AppError::Persistence { context, source }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::NeedsReauth(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Expired(_) => StatusCode::GONE,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Persistence { .. } | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::NeedsReauth(msg) => serde_json::json!({
                "success": false,
                "error": msg,
                "needsAuth": true
            }),
            other => serde_json::json!({
                "success": false,
                "error": other.to_string()
            }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Storage error: {}", err);
        match err {
            StorageError::NotConfigured => AppError::Unavailable(err.to_string()),
            _ => AppError::Upstream(err.to_string()),
        }
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::NeedsReauth(msg) => AppError::NeedsReauth(msg),
            CalendarError::NotConfigured => AppError::Unavailable(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}
