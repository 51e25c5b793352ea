use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audience des jetons d'état OAuth (distincte de celle des sessions)
const OAUTH_STATE_AUDIENCE: &str = "google-oauth-state";
const OAUTH_STATE_MINUTES: i64 = 10;

/// Métadonnées posées par le fournisseur d'identité à l'inscription
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Claims d'un access token émis par le fournisseur d'identité
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// État signé transmis à Google pendant le consentement OAuth
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthState {
    pub sub: Uuid,
    #[serde(rename = "returnUrl")]
    pub return_url: String,
    pub aud: String,
    pub exp: i64,
}

fn validation(audience: &str) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);
    validation
}

/// Vérifie un access token (signature HS256, audience, expiration)
pub fn verify_access_token(token: &str, secret: &str, audience: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation(audience),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

/// Génère un access token au format du fournisseur (tests, outils de dev)
pub fn generate_access_token(
    user_id: Uuid,
    email: &str,
    metadata: UserMetadata,
    secret: &str,
    audience: &str,
) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(1))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        email: Some(email.to_string()),
        aud: audience.to_string(),
        exp: expiration,
        user_metadata: metadata,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| format!("Failed to generate token: {}", e))
}

pub fn sign_oauth_state(user_id: Uuid, return_url: &str, secret: &str) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::minutes(OAUTH_STATE_MINUTES))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let state = OAuthState {
        sub: user_id,
        return_url: return_url.to_string(),
        aud: OAUTH_STATE_AUDIENCE.to_string(),
        exp: expiration,
    };

    encode(&Header::default(), &state, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| format!("Failed to sign state: {}", e))
}

pub fn verify_oauth_state(token: &str, secret: &str) -> Result<OAuthState, String> {
    decode::<OAuthState>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation(OAUTH_STATE_AUDIENCE),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid state: {}", e))
}
