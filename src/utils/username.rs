// ============================================================================
// VALIDATION DES USERNAMES
// ============================================================================
//
// Règles (dans l'ordre, la première qui échoue gagne):
//   1. longueur entre 3 et 30
//   2. lettres, chiffres, '-' et '_' uniquement
//   3. pas de '-' ou '_' en début ou fin
//   4. pas de caractères spéciaux consécutifs (--, __, -_, _-)
//   5. pas un mot réservé (insensible à la casse)
//
// La disponibilité en base est vérifiée par services::username_service.
//
// ============================================================================

use rand::Rng;
use serde::Serialize;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;

/// Chemins de l'application, plateformes sociales et jetons réservés
const RESERVED_USERNAMES: &[&str] = &[
    "admin", "api", "app", "www", "mail", "ftp", "blog", "store", "shop",
    "dashboard", "login", "signup", "auth", "oauth", "callback", "settings",
    "profile", "account", "help", "support", "contact", "about", "terms",
    "privacy", "legal", "docs", "documentation", "status", "health",
    "pricing", "features", "home", "landing", "welcome", "onboarding",
    "billing", "payment", "checkout", "success", "error", "notfound",
    "404", "500", "maintenance", "coming-soon", "soon", "beta", "alpha",
    "dev", "development", "staging", "test", "testing", "demo",
    "assets", "static", "public", "media", "uploads", "downloads",
    "images", "img", "css", "js", "javascript", "fonts", "favicon",
    "robots", "sitemap", "manifest", "security", "well-known",
    "instagram", "twitter", "facebook", "linkedin", "youtube", "tiktok",
    "github", "discord", "telegram", "whatsapp", "snapchat", "pinterest",
    "root", "user", "guest", "anonymous", "unknown", "null", "undefined",
    "true", "false", "yes", "no", "on", "off", "none", "all", "any",
];

/// Résultat renvoyé tel quel par POST /api/username/check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameCheck {
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UsernameCheck {
    pub fn valid() -> Self {
        UsernameCheck { is_valid: true, error: None }
    }

    pub fn invalid(error: impl Into<String>) -> Self {
        UsernameCheck {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

pub fn is_reserved(username: &str) -> bool {
    let lower = username.to_lowercase();
    RESERVED_USERNAMES.contains(&lower.as_str())
}

pub fn validate_username_format(username: &str) -> UsernameCheck {
    let len = username.chars().count();
    if len < USERNAME_MIN_LENGTH {
        return UsernameCheck::invalid(format!(
            "Username must be at least {} characters long",
            USERNAME_MIN_LENGTH
        ));
    }
    if len > USERNAME_MAX_LENGTH {
        return UsernameCheck::invalid(format!(
            "Username must be no more than {} characters long",
            USERNAME_MAX_LENGTH
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return UsernameCheck::invalid(
            "Username can only contain letters, numbers, hyphens, and underscores",
        );
    }

    let is_special = |c: char| c == '-' || c == '_';
    if username.starts_with(is_special) || username.ends_with(is_special) {
        return UsernameCheck::invalid("Username cannot start or end with hyphens or underscores");
    }

    if ["--", "__", "-_", "_-"].iter().any(|pair| username.contains(pair)) {
        return UsernameCheck::invalid("Username cannot contain consecutive special characters");
    }

    if is_reserved(username) {
        return UsernameCheck::invalid("This username is reserved and cannot be used");
    }

    UsernameCheck::valid()
}

/// Base de username à partir de la partie locale de l'email
pub fn generate_username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let mut username: String = local
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    if username.len() < USERNAME_MIN_LENGTH {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
        let mut rng = rand::thread_rng();
        while username.len() < USERNAME_MIN_LENGTH {
            let idx = rng.gen_range(0..ALPHABET.len());
            username.push(ALPHABET[idx] as char);
        }
    }

    username.truncate(USERNAME_MAX_LENGTH);
    username
}
