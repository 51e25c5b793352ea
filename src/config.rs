use serde::Deserialize;

/// Configuration chargée depuis l'environnement (.env via dotenv, puis envy)
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_jwt_audience")]
    pub jwt_audience: String,

    #[serde(default = "default_app_url")]
    pub app_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    // Object storage (Supabase Storage)
    #[serde(default)]
    pub supabase_url: String,
    #[serde(default)]
    pub supabase_service_key: String,
    #[serde(default = "default_images_bucket")]
    pub images_bucket: String,
    #[serde(default = "default_products_bucket")]
    pub products_bucket: String,

    // Mail (SendGrid)
    pub sendgrid_api_key: Option<String>,
    #[serde(default = "default_mail_from_email")]
    pub mail_from_email: String,
    #[serde(default = "default_mail_from_name")]
    pub mail_from_name: String,

    // Google Calendar
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: Option<String>,

    pub cron_secret: Option<String>,
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// URL absolue vers une page du site, `path` commence par '/'
    pub fn app_link(&self, path: &str) -> String {
        format!("{}{}", self.app_url.trim_end_matches('/'), path)
    }
}

fn default_jwt_audience() -> String {
    "authenticated".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_images_bucket() -> String {
    "images".to_string()
}

fn default_products_bucket() -> String {
    "products".to_string()
}

fn default_mail_from_email() -> String {
    "noreply@pintas.store".to_string()
}

fn default_mail_from_name() -> String {
    "Pintas".to_string()
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_audience: default_jwt_audience(),
            app_url: "https://app.test".to_string(),
            host: default_host(),
            port: default_port(),
            supabase_url: "https://storage.test".to_string(),
            supabase_service_key: "service-key".to_string(),
            images_bucket: default_images_bucket(),
            products_bucket: default_products_bucket(),
            sendgrid_api_key: None,
            mail_from_email: default_mail_from_email(),
            mail_from_name: default_mail_from_name(),
            google_client_id: Some("client-id".to_string()),
            google_client_secret: Some("client-secret".to_string()),
            google_redirect_uri: Some("https://app.test/api/google/callback".to_string()),
            cron_secret: None,
            auto_migrate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_link_joins_without_double_slash() {
        let mut config = Config::for_tests();
        config.app_url = "https://pintas.store/".to_string();
        assert_eq!(
            config.app_link("/dashboard/store"),
            "https://pintas.store/dashboard/store"
        );
    }
}
