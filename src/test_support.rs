// Outils partagés par les tests: base SQLite en mémoire et faux adaptateurs
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::products::{self, DeliveryType, ProductType};
use crate::models::users;
use crate::services::calendar::{
    AttendeeOutcome, CalendarClient, CalendarError, CreatedEvent, EventRequest, GoogleTokens,
    classify_calendar_error,
};
use crate::services::mail::{EmailMessage, MailClient, MailError};
use crate::services::storage::{ObjectStorage, StorageError};
use crate::utils::jwt::{self, UserMetadata};

pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db::create_tables(&db).await.unwrap();
    db
}

pub async fn insert_user(db: &DatabaseConnection, username: &str) -> users::Model {
    let now = Utc::now();
    users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{}@example.com", username)),
        username: Set(username.to_string()),
        full_name: Set(Some(format!("{} Host", username))),
        bio: Set(None),
        avatar: Set(None),
        avatar_path: Set(None),
        google_access_token: Set(None),
        google_refresh_token: Set(None),
        google_token_expiry: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
        .insert(db)
        .await
        .unwrap()
}

pub async fn connect_google(db: &DatabaseConnection, user: users::Model, expiry: chrono::DateTime<Utc>) -> users::Model {
    let mut active: users::ActiveModel = user.into();
    active.google_access_token = Set(Some("access-old".to_string()));
    active.google_refresh_token = Set(Some("refresh".to_string()));
    active.google_token_expiry = Set(Some(expiry));
    active.update(db).await.unwrap()
}

/// Produit publié avec des valeurs par défaut, ajustable via `customize`
pub async fn insert_product(
    db: &DatabaseConnection,
    user_id: Uuid,
    product_type: ProductType,
    customize: impl FnOnce(&mut products::ActiveModel),
) -> products::Model {
    let now = Utc::now();
    let mut active = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        title: Set("Test product".to_string()),
        subtitle: Set(None),
        description: Set(Some("A product".to_string())),
        price: Set(Decimal::ZERO),
        currency: Set("USD".to_string()),
        product_type: Set(product_type),
        image_url: Set(None),
        image_path: Set(None),
        file_url: Set(None),
        file_path: Set(None),
        file_name: Set(None),
        delivery_type: Set(DeliveryType::Upload),
        redirect_url: Set(None),
        button_text: Set(None),
        form_fields: Set(None),
        current_step: Set(1),
        is_draft: Set(false),
        is_active: Set(true),
        google_event_id: Set(None),
        google_meet_link: Set(None),
        google_calendar_link: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    customize(&mut active);
    active.insert(db).await.unwrap()
}

pub fn bearer_for(user: &users::Model) -> String {
    let config = Config::for_tests();
    let token = jwt::generate_access_token(
        user.id,
        &user.email,
        UserMetadata::default(),
        &config.jwt_secret,
        &config.jwt_audience,
    )
        .unwrap();
    format!("Bearer {}", token)
}

// ----------------------------------------------------------------------------
// Stockage
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeStorage {
    uploads: Mutex<Vec<String>>,
    deletes: Mutex<Vec<String>>,
    pub fail: bool,
}

impl FakeStorage {
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn deleted_paths(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, _bucket: &str, path: &str, _content_type: &str, _bytes: Vec<u8>) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Upload("bucket unavailable".to_string()));
        }
        self.uploads.lock().unwrap().push(path.to_string());
        Ok(path.to_string())
    }

    async fn delete(&self, _bucket: &str, path: &str) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Delete("bucket unavailable".to_string()));
        }
        self.deletes.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("https://storage.test/storage/v1/object/public/{}/{}", bucket, path)
    }

    async fn signed_url(&self, bucket: &str, path: &str, expires_in_secs: u64) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Sign("bucket unavailable".to_string()));
        }
        Ok(format!("https://storage.test/signed/{}/{}?expires={}", bucket, path, expires_in_secs))
    }
}

// ----------------------------------------------------------------------------
// Mail
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<EmailMessage>>,
    /// Les envois vers ces adresses échouent
    pub failing_recipients: Vec<String>,
}

impl FakeMailer {
    pub fn failing_for(recipient: &str) -> Self {
        FakeMailer {
            sent: Mutex::new(Vec::new()),
            failing_recipients: vec![recipient.to_string()],
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailClient for FakeMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.failing_recipients.contains(&message.to) {
            return Err(MailError::Api("550 mailbox unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Calendrier
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeCalendar {
    pub refresh_error: Option<String>,
    pub create_error: Option<String>,
    pub attendee_error: Option<String>,
    refreshes: Mutex<u32>,
    created: Mutex<Vec<(String, EventRequest)>>,
    attendees: Mutex<Vec<(String, String)>>,
}

impl FakeCalendar {
    pub fn refresh_count(&self) -> u32 {
        *self.refreshes.lock().unwrap()
    }

    /// (jeton d'accès utilisé, événement)
    pub fn created_events(&self) -> Vec<(String, EventRequest)> {
        self.created.lock().unwrap().clone()
    }

    /// (event id, email)
    pub fn added_attendees(&self) -> Vec<(String, String)> {
        self.attendees.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarClient for FakeCalendar {
    fn auth_url(&self, state: &str) -> Result<String, CalendarError> {
        Ok(format!("https://accounts.test/auth?state={}", state))
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens, CalendarError> {
        if code == "bad-code" {
            return Err(classify_calendar_error("invalid_grant"));
        }
        Ok(GoogleTokens {
            access_token: format!("access-{}", code),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<GoogleTokens, CalendarError> {
        *self.refreshes.lock().unwrap() += 1;
        if let Some(message) = &self.refresh_error {
            return Err(classify_calendar_error(message));
        }
        Ok(GoogleTokens {
            access_token: "access-new".to_string(),
            refresh_token: None,
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }

    async fn create_event(&self, access_token: &str, event: &EventRequest) -> Result<CreatedEvent, CalendarError> {
        if let Some(message) = &self.create_error {
            return Err(classify_calendar_error(message));
        }
        self.created
            .lock()
            .unwrap()
            .push((access_token.to_string(), event.clone()));
        Ok(CreatedEvent {
            id: "evt-1".to_string(),
            html_link: Some("https://calendar.test/evt-1".to_string()),
            meet_link: Some("https://meet.test/abc".to_string()),
            start_time: Some(event.start.to_rfc3339()),
            end_time: Some(event.end.to_rfc3339()),
        })
    }

    async fn add_attendee(&self, _access_token: &str, event_id: &str, email: &str, _name: Option<&str>) -> Result<AttendeeOutcome, CalendarError> {
        if let Some(message) = &self.attendee_error {
            return Err(classify_calendar_error(message));
        }
        self.attendees
            .lock()
            .unwrap()
            .push((event_id.to_string(), email.to_string()));
        Ok(AttendeeOutcome::Added)
    }
}

/// Les trois adaptateurs partagés entre un test et l'application
pub struct Fakes {
    pub storage: Arc<FakeStorage>,
    pub mailer: Arc<FakeMailer>,
    pub calendar: Arc<FakeCalendar>,
}

impl Default for Fakes {
    fn default() -> Self {
        Fakes {
            storage: Arc::new(FakeStorage::default()),
            mailer: Arc::new(FakeMailer::default()),
            calendar: Arc::new(FakeCalendar::default()),
        }
    }
}

/// Application complète (routes réelles) branchée sur la base et les faux
/// adaptateurs donnés
macro_rules! test_app {
    ($db:expr, $fakes:expr) => {{
        use std::sync::Arc;
        use actix_web::web::Data;
        use crate::services::{calendar::CalendarClient, mail::MailClient, storage::ObjectStorage};

        let mailer: Arc<dyn MailClient> = $fakes.mailer.clone();
        let storage: Arc<dyn ObjectStorage> = $fakes.storage.clone();
        let calendar: Arc<dyn CalendarClient> = $fakes.calendar.clone();

        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(Data::new($db.clone()))
                .app_data(Data::new(crate::config::Config::for_tests()))
                .app_data(Data::from(mailer))
                .app_data(Data::from(storage))
                .app_data(Data::from(calendar))
                .configure(crate::routes::configure_routes),
        )
            .await
    }};
}

pub(crate) use test_app;
