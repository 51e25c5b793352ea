// ============================================================================
// SERVICE : LEADS (lead magnets publics)
// ============================================================================
//
// Soumission (submit_lead):
//   1. Produit FREE_LEAD actif, sinon 404
//   2. Champs requis du formulaire, puis email ("email" ou id historique "2")
//   3. Insertion du lead: un échec n'empêche pas la livraison
//   4. redirect -> redirectUrl renvoyée au client
//      sinon    -> email avec lien de téléchargement (si le lead existe)
//   5. Événement LEAD_CAPTURED seulement si le lead a été enregistré
//
// Téléchargement (redeem_download):
//   (productId, email, token = lead.id) -> URL signée 1h si le lead a
//   moins de 24h (24h pile reste valide)
//
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;
use validator::Validate;

use crate::config::Config;
use crate::error::AppError;
use crate::models::analytics::AnalyticsEventType;
use crate::models::leads;
use crate::models::payload::ProductPayload;
use crate::models::products::{self, DeliveryType, ProductType};
use crate::models::users;
use crate::services::analytics_service::AnalyticsService;
use crate::services::mail::templates::{self, LeadMagnetEmail};
use crate::services::mail::{EmailMessage, MailClient};
use crate::services::storage::{ObjectStorage, SIGNED_URL_SECONDS, path_from_public_url};

pub const DOWNLOAD_LINK_HOURS: i64 = 24;
const LEAD_SOURCE: &str = "public_page";

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[validate(length(min = 1, message = "Product id is required"))]
    pub product_id: String,
    #[serde(default)]
    pub form_data: Map<String, Value>,
}

/// Origine de la requête, "unknown" si l'en-tête manque
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        ClientInfo {
            ip_address: "unknown".to_string(),
            user_agent: "unknown".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<Uuid>,
}

pub struct LeadService;

/// Valeur saisie non vide (les nombres sont acceptés)
fn form_value(form: &Map<String, Value>, key: &str) -> Option<String> {
    match form.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn lead_link_expired(created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - created_at > Duration::hours(DOWNLOAD_LINK_HOURS)
}

/// {APP_URL}/api/download/{productId}?email=...&token={leadId}
pub fn download_link(config: &Config, product_id: Uuid, email: &str, lead_id: Uuid) -> Option<String> {
    let base = config.app_link(&format!("/api/download/{}", product_id));
    let token = lead_id.to_string();
    reqwest::Url::parse_with_params(&base, &[("email", email), ("token", token.as_str())])
        .map(String::from)
        .map_err(|e| tracing::error!("Invalid download link base {}: {}", base, e))
        .ok()
}

impl LeadService {
    async fn find_lead_magnet(db: &DatabaseConnection, product_id: &str) -> Result<products::Model, AppError> {
        let unavailable = || AppError::not_found("Product not found or not available");
        let product_id = Uuid::parse_str(product_id.trim()).map_err(|_| unavailable())?;

        products::Entity::find()
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::ProductType.eq(ProductType::FreeLead))
            .filter(products::Column::IsActive.eq(true))
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load product", e))?
            .ok_or_else(unavailable)
    }

    pub async fn submit_lead(
        db: &DatabaseConnection,
        mailer: &dyn MailClient,
        config: &Config,
        submission: LeadSubmission,
        client: ClientInfo,
    ) -> Result<LeadResponse, AppError> {
        submission.validate()?;
        let product = Self::find_lead_magnet(db, &submission.product_id).await?;
        let form = &submission.form_data;

        let payload = ProductPayload::decode_lenient(product.product_type, product.form_fields.as_ref());
        if let Some(missing) = payload
            .collected_fields()
            .iter()
            .find(|field| field.required && form_value(form, &field.id).is_none())
        {
            return Err(AppError::Validation(format!("{} is required", missing.label)));
        }

        let email = form_value(form, "email")
            .or_else(|| form_value(form, "2"))
            .ok_or_else(|| AppError::validation("Email is required"))?;
        let name = form_value(form, "name").or_else(|| form_value(form, "1"));

        let now = Utc::now();
        let lead = leads::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(product.user_id),
            product_id: Set(product.id),
            customer_email: Set(email.clone()),
            customer_name: Set(name.clone()),
            customer_phone: Set(form_value(form, "phone")),
            form_data: Set(Value::Object(form.clone())),
            ip_address: Set(client.ip_address),
            user_agent: Set(client.user_agent),
            source: Set(LEAD_SOURCE.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(db)
            .await;

        // la livraison continue même sans lead enregistré
        let lead = match lead {
            Ok(lead) => Some(lead),
            Err(e) => {
                tracing::error!(product_id = %product.id, "Error creating lead: {}", e);
                None
            }
        };

        let redirect_url = product
            .redirect_url
            .clone()
            .filter(|url| product.delivery_type == DeliveryType::Redirect && !url.trim().is_empty());

        let response = match redirect_url {
            Some(url) => LeadResponse {
                success: true,
                message: "redirect".to_string(),
                redirect_url: Some(url),
                lead_id: lead.as_ref().map(|l| l.id),
            },
            None => {
                let link = lead
                    .as_ref()
                    .and_then(|l| download_link(config, product.id, &email, l.id));
                Self::send_lead_email(db, mailer, &product, &email, name.as_deref(), link.as_deref()).await;

                LeadResponse {
                    success: true,
                    message: "Thank you! Check your email for your download.".to_string(),
                    redirect_url: None,
                    lead_id: lead.as_ref().map(|l| l.id),
                }
            }
        };

        if let Some(lead) = &lead {
            AnalyticsService::record_quietly(
                db,
                product.user_id,
                AnalyticsEventType::LeadCaptured,
                json!({
                    "productId": product.id,
                    "leadId": lead.id,
                    "source": LEAD_SOURCE,
                }),
            )
                .await;
        }

        Ok(response)
    }

    async fn send_lead_email(
        db: &DatabaseConnection,
        mailer: &dyn MailClient,
        product: &products::Model,
        email: &str,
        name: Option<&str>,
        download_url: Option<&str>,
    ) {
        let host = users::Entity::find_by_id(product.user_id).one(db).await.ok().flatten();
        let host_name = host
            .as_ref()
            .map(|h| h.display_name())
            .unwrap_or_else(|| "Host".to_string());

        let description = product
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .or(product.subtitle.as_deref())
            .unwrap_or_default();
        let fallback_file_name = format!("{}.pdf", product.title);

        let (subject, html) = templates::lead_magnet(&LeadMagnetEmail {
            recipient_name: name.unwrap_or("Friend"),
            product_title: &product.title,
            product_description: description,
            download_url,
            file_name: Some(product.file_name.as_deref().unwrap_or(&fallback_file_name)),
            host_name: &host_name,
        });

        match mailer.send(EmailMessage::html(email, subject, html)).await {
            Ok(()) => tracing::info!(product_id = %product.id, "Lead magnet email sent"),
            Err(e) => tracing::error!(product_id = %product.id, "Failed to send lead magnet email: {}", e),
        }
    }

    /// Vérifie le lien et renvoie l'URL signée vers le fichier
    pub async fn redeem_download(
        db: &DatabaseConnection,
        storage: &dyn ObjectStorage,
        config: &Config,
        product_id: &str,
        email: Option<&str>,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let (email, token) = match (email.map(str::trim), token.map(str::trim)) {
            (Some(email), Some(token)) if !email.is_empty() && !token.is_empty() => (email, token),
            _ => return Err(AppError::validation("Email and token are required")),
        };

        let product = Self::find_lead_magnet(db, product_id).await?;

        let invalid = || AppError::Forbidden("Invalid download link or email not found".to_string());
        let lead_id = Uuid::parse_str(token).map_err(|_| invalid())?;
        let lead = leads::Entity::find()
            .filter(leads::Column::Id.eq(lead_id))
            .filter(leads::Column::ProductId.eq(product.id))
            .filter(leads::Column::CustomerEmail.eq(email))
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to verify download link", e))?
            .ok_or_else(invalid)?;

        if lead_link_expired(lead.created_at, now) {
            return Err(AppError::Expired(
                "Download link has expired. Please request a new one.".to_string(),
            ));
        }

        let bucket = &config.products_bucket;
        let path = product
            .file_path
            .clone()
            .filter(|p| !p.is_empty())
            .or_else(|| {
                product
                    .file_url
                    .as_deref()
                    .and_then(|url| path_from_public_url(url, bucket))
            })
            .ok_or_else(|| AppError::not_found("No file available for download"))?;

        let signed = storage
            .signed_url(bucket, &path, SIGNED_URL_SECONDS)
            .await
            .map_err(|e| {
                tracing::error!("Error creating signed URL: {}", e);
                AppError::Internal("Failed to generate download link".to_string())
            })?;

        AnalyticsService::record_quietly(
            db,
            product.user_id,
            AnalyticsEventType::FileDownload,
            json!({
                "productId": product.id,
                "leadId": lead.id,
                "downloadedAt": now.to_rfc3339(),
            }),
        )
            .await;

        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analytics;
    use crate::test_support::{FakeMailer, FakeStorage, insert_product, insert_user, test_db};

    fn submission(product_id: Uuid, form: Value) -> LeadSubmission {
        LeadSubmission {
            product_id: product_id.to_string(),
            form_data: form.as_object().cloned().unwrap_or_default(),
        }
    }

    fn lead_fields() -> Value {
        json!([
            {"id": "1", "type": "name", "label": "Name", "required": true},
            {"id": "2", "type": "email", "label": "Email", "required": true},
            {"id": "3", "type": "phone", "label": "Phone Number", "required": false}
        ])
    }

    #[tokio::test]
    async fn redirect_delivery_returns_url_and_stores_lead() {
        let db = test_db().await;
        let host = insert_user(&db, "jane").await;
        let product = insert_product(&db, host.id, ProductType::FreeLead, |p| {
            p.delivery_type = Set(DeliveryType::Redirect);
            p.redirect_url = Set(Some("https://x.com/thanks".to_string()));
            p.form_fields = Set(Some(lead_fields()));
        })
            .await;
        let mailer = FakeMailer::default();

        let response = LeadService::submit_lead(
            &db,
            &mailer,
            &Config::for_tests(),
            submission(product.id, json!({"1": "Jane", "2": "jane@x.com"})),
            ClientInfo::default(),
        )
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.message, "redirect");
        assert_eq!(response.redirect_url.as_deref(), Some("https://x.com/thanks"));
        assert!(mailer.sent().is_empty());

        let stored = leads::Entity::find().all(&db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].customer_email, "jane@x.com");
        assert_eq!(stored[0].customer_name.as_deref(), Some("Jane"));
        assert_eq!(Some(stored[0].id), response.lead_id);
        assert_eq!(stored[0].source, "public_page");

        let events = analytics::Entity::find().all(&db).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, AnalyticsEventType::LeadCaptured);
    }

    #[tokio::test]
    async fn upload_delivery_emails_download_link() {
        let db = test_db().await;
        let host = insert_user(&db, "jane").await;
        let product = insert_product(&db, host.id, ProductType::FreeLead, |p| {
            p.title = Set("Checklist".to_string());
            p.file_path = Set(Some(format!("{}/lead-magnets/1-a.pdf", host.id)));
        })
            .await;
        let mailer = FakeMailer::default();

        let response = LeadService::submit_lead(
            &db,
            &mailer,
            &Config::for_tests(),
            submission(product.id, json!({"email": "sam+1@x.com", "name": "Sam"})),
            ClientInfo::default(),
        )
            .await
            .unwrap();

        assert_eq!(response.message, "Thank you! Check your email for your download.");
        let lead_id = response.lead_id.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "sam+1@x.com");
        assert_eq!(sent[0].subject, "🎉 Your Free Download: Checklist");
        let body = sent[0].body_html.clone().unwrap();
        assert!(body.contains(&format!(
            "https://app.test/api/download/{}?email=sam%2B1%40x.com&amp;token={}",
            product.id, lead_id
        )));
    }

    #[tokio::test]
    async fn missing_email_is_rejected_before_storing() {
        let db = test_db().await;
        let host = insert_user(&db, "jane").await;
        let product = insert_product(&db, host.id, ProductType::FreeLead, |_| {}).await;

        let err = LeadService::submit_lead(
            &db,
            &FakeMailer::default(),
            &Config::for_tests(),
            submission(product.id, json!({"1": "Jane", "2": ""})),
            ClientInfo::default(),
        )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Email is required");
        assert_eq!(leads::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn required_fields_use_their_label() {
        let db = test_db().await;
        let host = insert_user(&db, "jane").await;
        let product = insert_product(&db, host.id, ProductType::FreeLead, |p| {
            p.form_fields = Set(Some(json!([
                {"id": "1", "type": "name", "label": "Your name", "required": true},
                {"id": "2", "type": "email", "label": "Email", "required": true}
            ])));
        })
            .await;

        let err = LeadService::submit_lead(
            &db,
            &FakeMailer::default(),
            &Config::for_tests(),
            submission(product.id, json!({"2": "jane@x.com"})),
            ClientInfo::default(),
        )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Your name is required");
    }

    #[tokio::test]
    async fn unknown_or_inactive_product_is_not_found() {
        let db = test_db().await;
        let host = insert_user(&db, "jane").await;
        let draft = insert_product(&db, host.id, ProductType::FreeLead, |p| {
            p.is_active = Set(false);
            p.is_draft = Set(true);
        })
            .await;
        let ebook = insert_product(&db, host.id, ProductType::Ebook, |_| {}).await;

        for product_id in [draft.id.to_string(), ebook.id.to_string(), "nope".to_string()] {
            let result = LeadService::submit_lead(
                &db,
                &FakeMailer::default(),
                &Config::for_tests(),
                LeadSubmission {
                    product_id,
                    form_data: json!({"2": "a@b.c"}).as_object().cloned().unwrap(),
                },
                ClientInfo::default(),
            )
                .await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }
    }

    async fn stored_lead(db: &DatabaseConnection) -> (products::Model, leads::Model) {
        let host = insert_user(db, "jane").await;
        let product = insert_product(db, host.id, ProductType::FreeLead, |p| {
            p.file_url = Set(Some(format!(
                "https://storage.test/storage/v1/object/public/products/{}/guide.pdf",
                host.id
            )));
        })
            .await;
        let response = LeadService::submit_lead(
            db,
            &FakeMailer::default(),
            &Config::for_tests(),
            submission(product.id, json!({"1": "Jane", "2": "jane@x.com"})),
            ClientInfo::default(),
        )
            .await
            .unwrap();
        let lead = leads::Entity::find_by_id(response.lead_id.unwrap())
            .one(db)
            .await
            .unwrap()
            .unwrap();
        (product, lead)
    }

    #[tokio::test]
    async fn download_link_is_valid_for_24_hours() {
        let db = test_db().await;
        let (product, lead) = stored_lead(&db).await;
        let storage = FakeStorage::default();
        let config = Config::for_tests();
        let product_id = product.id.to_string();
        let token = lead.id.to_string();
        let redeem = |now| {
            LeadService::redeem_download(
                &db,
                &storage,
                &config,
                &product_id,
                Some("jane@x.com"),
                Some(token.as_str()),
                now,
            )
        };

        let url = redeem(lead.created_at + Duration::hours(23) + Duration::minutes(59))
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("https://storage.test/signed/products/{}/guide.pdf?expires=3600", product.user_id)
        );

        let expired = redeem(lead.created_at + Duration::hours(24) + Duration::minutes(1)).await;
        assert!(matches!(expired, Err(AppError::Expired(_))));

        let downloads = analytics::Entity::find()
            .filter(analytics::Column::EventType.eq(AnalyticsEventType::FileDownload))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(downloads, 1);
    }

    #[tokio::test]
    async fn download_rejects_wrong_email_or_token() {
        let db = test_db().await;
        let (product, lead) = stored_lead(&db).await;
        let storage = FakeStorage::default();
        let config = Config::for_tests();
        let product_id = product.id.to_string();
        let token = lead.id.to_string();
        let now = lead.created_at;

        let missing = LeadService::redeem_download(&db, &storage, &config, &product_id, None, Some(&token), now).await;
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let wrong_email =
            LeadService::redeem_download(&db, &storage, &config, &product_id, Some("eve@x.com"), Some(&token), now).await;
        assert!(matches!(wrong_email, Err(AppError::Forbidden(_))));

        let wrong_token =
            LeadService::redeem_download(&db, &storage, &config, &product_id, Some("jane@x.com"), Some("abc"), now).await;
        assert!(matches!(wrong_token, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let created = Utc::now();
        assert!(!lead_link_expired(created, created + Duration::hours(24)));
        assert!(lead_link_expired(created, created + Duration::hours(24) + Duration::seconds(1)));
    }
}
