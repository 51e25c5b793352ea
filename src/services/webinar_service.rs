// ============================================================================
// SERVICE : WEBINARS
// ============================================================================
//
// Description:
//   Orchestration Google Calendar + emails autour des webinars.
//
// Jetons Google:
//   Rafraîchis à la demande dès que l'expiration est <= maintenant, jamais en
//   tâche de fond. Deux refresh concurrents: le dernier écrit gagne.
//
// Opérations:
//   - create_event          : événement Calendar (+ lien Meet) pour l'hôte
//   - purchase_confirmation : participant + email + commande, succès partiel
//                             accepté
//   - send_reminders        : rappel aux acheteurs des webinars qui
//                             commencent dans [20h, 28h]
//
// ============================================================================

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::analytics::AnalyticsEventType;
use crate::models::order_items;
use crate::models::orders::{self, OrderStatus};
use crate::models::payload::{ProductPayload, WebinarDetails, string_or_number};
use crate::models::products::{self, ProductType};
use crate::models::users;
use crate::services::analytics_service::AnalyticsService;
use crate::services::calendar::{CalendarClient, CreatedEvent, EventRequest, token_needs_refresh};
use crate::services::draft_service::DraftService;
use crate::services::mail::templates::{self, PurchaseEmail, WebinarEmail};
use crate::services::mail::{EmailMessage, MailClient};
use crate::services::user_service::UserService;

const REMINDER_WINDOW_HOURS: (f64, f64) = (20.0, 28.0);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebinarEventData {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub webinar_date: String,
    pub webinar_time: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub duration: String,
    #[serde(default)]
    pub time_zone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub webinar_data: WebinarEventData,
    #[serde(default)]
    pub attendee_emails: Vec<String>,
    /// Produit WEBINAR sur lequel enregistrer l'événement créé
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseConfirmation {
    pub product_id: Uuid,
    #[validate(length(min = 1, message = "Buyer name is required"))]
    pub buyer_name: String,
    #[validate(email(message = "Invalid buyer email"))]
    pub buyer_email: String,
    #[serde(deserialize_with = "string_or_number")]
    pub amount: String,
    #[serde(default)]
    pub currency: String,
    pub payment_id: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub email_sent: bool,
    pub attendee_added: bool,
    pub order_created: bool,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummary {
    pub reminders_sent: u32,
    pub errors: u32,
    pub webinars_checked: u32,
}

pub struct WebinarService;

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

fn webinar_email<'a>(
    product: &'a products::Model,
    details: &'a WebinarDetails,
    host_name: &'a str,
    host_email: &'a str,
) -> WebinarEmail<'a> {
    WebinarEmail {
        title: &product.title,
        description: product.description.as_deref().unwrap_or_default(),
        date: &details.webinar_date,
        time: &details.webinar_time,
        time_zone: or_default(&details.time_zone, "UTC"),
        duration_minutes: details.duration_minutes(),
        meet_link: product.google_meet_link.as_deref(),
        calendar_link: product.google_calendar_link.as_deref(),
        host_name,
        host_email,
    }
}

fn host_name(host: &users::Model) -> String {
    host.full_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Host".to_string())
}

impl WebinarService {
    /// Jeton d'accès utilisable: rafraîchi et persisté s'il a expiré.
    /// Un échec de refresh demande une reconnexion.
    async fn access_token(
        db: &DatabaseConnection,
        calendar: &dyn CalendarClient,
        host: users::Model,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let (Some(access_token), Some(refresh_token)) =
            (host.google_access_token.clone(), host.google_refresh_token.clone())
        else {
            return Err(AppError::NeedsReauth(
                "Google Calendar not connected. Please connect your Google account first.".to_string(),
            ));
        };

        if !token_needs_refresh(host.google_token_expiry, now) {
            return Ok(access_token);
        }

        let tokens = calendar.refresh_token(&refresh_token).await.map_err(|e| {
            tracing::warn!(user_id = %host.id, "Google token refresh failed: {}", e);
            AppError::NeedsReauth(
                "Failed to refresh Google token. Please reconnect your Google account.".to_string(),
            )
        })?;

        let user_id = host.id;
        if let Err(e) = UserService::save_google_tokens(
            db,
            host,
            tokens.access_token.clone(),
            tokens.refresh_token,
            tokens.expires_at,
        )
            .await
        {
            tracing::warn!(user_id = %user_id, "Refreshed Google token not stored: {}", e);
        }
        Ok(tokens.access_token)
    }

    pub async fn create_event(
        db: &DatabaseConnection,
        calendar: &dyn CalendarClient,
        host: users::Model,
        request: CreateEventRequest,
        now: DateTime<Utc>,
    ) -> Result<CreatedEvent, AppError> {
        let product = match request.product_id {
            Some(product_id) => {
                let product = DraftService::find_owned(db, host.id, product_id).await?;
                if product.product_type != ProductType::Webinar {
                    return Err(AppError::not_found("Webinar not found"));
                }
                Some(product)
            }
            None => None,
        };

        let data = request.webinar_data;
        let details = WebinarDetails {
            webinar_date: data.webinar_date,
            webinar_time: data.webinar_time,
            duration: data.duration,
            time_zone: or_default(&data.time_zone, "UTC").to_string(),
            ..Default::default()
        };
        let schedule = details
            .schedule()
            .ok_or_else(|| AppError::validation("Invalid webinar date or time"))?;

        let access_token = Self::access_token(db, calendar, host, now).await?;

        let event = calendar
            .create_event(
                &access_token,
                &EventRequest {
                    title: data.title,
                    description: data.description,
                    start: schedule.start,
                    end: schedule.end,
                    time_zone: schedule.time_zone.name().to_string(),
                    attendee_emails: request.attendee_emails,
                },
            )
            .await?;

        if let Some(product) = product {
            let mut active: products::ActiveModel = product.into();
            active.google_event_id = Set(Some(event.id.clone()));
            active.google_meet_link = Set(event.meet_link.clone());
            active.google_calendar_link = Set(event.html_link.clone());
            active.updated_at = Set(Utc::now());
            active
                .update(db)
                .await
                .map_err(|e| AppError::persistence("Failed to store calendar event", e))?;
        }

        tracing::info!(event_id = %event.id, "Webinar calendar event created");
        Ok(event)
    }

    pub async fn purchase_confirmation(
        db: &DatabaseConnection,
        calendar: &dyn CalendarClient,
        mailer: &dyn MailClient,
        purchase: PurchaseConfirmation,
        now: DateTime<Utc>,
    ) -> Result<PurchaseOutcome, AppError> {
        purchase.validate()?;
        let amount = Decimal::from_str(purchase.amount.trim())
            .map_err(|_| AppError::validation("Invalid amount"))?;
        let currency = or_default(&purchase.currency, "USD").to_uppercase();

        let product = products::Entity::find()
            .filter(products::Column::Id.eq(purchase.product_id))
            .filter(products::Column::ProductType.eq(ProductType::Webinar))
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load webinar", e))?
            .ok_or_else(|| AppError::not_found("Webinar not found"))?;

        let host = UserService::find_by_id(db, product.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Host not found"))?;

        let payload = ProductPayload::decode_lenient(product.product_type, product.form_fields.as_ref());
        let details = payload.webinar().cloned().unwrap_or_default();
        let mut outcome = PurchaseOutcome::default();

        // participant à l'événement Calendar (best-effort)
        if let (true, Some(event_id)) = (host.has_google_credentials(), product.google_event_id.as_deref()) {
            let token = match Self::access_token(db, calendar, host.clone(), now).await {
                Ok(token) => token,
                // on tente quand même avec l'ancien jeton
                Err(_) => host.google_access_token.clone().unwrap_or_default(),
            };
            match calendar
                .add_attendee(&token, event_id, &purchase.buyer_email, Some(&purchase.buyer_name))
                .await
            {
                Ok(_) => outcome.attendee_added = true,
                Err(e) => tracing::error!(product_id = %product.id, "Failed to add attendee to calendar: {}", e),
            }
        }

        let name = host_name(&host);
        let purchase_date = now.format("%Y-%m-%d").to_string();
        let amount_text = amount.to_string();
        let (subject, html) = templates::webinar_confirmation(
            &webinar_email(&product, &details, &name, &host.email),
            &PurchaseEmail {
                buyer_name: &purchase.buyer_name,
                buyer_email: &purchase.buyer_email,
                purchase_date: &purchase_date,
                amount: &amount_text,
                currency: &currency,
            },
        );
        match mailer
            .send(EmailMessage::html(&purchase.buyer_email, subject, html).reply_to(&host.email))
            .await
        {
            Ok(()) => outcome.email_sent = true,
            Err(e) => tracing::error!(product_id = %product.id, "Failed to send confirmation email: {}", e),
        }

        match Self::record_order(db, &product, &purchase, amount, &currency).await {
            Ok(order) => {
                outcome.order_created = true;
                AnalyticsService::record_quietly(
                    db,
                    product.user_id,
                    AnalyticsEventType::Purchase,
                    json!({"productId": product.id, "orderId": order.id}),
                )
                    .await;
            }
            Err(e) => tracing::error!(product_id = %product.id, "Error creating order record: {}", e),
        }

        Ok(outcome)
    }

    async fn record_order(
        db: &DatabaseConnection,
        product: &products::Model,
        purchase: &PurchaseConfirmation,
        amount: Decimal,
        currency: &str,
    ) -> Result<orders::Model, DbErr> {
        let txn = db.begin().await?;
        let now = Utc::now();

        let order = orders::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(product.user_id),
            customer_email: Set(purchase.buyer_email.clone()),
            customer_name: Set(Some(purchase.buyer_name.clone())),
            total_amount: Set(amount),
            currency: Set(currency.to_string()),
            status: Set(OrderStatus::Completed),
            external_payment_id: Set(purchase.payment_id.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(&txn)
            .await?;

        order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(1),
            price: Set(amount),
        }
            .insert(&txn)
            .await?;

        txn.commit().await?;
        Ok(order)
    }

    /// Acheteurs (commandes COMPLETED) d'un produit
    async fn completed_orders_for(db: &DatabaseConnection, product_id: Uuid) -> Result<Vec<orders::Model>, DbErr> {
        let order_ids: Vec<Uuid> = order_items::Entity::find()
            .filter(order_items::Column::ProductId.eq(product_id))
            .all(db)
            .await?
            .into_iter()
            .map(|item| item.order_id)
            .collect();

        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        orders::Entity::find()
            .filter(orders::Column::Id.is_in(order_ids))
            .filter(orders::Column::Status.eq(OrderStatus::Completed))
            .all(db)
            .await
    }

    pub async fn send_reminders(
        db: &DatabaseConnection,
        mailer: &dyn MailClient,
        now: DateTime<Utc>,
    ) -> Result<ReminderSummary, AppError> {
        let webinars = products::Entity::find()
            .filter(products::Column::ProductType.eq(ProductType::Webinar))
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::GoogleEventId.is_not_null())
            .all(db)
            .await
            .map_err(|e| AppError::persistence("Failed to fetch webinars", e))?;

        let mut summary = ReminderSummary {
            webinars_checked: webinars.len() as u32,
            ..Default::default()
        };

        for webinar in &webinars {
            let details = match ProductPayload::decode(webinar.product_type, webinar.form_fields.as_ref()) {
                Ok(ProductPayload::Webinar(details)) => details,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(product_id = %webinar.id, "Unreadable webinar details: {}", e);
                    continue;
                }
            };
            let Some(schedule) = details.schedule() else {
                tracing::info!(product_id = %webinar.id, "Skipping webinar without date/time");
                continue;
            };

            let hours_until = (schedule.start - now).num_seconds() as f64 / 3600.0;
            if hours_until < REMINDER_WINDOW_HOURS.0 || hours_until > REMINDER_WINDOW_HOURS.1 {
                continue;
            }

            let buyers = match Self::completed_orders_for(db, webinar.id).await {
                Ok(orders) => orders,
                Err(e) => {
                    tracing::error!(product_id = %webinar.id, "Error fetching orders: {}", e);
                    summary.errors += 1;
                    continue;
                }
            };
            let host = UserService::find_by_id(db, webinar.user_id).await.ok().flatten();
            let name = host.as_ref().map(host_name).unwrap_or_else(|| "Host".to_string());
            let host_email = host.as_ref().map(|h| h.email.clone()).unwrap_or_default();

            for order in buyers {
                let buyer_name = order.customer_name.clone().unwrap_or_else(|| "Customer".to_string());
                let purchase_date = order.created_at.format("%Y-%m-%d").to_string();
                let (subject, html) = templates::webinar_reminder(
                    &webinar_email(webinar, &details, &name, &host_email),
                    &PurchaseEmail {
                        buyer_name: &buyer_name,
                        buyer_email: &order.customer_email,
                        purchase_date: &purchase_date,
                        amount: "0",
                        currency: "USD",
                    },
                );

                // chaque envoi est indépendant
                match mailer
                    .send(EmailMessage::html(&order.customer_email, subject, html).reply_to(&host_email))
                    .await
                {
                    Ok(()) => {
                        summary.reminders_sent += 1;
                        tracing::info!(product_id = %webinar.id, "Reminder sent to {}", order.customer_email);
                    }
                    Err(e) => {
                        summary.errors += 1;
                        tracing::error!(product_id = %webinar.id, "Failed to send reminder to {}: {}", order.customer_email, e);
                    }
                }
            }
        }

        Ok(summary)
    }
}
