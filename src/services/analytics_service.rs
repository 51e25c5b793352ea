use chrono::Utc;
use sea_orm::*;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::analytics::{self, AnalyticsEventType};

pub struct AnalyticsService;

impl AnalyticsService {
    /// Journal en ajout seul, aucune agrégation ici
    pub async fn record_event(
        db: &DatabaseConnection,
        user_id: Uuid,
        event_type: AnalyticsEventType,
        metadata: Value,
    ) -> Result<analytics::Model, AppError> {
        analytics::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            event_type: Set(event_type),
            metadata: Set(metadata),
            created_at: Set(Utc::now()),
        }
            .insert(db)
            .await
            .map_err(|e| AppError::persistence("Failed to record analytics event", e))
    }

    /// Variante best-effort: l'échec est journalisé, jamais remonté
    pub async fn record_quietly(
        db: &DatabaseConnection,
        user_id: Uuid,
        event_type: AnalyticsEventType,
        metadata: Value,
    ) {
        if let Err(e) = Self::record_event(db, user_id, event_type, metadata).await {
            tracing::warn!("Analytics event {:?} not recorded: {}", event_type, e);
        }
    }

    pub async fn events_for(
        db: &DatabaseConnection,
        user_id: Uuid,
        event_type: AnalyticsEventType,
    ) -> Result<Vec<analytics::Model>, AppError> {
        analytics::Entity::find()
            .filter(analytics::Column::UserId.eq(user_id))
            .filter(analytics::Column::EventType.eq(event_type))
            .order_by_asc(analytics::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load analytics", e))
    }
}
