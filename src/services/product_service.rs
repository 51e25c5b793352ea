use chrono::Utc;
use sea_orm::*;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::products::{self, DeliveryType, ProductType};
use crate::services::draft_service::{DraftService, parse_price};

pub struct ProductService;

/// Création directe d'un produit publié (hors assistant)
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[validate(url(message = "Redirect URL must be a valid URL"))]
    pub redirect_url: Option<String>,
    pub button_text: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ProductService {
    /// Produits du créateur, brouillons compris, du plus récent au plus ancien
    pub async fn list_products(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<products::Model>, AppError> {
        products::Entity::find()
            .filter(products::Column::UserId.eq(user_id))
            .order_by_desc(products::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load products", e))
    }

    pub async fn create_product(
        db: &DatabaseConnection,
        user_id: Uuid,
        new_product: NewProduct,
    ) -> Result<products::Model, AppError> {
        new_product.validate()?;
        let title = new_product.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("Title is required"));
        }
        let price = parse_price(new_product.price.as_deref(), new_product.product_type)?;

        let now = Utc::now();
        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title),
            subtitle: Set(non_blank(new_product.subtitle)),
            description: Set(non_blank(new_product.description)),
            price: Set(price),
            currency: Set("USD".to_string()),
            product_type: Set(new_product.product_type),
            image_url: Set(non_blank(new_product.image_url)),
            image_path: Set(None),
            file_url: Set(non_blank(new_product.file_url)),
            file_path: Set(non_blank(new_product.file_path)),
            file_name: Set(non_blank(new_product.file_name)),
            delivery_type: Set(new_product.delivery_type),
            redirect_url: Set(non_blank(new_product.redirect_url)),
            button_text: Set(non_blank(new_product.button_text)),
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

        product
            .insert(db)
            .await
            .map_err(|e| AppError::persistence("Failed to create product", e))
    }

    /// Suppression définitive, 404 si absent ou appartenant à un autre
    pub async fn delete_product(db: &DatabaseConnection, user_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let product = DraftService::find_owned(db, user_id, product_id).await?;

        products::Entity::delete_by_id(product.id)
            .exec(db)
            .await
            .map_err(|e| AppError::persistence("Failed to delete product", e))?;

        tracing::info!(product_id = %product_id, "Product deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_product, insert_user, test_db};

    fn new_product(title: &str) -> NewProduct {
        serde_json::from_value(serde_json::json!({
            "title": title,
            "type": "EBOOK",
            "price": "0"
        }))
            .unwrap()
    }

    #[tokio::test]
    async fn create_and_list_newest_first() {
        let db = test_db().await;
        let user = insert_user(&db, "jane").await;

        let first = ProductService::create_product(&db, user.id, new_product("First")).await.unwrap();
        assert!(first.is_published());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = ProductService::create_product(&db, user.id, new_product("Second")).await.unwrap();

        let listed = ProductService::list_products(&db, user.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let db = test_db().await;
        let user = insert_user(&db, "jane").await;
        assert!(matches!(
            ProductService::create_product(&db, user.id, new_product("")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ProductService::create_product(&db, user.id, new_product("   ")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_owner_scoped() {
        let db = test_db().await;
        let owner = insert_user(&db, "jane").await;
        let other = insert_user(&db, "mallory").await;
        let product = insert_product(&db, owner.id, ProductType::Course, |_| {}).await;

        assert!(matches!(
            ProductService::delete_product(&db, other.id, product.id).await,
            Err(AppError::NotFound(_))
        ));
        ProductService::delete_product(&db, owner.id, product.id).await.unwrap();
        assert!(ProductService::list_products(&db, owner.id).await.unwrap().is_empty());
    }
}
