// ============================================================================
// SERVICE : DRAFTS
// ============================================================================
//
// Description:
//   Persistance des brouillons produits créés par les assistants.
//
// Opérations (toutes filtrées sur (id, user_id)):
//   - save_draft     : insère is_draft = true, is_active = false
//   - update_draft   : met à jour, image/fichier selon Patch (absent = garder)
//   - finalize_draft : même fusion + is_draft = false, is_active = true, après
//                      contrôle de tous les gates de l'assistant
//   - load_draft     : projection DraftView
//
// Points d'attention:
//   - Id inconnu et produit d'un autre utilisateur donnent la même 404
//   - Dernière écriture gagnante en cas d'onglets concurrents
//
// ============================================================================

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::dto::{DraftInput, DraftView};
use crate::models::payload::ProductPayload;
use crate::models::products::{self, ProductType};
use crate::wizard;

const UNTITLED_DRAFT: &str = "Untitled Draft";
const DEFAULT_BUTTON_TEXT: &str = "Get Free Download";

pub struct DraftService;

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Prix saisi -> Decimal. Vide = 0, les lead magnets sont toujours gratuits.
pub fn parse_price(raw: Option<&str>, product_type: ProductType) -> Result<Decimal, AppError> {
    if product_type.is_lead_magnet() {
        return Ok(Decimal::ZERO);
    }
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let price = Decimal::from_str(raw)
        .map_err(|_| AppError::validation(format!("Invalid price: {}", raw)))?;
    if price.is_sign_negative() {
        return Err(AppError::validation("Price cannot be negative"));
    }
    Ok(price)
}

/// Applique une saisie d'assistant sur une ligne (en mémoire)
fn merge_input(
    product: &mut products::Model,
    input: DraftInput,
    fallback_title: &str,
) -> Result<(), AppError> {
    let product_type = product.product_type;

    let subtitle = non_blank(input.subtitle);
    product.title = non_blank(input.title).unwrap_or_else(|| fallback_title.to_string());
    product.description = Some(
        non_blank(input.description)
            .or_else(|| subtitle.clone())
            .unwrap_or_default(),
    );
    product.subtitle = subtitle;
    product.price = parse_price(input.price.as_deref(), product_type)?;
    product.button_text = Some(
        non_blank(input.button_text).unwrap_or_else(|| DEFAULT_BUTTON_TEXT.to_string()),
    );
    product.delivery_type = input.delivery_type.unwrap_or_default();
    product.redirect_url = non_blank(input.redirect_url);

    product.image_url = input.image_url.apply(product.image_url.take());
    product.image_path = input.image_path.apply(product.image_path.take());
    product.file_url = input.file_url.apply(product.file_url.take());
    product.file_path = input.file_path.apply(product.file_path.take());
    product.file_name = input.file_name.apply(product.file_name.take());

    // formFields absent: on garde le payload existant
    if input.form_fields.is_some() || product.form_fields.is_none() {
        let payload = ProductPayload::decode(product_type, input.form_fields.as_ref())
            .map_err(|e| AppError::Validation(e.to_string()))?;
        product.form_fields = payload
            .encode()
            .map_err(|e| AppError::Validation(e.to_string()))?;
    }

    if let Some(step) = input.current_step {
        product.current_step = step.max(1);
    }
    product.updated_at = Utc::now();
    Ok(())
}

/// Colonnes modifiables par un assistant
fn write_fields(active: &mut products::ActiveModel, product: &products::Model) {
    active.title = Set(product.title.clone());
    active.subtitle = Set(product.subtitle.clone());
    active.description = Set(product.description.clone());
    active.price = Set(product.price);
    active.image_url = Set(product.image_url.clone());
    active.image_path = Set(product.image_path.clone());
    active.file_url = Set(product.file_url.clone());
    active.file_path = Set(product.file_path.clone());
    active.file_name = Set(product.file_name.clone());
    active.delivery_type = Set(product.delivery_type);
    active.redirect_url = Set(product.redirect_url.clone());
    active.button_text = Set(product.button_text.clone());
    active.form_fields = Set(product.form_fields.clone());
    active.current_step = Set(product.current_step);
    active.is_draft = Set(product.is_draft);
    active.is_active = Set(product.is_active);
    active.updated_at = Set(product.updated_at);
}

impl DraftService {
    pub async fn find_owned(
        db: &DatabaseConnection,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<products::Model, AppError> {
        products::Entity::find()
            .filter(products::Column::Id.eq(product_id))
            .filter(products::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load product", e))?
            .ok_or_else(|| AppError::not_found("Product not found"))
    }

    pub async fn save_draft(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: DraftInput,
    ) -> Result<products::Model, AppError> {
        let now = Utc::now();
        let mut draft = products::Model {
            id: Uuid::new_v4(),
            user_id,
            title: String::new(),
            subtitle: None,
            description: None,
            price: Decimal::ZERO,
            currency: "USD".to_string(),
            product_type: input.product_type.unwrap_or(ProductType::Digital),
            image_url: None,
            image_path: None,
            file_url: None,
            file_path: None,
            file_name: None,
            delivery_type: Default::default(),
            redirect_url: None,
            button_text: None,
            form_fields: None,
            current_step: 1,
            is_draft: true,
            is_active: false,
            google_event_id: None,
            google_meet_link: None,
            google_calendar_link: None,
            created_at: now,
            updated_at: now,
        };
        merge_input(&mut draft, input, UNTITLED_DRAFT)?;

        let mut active = products::ActiveModel {
            id: Set(draft.id),
            user_id: Set(draft.user_id),
            currency: Set(draft.currency.clone()),
            product_type: Set(draft.product_type),
            google_event_id: Set(None),
            google_meet_link: Set(None),
            google_calendar_link: Set(None),
            created_at: Set(draft.created_at),
            ..Default::default()
        };
        write_fields(&mut active, &draft);

        let saved = active
            .insert(db)
            .await
            .map_err(|e| AppError::persistence("Failed to save draft", e))?;

        tracing::info!(product_id = %saved.id, product_type = ?saved.product_type, "Draft saved");
        Ok(saved)
    }

    pub async fn update_draft(
        db: &DatabaseConnection,
        user_id: Uuid,
        product_id: Uuid,
        input: DraftInput,
    ) -> Result<products::Model, AppError> {
        let existing = Self::find_owned(db, user_id, product_id).await?;

        let mut merged = existing.clone();
        merge_input(&mut merged, input, UNTITLED_DRAFT)?;

        let mut active: products::ActiveModel = existing.into();
        write_fields(&mut active, &merged);
        active
            .update(db)
            .await
            .map_err(|e| AppError::persistence("Failed to update draft", e))
    }

    /// Seule transition brouillon -> publié
    pub async fn finalize_draft(
        db: &DatabaseConnection,
        user_id: Uuid,
        product_id: Uuid,
        input: DraftInput,
    ) -> Result<products::Model, AppError> {
        let existing = Self::find_owned(db, user_id, product_id).await?;

        let mut merged = existing.clone();
        merge_input(&mut merged, input, existing.product_type.untitled_label())?;
        merged.is_draft = false;
        merged.is_active = true;

        wizard::check_publishable(&merged).map_err(AppError::Validation)?;

        let mut active: products::ActiveModel = existing.into();
        write_fields(&mut active, &merged);
        let published = active
            .update(db)
            .await
            .map_err(|e| AppError::persistence("Failed to finalize draft", e))?;

        tracing::info!(product_id = %published.id, "Draft published");
        Ok(published)
    }

    pub async fn load_draft(
        db: &DatabaseConnection,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<DraftView, AppError> {
        Self::find_owned(db, user_id, product_id).await.map(DraftView::from)
    }
}
