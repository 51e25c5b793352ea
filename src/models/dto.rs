// Objets échangés entre les wizards, les routes /api/drafts et DraftService
use rust_decimal::Decimal;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::products::{self, DeliveryType, ProductType};
use crate::utils::patch::Patch;

/// Corps de save-draft / update-draft / finalize-draft
///
/// Les champs image/fichier suivent la sémantique de `Patch`; les autres
/// champs absents prennent leur valeur par défaut.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftInput {
    /// Lu uniquement à la création, le type d'un produit ne change plus ensuite
    pub product_type: Option<ProductType>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "price_string")]
    pub price: Option<String>,
    pub button_text: Option<String>,
    pub delivery_type: Option<DeliveryType>,
    pub redirect_url: Option<String>,

    #[serde(default)]
    pub image_url: Patch<String>,
    #[serde(default)]
    pub image_path: Patch<String>,
    #[serde(default)]
    pub file_url: Patch<String>,
    #[serde(default)]
    pub file_path: Patch<String>,
    #[serde(default)]
    pub file_name: Patch<String>,

    pub form_fields: Option<Value>,
    pub current_step: Option<i32>,
}

// Le prix arrive tel que saisi: "19.99" ou 19.99
fn price_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("invalid price: {}", other))),
    }
}

/// Brouillon tel que rechargé par un wizard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftView {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub button_text: Option<String>,
    pub image_url: Option<String>,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub delivery_type: DeliveryType,
    pub redirect_url: Option<String>,
    pub form_fields: Option<Value>,
    pub current_step: i32,
    pub is_draft: bool,
}

impl From<products::Model> for DraftView {
    fn from(product: products::Model) -> Self {
        DraftView {
            id: product.id,
            product_type: product.product_type,
            title: product.title,
            subtitle: product.subtitle,
            description: product.description,
            price: product.price,
            button_text: product.button_text,
            image_url: product.image_url,
            file_url: product.file_url,
            file_name: product.file_name,
            delivery_type: product.delivery_type,
            redirect_url: product.redirect_url,
            form_fields: product.form_fields,
            current_step: product.current_step,
            is_draft: product.is_draft,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_input_reads_wizard_body() {
        let input: DraftInput = serde_json::from_str(
            r#"{
                "productType": "WEBINAR",
                "title": "Live Q&A",
                "price": 25,
                "deliveryType": "redirect",
                "imageUrl": "",
                "fileUrl": null,
                "currentStep": 2
            }"#,
        )
            .unwrap();

        assert_eq!(input.product_type, Some(ProductType::Webinar));
        assert_eq!(input.price.as_deref(), Some("25"));
        assert_eq!(input.delivery_type, Some(DeliveryType::Redirect));
        assert_eq!(input.image_url, Patch::Keep);
        assert_eq!(input.file_url, Patch::Clear);
        assert_eq!(input.file_name, Patch::Keep);
        assert_eq!(input.current_step, Some(2));
    }
}
