// Assistant produit digital: fiche, page de paiement, livraison
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::dto::DraftInput;
use crate::models::payload::{DigitalProductDetails, ProductPayload};
use crate::models::products::{self, DeliveryType, ProductType};

use super::{FieldList, WizardFlow, filled, filled_opt, keep_or_set};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalStep {
    Listing,
    Checkout,
    Delivery,
}

impl fmt::Display for DigitalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DigitalStep::Listing => "product listing",
            DigitalStep::Checkout => "checkout page",
            DigitalStep::Delivery => "delivery",
        };
        write!(f, "{}", label)
    }
}

/// Prix saisi, non vide et >= 0
pub(crate) fn price_is_valid(raw: &str) -> bool {
    Decimal::from_str(raw.trim()).is_ok_and(|price| !price.is_sign_negative())
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DigitalProductForm {
    pub image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub price: String,
    pub button_text: String,
    pub details: DigitalProductDetails,
    pub fields: FieldList,
    pub delivery_type: DeliveryType,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub redirect_url: String,
}

impl WizardFlow for DigitalProductForm {
    type Step = DigitalStep;

    const PRODUCT_TYPE: ProductType = ProductType::Digital;

    fn steps() -> &'static [DigitalStep] {
        &[DigitalStep::Listing, DigitalStep::Checkout, DigitalStep::Delivery]
    }

    fn step_complete(&self, step: DigitalStep) -> bool {
        match step {
            DigitalStep::Listing => {
                self.details.style.is_some() && filled(&self.title) && price_is_valid(&self.price)
            }
            DigitalStep::Checkout => {
                filled(&self.details.description) && filled(&self.details.cta_button_text)
            }
            DigitalStep::Delivery => match self.delivery_type {
                DeliveryType::Upload => filled_opt(&self.file_url),
                DeliveryType::Redirect => filled(&self.redirect_url),
            },
        }
    }

    fn draft_input(&self) -> DraftInput {
        let details = DigitalProductDetails {
            collect_fields: self.fields.fields().to_vec(),
            ..self.details.clone()
        };
        let button_text = if filled(&self.button_text) {
            self.button_text.clone()
        } else {
            details.cta_button_text.clone()
        };

        DraftInput {
            title: Some(self.title.clone()),
            subtitle: Some(self.subtitle.clone()),
            price: Some(self.price.clone()),
            button_text: Some(button_text),
            delivery_type: Some(self.delivery_type),
            redirect_url: Some(self.redirect_url.clone()),
            form_fields: serde_json::to_value(&details).ok(),
            image_url: keep_or_set(&self.image_url),
            file_url: keep_or_set(&self.file_url),
            file_name: keep_or_set(&self.file_name),
            ..Default::default()
        }
    }

    fn from_product(product: &products::Model) -> Self {
        let details = match ProductPayload::decode_lenient(product.product_type, product.form_fields.as_ref()) {
            ProductPayload::Digital(details) => details,
            _ => DigitalProductDetails::default(),
        };
        DigitalProductForm {
            image_url: product.image_url.clone(),
            title: product.title.clone(),
            subtitle: product.subtitle.clone().unwrap_or_default(),
            price: product.price.to_string(),
            button_text: product.button_text.clone().unwrap_or_default(),
            fields: FieldList::from_fields(&details.collect_fields),
            details,
            delivery_type: product.delivery_type,
            file_url: product.file_url.clone(),
            file_name: product.file_name.clone(),
            redirect_url: product.redirect_url.clone().unwrap_or_default(),
        }
    }
}
