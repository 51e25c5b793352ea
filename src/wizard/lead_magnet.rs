// Assistant lead magnet: image, texte, champs collectés, livraison
use std::fmt;

use crate::models::dto::DraftInput;
use crate::models::payload::ProductPayload;
use crate::models::products::{self, DeliveryType, ProductType};

use super::{FieldList, WizardFlow, filled, keep_or_set};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadMagnetStep {
    Image,
    Text,
    Fields,
    Delivery,
}

impl fmt::Display for LeadMagnetStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LeadMagnetStep::Image => "image",
            LeadMagnetStep::Text => "text",
            LeadMagnetStep::Fields => "collected fields",
            LeadMagnetStep::Delivery => "delivery",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadMagnetForm {
    pub image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub fields: FieldList,
    pub delivery_type: DeliveryType,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub redirect_url: String,
}

impl Default for LeadMagnetForm {
    fn default() -> Self {
        LeadMagnetForm {
            image_url: None,
            title: String::new(),
            subtitle: String::new(),
            button_text: "Get Free Download".to_string(),
            fields: FieldList::default(),
            delivery_type: DeliveryType::Upload,
            file_url: None,
            file_name: None,
            redirect_url: String::new(),
        }
    }
}

impl WizardFlow for LeadMagnetForm {
    type Step = LeadMagnetStep;

    const PRODUCT_TYPE: ProductType = ProductType::FreeLead;

    fn steps() -> &'static [LeadMagnetStep] {
        &[
            LeadMagnetStep::Image,
            LeadMagnetStep::Text,
            LeadMagnetStep::Fields,
            LeadMagnetStep::Delivery,
        ]
    }

    fn step_complete(&self, step: LeadMagnetStep) -> bool {
        match step {
            LeadMagnetStep::Image | LeadMagnetStep::Fields => true,
            LeadMagnetStep::Text => filled(&self.title),
            // sans fichier, le visiteur reçoit un simple email de remerciement
            LeadMagnetStep::Delivery => match self.delivery_type {
                DeliveryType::Redirect => filled(&self.redirect_url),
                DeliveryType::Upload => true,
            },
        }
    }

    fn draft_input(&self) -> DraftInput {
        DraftInput {
            title: Some(self.title.clone()),
            subtitle: Some(self.subtitle.clone()),
            button_text: Some(self.button_text.clone()),
            delivery_type: Some(self.delivery_type),
            redirect_url: Some(self.redirect_url.clone()),
            form_fields: serde_json::to_value(self.fields.fields()).ok(),
            image_url: keep_or_set(&self.image_url),
            file_url: keep_or_set(&self.file_url),
            file_name: keep_or_set(&self.file_name),
            ..Default::default()
        }
    }

    fn from_product(product: &products::Model) -> Self {
        let payload = ProductPayload::decode_lenient(product.product_type, product.form_fields.as_ref());
        let defaults = LeadMagnetForm::default();
        LeadMagnetForm {
            image_url: product.image_url.clone(),
            title: product.title.clone(),
            subtitle: product.subtitle.clone().unwrap_or_default(),
            button_text: product.button_text.clone().unwrap_or(defaults.button_text),
            fields: FieldList::from_fields(payload.collected_fields()),
            delivery_type: product.delivery_type,
            file_url: product.file_url.clone(),
            file_name: product.file_name.clone(),
            redirect_url: product.redirect_url.clone().unwrap_or_default(),
        }
    }
}
