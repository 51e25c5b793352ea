// Assistant webinar: fiche, page d'inscription, planning
use std::fmt;

use crate::models::dto::DraftInput;
use crate::models::payload::{ProductPayload, WebinarDetails};
use crate::models::products::{self, ProductType};

use super::digital_product::price_is_valid;
use super::{FieldList, WizardFlow, filled, keep_or_set};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebinarStep {
    Listing,
    Registration,
    Schedule,
}

impl fmt::Display for WebinarStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WebinarStep::Listing => "webinar listing",
            WebinarStep::Registration => "registration page",
            WebinarStep::Schedule => "schedule",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebinarForm {
    pub image_url: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub price: String,
    pub button_text: String,
    pub details: WebinarDetails,
    pub fields: FieldList,
}

impl Default for WebinarForm {
    fn default() -> Self {
        WebinarForm {
            image_url: None,
            title: String::new(),
            subtitle: String::new(),
            price: String::new(),
            button_text: "Register Now".to_string(),
            details: WebinarDetails::default(),
            fields: FieldList::default(),
        }
    }
}

impl WizardFlow for WebinarForm {
    type Step = WebinarStep;

    const PRODUCT_TYPE: ProductType = ProductType::Webinar;

    fn steps() -> &'static [WebinarStep] {
        &[WebinarStep::Listing, WebinarStep::Registration, WebinarStep::Schedule]
    }

    fn step_complete(&self, step: WebinarStep) -> bool {
        match step {
            WebinarStep::Listing => {
                self.details.style.is_some() && filled(&self.title) && price_is_valid(&self.price)
            }
            WebinarStep::Registration => {
                filled(&self.details.description) && filled(&self.details.cta_button_text)
            }
            // date et heure lisibles dans le fuseau du webinar
            WebinarStep::Schedule => self.details.schedule().is_some(),
        }
    }

    fn draft_input(&self) -> DraftInput {
        let details = WebinarDetails {
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
            form_fields: serde_json::to_value(&details).ok(),
            image_url: keep_or_set(&self.image_url),
            ..Default::default()
        }
    }

    fn from_product(product: &products::Model) -> Self {
        let details = match ProductPayload::decode_lenient(product.product_type, product.form_fields.as_ref()) {
            ProductPayload::Webinar(details) => details,
            _ => WebinarDetails::default(),
        };
        WebinarForm {
            image_url: product.image_url.clone(),
            title: product.title.clone(),
            subtitle: product.subtitle.clone().unwrap_or_default(),
            price: product.price.to_string(),
            button_text: product.button_text.clone().unwrap_or_default(),
            fields: FieldList::from_fields(&details.collect_fields),
            details,
        }
    }
}
