// ============================================================================
// PAYLOAD : colonne products.form_fields
// ============================================================================
//
// Description:
//   La colonne JSON `form_fields` change de forme selon le type de produit:
//     - FREE_LEAD : liste des champs collectés [{id, type, label, required}]
//     - DIGITAL   : {style, description, ctaButtonText, collectFields, ...}
//     - WEBINAR   : idem + {webinarDate, webinarTime, duration, timeZone, ...}
//     - autres    : pas de payload
//
//   ProductPayload en est la forme typée. Le JSON n'est pas versionné: toutes
//   les clés ont une valeur par défaut pour relire les anciennes lignes.
//
// Points d'attention:
//   - Certaines anciennes lignes stockent la liste FREE_LEAD sous forme de
//     chaîne JSON, décodée aussi
//   - `duration` / `maxAttendees` peuvent être des nombres ou des chaînes
//
// ============================================================================

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::products::ProductType;

pub const DEFAULT_WEBINAR_MINUTES: i64 = 60;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Invalid form fields: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Products of type {0:?} do not accept form fields")]
    Unexpected(ProductType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Name,
    Email,
    Phone,
    Text,
    Mcq,
    Dropdown,
}

impl FieldType {
    pub fn default_label(self) -> &'static str {
        match self {
            FieldType::Name => "Name",
            FieldType::Email => "Email",
            FieldType::Phone => "Phone Number",
            FieldType::Text => "Message",
            FieldType::Mcq => "Mcq",
            FieldType::Dropdown => "Dropdown",
        }
    }
}

/// Champ demandé au visiteur sur le formulaire public
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedField {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl CollectedField {
    /// Les deux champs présents sur tout formulaire neuf (nom "1", email "2")
    pub fn defaults() -> Vec<CollectedField> {
        vec![
            CollectedField {
                id: "1".to_string(),
                field_type: FieldType::Name,
                label: "Name".to_string(),
                required: true,
                options: Vec::new(),
            },
            CollectedField {
                id: "2".to_string(),
                field_type: FieldType::Email,
                label: "Email".to_string(),
                required: true,
                options: Vec::new(),
            },
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Button,
    Callout,
}

// "" est la valeur d'un style pas encore choisi
fn style_or_none<'de, D>(deserializer: D) -> Result<Option<DisplayStyle>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some("button") => Ok(Some(DisplayStyle::Button)),
        Some("callout") => Ok(Some(DisplayStyle::Callout)),
        Some(other) => Err(de::Error::unknown_variant(other, &["button", "callout"])),
    }
}

// Nombre ou chaîne, toujours relu en chaîne
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}

fn default_collect_fields() -> Vec<CollectedField> {
    CollectedField::defaults()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalProductDetails {
    #[serde(deserialize_with = "style_or_none")]
    pub style: Option<DisplayStyle>,
    pub description: String,
    pub cta_button_text: String,
    pub collect_fields: Vec<CollectedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_image_url: Option<String>,
}

impl Default for DigitalProductDetails {
    fn default() -> Self {
        DigitalProductDetails {
            style: None,
            description: String::new(),
            cta_button_text: "Purchase Now".to_string(),
            collect_fields: default_collect_fields(),
            checkout_image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebinarDetails {
    #[serde(deserialize_with = "style_or_none")]
    pub style: Option<DisplayStyle>,
    pub description: String,
    pub cta_button_text: String,
    pub collect_fields: Vec<CollectedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_image_url: Option<String>,

    /// YYYY-MM-DD
    pub webinar_date: String,
    /// HH:MM, heure locale dans `time_zone`
    pub webinar_time: String,
    #[serde(deserialize_with = "string_or_number")]
    pub duration: String,
    pub time_zone: String,
    #[serde(deserialize_with = "string_or_number")]
    pub max_attendees: String,
    pub meeting_platform: String,
}

impl Default for WebinarDetails {
    fn default() -> Self {
        WebinarDetails {
            style: None,
            description: String::new(),
            cta_button_text: "Register Now".to_string(),
            collect_fields: default_collect_fields(),
            registration_image_url: None,
            webinar_date: String::new(),
            webinar_time: String::new(),
            duration: DEFAULT_WEBINAR_MINUTES.to_string(),
            time_zone: "UTC".to_string(),
            max_attendees: "100".to_string(),
            meeting_platform: "zoom".to_string(),
        }
    }
}

/// Créneau absolu d'un webinar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebinarSchedule {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub time_zone: Tz,
}

impl WebinarDetails {
    pub fn duration_minutes(&self) -> i64 {
        match self.duration.trim().parse::<i64>() {
            Ok(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_WEBINAR_MINUTES,
        }
    }

    /// Fuseau IANA du webinar, UTC si inconnu
    pub fn tz(&self) -> Tz {
        self.time_zone.trim().parse::<Tz>().unwrap_or(Tz::UTC)
    }

    /// None si la date ou l'heure manquent ou sont illisibles
    pub fn schedule(&self) -> Option<WebinarSchedule> {
        let date = NaiveDate::parse_from_str(self.webinar_date.trim(), "%Y-%m-%d").ok()?;
        let time_str = self.webinar_time.trim();
        let time = NaiveTime::parse_from_str(time_str, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time_str, "%H:%M:%S"))
            .ok()?;

        let tz = self.tz();
        let local = date.and_time(time);
        // heure sautée au passage à l'heure d'été: on décale d'une heure
        let start = tz
            .from_local_datetime(&local)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())?
            .with_timezone(&Utc);

        Some(WebinarSchedule {
            start,
            end: start + Duration::minutes(self.duration_minutes()),
            time_zone: tz,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductPayload {
    LeadMagnet(Vec<CollectedField>),
    Digital(DigitalProductDetails),
    Webinar(WebinarDetails),
    None,
}

impl ProductPayload {
    /// Décode strictement (écriture): un JSON invalide est une erreur
    pub fn decode(product_type: ProductType, raw: Option<&Value>) -> Result<Self, PayloadError> {
        // Anciennes lignes: JSON stocké dans une chaîne
        let parsed;
        let raw = match raw {
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => {
                parsed = serde_json::from_str::<Value>(s)?;
                Some(&parsed)
            }
            Some(Value::Null) | None => None,
            Some(other) => Some(other),
        };

        match (product_type, raw) {
            (ProductType::FreeLead, None) => Ok(ProductPayload::LeadMagnet(Vec::new())),
            (ProductType::FreeLead, Some(v)) => {
                Ok(ProductPayload::LeadMagnet(Vec::<CollectedField>::deserialize(v)?))
            }
            (ProductType::Digital, None) => Ok(ProductPayload::Digital(DigitalProductDetails::default())),
            (ProductType::Digital, Some(v)) => {
                Ok(ProductPayload::Digital(DigitalProductDetails::deserialize(v)?))
            }
            (ProductType::Webinar, None) => Ok(ProductPayload::Webinar(WebinarDetails::default())),
            (ProductType::Webinar, Some(v)) => {
                Ok(ProductPayload::Webinar(WebinarDetails::deserialize(v)?))
            }
            (_, None) => Ok(ProductPayload::None),
            (other, Some(_)) => Err(PayloadError::Unexpected(other)),
        }
    }

    /// Décode en lecture: une ligne illisible retombe sur le payload vide
    pub fn decode_lenient(product_type: ProductType, raw: Option<&Value>) -> Self {
        match Self::decode(product_type, raw) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Unreadable form fields for {:?} product: {}", product_type, e);
                Self::decode(product_type, None).unwrap_or(ProductPayload::None)
            }
        }
    }

    pub fn encode(&self) -> Result<Option<Value>, PayloadError> {
        let value = match self {
            ProductPayload::LeadMagnet(fields) => serde_json::to_value(fields)?,
            ProductPayload::Digital(details) => serde_json::to_value(details)?,
            ProductPayload::Webinar(details) => serde_json::to_value(details)?,
            ProductPayload::None => return Ok(None),
        };
        Ok(Some(value))
    }

    pub fn collected_fields(&self) -> &[CollectedField] {
        match self {
            ProductPayload::LeadMagnet(fields) => fields,
            ProductPayload::Digital(details) => &details.collect_fields,
            ProductPayload::Webinar(details) => &details.collect_fields,
            ProductPayload::None => &[],
        }
    }

    pub fn webinar(&self) -> Option<&WebinarDetails> {
        match self {
            ProductPayload::Webinar(details) => Some(details),
            _ => None,
        }
    }
}
