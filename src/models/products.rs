// ============================================================================
// MODÈLE : PRODUCTS
// ============================================================================
//
// Description:
//   Entité centrale, polymorphe selon `type`. La configuration propre au type
//   (champs collectés, planning du webinar, style...) est stockée dans la
//   colonne JSON `form_fields` et décodée via models::payload.
//
// Cycle de vie:
//   brouillon  : is_draft = true,  is_active = false (invisible publiquement)
//   publié     : is_draft = false, is_active = true
//   La finalisation (DraftService::finalize_draft) est la seule transition.
//
// Points d'attention:
//   - Toutes les requêtes propriétaire filtrent sur (id, user_id)
//   - price = 0 pour les lead magnets
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    #[sea_orm(string_value = "FREE_LEAD")]
    FreeLead,
    #[sea_orm(string_value = "DIGITAL")]
    Digital,
    #[sea_orm(string_value = "WEBINAR")]
    Webinar,
    #[sea_orm(string_value = "EBOOK")]
    Ebook,
    #[sea_orm(string_value = "COURSE")]
    Course,
    #[sea_orm(string_value = "TEMPLATE")]
    Template,
    #[sea_orm(string_value = "CONSULTATION")]
    Consultation,
    #[sea_orm(string_value = "SUBSCRIPTION")]
    Subscription,
    #[sea_orm(string_value = "PHYSICAL")]
    Physical,
    #[sea_orm(string_value = "COACHING")]
    Coaching,
}

impl ProductType {
    pub fn is_lead_magnet(self) -> bool {
        self == ProductType::FreeLead
    }

    /// Titre utilisé quand le créateur finalise sans titre
    pub fn untitled_label(self) -> &'static str {
        match self {
            ProductType::FreeLead => "Untitled Lead Magnet",
            ProductType::Webinar => "Untitled Webinar",
            _ => "Untitled Product",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryType {
    #[default]
    #[sea_orm(string_value = "upload")]
    Upload,
    #[sea_orm(string_value = "redirect")]
    Redirect,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,

    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,

    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub product_type: ProductType,

    pub image_url: Option<String>,
    pub image_path: Option<String>,
    pub file_url: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,

    pub delivery_type: DeliveryType,
    pub redirect_url: Option<String>,
    pub button_text: Option<String>,

    // JSON sans version: les lecteurs tolèrent les clés manquantes
    pub form_fields: Option<Json>,

    pub current_step: i32,
    pub is_draft: bool,
    pub is_active: bool,

    // Événement Google Calendar (webinars)
    pub google_event_id: Option<String>,
    pub google_meet_link: Option<String>,
    pub google_calendar_link: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    pub fn is_published(&self) -> bool {
        !self.is_draft && self.is_active
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(has_many = "super::leads::Entity")]
    Leads,

    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::leads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leads.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
