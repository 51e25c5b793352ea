use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsEventType {
    #[sea_orm(string_value = "PAGE_VIEW")]
    PageView,
    #[sea_orm(string_value = "PRODUCT_VIEW")]
    ProductView,
    #[sea_orm(string_value = "LINK_CLICK")]
    LinkClick,
    #[sea_orm(string_value = "FILE_DOWNLOAD")]
    FileDownload,
    #[sea_orm(string_value = "LEAD_CAPTURED")]
    LeadCaptured,
    #[sea_orm(string_value = "PURCHASE")]
    Purchase,
}

/// Journal d'événements en ajout seul
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "analytics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    #[sea_orm(column_name = "type")]
    pub event_type: AnalyticsEventType,
    pub metadata: Json,
    pub created_at: DateTimeUtc,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
