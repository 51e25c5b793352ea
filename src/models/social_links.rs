use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plateformes supportées, dans l'ordre d'affichage sur la page publique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    #[sea_orm(string_value = "instagram")]
    Instagram,
    #[sea_orm(string_value = "twitter")]
    Twitter,
    #[sea_orm(string_value = "tiktok")]
    Tiktok,
    #[sea_orm(string_value = "youtube")]
    Youtube,
    #[sea_orm(string_value = "linkedin")]
    Linkedin,
    #[sea_orm(string_value = "github")]
    Github,
    #[sea_orm(string_value = "facebook")]
    Facebook,
    #[sea_orm(string_value = "twitch")]
    Twitch,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "social_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: SocialPlatform,
    pub url: String,
    pub position: i32, // 1..n, ordre d'insertion
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
