// ============================================================================
// MODÈLE : USERS
// ============================================================================
//
// Description:
//   Créateur d'une page publique. L'identité est gérée par le fournisseur
//   d'auth: l'id est le `sub` de son JWT, la ligne est créée à la première
//   requête authentifiée (voir UserService::ensure_user).
//
// Points d'attention:
//   - username unique, stocké en minuscules
//   - tokens Google optionnels (OAuth Calendar), jamais sérialisés en JSON
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(unique)]
    pub username: String,

    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub avatar_path: Option<String>,

    #[serde(skip_serializing)]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_refresh_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_token_expiry: Option<DateTimeUtc>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Nom affiché dans les emails (nom complet, sinon username)
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.username.clone())
    }

    pub fn has_google_credentials(&self) -> bool {
        self.google_access_token.is_some() && self.google_refresh_token.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::products::Entity")]
    Products,

    #[sea_orm(has_many = "super::social_links::Entity")]
    SocialLinks,

    #[sea_orm(has_many = "super::leads::Entity")]
    Leads,

    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::social_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SocialLinks.def()
    }
}

impl Related<super::leads::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Leads.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
