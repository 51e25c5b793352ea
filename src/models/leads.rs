// ============================================================================
// MODÈLE : LEADS
// ============================================================================
//
// Description:
//   Contact capturé quand un visiteur soumet le formulaire d'un lead magnet
//   (FREE_LEAD).
//
// Workflow:
//   1. POST /api/leads/submit -> insertion d'un lead
//   2. Email avec lien /api/download/{productId}?email=...&token={lead.id}
//   3. GET /api/download/... vérifie (product_id, customer_email, id)
//   4. Lien valide tant que now - created_at <= 24h
//
// Points d'attention:
//   - L'id (UUID v4) sert de jeton porteur: très difficile à deviner
//   - ON DELETE CASCADE: si le produit est supprimé, ses leads aussi
//
// ============================================================================

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "leads")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,
    pub product_id: Uuid,

    pub customer_email: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,

    pub form_data: Json,

    pub ip_address: String,
    pub user_agent: String,
    pub source: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
