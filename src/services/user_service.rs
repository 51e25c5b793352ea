// ============================================================================
// SERVICE : USERS
// ============================================================================
//
// Description:
//   Provisionnement paresseux des utilisateurs, profil, liens sociaux et page
//   publique.
//
// Provisionnement (ensure_user):
//   1. Ligne existante pour le `sub` du JWT -> renvoyée telle quelle
//   2. Sinon username = metadata.username s'il a un format valide, sinon
//      dérivé de l'email, puis rendu unique (suffixe numérique)
//   3. Insertion; si une requête concurrente a gagné, on relit la ligne
//
// ============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::products::{self, DeliveryType, ProductType};
use crate::models::social_links::{self, SocialPlatform};
use crate::models::users;
use crate::services::username_service::UsernameService;
use crate::utils::patch::Patch;
use crate::utils::username::{generate_username_from_email, validate_username_format};

pub struct UserService;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Patch<String>,
    #[serde(default)]
    pub avatar_path: Patch<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub full_name: Option<String>,
    pub username: String,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublicSocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProduct {
    pub id: Uuid,
    pub title: String,
    pub subtitle: Option<String>,
    pub button_text: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub price: Decimal,
    pub form_fields: Option<Value>,
    pub delivery_type: DeliveryType,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPage {
    pub user: PublicProfile,
    pub social_links: Vec<PublicSocialLink>,
    pub products: Vec<PublicProduct>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleStatus {
    pub is_connected: bool,
    pub is_expired: bool,
    pub token_expiry: Option<DateTime<Utc>>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl UserService {
    pub async fn find_by_id(db: &DatabaseConnection, user_id: Uuid) -> Result<Option<users::Model>, AppError> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load user", e))
    }

    /// Renvoie la ligne de l'utilisateur authentifié, la crée si besoin
    pub async fn ensure_user(db: &DatabaseConnection, auth: &AuthUser) -> Result<users::Model, AppError> {
        if let Some(user) = Self::find_by_id(db, auth.user_id).await? {
            return Ok(user);
        }

        let base = match auth.metadata.username.as_deref() {
            Some(name) if validate_username_format(name).is_valid => name.to_lowercase(),
            _ => generate_username_from_email(&auth.email),
        };
        let username = UsernameService::generate_unique(db, &base).await;

        let now = Utc::now();
        let new_user = users::ActiveModel {
            id: Set(auth.user_id),
            email: Set(auth.email.clone()),
            username: Set(username),
            full_name: Set(non_blank(
                auth.metadata.full_name.clone().or_else(|| auth.metadata.name.clone()),
            )),
            bio: Set(None),
            avatar: Set(non_blank(auth.metadata.avatar_url.clone())),
            avatar_path: Set(None),
            google_access_token: Set(None),
            google_refresh_token: Set(None),
            google_token_expiry: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match new_user.insert(db).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User provisioned");
                Ok(user)
            }
            Err(e) => match Self::find_by_id(db, auth.user_id).await? {
                // une requête concurrente l'a créé entre-temps
                Some(user) => Ok(user),
                None => Err(AppError::persistence("Failed to create user", e)),
            },
        }
    }

    pub async fn update_profile(
        db: &DatabaseConnection,
        user: users::Model,
        update: ProfileUpdate,
    ) -> Result<users::Model, AppError> {
        let username = match non_blank(update.username) {
            Some(requested) => {
                let check = UsernameService::validate(db, &requested, Some(user.id)).await;
                if !check.is_valid {
                    return Err(AppError::Validation(
                        check.error.unwrap_or_else(|| "Invalid username".to_string()),
                    ));
                }
                requested.to_lowercase()
            }
            None => user.username.clone(),
        };

        let avatar = update.avatar.apply(user.avatar.clone());
        let avatar_path = update.avatar_path.apply(user.avatar_path.clone());

        let mut active: users::ActiveModel = user.into();
        active.full_name = Set(non_blank(update.full_name));
        active.username = Set(username);
        active.bio = Set(non_blank(update.bio));
        active.avatar = Set(avatar);
        active.avatar_path = Set(avatar_path);
        active.updated_at = Set(Utc::now());

        active
            .update(db)
            .await
            .map_err(|e| AppError::persistence("Failed to update profile", e))
    }

    pub async fn social_links(db: &DatabaseConnection, user_id: Uuid) -> Result<Vec<social_links::Model>, AppError> {
        social_links::Entity::find()
            .filter(social_links::Column::UserId.eq(user_id))
            .order_by_asc(social_links::Column::Position)
            .all(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load social links", e))
    }

    /// Remplace tous les liens: suppression puis recréation dans l'ordre
    /// fixe des plateformes, positions 1..n, URLs vides ignorées
    pub async fn replace_social_links(
        db: &DatabaseConnection,
        user_id: Uuid,
        urls: &HashMap<SocialPlatform, String>,
    ) -> Result<Vec<social_links::Model>, AppError> {
        let txn = db
            .begin()
            .await
            .map_err(|e| AppError::persistence("Failed to update social links", e))?;

        social_links::Entity::delete_many()
            .filter(social_links::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::persistence("Failed to update social links", e))?;

        let mut position = 1;
        for platform in SocialPlatform::iter() {
            let Some(url) = urls.get(&platform).map(|u| u.trim()).filter(|u| !u.is_empty()) else {
                continue;
            };
            social_links::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                platform: Set(platform),
                url: Set(url.to_string()),
                position: Set(position),
            }
                .insert(&txn)
                .await
                .map_err(|e| AppError::persistence("Failed to update social links", e))?;
            position += 1;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::persistence("Failed to update social links", e))?;

        Self::social_links(db, user_id).await
    }

    /// Profil, liens et produits publiés d'un créateur (404 si inconnu)
    pub async fn public_page(db: &DatabaseConnection, username: &str) -> Result<PublicPage, AppError> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username.to_lowercase()))
            .one(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load page", e))?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let links = Self::social_links(db, user.id).await?;

        let published = products::Entity::find()
            .filter(products::Column::UserId.eq(user.id))
            .filter(products::Column::IsActive.eq(true))
            .filter(products::Column::IsDraft.eq(false))
            .order_by_desc(products::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| AppError::persistence("Failed to load page", e))?;

        Ok(PublicPage {
            user: PublicProfile {
                full_name: user.full_name,
                username: user.username,
                bio: user.bio,
                avatar: user.avatar,
            },
            social_links: links
                .into_iter()
                .map(|l| PublicSocialLink { platform: l.platform, url: l.url })
                .collect(),
            products: published
                .into_iter()
                .map(|p| PublicProduct {
                    id: p.id,
                    title: p.title,
                    subtitle: p.subtitle,
                    button_text: p.button_text,
                    image_url: p.image_url,
                    product_type: p.product_type,
                    price: p.price,
                    form_fields: p.form_fields,
                    delivery_type: p.delivery_type,
                    redirect_url: p.redirect_url,
                })
                .collect(),
        })
    }

    // ------------------------------------------------------------------------
    // Jetons Google Calendar
    // ------------------------------------------------------------------------

    pub fn google_status(user: &users::Model, now: DateTime<Utc>) -> GoogleStatus {
        GoogleStatus {
            is_connected: user.has_google_credentials(),
            is_expired: user.google_token_expiry.is_some_and(|expiry| expiry <= now),
            token_expiry: user.google_token_expiry,
        }
    }

    /// `refresh_token` absent (cas d'un refresh): on garde celui stocké
    pub async fn save_google_tokens(
        db: &DatabaseConnection,
        user: users::Model,
        access_token: String,
        refresh_token: Option<String>,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<users::Model, AppError> {
        let refresh_token = refresh_token.or_else(|| user.google_refresh_token.clone());

        let mut active: users::ActiveModel = user.into();
        active.google_access_token = Set(Some(access_token));
        active.google_refresh_token = Set(refresh_token);
        active.google_token_expiry = Set(expiry);
        active.updated_at = Set(Utc::now());

        active
            .update(db)
            .await
            .map_err(|e| AppError::persistence("Failed to store Google tokens", e))
    }

    pub async fn clear_google_tokens(db: &DatabaseConnection, user: users::Model) -> Result<users::Model, AppError> {
        let mut active: users::ActiveModel = user.into();
        active.google_access_token = Set(None);
        active.google_refresh_token = Set(None);
        active.google_token_expiry = Set(None);
        active.updated_at = Set(Utc::now());

        active
            .update(db)
            .await
            .map_err(|e| AppError::persistence("Failed to disconnect Google account", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_product, insert_user, test_db};
    use crate::utils::jwt::UserMetadata;
    use chrono::Duration;

    fn auth(email: &str, username: Option<&str>) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            metadata: UserMetadata {
                username: username.map(str::to_string),
                name: Some("Jane Doe".to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn ensure_user_creates_once() {
        let db = test_db().await;
        let auth = auth("jane.doe@mail.com", None);

        let created = UserService::ensure_user(&db, &auth).await.unwrap();
        assert_eq!(created.id, auth.user_id);
        assert_eq!(created.username, "janedoe");
        assert_eq!(created.full_name.as_deref(), Some("Jane Doe"));

        let again = UserService::ensure_user(&db, &auth).await.unwrap();
        assert_eq!(again.username, created.username);
        assert_eq!(users::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_user_prefers_valid_metadata_username() {
        let db = test_db().await;
        insert_user(&db, "creator").await;

        let user = UserService::ensure_user(&db, &auth("x@mail.com", Some("Creator"))).await.unwrap();
        assert_eq!(user.username, "creator1");

        let fallback = UserService::ensure_user(&db, &auth("sam@mail.com", Some("__bad"))).await.unwrap();
        assert_eq!(fallback.username, "sam");
    }

    #[tokio::test]
    async fn profile_update_keeps_avatar_and_validates_username() {
        let db = test_db().await;
        insert_user(&db, "taken").await;
        let mut user = insert_user(&db, "jane").await;
        user = UserService::update_profile(
            &db,
            user,
            ProfileUpdate {
                avatar: Patch::set("https://img/a.png"),
                ..Default::default()
            },
        )
            .await
            .unwrap();

        let err = UserService::update_profile(
            &db,
            user.clone(),
            ProfileUpdate {
                username: Some("Taken".to_string()),
                ..Default::default()
            },
        )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "This username is already taken");

        let updated = UserService::update_profile(
            &db,
            user,
            ProfileUpdate {
                username: Some("Jane-Doe".to_string()),
                full_name: Some("".to_string()),
                ..Default::default()
            },
        )
            .await
            .unwrap();
        assert_eq!(updated.username, "jane-doe");
        assert_eq!(updated.full_name, None);
        assert_eq!(updated.avatar.as_deref(), Some("https://img/a.png"));
    }

    #[tokio::test]
    async fn social_links_follow_platform_order() {
        let db = test_db().await;
        let user = insert_user(&db, "jane").await;

        let mut urls = HashMap::new();
        urls.insert(SocialPlatform::Twitch, " https://twitch.tv/jane ".to_string());
        urls.insert(SocialPlatform::Instagram, "https://instagram.com/jane".to_string());
        urls.insert(SocialPlatform::Github, "   ".to_string());
        UserService::replace_social_links(&db, user.id, &urls).await.unwrap();

        // second remplacement: l'ancien jeu disparaît
        urls.insert(SocialPlatform::Youtube, "https://youtube.com/@jane".to_string());
        let links = UserService::replace_social_links(&db, user.id, &urls).await.unwrap();

        let summary: Vec<_> = links.iter().map(|l| (l.platform, l.position, l.url.as_str())).collect();
        assert_eq!(
            summary,
            vec![
                (SocialPlatform::Instagram, 1, "https://instagram.com/jane"),
                (SocialPlatform::Youtube, 2, "https://youtube.com/@jane"),
                (SocialPlatform::Twitch, 3, "https://twitch.tv/jane"),
            ]
        );
    }

    #[tokio::test]
    async fn public_page_hides_drafts() {
        let db = test_db().await;
        let user = insert_user(&db, "jane").await;
        insert_product(&db, user.id, ProductType::Ebook, |p| p.title = Set("Live".into())).await;
        insert_product(&db, user.id, ProductType::Ebook, |p| {
            p.title = Set("Draft".into());
            p.is_draft = Set(true);
            p.is_active = Set(false);
        })
            .await;

        let page = UserService::public_page(&db, "JANE").await.unwrap();
        assert_eq!(page.user.username, "jane");
        let titles: Vec<_> = page.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Live"]);

        assert!(matches!(
            UserService::public_page(&db, "nobody").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn google_tokens_lifecycle() {
        let db = test_db().await;
        let user = insert_user(&db, "jane").await;
        let now = Utc::now();

        let user = UserService::save_google_tokens(&db, user, "a1".into(), Some("r1".into()), Some(now - Duration::minutes(1)))
            .await
            .unwrap();
        let status = UserService::google_status(&user, now);
        assert!(status.is_connected);
        assert!(status.is_expired);

        // refresh sans nouveau refresh token
        let user = UserService::save_google_tokens(&db, user, "a2".into(), None, Some(now + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(user.google_refresh_token.as_deref(), Some("r1"));
        assert!(!UserService::google_status(&user, now).is_expired);

        let user = UserService::clear_google_tokens(&db, user).await.unwrap();
        assert!(!UserService::google_status(&user, now).is_connected);
    }
}
