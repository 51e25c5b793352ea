use chrono::Utc;
use sea_orm::*;
use uuid::Uuid;

use crate::models::users;
use crate::utils::username::{UsernameCheck, validate_username_format};

const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

pub struct UsernameService;

impl UsernameService {
    /// Disponibilité (comparaison en minuscules). `exclude_user_id` permet à
    /// un utilisateur de garder son propre username.
    /// Une erreur BD est rapportée comme "indisponible", jamais propagée.
    pub async fn check_availability(
        db: &DatabaseConnection,
        username: &str,
        exclude_user_id: Option<Uuid>,
    ) -> UsernameCheck {
        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username.to_lowercase()))
            .one(db)
            .await;

        match existing {
            Ok(Some(user)) if Some(user.id) != exclude_user_id => {
                UsernameCheck::invalid("This username is already taken")
            }
            Ok(_) => UsernameCheck::valid(),
            Err(e) => {
                tracing::error!("Error checking username availability: {}", e);
                UsernameCheck::invalid("Unable to check username availability")
            }
        }
    }

    /// Format puis disponibilité, on s'arrête au premier échec
    pub async fn validate(
        db: &DatabaseConnection,
        username: &str,
        exclude_user_id: Option<Uuid>,
    ) -> UsernameCheck {
        let format = validate_username_format(username);
        if !format.is_valid {
            return format;
        }
        Self::check_availability(db, username, exclude_user_id).await
    }

    /// base, base1, base2, ... puis base{timestamp} après 1000 essais
    pub async fn generate_unique(db: &DatabaseConnection, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut counter = 1;

        loop {
            let usable = validate_username_format(&candidate).is_valid
                && Self::check_availability(db, &candidate, None).await.is_valid;
            if usable {
                return candidate;
            }
            if counter > MAX_SUFFIX_ATTEMPTS {
                return format!("{}{}", base, Utc::now().timestamp_millis());
            }
            candidate = format!("{}{}", base, counter);
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_user, test_db};

    #[tokio::test]
    async fn taken_username_is_case_insensitive() {
        let db = test_db().await;
        let jane = insert_user(&db, "jane").await;

        let result = UsernameService::check_availability(&db, "JANE", None).await;
        assert_eq!(result.error.as_deref(), Some("This username is already taken"));

        // son propriétaire peut le garder
        assert!(UsernameService::check_availability(&db, "jane", Some(jane.id)).await.is_valid);
    }

    #[tokio::test]
    async fn validate_short_circuits_on_format() {
        let db = test_db().await;
        let result = UsernameService::validate(&db, "ab", None).await;
        assert_eq!(result.error.as_deref(), Some("Username must be at least 3 characters long"));
        assert!(UsernameService::validate(&db, "fresh-name", None).await.is_valid);
    }

    #[tokio::test]
    async fn unique_username_appends_counter() {
        let db = test_db().await;
        insert_user(&db, "jane").await;
        insert_user(&db, "jane1").await;

        assert_eq!(UsernameService::generate_unique(&db, "jane").await, "jane2");
        assert_eq!(UsernameService::generate_unique(&db, "bob").await, "bob");
        // un mot réservé reçoit aussi un suffixe
        assert_eq!(UsernameService::generate_unique(&db, "admin").await, "admin1");
    }
}
