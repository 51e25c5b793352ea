// connexion BD

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::config::Config;
use crate::models::{analytics, leads, order_items, orders, products, social_links, users};

pub async fn establish_connection(config: &Config) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables manquantes à partir des entités (AUTO_MIGRATE + tests)
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Ordre: les tables référencées d'abord
    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, social_links::Entity).await?;
    create_table(db, &schema, products::Entity).await?;
    create_table(db, &schema, leads::Entity).await?;
    create_table(db, &schema, orders::Entity).await?;
    create_table(db, &schema, order_items::Entity).await?;
    create_table(db, &schema, analytics::Entity).await?;

    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(db.get_database_backend().build(&statement)).await?;
    Ok(())
}
