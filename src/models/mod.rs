// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Description:
//   Point d'entrée pour tous les modèles de données.
//   Chaque entité correspond à une table PostgreSQL (SeaORM).
//
// Liste des modules:
//   - health : Health check API
//   - users : Créateurs (profil + jetons Google Calendar)
//   - social_links : Liens sociaux ordonnés d'un profil
//   - products : Produits (brouillons et publiés), polymorphes par type
//   - leads : Contacts capturés par les lead magnets
//   - orders / order_items : Achats confirmés
//   - analytics : Journal d'événements (ajout seul)
//   - payload : Forme typée de products.form_fields
//   - dto : Objets échangés avec les wizards
//
// Points d'attention:
//   - Clés primaires UUID v4, pas d'auto-incrément
//   - ON DELETE CASCADE depuis users et products
//
// ============================================================================

pub mod analytics;
pub mod dto;
pub mod health;
pub mod leads;
pub mod order_items;
pub mod orders;
pub mod payload;
pub mod products;
pub mod social_links;
pub mod users;
