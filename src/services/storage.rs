// ============================================================================
// STOCKAGE D'OBJETS (Supabase Storage)
// ============================================================================
//
// Description:
//   Passerelle vers le stockage de fichiers: upload, suppression, URL publique
//   et URL signée (lien temporaire vers un objet privé).
//
// Chemins:
//   {userId}/[{folder}/]{timestampMs}-{random}.{ext}
//   Le premier segment est l'id du propriétaire: les policies du bucket s'en
//   servent pour limiter l'accès, et la suppression le vérifie.
//
// Points d'attention:
//   - Aucune relance: une erreur du backend remonte telle quelle
//   - Les uploads sont séquentiels (l'URL sert ensuite au formFields)
//
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::utils::files::file_extension;

pub const SIGNED_URL_SECONDS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File storage is not configured")]
    NotConfigured,

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Delete failed: {0}")]
    Delete(String),

    #[error("Failed to create signed URL: {0}")]
    Sign(String),

    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Renvoie le chemin stocké
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError>;
}

pub type DynObjectStorage = Arc<dyn ObjectStorage>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub url: String,
    pub path: String,
}

pub struct SupabaseStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

#[derive(Deserialize)]
struct SignResponse {
    #[serde(rename = "signedURL")]
    signed_url: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        SupabaseStorage {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.supabase_url, &config.supabase_service_key)
    }

    fn ensure_configured(&self) -> Result<(), StorageError> {
        if self.base_url.is_empty() || self.service_key.is_empty() {
            return Err(StorageError::NotConfigured);
        }
        Ok(())
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("{} {}", status, body)
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        self.ensure_configured()?;

        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(error_text(response).await));
        }
        Ok(path.to_string())
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.ensure_configured()?;

        let url = format!("{}/storage/v1/object/{}", self.base_url, bucket);
        let response = self
            .authorized(self.client.delete(url))
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Delete(error_text(response).await));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, StorageError> {
        self.ensure_configured()?;

        let url = format!("{}/storage/v1/object/sign/{}/{}", self.base_url, bucket, path);
        let response = self
            .authorized(self.client.post(url))
            .json(&serde_json::json!({ "expiresIn": expires_in_secs }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StorageError::Sign(error_text(response).await));
        }

        let signed: SignResponse = response.json().await?;
        Ok(format!("{}/storage/v1{}", self.base_url, signed.signed_url))
    }
}

pub fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// {userId}/[{folder}/]{timestampMs}-{suffix}.{ext}
pub fn build_object_path(
    user_id: Uuid,
    folder: Option<&str>,
    extension: &str,
    now: DateTime<Utc>,
    suffix: &str,
) -> String {
    let file_name = format!("{}-{}.{}", now.timestamp_millis(), suffix, extension);
    match folder.map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{}/{}/{}", user_id, folder, file_name),
        None => format!("{}/{}", user_id, file_name),
    }
}

/// Retrouve le chemin d'un objet à partir de son ancienne URL publique
pub fn path_from_public_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/storage/v1/object/public/{}/", bucket);
    let (_, rest) = url.split_once(&marker)?;
    let path = rest.split(['?', '#']).next().unwrap_or_default();
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Vrai si le premier segment du chemin est l'id de l'utilisateur
pub fn path_belongs_to(path: &str, user_id: Uuid) -> bool {
    path.split('/').next() == Some(user_id.to_string().as_str())
        && !path.split('/').any(|segment| segment == "..")
}

pub async fn upload_file(
    storage: &dyn ObjectStorage,
    bucket: &str,
    folder: Option<&str>,
    user_id: Uuid,
    file_name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<UploadResult, StorageError> {
    let extension = file_extension(file_name).unwrap_or("bin").to_lowercase();
    let path = build_object_path(user_id, folder, &extension, Utc::now(), &random_suffix());

    let stored = storage.upload(bucket, &path, content_type, bytes).await?;
    Ok(UploadResult {
        url: storage.public_url(bucket, &stored),
        path: stored,
    })
}

pub async fn delete_file(
    storage: &dyn ObjectStorage,
    bucket: &str,
    path: &str,
) -> Result<(), StorageError> {
    storage.delete(bucket, path).await
}
