use crate::store::atomic_write;
use crate::sync::RemoteFolder;
use crate::utils::error::{Result, StoreError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

/// Drive-v3-style remote folder. All files live in one app folder, found or
/// created by name on first use; uploads upsert by file name within it.
pub struct DriveFolder {
    client: Client,
    base_url: String,
    token: String,
    folder_name: String,
    folder_id: Mutex<Option<String>>,
}

impl DriveFolder {
    pub fn new(base_url: &str, token: &str, folder_name: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            folder_name: folder_name.to_string(),
            folder_id: Mutex::new(None),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<FileRef>> {
        let url = format!("{}/files", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("q", query), ("fields", "files(id,name)")])
            .send()
            .await?
            .error_for_status()?;
        let list: FileList = response.json().await?;
        Ok(list.files)
    }

    /// Finds the app folder, creating it when absent. The resolved id is
    /// cached for the lifetime of the client.
    async fn ensure_folder(&self) -> Result<String> {
        if let Some(id) = self.folder_id.lock().expect("folder id lock").clone() {
            return Ok(id);
        }

        let query = format!(
            "name='{}' and mimeType='{}' and trashed=false",
            self.folder_name, FOLDER_MIME
        );
        let id = match self.search(&query).await?.into_iter().next() {
            Some(folder) => {
                tracing::debug!("found remote folder '{}' ({})", self.folder_name, folder.id);
                folder.id
            }
            None => {
                let url = format!("{}/files", self.base_url);
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&serde_json::json!({
                        "name": self.folder_name,
                        "mimeType": FOLDER_MIME,
                    }))
                    .send()
                    .await?
                    .error_for_status()?;
                let created: CreatedFile = response.json().await?;
                tracing::info!("created remote folder '{}' ({})", self.folder_name, created.id);
                created.id
            }
        };

        *self.folder_id.lock().expect("folder id lock") = Some(id.clone());
        Ok(id)
    }

    async fn find_file(&self, folder_id: &str, name: &str) -> Result<Option<FileRef>> {
        let query = format!("name='{name}' and '{folder_id}' in parents and trashed=false");
        Ok(self.search(&query).await?.into_iter().next())
    }

    async fn upload_content(&self, file_id: &str, data: Vec<u8>) -> Result<()> {
        let url = format!("{}/upload/files/{}", self.base_url, file_id);
        self.client
            .patch(&url)
            .bearer_auth(&self.token)
            .query(&[("uploadType", "media")])
            .body(data)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl RemoteFolder for DriveFolder {
    /// Upserts `name` in the app folder: existing remote files are updated
    /// in place, new ones created first and then filled.
    async fn upload(&self, name: &str, local_path: &Path) -> Result<()> {
        let folder_id = self.ensure_folder().await?;
        let data = std::fs::read(local_path)?;

        match self.find_file(&folder_id, name).await? {
            Some(existing) => {
                tracing::debug!("updating remote file '{}'", name);
                self.upload_content(&existing.id, data).await?;
            }
            None => {
                tracing::debug!("creating remote file '{}'", name);
                let url = format!("{}/files", self.base_url);
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(&self.token)
                    .json(&serde_json::json!({
                        "name": name,
                        "parents": [folder_id],
                    }))
                    .send()
                    .await?
                    .error_for_status()?;
                let created: CreatedFile = response.json().await?;
                self.upload_content(&created.id, data).await?;
            }
        }
        Ok(())
    }

    async fn download(&self, name: &str, local_path: &Path) -> Result<()> {
        let folder_id = self.ensure_folder().await?;
        let file = self.find_file(&folder_id, name).await?.ok_or_else(|| {
            StoreError::Remote {
                message: format!("remote file '{name}' not found"),
            }
        })?;

        let url = format!("{}/files/{}", self.base_url, file.id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("alt", "media")])
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        atomic_write(local_path, &bytes)?;
        tracing::debug!("downloaded '{}' to {}", name, local_path.display());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>> {
        let folder_id = self.ensure_folder().await?;
        let query = format!("'{folder_id}' in parents and trashed=false");
        Ok(self.search(&query).await?.into_iter().map(|f| f.name).collect())
    }
}
