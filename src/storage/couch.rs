use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::storage::{DocumentStore, FeedDocument};

/// CouchDB database reached over its HTTP API.
#[derive(Debug, Clone)]
pub struct CouchStore {
    client: Client,
    database_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl CouchStore {
    pub fn new(config: &StoreConfig, timeout: Duration) -> Result<Self> {
        url::Url::parse(&config.url).map_err(|_| Error::InvalidUrl(config.url.clone()))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            database_url: format!("{}/{}", config.url.trim_end_matches('/'), config.database),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

#[async_trait]
impl DocumentStore for CouchStore {
    async fn save(&self, document: &FeedDocument) -> Result<()> {
        let mut request = self.client.post(&self.database_url).json(document);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Request to {} failed: {}", self.database_url, e)))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::ACCEPTED => {
                debug!(id = %document.id, "Stored document");
                Ok(())
            }
            StatusCode::CONFLICT => Err(Error::AlreadyExists(format!(
                "Document {} already stored",
                document.id
            ))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Storage(format!(
                    "CouchDB returned HTTP {} for {}: {}",
                    status.as_u16(),
                    self.database_url,
                    body.trim()
                )))
            }
        }
    }
}
