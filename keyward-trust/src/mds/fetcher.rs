use reqwest::{
    header::{ACCEPT, AUTHORIZATION},
    Client,
};
use url::Url;

use crate::MetadataFetchError;

/// Pluggable transport for metadata documents.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the body behind `url`.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, MetadataFetchError>;
}

/// [`MetadataFetcher`] over HTTPS.
#[derive(Debug, Clone, Default)]
pub struct HttpMetadataFetcher {
    client: Client,
    bearer_token: Option<String>,
}

impl HttpMetadataFetcher {
    /// Fetch with `client`, optionally authenticating with a bearer token.
    pub fn new(client: Client, bearer_token: Option<String>) -> Self {
        Self {
            client,
            bearer_token,
        }
    }
}

#[async_trait::async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, MetadataFetchError> {
        let mut request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "application/jwt, application/json, text/plain");
        if let Some(token) = &self.bearer_token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| MetadataFetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataFetchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MetadataFetchError::Network(e.to_string()))?;
        Ok(body.to_vec())
    }
}
