//! API client for communicating with the rent prediction server

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors returned by the API client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid API URL '{0}': {1}")]
    InvalidUrl(String, url::ParseError),

    #[error("Failed to reach server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{message}")]
    Api { status: StatusCode, message: String },
}

impl ClientError {
    /// True when the server rejected the submitted form
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::UNPROCESSABLE_ENTITY)
    }
}

/// API client for the rent prediction server
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(base_url.to_string(), e))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(path.to_string(), e))
    }

    /// Make a GET request, returning the JSON body whatever the status
    pub async fn get_with_status(
        &self,
        path: &str,
    ) -> Result<(StatusCode, serde_json::Value), ClientError> {
        let response = self.client.get(self.url(path)?).send().await?;
        let status = response.status();
        let body = response.json().await?;
        Ok((status, body))
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.client.post(self.url(path)?).json(body).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("API error ({}): {}", status, body));
            return Err(ClientError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}

// API response types

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub annual_rent: f64,
    pub currency: String,
    pub display: String,
    pub model_version: String,
}
