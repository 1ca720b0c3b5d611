//! Shared HTTP client for Sarvam endpoints

use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use indic_commerce_config::SpeechConfig;

use crate::SpeechError;

const SUBSCRIPTION_HEADER: &str = "api-subscription-key";

/// Basic-auth credentials for downloading inbound media (Twilio)
#[derive(Debug, Clone)]
pub struct MediaAuth {
    pub username: String,
    pub password: Option<String>,
}

/// Sarvam API client
#[derive(Clone)]
pub struct SarvamClient {
    http: Client,
    endpoint: String,
    api_key: String,
    media_auth: Option<MediaAuth>,
}

impl SarvamClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SpeechError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SpeechError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            media_auth: None,
        })
    }

    /// Build from the `speech` settings section
    pub fn from_config(config: &SpeechConfig, timeout: Duration) -> Result<Self, SpeechError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            SpeechError::Configuration("speech.api_key (SARVAM_API_KEY) is not set".to_string())
        })?;

        let mut client = Self::new(&config.endpoint, api_key, timeout)?;
        if let Some(username) = &config.media_username {
            client = client.with_media_auth(MediaAuth {
                username: username.clone(),
                password: config.media_password.clone(),
            });
        }
        Ok(client)
    }

    pub fn with_media_auth(mut self, auth: MediaAuth) -> Self {
        self.media_auth = Some(auth);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    /// POST a JSON body and decode the JSON reply
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, SpeechError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// POST a multipart form and decode the JSON reply
    pub async fn post_multipart<R>(&self, path: &str, form: Form) -> Result<R, SpeechError>
    where
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(path))
            .header(SUBSCRIPTION_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::decode(response).await
    }

    /// Download inbound media, returning the bytes and the served content type
    pub async fn download(&self, url: &str) -> Result<(Vec<u8>, Option<String>), SpeechError> {
        let mut request = self.http.get(url);
        if let Some(auth) = &self.media_auth {
            request = request.basic_auth(&auth.username, auth.password.as_ref());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Failed to download audio");
            return Err(SpeechError::Api {
                status: status.as_u16(),
                body: body.chars().take(100).collect(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response.bytes().await?;

        tracing::debug!(
            size = bytes.len(),
            content_type = content_type.as_deref().unwrap_or(""),
            "Downloaded audio"
        );

        Ok((bytes.to_vec(), content_type))
    }

    async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, SpeechError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))
    }
}
