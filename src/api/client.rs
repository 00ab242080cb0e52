//! reqwest-based API client

use std::sync::Arc;
use std::time::Duration;

use reqwest::{multipart::Form, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::{config::ApiConfig, error::ApiError};

/// Shared slot for the session bearer token
///
/// The session context writes it; every request made by the client reads it.
#[derive(Clone, Default)]
pub struct BearerToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl BearerToken {
    pub async fn set(&self, token: Option<String>) {
        *self.inner.write().await = token;
    }

    pub async fn get(&self) -> Option<String> {
        self.inner.read().await.clone()
    }

    pub async fn is_set(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: BearerToken,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, token: BearerToken) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn token(&self) -> &BearerToken {
        &self.token
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!("{} {}", method, path);
        let builder = self.http.request(method, self.url(path));
        match self.token.get().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send the request; any non-2xx status becomes a normalized error
    async fn execute(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!("Could not read error body for status {}: {}", status, e);
                Default::default()
            }
        };
        let error = ApiError::from_response(status.as_u16(), &body);
        tracing::debug!("Request failed: {}", error);
        Err(error)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        Ok(response.json::<T>().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path).await;
        Self::decode(Self::execute(builder).await?).await
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let builder = self.request(Method::GET, path).await.query(query);
        Self::decode(Self::execute(builder).await?).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let builder = self.request(Method::POST, path).await.json(body);
        Self::decode(Self::execute(builder).await?).await
    }

    pub async fn send_multipart<T>(&self, method: Method, path: &str, form: Form) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let builder = self.request(method, path).await.multipart(form);
        Self::decode(Self::execute(builder).await?).await
    }

    /// PUT without a body
    pub async fn put<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let builder = self.request(Method::PUT, path).await;
        Self::decode(Self::execute(builder).await?).await
    }

    /// DELETE, ignoring any response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, path).await;
        Self::execute(builder).await?;
        Ok(())
    }
}
