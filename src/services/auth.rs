//! Authentication service

use async_trait::async_trait;

use crate::{
    api::ApiClient,
    error::ApiError,
    models::{CurrentUser, LoginRequest, LoginResponse},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// Resolve the identity behind the current bearer token
    async fn me(&self) -> Result<CurrentUser, ApiError>;
}

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthApi for AuthService {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.client.post_json("/api/auth/login", request).await
    }

    async fn me(&self) -> Result<CurrentUser, ApiError> {
        self.client.get("/api/me").await
    }
}
