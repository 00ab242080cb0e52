//! Session context
//!
//! Owned by the application shell and handed to whoever needs the current
//! user; there is no global session state.

use std::sync::Arc;

use validator::Validate;

use crate::{
    api::BearerToken,
    error::AppResult,
    models::{CurrentUser, LoginRequest, Role},
    schemas::LoginForm,
    services::AuthApi,
};

use super::TokenStore;

pub struct AuthContext {
    auth: Arc<dyn AuthApi>,
    store: Arc<dyn TokenStore>,
    bearer: BearerToken,
    user: Option<CurrentUser>,
    loading: bool,
}

impl AuthContext {
    pub fn new(auth: Arc<dyn AuthApi>, store: Arc<dyn TokenStore>, bearer: BearerToken) -> Self {
        Self {
            auth,
            store,
            bearer,
            user: None,
            loading: true,
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.user.as_ref().map(|u| &u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// True until `init` has resolved (or skipped) the stored session
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Restore the session from the stored token
    ///
    /// Without a token, identity resolution is skipped. A token the backend
    /// refuses is cleared. Other failures leave the token in place and the
    /// context unauthenticated.
    pub async fn init(&mut self) -> AppResult<()> {
        let result = self.resolve_stored().await;
        self.loading = false;
        result
    }

    async fn resolve_stored(&mut self) -> AppResult<()> {
        let Some(token) = self.store.load()? else {
            tracing::debug!("No stored session token");
            return Ok(());
        };
        self.bearer.set(Some(token)).await;

        match self.auth.me().await {
            Ok(user) => {
                tracing::info!("Restored session for {} ({})", user.username, user.role);
                self.user = Some(user);
            }
            Err(err) if err.is_auth_failure() => {
                tracing::info!("Stored session rejected: {}", err);
                self.clear_token().await?;
            }
            Err(err) => {
                tracing::warn!("Could not resolve session identity: {}", err);
                self.user = None;
            }
        }
        Ok(())
    }

    /// Sign in, persist the token and resolve the identity behind it
    pub async fn login(&mut self, form: &LoginForm) -> AppResult<&CurrentUser> {
        form.validate()?;

        let response = self.auth.login(&LoginRequest::from(form)).await?;
        self.store.save(&response.token)?;
        self.bearer.set(Some(response.token)).await;

        let user = self.auth.me().await?;
        tracing::info!("Signed in as {} ({})", user.username, user.role);
        Ok(&*self.user.insert(user))
    }

    pub async fn logout(&mut self) -> AppResult<()> {
        self.clear_token().await
    }

    async fn clear_token(&mut self) -> AppResult<()> {
        self.user = None;
        self.bearer.set(None).await;
        self.store.clear()
    }
}
