//! Notification resource service

use async_trait::async_trait;

use crate::{
    api::ApiClient,
    error::ApiError,
    models::notification::{MarkReadResponse, NotificationPage, UnreadCount},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list(&self, page: u32, limit: u32) -> Result<NotificationPage, ApiError>;

    async fn mark_read(&self, id: i64) -> Result<MarkReadResponse, ApiError>;

    async fn unread_count(&self) -> Result<u64, ApiError>;
}

#[derive(Clone)]
pub struct NotificationService {
    client: ApiClient,
}

impl NotificationService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationApi for NotificationService {
    async fn list(&self, page: u32, limit: u32) -> Result<NotificationPage, ApiError> {
        self.client
            .get_json("/api/notifications", &[("page", page), ("limit", limit)])
            .await
    }

    async fn mark_read(&self, id: i64) -> Result<MarkReadResponse, ApiError> {
        self.client.put(&format!("/api/notifications/{}/read", id)).await
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        let count: UnreadCount = self.client.get("/api/notifications/unread/count").await?;
        Ok(count.unread_count)
    }
}
