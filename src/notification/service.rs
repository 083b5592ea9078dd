//! 通知后端服务
//!
//! `NotificationService` 是 Store 访问后端的唯一接口，HTTP 实现基于 reqwest：
//! - `GET  {base_url}/notifications`
//! - `POST {base_url}/notifications/{id}/read`

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

use super::error::ServiceError;
use super::model::UserNotification;
use crate::config::Config;

/// 通知后端
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 拉取通知列表（后端顺序即展示顺序）
    async fn list_notifications(&self) -> Result<Vec<UserNotification>, ServiceError>;

    /// 标记单条通知为已读
    async fn mark_as_read(&self, id: i64) -> Result<(), ServiceError>;
}

/// HTTP 后端客户端
#[derive(Debug, Clone)]
pub struct HttpNotificationService {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpNotificationService {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// 非 2xx 转为 `ServiceError::Status`，错误体优先取 JSON 的 `error`/`message` 字段
    async fn check_status(response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown error").to_string()
                } else {
                    body
                }
            });

        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl NotificationService for HttpNotificationService {
    async fn list_notifications(&self) -> Result<Vec<UserNotification>, ServiceError> {
        let url = format!("{}/notifications", self.base_url);
        debug!(%url, "fetching notifications");

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::check_status(response).await?;
        let feed: Vec<UserNotification> = response.json().await?;

        debug!(count = feed.len(), "notifications received");
        Ok(feed)
    }

    async fn mark_as_read(&self, id: i64) -> Result<(), ServiceError> {
        let url = format!("{}/notifications/{}/read", self.base_url, id);
        debug!(%url, "marking notification as read");

        let response = self.authorize(self.client.post(&url)).send().await?;
        Self::check_status(response).await?;
        Ok(())
    }
}
