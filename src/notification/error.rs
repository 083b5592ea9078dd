//! 通知模块错误类型

use thiserror::Error;

/// 后端调用失败
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// 网络不可达、超时等
    #[error("network error: {0}")]
    Network(String),
    /// 后端返回非 2xx
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
    /// 响应体无法解码
    #[error("invalid response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ServiceError::Decode(e.to_string())
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}

/// Store 对外暴露的错误状态
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// 拉取通知列表失败（保留旧列表）
    #[error("Failed to load notifications: {0}")]
    Fetch(String),
    /// 标记已读失败（已回滚该条）
    #[error("Failed to mark notification {id} as read: {message}")]
    Mutation { id: i64, message: String },
}

impl StoreError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, StoreError::Fetch(_))
    }
}
