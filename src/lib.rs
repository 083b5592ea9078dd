//! Notification Center - 用户通知列表客户端（拉取、未读状态、展示文本）

pub mod config;
pub mod notification;
pub mod tui;

pub use config::Config;
pub use notification::{
    HttpNotificationService, NotificationContent, NotificationService, NotificationState,
    NotificationStore, NotificationView, ServiceError, StoreError, UserNotification,
};
