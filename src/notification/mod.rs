//! 通知模块 - 用户通知列表的拉取、已读状态和展示文本
//!
//! # 组成
//! 1. `model`：线上通知结构，按类型区分负载，未知类型兼容
//! 2. `formatter`：负载 → 标题/正文/图标，纯函数
//! 3. `store`：唯一状态源，乐观标记已读 + 回滚
//! 4. `view`：状态 → 视图模型，导航副作用
//! 5. `service`：后端接口及 HTTP 实现
//!
//! # 使用示例
//! ```ignore
//! use std::sync::Arc;
//! use notification_center::notification::{HttpNotificationService, NotificationStore, NotificationView};
//!
//! let service = HttpNotificationService::new(&config)?;
//! let store = Arc::new(NotificationStore::new(Arc::new(service)));
//! store.fetch().await;
//! let view = NotificationView::build(&store.snapshot(), chrono::Utc::now());
//! ```

pub mod error;
pub mod formatter;
pub mod model;
pub mod service;
pub mod store;
pub mod view;

pub use error::{ServiceError, StoreError};
pub use formatter::{format, msg, relative_age, DisplayText, IconKind};
pub use model::{NotificationContent, UserNotification, KNOWN_KINDS};
pub use service::{HttpNotificationService, NotificationService};
pub use store::{NotificationState, NotificationStore, RefreshHandle};
pub use view::{EntryView, NotificationView, Route, ViewEffect, EMPTY_STATE_MESSAGE};
