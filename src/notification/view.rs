//! 通知视图模型 - Store 状态到展示内容的纯映射
//!
//! 展示层（弹出层 / 完整列表）只消费这里的结果，不直接读取 Store 内部。

use chrono::{DateTime, Utc};

use super::formatter::{self, IconKind};
use super::store::NotificationState;

/// 空列表提示
pub const EMPTY_STATE_MESSAGE: &str = "No notifications yet";

/// 导航目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// 完整通知列表页
    AllNotifications,
}

/// 视图动作产生的副作用（由外部执行）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    Navigate(Route),
    Close,
}

/// 单条通知的展示数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub id: i64,
    pub icon: IconKind,
    pub title: String,
    pub message: String,
    pub age: String,
    pub is_read: bool,
    /// 仅未读条目可标记已读
    pub can_mark_read: bool,
}

/// 通知视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    /// 未读角标（大于 0 时显示）
    pub badge: Option<usize>,
    /// 错误横幅
    pub error_banner: Option<String>,
    pub loading: bool,
    /// 空列表提示（非加载中时）
    pub empty_state: Option<&'static str>,
    /// 按后端顺序排列
    pub entries: Vec<EntryView>,
    pub show_view_all: bool,
}

impl NotificationView {
    pub fn build(state: &NotificationState, now: DateTime<Utc>) -> Self {
        let unread = state.unread_count();
        let feed = state.feed();

        let entries = feed
            .iter()
            .map(|n| {
                let text = formatter::format(&n.content);
                EntryView {
                    id: n.id,
                    icon: text.icon,
                    title: text.title,
                    message: text.message,
                    age: formatter::relative_age(n.created_at, now),
                    is_read: n.is_read,
                    can_mark_read: !n.is_read,
                }
            })
            .collect();

        Self {
            badge: (unread > 0).then_some(unread),
            error_banner: state.error().map(|e| e.to_string()),
            loading: state.loading(),
            empty_state: (feed.is_empty() && !state.loading()).then_some(EMPTY_STATE_MESSAGE),
            entries,
            show_view_all: !feed.is_empty(),
        }
    }

    /// "查看全部"：先导航，再关闭
    pub fn view_all() -> [ViewEffect; 2] {
        [ViewEffect::Navigate(Route::AllNotifications), ViewEffect::Close]
    }

    pub fn close() -> [ViewEffect; 1] {
        [ViewEffect::Close]
    }
}
