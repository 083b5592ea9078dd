//! TUI 状态数据结构

/// 当前页面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// 主页（只显示角标）
    #[default]
    Home,
    /// 完整通知列表
    AllNotifications,
}

/// 按键产生的 Store 操作（由主循环异步执行）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MarkRead(i64),
    Refresh,
}
