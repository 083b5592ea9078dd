//! 消息格式化模块 - 将通知负载转换为用户可读的标题/正文/图标
//!
//! 纯函数，无状态。未知类型走默认分支，永不失败。

use chrono::{DateTime, Utc};

use super::model::NotificationContent;

/// Display text constants
pub mod msg {
    pub const DEFAULT_TITLE: &str = "Notification";
    pub const DEFAULT_MESSAGE: &str = "You have a new notification";

    pub const TEAM_MEMBER_ADDED: &str = "Added to team";
    pub const TEAM_MEMBER_REMOVED: &str = "Removed from team";
    pub const TEAM_ROLE_CHANGED: &str = "Role changed";
    pub const ISSUE_REGRESSION: &str = "Issue regressed";
    pub const ISSUE_ASSIGNED: &str = "Issue assigned";
    pub const ALERT_TRIGGERED: &str = "Alert triggered";

    pub const JUST_NOW: &str = "just now";
}

/// 图标种类（由展示层决定具体样式）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconKind {
    Team,
    Role,
    Regression,
    Assignment,
    Alert,
    Generic,
}

impl IconKind {
    /// 终端下的图标字符
    pub fn symbol(&self) -> &'static str {
        match self {
            IconKind::Team => "👥",
            IconKind::Role => "🛡",
            IconKind::Regression => "🐞",
            IconKind::Assignment => "📌",
            IconKind::Alert => "🚨",
            IconKind::Generic => "🔔",
        }
    }
}

/// 格式化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText {
    pub title: String,
    pub message: String,
    pub icon: IconKind,
}

impl DisplayText {
    fn new(title: &str, message: String, icon: IconKind) -> Self {
        Self {
            title: title.to_string(),
            message,
            icon,
        }
    }
}

/// 格式化通知负载
pub fn format(content: &NotificationContent) -> DisplayText {
    match content {
        NotificationContent::TeamMemberAdded { team_name, role } => DisplayText::new(
            msg::TEAM_MEMBER_ADDED,
            format!("You were added to {} as {}", team_name, role),
            IconKind::Team,
        ),
        NotificationContent::TeamMemberRemoved { team_name } => DisplayText::new(
            msg::TEAM_MEMBER_REMOVED,
            format!("You were removed from {}", team_name),
            IconKind::Team,
        ),
        NotificationContent::TeamRoleChanged {
            team_name,
            old_role,
            new_role,
        } => DisplayText::new(
            msg::TEAM_ROLE_CHANGED,
            format!("Your role in {} changed from {} to {}", team_name, old_role, new_role),
            IconKind::Role,
        ),
        NotificationContent::IssueRegression {
            issue_title,
            project_name,
        } => {
            let message = match project_name {
                Some(project) => format!("\"{}\" regressed in {}", issue_title, project),
                None => format!("\"{}\" regressed", issue_title),
            };
            DisplayText::new(msg::ISSUE_REGRESSION, message, IconKind::Regression)
        }
        NotificationContent::IssueAssigned {
            issue_title,
            assigned_by,
        } => DisplayText::new(
            msg::ISSUE_ASSIGNED,
            format!("{} assigned \"{}\" to you", assigned_by, issue_title),
            IconKind::Assignment,
        ),
        NotificationContent::AlertTriggered {
            alert_name,
            project_name,
        } => {
            let message = match project_name {
                Some(project) => format!("{} fired in {}", alert_name, project),
                None => format!("{} fired", alert_name),
            };
            DisplayText::new(msg::ALERT_TRIGGERED, message, IconKind::Alert)
        }
        NotificationContent::Unknown { .. } => DisplayText::new(
            msg::DEFAULT_TITLE,
            msg::DEFAULT_MESSAGE.to_string(),
            IconKind::Generic,
        ),
    }
}

/// 相对时间（"5m ago"），超过 30 天显示日期
pub fn relative_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();

    if minutes < 1 {
        // 未来时间（时钟偏差）也算刚刚
        msg::JUST_NOW.to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() <= 30 {
        format!("{}d ago", elapsed.num_days())
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}
