//! 通知数据模型 - 后端下发的用户通知
//!
//! 线上格式中 `type` 是开放枚举，`content` 的结构由 `type` 决定。
//! 本地统一建模为 [`NotificationContent`] 标签联合体，未知类型落入
//! `Unknown` 变体，解码永不因为新类型失败。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// 当前已知的通知类型标签
pub const KNOWN_KINDS: &[&str] = &[
    "team_member_added",
    "team_member_removed",
    "team_role_changed",
    "issue_regression",
    "issue_assigned",
    "alert_triggered",
];

/// 用户通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireNotification", into = "WireNotification")]
pub struct UserNotification {
    /// 通知 ID（后端分配，不可变）
    pub id: i64,
    /// 类型 + 负载
    pub content: NotificationContent,
    /// 是否已读
    pub is_read: bool,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl UserNotification {
    /// 创建未读通知
    pub fn new(id: i64, content: NotificationContent, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content,
            is_read: false,
            created_at,
        }
    }

    /// 设置已读状态
    pub fn with_read(mut self, is_read: bool) -> Self {
        self.is_read = is_read;
        self
    }

    /// 线上类型标签
    pub fn kind(&self) -> &str {
        self.content.kind()
    }
}

/// 通知负载（按类型区分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum NotificationContent {
    /// 被加入团队
    TeamMemberAdded { team_name: String, role: String },
    /// 被移出团队
    TeamMemberRemoved { team_name: String },
    /// 团队角色变更
    TeamRoleChanged {
        team_name: String,
        old_role: String,
        new_role: String,
    },
    /// 问题回归
    IssueRegression {
        issue_title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_name: Option<String>,
    },
    /// 问题被分配
    IssueAssigned {
        issue_title: String,
        assigned_by: String,
    },
    /// 告警触发
    AlertTriggered {
        alert_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_name: Option<String>,
    },
    /// 客户端尚不认识的类型，保留原始标签和负载
    #[serde(skip)]
    Unknown { kind: String, content: Value },
}

impl NotificationContent {
    /// 从线上 `(type, content)` 解码
    ///
    /// 已知类型但负载不匹配时同样降级为 `Unknown`。
    pub fn from_wire(kind: &str, content: Value) -> Self {
        let tagged = serde_json::json!({ "type": kind, "content": content.clone() });
        match serde_json::from_value(tagged) {
            Ok(parsed) => parsed,
            Err(e) => {
                if KNOWN_KINDS.contains(&kind) {
                    warn!(kind, error = %e, "notification content does not match its type, treating as unknown");
                }
                Self::Unknown {
                    kind: kind.to_string(),
                    content,
                }
            }
        }
    }

    /// 类型标签
    pub fn kind(&self) -> &str {
        match self {
            Self::TeamMemberAdded { .. } => "team_member_added",
            Self::TeamMemberRemoved { .. } => "team_member_removed",
            Self::TeamRoleChanged { .. } => "team_role_changed",
            Self::IssueRegression { .. } => "issue_regression",
            Self::IssueAssigned { .. } => "issue_assigned",
            Self::AlertTriggered { .. } => "alert_triggered",
            Self::Unknown { kind, .. } => kind,
        }
    }

    /// 线上 `content` 字段
    pub fn payload(&self) -> Value {
        match self {
            Self::Unknown { content, .. } => content.clone(),
            known => serde_json::to_value(known)
                .ok()
                .and_then(|mut v| v.get_mut("content").map(Value::take))
                .unwrap_or(Value::Null),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }
}

/// 线上 JSON 结构
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireNotification {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Value,
    #[serde(default)]
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<WireNotification> for UserNotification {
    fn from(wire: WireNotification) -> Self {
        Self {
            id: wire.id,
            content: NotificationContent::from_wire(&wire.kind, wire.content),
            is_read: wire.is_read,
            created_at: wire.created_at,
        }
    }
}

impl From<UserNotification> for WireNotification {
    fn from(n: UserNotification) -> Self {
        Self {
            id: n.id,
            kind: n.content.kind().to_string(),
            content: n.content.payload(),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}
