//! 通知本地模型定义

use serde::{Deserialize, Serialize};

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// 合同相关（到期提醒等）
    Contract,
    /// 房源相关
    Property,
    /// 线索（潜在客户来消息）
    Lead,
    /// 系统
    System,
}

/// 站内通知
///
/// 展示时按 timestamp 降序（最新在前）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "notificationID")]
    pub notification_id: String,
    pub kind: NotificationKind,
    pub message: String,
    /// 毫秒时间戳
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub read: bool,
}
