//! 会话本地模型定义

use crate::estate::user::models::UserRole;
use serde::{Deserialize, Serialize};

/// 消息发送方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSender {
    /// 终端用户（访客/客户）
    User,
    /// 经纪人（后台）
    Agent,
}

/// 聊天消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 消息 ID（发送方 ID + 纳秒时间戳）
    #[serde(rename = "msgID")]
    pub message_id: String,
    pub sender: MessageSender,
    pub text: String,
    /// 展示用时间字符串（HH:MM）
    #[serde(default)]
    pub time: String,
    /// 经纪人发出的消息视为已读
    #[serde(default)]
    pub read: bool,
}

/// 会话数据结构
///
/// 每个终端用户对应一个会话，会话 ID 即用户 ID 的字符串形式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    /// 对方展示名（冗余，列表页不做用户表查询）
    #[serde(rename = "userName", default)]
    pub user_name: String,
    #[serde(rename = "avatarURL", default)]
    pub avatar_url: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// 未读消息数
    #[serde(rename = "unreadCount", default)]
    pub unread_count: i32,
    /// 最新消息内容（冗余，列表展示用）
    #[serde(rename = "lastMessage", default)]
    pub last_message: String,
    /// 最新消息时间（毫秒时间戳）
    #[serde(rename = "lastMessageTime", default)]
    pub last_message_time: i64,
}

/// 会话冗余元数据（保存消息时一并 upsert）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMeta {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "avatarURL", default)]
    pub avatar_url: String,
    #[serde(default)]
    pub role: UserRole,
}

impl ConversationMeta {
    /// 访客兜底元数据（既无目标用户也无登录用户时使用）
    pub fn visitor() -> Self {
        Self {
            user_name: "访客".to_string(),
            avatar_url: String::new(),
            role: UserRole::Client,
        }
    }
}
