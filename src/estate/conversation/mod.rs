//! 会话模块
//!
//! 咨询会话与消息：实体、保存消息的 HTTP API、快照监听器

pub mod api;
pub mod listener;
pub mod models;

// 重新导出主要类型
pub use api::ConversationApi;
pub use listener::{ConversationListener, EmptyConversationListener};
pub use models::{ChatMessage, Conversation, ConversationMeta, MessageSender};
