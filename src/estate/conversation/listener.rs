//! 会话监听器回调接口

use async_trait::async_trait;

/// 会话监听器回调接口
///
/// 服务端每次推送完整会话快照，回调参数为快照的 JSON 字符串
#[async_trait]
pub trait ConversationListener: Send + Sync {
    /// 会话快照变更（全量替换）
    async fn on_conversations_snapshot(&self, conversation_list: String);

    /// 总未读消息数变更
    async fn on_total_unread_message_count_changed(&self, total_unread_count: i32);
}

/// 空实现（默认监听器）
pub struct EmptyConversationListener;

#[async_trait]
impl ConversationListener for EmptyConversationListener {
    async fn on_conversations_snapshot(&self, _conversation_list: String) {}
    async fn on_total_unread_message_count_changed(&self, _total_unread_count: i32) {}
}
