//! 通知监听器回调接口

use async_trait::async_trait;

/// 通知监听器回调接口
///
/// 服务端每次推送完整通知快照，回调参数为快照的 JSON 字符串（已按时间降序）
#[async_trait]
pub trait NotificationListener: Send + Sync {
    /// 通知快照变更（全量替换）
    async fn on_notifications_snapshot(&self, notification_list: String);

    /// 未读通知数变更
    async fn on_unread_notification_count_changed(&self, unread_count: i32);
}

/// 空实现（默认监听器）
pub struct EmptyNotificationListener;

#[async_trait]
impl NotificationListener for EmptyNotificationListener {
    async fn on_notifications_snapshot(&self, _notification_list: String) {}
    async fn on_unread_notification_count_changed(&self, _unread_count: i32) {}
}
