//! 通知模块
//!
//! 站内通知：实体、创建/已读/清空 API、快照监听器

pub mod api;
pub mod listener;
pub mod models;

// 重新导出主要类型
pub use api::NotificationApi;
pub use listener::{EmptyNotificationListener, NotificationListener};
pub use models::{Notification, NotificationKind};
