pub mod auth;
pub mod client;
pub mod contract;
pub mod conversation;
pub mod notification;
pub mod property;
pub mod serialization;
pub mod store;
pub mod types;
pub mod user;

// 重新导出认证相关函数
pub use auth::{login_async, logout_async, AuthListener};

// 重新导出核心类型
pub use client::{ActiveView, ClientConfig, EstateClient, UiState};
pub use contract::{Contract, ContractExpiryNotifier, ContractStatus, ContractType};
pub use conversation::{ChatMessage, Conversation, ConversationListener, MessageSender};
pub use notification::{Notification, NotificationKind, NotificationListener};
pub use property::{Property, PropertyStatus};
pub use store::DomainStore;
pub use user::{User, UserRole};
