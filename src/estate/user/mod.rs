//! 用户模块
//!
//! 用户档案、角色与收藏（CRM 数据的客户端侧）

pub mod api;
pub mod models;

// 重新导出主要类型
pub use api::UserApi;
pub use models::{User, UserRole};
