//! 用户本地模型定义

use serde::{Deserialize, Serialize};

/// 用户角色（封闭枚举，所有分支必须显式处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// 管理员（经纪公司后台）
    Admin,
    /// 业主
    Owner,
    /// 客户 / 访客
    Client,
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Client
    }
}

/// 用户数据结构
///
/// 所有实体 ID 在创建时即固定为字符串形式，后续比较不做类型转换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "name", default)]
    pub name: String,
    #[serde(rename = "role", default)]
    pub role: UserRole,
    #[serde(rename = "phone", default)]
    pub phone: String,
    #[serde(rename = "avatarURL", default)]
    pub avatar_url: String,
    /// 收藏的房源 ID 集合
    #[serde(rename = "favorites", default)]
    pub favorites: Vec<String>,
}
