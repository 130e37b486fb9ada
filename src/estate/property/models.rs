//! 房源本地模型定义

use serde::{Deserialize, Serialize};

/// 房源状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    /// 在售/在租
    Available,
    /// 已出租
    Rented,
    /// 已售出
    Sold,
}

/// 房源数据结构
///
/// 创建时由客户端生成 ID，先写本地集合再发远端
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "propertyID")]
    pub property_id: String,
    pub title: String,
    pub status: PropertyStatus,
    #[serde(rename = "ownerID", default)]
    pub owner_id: String,
    #[serde(rename = "coverURL", default)]
    pub cover_url: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub location: String,
    /// 创建时间（毫秒时间戳）
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

/// 房源部分更新载荷
///
/// 仅携带要变更的字段，本地合并与远端请求使用同一份载荷
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PropertyStatus>,
    #[serde(rename = "coverURL", skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl PropertyPatch {
    /// 将携带的字段合并到目标房源（ID 不可变更）
    pub fn apply_to(&self, property: &mut Property) {
        if let Some(title) = &self.title {
            property.title = title.clone();
        }
        if let Some(status) = self.status {
            property.status = status;
        }
        if let Some(cover_url) = &self.cover_url {
            property.cover_url = cover_url.clone();
        }
        if let Some(price) = self.price {
            property.price = price;
        }
        if let Some(location) = &self.location {
            property.location = location.clone();
        }
    }
}
