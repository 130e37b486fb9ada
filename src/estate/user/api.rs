//! 用户 HTTP API 客户端
//!
//! 负责用户列表拉取与收藏切换

use crate::estate::types::handle_http_response;
use crate::estate::user::models::User;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

/// 用户相关的 HTTP API 客户端
#[derive(Clone)]
pub struct UserApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl UserApi {
    /// 创建新的用户 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 从服务器获取全量用户列表
    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/user/get_all_users", self.api_base_url);

        info!("[UserAPI] 📡 请求用户列表");
        debug!("[UserAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("请求失败")?;

        #[derive(Deserialize)]
        struct UsersData {
            users: Vec<User>,
        }

        let api_resp = handle_http_response::<UsersData>(response, "用户列表").await?;
        let data = api_resp
            .data
            .ok_or_else(|| anyhow::anyhow!("响应中缺少 data 字段"))?;

        info!("[UserAPI] ✅ 用户列表响应，用户数: {}", data.users.len());
        Ok(data.users)
    }

    /// 切换收藏（服务端计算新的收藏集合并返回）
    pub async fn toggle_favorite(&self, user_id: &str, property_id: &str) -> Result<Vec<String>> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/user/toggle_favorite", self.api_base_url);

        info!(
            "[UserAPI] 📡 切换收藏: userID={}, propertyID={}",
            user_id, property_id
        );
        debug!("[UserAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "userID": user_id,
                "propertyID": property_id,
            }))
            .send()
            .await
            .context("请求失败")?;

        #[derive(Deserialize)]
        struct FavoritesData {
            favorites: Vec<String>,
        }

        let api_resp = handle_http_response::<FavoritesData>(response, "切换收藏").await?;
        let data = api_resp
            .data
            .ok_or_else(|| anyhow::anyhow!("响应中缺少 data 字段"))?;

        info!(
            "[UserAPI] ✅ 收藏切换完成，当前收藏数: {}",
            data.favorites.len()
        );
        Ok(data.favorites)
    }
}
