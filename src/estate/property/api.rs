//! 房源 HTTP API 客户端
//!
//! 负责所有房源相关的 HTTP 请求

use crate::estate::property::models::{Property, PropertyPatch};
use crate::estate::property::types::AllPropertiesResp;
use crate::estate::types::handle_http_response;
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 房源相关的 HTTP API 客户端
#[derive(Clone)]
pub struct PropertyApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl PropertyApi {
    /// 创建新的房源 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 从服务器获取全量房源
    pub async fn get_all_properties(&self) -> Result<AllPropertiesResp> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/property/get_all_properties", self.api_base_url);

        info!("[PropAPI] 📡 请求全量房源");
        debug!("[PropAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("请求失败")?;

        let api_resp = handle_http_response::<AllPropertiesResp>(response, "全量房源").await?;
        let resp = api_resp
            .data
            .ok_or_else(|| anyhow::anyhow!("响应中缺少 data 字段"))?;

        info!("[PropAPI] ✅ 全量房源响应，房源数: {}", resp.properties.len());
        Ok(resp)
    }

    /// 新增房源
    pub async fn add_property(&self, property: &Property) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/property/add_property", self.api_base_url);

        info!("[PropAPI] 📡 新增房源: {}", property.property_id);
        debug!("[PropAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "property": property }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "新增房源").await?;
        Ok(())
    }

    /// 部分更新房源（载荷与本地合并使用同一份 patch）
    pub async fn update_property(&self, property_id: &str, patch: &PropertyPatch) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/property/update_property", self.api_base_url);

        info!("[PropAPI] 📡 更新房源: {}", property_id);
        debug!("[PropAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "propertyID": property_id,
                "patch": patch,
            }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "更新房源").await?;
        Ok(())
    }

    /// 删除房源
    pub async fn delete_property(&self, property_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/property/delete_property", self.api_base_url);

        info!("[PropAPI] 📡 删除房源: {}", property_id);
        debug!("[PropAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "propertyID": property_id }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "删除房源").await?;
        Ok(())
    }
}
