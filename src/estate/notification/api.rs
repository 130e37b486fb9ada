//! 通知 HTTP API 客户端
//!
//! 负责通知创建、已读标记与清空

use crate::estate::types::handle_http_response;
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 通知相关的 HTTP API 客户端
#[derive(Clone)]
pub struct NotificationApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl NotificationApi {
    /// 创建新的通知 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    async fn create(&self, body: serde_json::Value, operation_name: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/notification/create", self.api_base_url);

        info!("[NotifAPI] 📡 {}", operation_name);
        debug!("[NotifAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&body)
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, operation_name).await?;
        Ok(())
    }

    /// 创建合同通知（到期提醒等）
    pub async fn create_contract_notification(
        &self,
        contract_id: &str,
        property_title: &str,
        reason: &str,
    ) -> Result<()> {
        self.create(
            serde_json::json!({
                "kind": "contract",
                "contractID": contract_id,
                "propertyTitle": property_title,
                "reason": reason,
            }),
            "创建合同通知",
        )
        .await
    }

    /// 创建房源通知
    pub async fn create_property_notification(
        &self,
        property_title: &str,
        reason: &str,
    ) -> Result<()> {
        self.create(
            serde_json::json!({
                "kind": "property",
                "propertyTitle": property_title,
                "reason": reason,
            }),
            "创建房源通知",
        )
        .await
    }

    /// 创建线索通知（终端用户发来咨询）
    pub async fn create_lead_notification(
        &self,
        lead_name: &str,
        property_title: Option<&str>,
    ) -> Result<()> {
        self.create(
            serde_json::json!({
                "kind": "lead",
                "leadName": lead_name,
                "propertyTitle": property_title,
            }),
            "创建线索通知",
        )
        .await
    }

    /// 标记单条通知已读
    pub async fn mark_read(&self, notification_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/notification/mark_read", self.api_base_url);

        info!("[NotifAPI] 📡 标记通知已读: {}", notification_id);
        debug!("[NotifAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "notificationID": notification_id }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "标记通知已读").await?;
        Ok(())
    }

    /// 全部标记已读
    pub async fn mark_all_read(&self) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/notification/mark_all_read", self.api_base_url);

        info!("[NotifAPI] 📡 全部标记已读");
        debug!("[NotifAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "全部标记已读").await?;
        Ok(())
    }

    /// 清空全部通知（确认弹窗由调用方负责）
    pub async fn clear_all(&self) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/notification/clear_all", self.api_base_url);

        info!("[NotifAPI] 📡 清空全部通知");
        debug!("[NotifAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "清空全部通知").await?;
        Ok(())
    }
}
