//! 会话 HTTP API 客户端
//!
//! 负责消息保存与已读标记

use crate::estate::conversation::models::{ChatMessage, ConversationMeta};
use crate::estate::types::handle_http_response;
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 会话相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ConversationApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl ConversationApi {
    /// 创建新的会话 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 保存消息（单次调用同时追加消息并 upsert 会话元数据）
    pub async fn save_message(
        &self,
        conversation_id: &str,
        message: &ChatMessage,
        meta: &ConversationMeta,
    ) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/conversation/save_message", self.api_base_url);

        info!(
            "[ConvAPI] 📡 保存消息: conversationID={}, msgID={}",
            conversation_id, message.message_id
        );
        debug!("[ConvAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "conversationID": conversation_id,
                "message": message,
                "meta": meta,
            }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "保存消息").await?;
        Ok(())
    }

    /// 标记会话已读（未读数清零）
    pub async fn mark_read(&self, conversation_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/conversation/mark_read", self.api_base_url);

        info!("[ConvAPI] 📡 标记会话已读: {}", conversation_id);
        debug!("[ConvAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "conversationID": conversation_id }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "标记会话已读").await?;
        Ok(())
    }
}
