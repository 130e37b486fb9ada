//! 合同 HTTP API 客户端
//!
//! 负责所有合同相关的 HTTP 请求

use crate::estate::contract::models::{Contract, ContractPatch};
use crate::estate::contract::types::AllContractsResp;
use crate::estate::types::handle_http_response;
use anyhow::{Context, Result};
use tracing::{debug, info};
use uuid::Uuid;

/// 合同相关的 HTTP API 客户端
#[derive(Clone)]
pub struct ContractApi {
    client: reqwest::Client,
    api_base_url: String,
}

impl ContractApi {
    /// 创建新的合同 API 客户端
    ///
    /// `client` 应该已经在外部配置好认证拦截器
    pub fn new(client: reqwest::Client, api_base_url: String) -> Self {
        Self {
            client,
            api_base_url,
        }
    }

    /// 从服务器获取全量合同
    pub async fn get_all_contracts(&self) -> Result<AllContractsResp> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/contract/get_all_contracts", self.api_base_url);

        info!("[ContractAPI] 📡 请求全量合同");
        debug!("[ContractAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({}))
            .send()
            .await
            .context("请求失败")?;

        let api_resp = handle_http_response::<AllContractsResp>(response, "全量合同").await?;
        let resp = api_resp
            .data
            .ok_or_else(|| anyhow::anyhow!("响应中缺少 data 字段"))?;

        info!("[ContractAPI] ✅ 全量合同响应，合同数: {}", resp.contracts.len());
        Ok(resp)
    }

    /// 新增合同
    pub async fn add_contract(&self, contract: &Contract) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/contract/add_contract", self.api_base_url);

        info!("[ContractAPI] 📡 新增合同: {}", contract.contract_id);
        debug!("[ContractAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "contract": contract }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "新增合同").await?;
        Ok(())
    }

    /// 部分更新合同（载荷与本地合并使用同一份 patch）
    pub async fn update_contract(&self, contract_id: &str, patch: &ContractPatch) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/contract/update_contract", self.api_base_url);

        info!("[ContractAPI] 📡 更新合同: {}", contract_id);
        debug!("[ContractAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({
                "contractID": contract_id,
                "patch": patch,
            }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "更新合同").await?;
        Ok(())
    }

    /// 删除合同
    pub async fn delete_contract(&self, contract_id: &str) -> Result<()> {
        let operation_id = Uuid::new_v4().to_string();
        let url = format!("{}/contract/delete_contract", self.api_base_url);

        info!("[ContractAPI] 📡 删除合同: {}", contract_id);
        debug!("[ContractAPI]   请求URL: {}, 操作ID: {}", url, operation_id);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("operationID", &operation_id)
            .json(&serde_json::json!({ "contractID": contract_id }))
            .send()
            .await
            .context("请求失败")?;

        handle_http_response::<serde_json::Value>(response, "删除合同").await?;
        Ok(())
    }
}
