use crate::estate::contract::models::Contract;
use serde::Deserialize;

/// 全量合同响应（业务逻辑层结构体，可直接从 API 响应反序列化）
#[derive(Debug, Clone, Deserialize)]
pub struct AllContractsResp {
    pub contracts: Vec<Contract>,
}
