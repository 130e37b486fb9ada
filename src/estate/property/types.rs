use crate::estate::property::models::Property;
use serde::Deserialize;

/// 全量房源响应（业务逻辑层结构体，可直接从 API 响应反序列化）
#[derive(Debug, Clone, Deserialize)]
pub struct AllPropertiesResp {
    pub properties: Vec<Property>,
}
