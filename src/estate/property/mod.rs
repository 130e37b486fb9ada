//! 房源模块
//!
//! 房源实体、部分更新与 HTTP API

pub mod api;
pub mod models;
pub mod types;

// 重新导出主要类型
pub use api::PropertyApi;
pub use models::{Property, PropertyPatch, PropertyStatus};
pub use types::AllPropertiesResp;
