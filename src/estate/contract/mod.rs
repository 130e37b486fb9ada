//! 合同模块
//!
//! 合同实体、付款状态流转、HTTP API 与到期提醒服务

pub mod api;
pub mod models;
pub mod service;
pub mod types;

// 重新导出主要类型和函数
pub use api::ContractApi;
pub use models::{Contract, ContractPatch, ContractStatus, ContractType, PaymentStatus};
pub use service::{ContractExpiryNotifier, EXPIRING_MARKER, EXPIRY_THRESHOLD_DAYS};
pub use types::AllContractsResp;
