pub mod estate;

// 重新导出常用类型和函数，方便外部使用
pub use estate::{
    client::{ActiveView, ClientConfig, EstateClient, UiState},
    contract::{Contract, ContractPatch},
    property::{Property, PropertyPatch},
    store::DomainStore,
    login_async,
};
