//! 合同本地模型定义

use serde::{Deserialize, Serialize};

/// 合同类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    /// 租赁
    Rent,
    /// 买卖
    Sale,
}

/// 合同状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    /// 履约中
    Active,
    /// 已完成
    Completed,
}

/// 付款状态（本期租金 / 业主打款共用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// 待付
    Pending,
    /// 已付
    Paid,
    /// 逾期
    Overdue,
}

/// 合同数据结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "contractID")]
    pub contract_id: String,
    /// 关联房源 ID
    #[serde(rename = "propertyID")]
    pub property_id: String,
    /// 房源标题（签约时冗余一份，房源后续改名不影响合同展示）
    #[serde(rename = "propertyTitle", default)]
    pub property_title: String,
    /// 房源封面（同上，签约时冗余）
    #[serde(rename = "propertyCover", default)]
    pub property_cover: String,
    #[serde(rename = "contractType")]
    pub contract_type: ContractType,
    pub status: ContractStatus,
    #[serde(rename = "clientID", default)]
    pub client_id: String,
    #[serde(rename = "clientName", default)]
    pub client_name: String,
    #[serde(rename = "clientPhone", default)]
    pub client_phone: String,
    #[serde(rename = "ownerID", default)]
    pub owner_id: String,
    #[serde(rename = "ownerName", default)]
    pub owner_name: String,
    #[serde(rename = "ownerPhone", default)]
    pub owner_phone: String,
    /// 合同金额（租赁为月租金，买卖为总价）
    #[serde(default)]
    pub value: f64,
    /// 佣金比例（百分比）
    #[serde(rename = "commissionRate", default)]
    pub commission_rate: f64,
    /// 每月付款日（1-31）
    #[serde(rename = "dueDay", default)]
    pub due_day: u32,
    /// 起始日期（毫秒时间戳）
    #[serde(rename = "startDate", default)]
    pub start_date: i64,
    /// 到期日期（毫秒时间戳，买卖合同可能没有）
    #[serde(rename = "endDate", default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    /// 本期付款状态
    #[serde(rename = "nextPaymentStatus", default = "default_payment_status")]
    pub next_payment_status: PaymentStatus,
    /// 最近一次收款日期（展示用字符串，如 2026-08-05）
    #[serde(rename = "lastPaymentDate", default)]
    pub last_payment_date: String,
    /// 业主打款状态
    #[serde(rename = "ownerPayoutStatus", default = "default_payment_status")]
    pub owner_payout_status: PaymentStatus,
    /// 分期总数（仅买卖分期合同）
    #[serde(rename = "installmentsTotal", default, skip_serializing_if = "Option::is_none")]
    pub installments_total: Option<u32>,
    /// 已付分期数（仅买卖分期合同，不超过分期总数）
    #[serde(rename = "installmentsPaid", default, skip_serializing_if = "Option::is_none")]
    pub installments_paid: Option<u32>,
}

fn default_payment_status() -> PaymentStatus {
    PaymentStatus::Pending
}

/// 合同部分更新载荷
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ContractStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(rename = "commissionRate", skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(rename = "dueDay", skip_serializing_if = "Option::is_none")]
    pub due_day: Option<u32>,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(rename = "nextPaymentStatus", skip_serializing_if = "Option::is_none")]
    pub next_payment_status: Option<PaymentStatus>,
    #[serde(rename = "lastPaymentDate", skip_serializing_if = "Option::is_none")]
    pub last_payment_date: Option<String>,
    #[serde(rename = "ownerPayoutStatus", skip_serializing_if = "Option::is_none")]
    pub owner_payout_status: Option<PaymentStatus>,
    #[serde(rename = "installmentsPaid", skip_serializing_if = "Option::is_none")]
    pub installments_paid: Option<u32>,
}

impl ContractPatch {
    /// 将携带的字段合并到目标合同（ID 与关联房源不可变更）
    pub fn apply_to(&self, contract: &mut Contract) {
        if let Some(status) = self.status {
            contract.status = status;
        }
        if let Some(value) = self.value {
            contract.value = value;
        }
        if let Some(rate) = self.commission_rate {
            contract.commission_rate = rate;
        }
        if let Some(due_day) = self.due_day {
            contract.due_day = due_day;
        }
        if let Some(end_date) = self.end_date {
            contract.end_date = Some(end_date);
        }
        if let Some(payment) = self.next_payment_status {
            contract.next_payment_status = payment;
        }
        if let Some(date) = &self.last_payment_date {
            contract.last_payment_date = date.clone();
        }
        if let Some(payout) = self.owner_payout_status {
            contract.owner_payout_status = payout;
        }
        if let Some(paid) = self.installments_paid {
            contract.installments_paid = Some(paid);
        }
    }
}
