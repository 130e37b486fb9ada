//! 合同到期提醒服务
//!
//! 周期性扫描合同集合，对临近到期的租赁合同生成提醒通知，
//! 并依据已有通知去重，避免同一房源重复提醒。

use crate::estate::contract::models::ContractStatus;
use crate::estate::notification::api::NotificationApi;
use crate::estate::notification::models::{Notification, NotificationKind};
use crate::estate::store::DomainStore;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 提醒阈值（剩余天数，严格相等才触发）
///
/// 检查当天恰好落在阈值上才会提醒；某个阈值日未运行检查则该档提醒跳过。
pub const EXPIRY_THRESHOLD_DAYS: [i64; 3] = [30, 15, 7];

/// 到期提醒文案标记（去重扫描依据此子串判断是否已提醒过）
pub const EXPIRING_MARKER: &str = "即将到期";

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// 合同到期提醒器
///
/// 只读合同与通知集合，只写新通知，不回写合同。
pub struct ContractExpiryNotifier {
    store: Arc<DomainStore>,
    api: NotificationApi,
}

impl ContractExpiryNotifier {
    pub fn new(store: Arc<DomainStore>, api: NotificationApi) -> Self {
        Self { store, api }
    }

    /// 计算剩余天数（向上取整，不足一天按一天计）
    pub fn days_until(end_ms: i64, now_ms: i64) -> i64 {
        ((end_ms - now_ms) as f64 / DAY_MS as f64).ceil() as i64
    }

    /// 以当前时间执行一次检查
    pub async fn run_once(&self) -> usize {
        self.run_once_at(chrono::Utc::now().timestamp_millis()).await
    }

    /// 以指定时间执行一次检查，返回本次新生成的提醒数
    pub async fn run_once_at(&self, now_ms: i64) -> usize {
        let contracts = self.store.contracts();
        info!("[Expiry] 🔄 开始到期检查，合同数: {}", contracts.len());

        let mut raised = 0usize;
        for contract in contracts.iter() {
            if contract.status != ContractStatus::Active {
                continue;
            }
            let Some(end_ms) = contract.end_date else {
                continue;
            };

            let days_left = Self::days_until(end_ms, now_ms);
            if !EXPIRY_THRESHOLD_DAYS.contains(&days_left) {
                debug!(
                    "[Expiry]   合同 {} 剩余 {} 天，不在提醒阈值上",
                    contract.contract_id, days_left
                );
                continue;
            }

            // 去重：已存在包含该房源标题与到期标记的合同通知则跳过
            let already_raised = self.store.notifications().iter().any(|n| {
                n.kind == NotificationKind::Contract
                    && n.message.contains(&contract.property_title)
                    && n.message.contains(EXPIRING_MARKER)
            });
            if already_raised {
                debug!(
                    "[Expiry]   合同 {} ({}) 已提醒过，跳过",
                    contract.contract_id, contract.property_title
                );
                continue;
            }

            info!(
                "[Expiry] 🔔 合同 {} ({}) 剩余 {} 天，生成到期提醒",
                contract.contract_id, contract.property_title, days_left
            );

            let notification = Notification {
                notification_id: Uuid::new_v4().to_string(),
                kind: NotificationKind::Contract,
                message: format!(
                    "{} 的租约{}，剩余 {} 天",
                    contract.property_title, EXPIRING_MARKER, days_left
                ),
                timestamp: now_ms,
                read: false,
            };
            self.store.push_notification_front(notification);
            raised += 1;

            // 远端创建失败不重试也不回滚本地通知，下个阈值日再由检查补偿
            if let Err(e) = self
                .api
                .create_contract_notification(
                    &contract.contract_id,
                    &contract.property_title,
                    EXPIRING_MARKER,
                )
                .await
            {
                warn!("[Expiry] ⚠️ 到期提醒远端创建失败: {e:#}");
            }
        }

        info!("[Expiry] ✅ 到期检查完成，本次新提醒: {}", raised);
        raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estate::contract::models::{Contract, ContractType, PaymentStatus};

    fn unreachable_api() -> NotificationApi {
        // 端口 9（discard）无服务监听，远端写入会快速失败并被忽略
        NotificationApi::new(reqwest::Client::new(), "http://127.0.0.1:9".to_string())
    }

    fn rental_contract(id: &str, title: &str, end_ms: Option<i64>) -> Contract {
        Contract {
            contract_id: id.to_string(),
            property_id: format!("p-{}", id),
            property_title: title.to_string(),
            property_cover: String::new(),
            contract_type: ContractType::Rent,
            status: ContractStatus::Active,
            client_id: String::new(),
            client_name: String::new(),
            client_phone: String::new(),
            owner_id: String::new(),
            owner_name: String::new(),
            owner_phone: String::new(),
            value: 6000.0,
            commission_rate: 10.0,
            due_day: 5,
            start_date: 0,
            end_date: end_ms,
            next_payment_status: PaymentStatus::Pending,
            last_payment_date: String::new(),
            owner_payout_status: PaymentStatus::Pending,
            installments_total: None,
            installments_paid: None,
        }
    }

    #[test]
    fn test_days_until_rounds_up() {
        // 剩 29 天半，按 30 天计
        assert_eq!(
            ContractExpiryNotifier::days_until(DAY_MS * 30 - DAY_MS / 2, 0),
            30
        );
        assert_eq!(ContractExpiryNotifier::days_until(DAY_MS * 30, 0), 30);
        assert_eq!(ContractExpiryNotifier::days_until(DAY_MS * 30 + 1, 0), 31);
    }

    #[tokio::test]
    async fn test_raises_once_and_dedups_same_day() {
        let store = Arc::new(DomainStore::new());
        store.replace_contracts(vec![rental_contract(
            "c1",
            "滨江花园 2301",
            Some(DAY_MS * 30),
        )]);
        let notifier = ContractExpiryNotifier::new(store.clone(), unreachable_api());

        assert_eq!(notifier.run_once_at(0).await, 1);
        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("滨江花园 2301"));
        assert!(notifications[0].message.contains(EXPIRING_MARKER));
        assert_eq!(notifications[0].kind, NotificationKind::Contract);

        // 同一天再跑一次，不应产生新的提醒
        assert_eq!(notifier.run_once_at(0).await, 0);
        assert_eq!(store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_strict_threshold_skips_between_days() {
        let store = Arc::new(DomainStore::new());
        let end_ms = DAY_MS * 16;
        store.replace_contracts(vec![rental_contract("c1", "金桂苑 502", Some(end_ms))]);
        let notifier = ContractExpiryNotifier::new(store.clone(), unreachable_api());

        // 剩 16 天不在阈值上
        assert_eq!(notifier.run_once_at(0).await, 0);
        // 两天后剩 14 天，15 天档已错过，同样不提醒
        assert_eq!(notifier.run_once_at(DAY_MS * 2).await, 0);
        assert!(store.notifications().is_empty());

        // 再过 7 天恰好剩 7 天，触发提醒
        assert_eq!(notifier.run_once_at(DAY_MS * 9).await, 1);
    }

    #[tokio::test]
    async fn test_ignores_completed_and_undated_contracts() {
        let store = Arc::new(DomainStore::new());
        let mut completed = rental_contract("c1", "已完成合同", Some(DAY_MS * 30));
        completed.status = ContractStatus::Completed;
        store.replace_contracts(vec![
            completed,
            rental_contract("c2", "无到期日合同", None),
        ]);
        let notifier = ContractExpiryNotifier::new(store.clone(), unreachable_api());

        assert_eq!(notifier.run_once_at(0).await, 0);
        assert!(store.notifications().is_empty());
    }
}
