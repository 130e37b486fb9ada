//! 领域数据中心
//!
//! 持有房源、合同、用户、会话、通知五个集合的内存权威副本。
//! 读取接口对外公开；变更接口为 crate 内可见，外部只能经由
//! `EstateClient` 的处理函数间接修改，视图层不允许直接写集合。

use crate::estate::contract::models::{Contract, ContractPatch, ContractStatus, PaymentStatus};
use crate::estate::conversation::models::{ChatMessage, Conversation, ConversationMeta, MessageSender};
use crate::estate::notification::models::Notification;
use crate::estate::property::models::{Property, PropertyPatch, PropertyStatus};
use crate::estate::user::models::User;
use std::sync::RwLock;
use tracing::debug;

/// 房源状态统计（仪表盘用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyStatusCounts {
    pub available: usize,
    pub rented: usize,
    pub sold: usize,
}

/// 领域数据中心
///
/// 锁只在集合操作期间持有，绝不跨 await 持锁。
#[derive(Default)]
pub struct DomainStore {
    properties: RwLock<Vec<Property>>,
    contracts: RwLock<Vec<Contract>>,
    users: RwLock<Vec<User>>,
    conversations: RwLock<Vec<Conversation>>,
    notifications: RwLock<Vec<Notification>>,
}

impl DomainStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 读取接口 ==========

    pub fn properties(&self) -> Vec<Property> {
        self.properties.read().unwrap().clone()
    }

    pub fn property_by_id(&self, property_id: &str) -> Option<Property> {
        self.properties
            .read()
            .unwrap()
            .iter()
            .find(|p| p.property_id == property_id)
            .cloned()
    }

    pub fn contracts(&self) -> Vec<Contract> {
        self.contracts.read().unwrap().clone()
    }

    pub fn contract_by_id(&self, contract_id: &str) -> Option<Contract> {
        self.contracts
            .read()
            .unwrap()
            .iter()
            .find(|c| c.contract_id == contract_id)
            .cloned()
    }

    pub fn users(&self) -> Vec<User> {
        self.users.read().unwrap().clone()
    }

    pub fn user_by_id(&self, user_id: &str) -> Option<User> {
        self.users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.user_id == user_id)
            .cloned()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.conversations.read().unwrap().clone()
    }

    pub fn conversation_by_id(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations
            .read()
            .unwrap()
            .iter()
            .find(|c| c.conversation_id == conversation_id)
            .cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.read().unwrap().clone()
    }

    // ========== 派生视图 ==========

    /// 房源状态统计
    pub fn property_status_counts(&self) -> PropertyStatusCounts {
        let properties = self.properties.read().unwrap();
        let mut counts = PropertyStatusCounts::default();
        for p in properties.iter() {
            match p.status {
                PropertyStatus::Available => counts.available += 1,
                PropertyStatus::Rented => counts.rented += 1,
                PropertyStatus::Sold => counts.sold += 1,
            }
        }
        counts
    }

    /// 总未读消息数（所有会话未读数之和）
    pub fn total_unread_message_count(&self) -> i32 {
        self.conversations
            .read()
            .unwrap()
            .iter()
            .map(|c| c.unread_count)
            .sum()
    }

    /// 未读通知数
    pub fn unread_notification_count(&self) -> i32 {
        self.notifications
            .read()
            .unwrap()
            .iter()
            .filter(|n| !n.read)
            .count() as i32
    }

    /// 履约中合同的佣金收入合计（金额 × 佣金比例）
    pub fn commission_income(&self) -> f64 {
        self.contracts
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.status == ContractStatus::Active)
            .map(|c| c.value * c.commission_rate / 100.0)
            .sum()
    }

    /// 待收款的履约中合同（财务页列表）
    pub fn pending_payment_contracts(&self) -> Vec<Contract> {
        self.contracts
            .read()
            .unwrap()
            .iter()
            .filter(|c| {
                c.status == ContractStatus::Active
                    && c.next_payment_status == PaymentStatus::Pending
            })
            .cloned()
            .collect()
    }

    /// 某用户收藏的房源列表
    pub fn favorites_of(&self, user_id: &str) -> Vec<Property> {
        let Some(user) = self.user_by_id(user_id) else {
            return Vec::new();
        };
        let properties = self.properties.read().unwrap();
        user.favorites
            .iter()
            .filter_map(|id| properties.iter().find(|p| &p.property_id == id).cloned())
            .collect()
    }

    // ========== 变更接口（crate 内可见） ==========

    pub(crate) fn replace_properties(&self, properties: Vec<Property>) {
        debug!("[Store] 替换房源集合，共 {} 条", properties.len());
        *self.properties.write().unwrap() = properties;
    }

    pub(crate) fn insert_property_front(&self, property: Property) {
        self.properties.write().unwrap().insert(0, property);
    }

    /// 按 ID 合并部分更新，返回是否命中（ID 唯一，至多一条命中）
    pub(crate) fn merge_property(&self, property_id: &str, patch: &PropertyPatch) -> bool {
        let mut properties = self.properties.write().unwrap();
        match properties.iter_mut().find(|p| p.property_id == property_id) {
            Some(property) => {
                patch.apply_to(property);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_property(&self, property_id: &str) -> bool {
        let mut properties = self.properties.write().unwrap();
        let before = properties.len();
        properties.retain(|p| p.property_id != property_id);
        properties.len() != before
    }

    pub(crate) fn replace_contracts(&self, contracts: Vec<Contract>) {
        debug!("[Store] 替换合同集合，共 {} 条", contracts.len());
        *self.contracts.write().unwrap() = contracts;
    }

    pub(crate) fn insert_contract_front(&self, contract: Contract) {
        self.contracts.write().unwrap().insert(0, contract);
    }

    pub(crate) fn merge_contract(&self, contract_id: &str, patch: &ContractPatch) -> bool {
        let mut contracts = self.contracts.write().unwrap();
        match contracts.iter_mut().find(|c| c.contract_id == contract_id) {
            Some(contract) => {
                patch.apply_to(contract);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_contract(&self, contract_id: &str) -> bool {
        let mut contracts = self.contracts.write().unwrap();
        let before = contracts.len();
        contracts.retain(|c| c.contract_id != contract_id);
        contracts.len() != before
    }

    pub(crate) fn replace_users(&self, users: Vec<User>) {
        debug!("[Store] 替换用户集合，共 {} 条", users.len());
        *self.users.write().unwrap() = users;
    }

    pub(crate) fn set_user_favorites(&self, user_id: &str, favorites: Vec<String>) {
        let mut users = self.users.write().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.user_id == user_id) {
            user.favorites = favorites;
        }
    }

    pub(crate) fn replace_conversations(&self, conversations: Vec<Conversation>) {
        debug!("[Store] 替换会话集合，共 {} 条", conversations.len());
        *self.conversations.write().unwrap() = conversations;
    }

    /// 追加消息并 upsert 会话（不存在则新建，存在则更新冗余字段）
    ///
    /// 终端用户发来的消息计入未读数；经纪人发出的不计。
    pub(crate) fn apply_message(
        &self,
        conversation_id: &str,
        message: ChatMessage,
        meta: &ConversationMeta,
    ) {
        let mut conversations = self.conversations.write().unwrap();
        let now_ms = chrono::Utc::now().timestamp_millis();
        match conversations
            .iter_mut()
            .find(|c| c.conversation_id == conversation_id)
        {
            Some(conversation) => {
                conversation.user_name = meta.user_name.clone();
                conversation.avatar_url = meta.avatar_url.clone();
                conversation.role = meta.role;
                conversation.last_message = message.text.clone();
                conversation.last_message_time = now_ms;
                if message.sender == MessageSender::User {
                    conversation.unread_count += 1;
                }
                conversation.messages.push(message);
            }
            None => {
                let unread = if message.sender == MessageSender::User { 1 } else { 0 };
                conversations.insert(
                    0,
                    Conversation {
                        conversation_id: conversation_id.to_string(),
                        user_name: meta.user_name.clone(),
                        avatar_url: meta.avatar_url.clone(),
                        role: meta.role,
                        last_message: message.text.clone(),
                        last_message_time: now_ms,
                        unread_count: unread,
                        messages: vec![message],
                    },
                );
            }
        }
    }

    pub(crate) fn mark_conversation_read(&self, conversation_id: &str) -> bool {
        let mut conversations = self.conversations.write().unwrap();
        match conversations
            .iter_mut()
            .find(|c| c.conversation_id == conversation_id)
        {
            Some(conversation) => {
                conversation.unread_count = 0;
                for message in conversation.messages.iter_mut() {
                    message.read = true;
                }
                true
            }
            None => false,
        }
    }

    pub(crate) fn replace_notifications(&self, notifications: Vec<Notification>) {
        debug!("[Store] 替换通知集合，共 {} 条", notifications.len());
        *self.notifications.write().unwrap() = notifications;
    }

    pub(crate) fn push_notification_front(&self, notification: Notification) {
        self.notifications.write().unwrap().insert(0, notification);
    }

    pub(crate) fn mark_notification_read(&self, notification_id: &str) -> bool {
        let mut notifications = self.notifications.write().unwrap();
        match notifications
            .iter_mut()
            .find(|n| n.notification_id == notification_id)
        {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn mark_all_notifications_read(&self) {
        for notification in self.notifications.write().unwrap().iter_mut() {
            notification.read = true;
        }
    }

    pub(crate) fn clear_notifications(&self) {
        self.notifications.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estate::contract::models::ContractType;
    use crate::estate::notification::models::NotificationKind;
    use crate::estate::user::models::UserRole;

    fn property(id: &str, status: PropertyStatus) -> Property {
        Property {
            property_id: id.to_string(),
            title: format!("测试房源 {}", id),
            status,
            owner_id: "o1".to_string(),
            cover_url: String::new(),
            price: 5000.0,
            location: String::new(),
            created_at: 0,
        }
    }

    fn contract(id: &str, status: ContractStatus, payment: PaymentStatus) -> Contract {
        Contract {
            contract_id: id.to_string(),
            property_id: "p1".to_string(),
            property_title: "测试房源".to_string(),
            property_cover: String::new(),
            contract_type: ContractType::Rent,
            status,
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
            end_date: None,
            next_payment_status: payment,
            last_payment_date: String::new(),
            owner_payout_status: PaymentStatus::Pending,
            installments_total: None,
            installments_paid: None,
        }
    }

    #[test]
    fn test_property_status_counts() {
        let store = DomainStore::new();
        store.replace_properties(vec![
            property("p1", PropertyStatus::Available),
            property("p2", PropertyStatus::Rented),
            property("p3", PropertyStatus::Rented),
            property("p4", PropertyStatus::Sold),
        ]);
        let counts = store.property_status_counts();
        assert_eq!(counts.available, 1);
        assert_eq!(counts.rented, 2);
        assert_eq!(counts.sold, 1);
    }

    #[test]
    fn test_merge_property_misses_unknown_id() {
        let store = DomainStore::new();
        store.replace_properties(vec![property("p1", PropertyStatus::Available)]);
        let patch = PropertyPatch {
            status: Some(PropertyStatus::Sold),
            ..Default::default()
        };
        assert!(!store.merge_property("p999", &patch));
        assert_eq!(
            store.property_by_id("p1").unwrap().status,
            PropertyStatus::Available
        );
    }

    #[test]
    fn test_commission_income_counts_active_only() {
        let store = DomainStore::new();
        store.replace_contracts(vec![
            contract("c1", ContractStatus::Active, PaymentStatus::Pending),
            contract("c2", ContractStatus::Completed, PaymentStatus::Paid),
        ]);
        // 6000 × 10% = 600，已完成合同不计
        assert_eq!(store.commission_income(), 600.0);
        assert_eq!(store.pending_payment_contracts().len(), 1);
    }

    #[test]
    fn test_apply_message_creates_then_updates_conversation() {
        let store = DomainStore::new();
        let meta = ConversationMeta {
            user_name: "张先生".to_string(),
            avatar_url: String::new(),
            role: UserRole::Client,
        };
        store.apply_message(
            "u100",
            ChatMessage {
                message_id: "m1".to_string(),
                sender: MessageSender::User,
                text: "这套房子还在吗？".to_string(),
                time: "10:00".to_string(),
                read: false,
            },
            &meta,
        );
        store.apply_message(
            "u100",
            ChatMessage {
                message_id: "m2".to_string(),
                sender: MessageSender::Agent,
                text: "在的，欢迎预约看房".to_string(),
                time: "10:01".to_string(),
                read: true,
            },
            &meta,
        );

        let conversations = store.conversations();
        assert_eq!(conversations.len(), 1);
        let conv = &conversations[0];
        assert_eq!(conv.conversation_id, "u100");
        assert_eq!(conv.messages.len(), 2);
        // 只有终端用户的消息计入未读
        assert_eq!(conv.unread_count, 1);
        assert_eq!(conv.last_message, "在的，欢迎预约看房");

        assert!(store.mark_conversation_read("u100"));
        assert_eq!(store.total_unread_message_count(), 0);
    }

    #[test]
    fn test_notification_read_flags() {
        let store = DomainStore::new();
        store.replace_notifications(vec![
            Notification {
                notification_id: "n1".to_string(),
                kind: NotificationKind::Lead,
                message: "新线索".to_string(),
                timestamp: 2,
                read: false,
            },
            Notification {
                notification_id: "n2".to_string(),
                kind: NotificationKind::System,
                message: "系统".to_string(),
                timestamp: 1,
                read: false,
            },
        ]);
        assert_eq!(store.unread_notification_count(), 2);
        assert!(store.mark_notification_read("n1"));
        assert_eq!(store.unread_notification_count(), 1);
        store.mark_all_notifications_read();
        assert_eq!(store.unread_notification_count(), 0);
        store.clear_notifications();
        assert!(store.notifications().is_empty());
    }
}
