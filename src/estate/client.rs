//! 安居客户端核心实现模块
//!
//! 此模块包含客户端的核心协调逻辑：所有变更先同步写入内存集合，
//! 再发起对应的远端写入；服务端经 WebSocket 推送的全量快照
//! 整体替换本地集合并触发监听器回调。

use crate::estate::auth::{self, AuthListener, EmptyAuthListener};
use crate::estate::contract::api::ContractApi;
use crate::estate::contract::models::{
    Contract, ContractPatch, ContractStatus, ContractType, PaymentStatus,
};
use crate::estate::contract::service::ContractExpiryNotifier;
use crate::estate::conversation::api::ConversationApi;
use crate::estate::conversation::listener::{ConversationListener, EmptyConversationListener};
use crate::estate::conversation::models::{ChatMessage, Conversation, ConversationMeta, MessageSender};
use crate::estate::notification::api::NotificationApi;
use crate::estate::notification::listener::{EmptyNotificationListener, NotificationListener};
use crate::estate::notification::models::{Notification, NotificationKind};
use crate::estate::property::api::PropertyApi;
use crate::estate::property::models::{Property, PropertyPatch, PropertyStatus};
use crate::estate::serialization::{decompress_gzip, generate_msg_id};
use crate::estate::store::DomainStore;
use crate::estate::types::{push_event, ConnectAckResp, PushFrame};
use crate::estate::user::api::UserApi;
use crate::estate::user::models::{User, UserRole};
use anyhow::{Context, Result};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::MaybeTlsStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// WebSocket 写入端类型别名
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

/// WebSocket 读取端类型别名
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// 到期检查周期（24 小时）
const EXPIRY_CHECK_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// 用户 ID
    pub user_id: String,
    /// 认证 token
    pub token: String,
    /// 平台 ID
    pub platform_id: i32,
    /// WebSocket 服务器 URL（快照推送）
    pub ws_url: String,
    /// 压缩方式，例如 "gzip" 或空字符串表示不压缩
    pub compression: String,
    /// HTTP API 基础地址
    pub api_base_url: String,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(user_id: String, token: String, platform_id: i32) -> Self {
        Self {
            user_id,
            token,
            platform_id,
            ws_url: "ws://localhost:10001".to_string(),
            compression: "gzip".to_string(),
            api_base_url: "http://localhost:10002".to_string(),
        }
    }
}

/// 当前激活的页面视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    #[default]
    Dashboard,
    Properties,
    PropertyDetail,
    Contracts,
    Crm,
    Chat,
}

/// 视图层瞬态选择状态
///
/// 只保存"选中了哪个"，不持有实体副本；导航离开即失效。
#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub active_view: ActiveView,
    pub selected_property_id: Option<String>,
}

/// 安居客户端
///
/// 核心领域状态协调逻辑：集合的唯一变更入口
#[derive(Clone)]
pub struct EstateClient {
    pub(crate) config: ClientConfig,
    store: Arc<DomainStore>,
    property_api: PropertyApi,
    contract_api: ContractApi,
    user_api: UserApi,
    conversation_api: ConversationApi,
    notification_api: NotificationApi,
    writer: Option<Arc<Mutex<WsWriter>>>,
    // 当前登录用户（服务端 auth 推送或本地登录/登出驱动）
    current_user: Arc<std::sync::RwLock<Option<User>>>,
    // 视图层瞬态状态
    ui: Arc<std::sync::Mutex<UiState>>,
    // 会话监听器（可由调用方注册）
    conversation_listener: Arc<dyn ConversationListener>,
    // 通知监听器（可由调用方注册）
    notification_listener: Arc<dyn NotificationListener>,
    // 登录态监听器（可由调用方注册）
    auth_listener: Arc<dyn AuthListener>,
    // 到期检查定时任务（仅管理员登录且合同已加载时存在）
    expiry_task: Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
    // 订阅相关后台任务（心跳、消息处理），断开时统一取消
    bg_tasks: Arc<std::sync::Mutex<Vec<JoinHandle<()>>>>,
}

impl EstateClient {
    /// 创建新的客户端
    /// - `config`: 客户端配置
    pub fn new(config: ClientConfig) -> Result<Self> {
        // 创建带认证拦截器的 HTTP 客户端（token 通过 default_headers 自动添加）
        let http_client = reqwest::ClientBuilder::new()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::HeaderName::from_static("token"),
                    reqwest::header::HeaderValue::from_str(&config.token)
                        .context("无效的 token")?,
                );
                headers
            })
            .build()
            .context("创建 HTTP 客户端失败")?;

        let api_base_url = config.api_base_url.clone();
        Ok(Self {
            config,
            store: Arc::new(DomainStore::new()),
            property_api: PropertyApi::new(http_client.clone(), api_base_url.clone()),
            contract_api: ContractApi::new(http_client.clone(), api_base_url.clone()),
            user_api: UserApi::new(http_client.clone(), api_base_url.clone()),
            conversation_api: ConversationApi::new(http_client.clone(), api_base_url.clone()),
            notification_api: NotificationApi::new(http_client, api_base_url),
            writer: None,
            current_user: Arc::new(std::sync::RwLock::new(None)),
            ui: Arc::new(std::sync::Mutex::new(UiState::default())),
            conversation_listener: Arc::new(EmptyConversationListener),
            notification_listener: Arc::new(EmptyNotificationListener),
            auth_listener: Arc::new(EmptyAuthListener),
            expiry_task: Arc::new(std::sync::Mutex::new(None)),
            bg_tasks: Arc::new(std::sync::Mutex::new(Vec::new())),
        })
    }

    /// 注册会话监听器（应在 connect 之前调用）
    pub fn set_conversation_listener(&mut self, listener: Arc<dyn ConversationListener>) {
        self.conversation_listener = listener;
    }

    /// 注册通知监听器（应在 connect 之前调用）
    pub fn set_notification_listener(&mut self, listener: Arc<dyn NotificationListener>) {
        self.notification_listener = listener;
    }

    /// 注册登录态监听器（应在 connect 之前调用）
    pub fn set_auth_listener(&mut self, listener: Arc<dyn AuthListener>) {
        self.auth_listener = listener;
    }

    /// 领域数据中心（只读访问；变更必须走客户端处理函数）
    pub fn store(&self) -> Arc<DomainStore> {
        self.store.clone()
    }

    /// 当前登录用户
    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().unwrap().clone()
    }

    /// 视图层瞬态状态快照
    pub fn ui_state(&self) -> UiState {
        self.ui.lock().unwrap().clone()
    }

    /// 切换激活视图
    pub fn set_active_view(&self, view: ActiveView) {
        self.ui.lock().unwrap().active_view = view;
    }

    /// 设置当前登录用户并联动：触发登录态回调、评估到期检查任务的启停条件
    pub fn set_current_user(&self, user: Option<User>) {
        let user_json =
            serde_json::to_string(&user).unwrap_or_else(|_| "null".to_string());
        info!(
            "[Client] 👤 登录态变更: {}",
            user.as_ref()
                .map(|u| u.user_id.as_str())
                .unwrap_or("(未登录)")
        );
        *self.current_user.write().unwrap() = user;

        let listener = self.auth_listener.clone();
        tokio::spawn(async move {
            listener.on_auth_state_changed(user_json).await;
        });

        self.maybe_start_expiry_notifier();
    }

    /// 登出：停止到期检查、清空登录态并通知远端
    pub async fn logout(&self) {
        info!("[Client] 🚪 登出");
        self.set_current_user(None);
        if let Err(e) = auth::logout_async(&self.config.api_base_url, &self.config.token).await {
            warn!("[Client] ⚠️ 远端登出失败: {}", e);
        }
    }

    // ========== 初始加载 ==========

    /// 拉取房源、合同、用户三个集合的全量数据并载入本地
    pub async fn bootstrap(&self) -> Result<()> {
        info!("[Client] 🔄 开始初始数据加载");

        let properties = self
            .property_api
            .get_all_properties()
            .await
            .context("拉取房源失败")?;
        self.store.replace_properties(properties.properties);

        let contracts = self
            .contract_api
            .get_all_contracts()
            .await
            .context("拉取合同失败")?;
        self.store.replace_contracts(contracts.contracts);

        let users = self.user_api.get_all_users().await.context("拉取用户失败")?;
        self.store.replace_users(users);

        info!(
            "[Client] ✅ 初始数据加载完成 - 房源: {}, 合同: {}, 用户: {}",
            self.store.properties().len(),
            self.store.contracts().len(),
            self.store.users().len()
        );

        // 合同就绪后重新评估到期检查任务启停条件
        self.maybe_start_expiry_notifier();
        Ok(())
    }

    // ========== WebSocket 订阅 ==========

    /// 构建 WebSocket 连接 URL
    fn build_url(&self, operation_id: &str) -> String {
        let compression_param = if self.config.compression.is_empty() {
            String::new()
        } else {
            format!("&compression={}", self.config.compression)
        };

        format!(
            "{}/?token={}&userID={}&platformID={}&operationID={}{}",
            self.config.ws_url,
            self.config.token,
            self.config.user_id,
            self.config.platform_id,
            operation_id,
            compression_param
        )
    }

    /// 连接到推送服务器并在内部启动快照处理
    pub async fn connect(&mut self) -> Result<()> {
        let operation_id = format!("{}", chrono::Utc::now().timestamp_millis());
        let url = self.build_url(&operation_id);

        info!(
            "[Client] 🔗 连接推送服务器 (user={}, platform={})",
            self.config.user_id, self.config.platform_id
        );

        let (ws_stream, response) = connect_async(&url).await?;
        info!(
            "[Client] ✅ WebSocket 连接成功, 状态: {}",
            response.status()
        );

        let (write, mut read) = ws_stream.split();
        let writer = Arc::new(Mutex::new(write));
        self.writer = Some(writer.clone());

        // 等待连接握手响应
        if let Some(Ok(WsMessage::Text(text))) = read.next().await {
            debug!("[Client] 📥 WebSocket 握手响应: {}", text);
            match serde_json::from_str::<ConnectAckResp>(&text) {
                Ok(resp) => {
                    if resp.err_code == 0 {
                        info!("[Client] ✅ 服务器连接鉴权成功");
                    } else {
                        let error_msg = if !resp.err_dlt.is_empty() {
                            format!("{} (详情: {})", resp.err_msg, resp.err_dlt)
                        } else {
                            resp.err_msg.clone()
                        };
                        error!(
                            "[Client] ❌ WebSocket 连接失败，错误码: {}, 错误信息: {}",
                            resp.err_code, error_msg
                        );
                        return Err(anyhow::anyhow!(
                            "WebSocket 连接失败，错误码: {}, 错误信息: {}",
                            resp.err_code,
                            error_msg
                        ));
                    }
                }
                Err(e) => {
                    error!(
                        "[Client] ❌ WebSocket 握手响应解析失败: {}, 原始响应: {}",
                        e, text
                    );
                    return Err(anyhow::anyhow!(
                        "WebSocket 握手响应解析失败: {}, 原始响应: {}",
                        e,
                        text
                    ));
                }
            }
        } else {
            error!("[Client] ❌ 未收到 WebSocket 握手响应");
            return Err(anyhow::anyhow!("未收到 WebSocket 握手响应"));
        }

        info!("[Client] 💓 启动心跳");
        info!("[Client] 📥 开始监听服务器快照推送");

        // 启动心跳
        let writer_for_heartbeat = writer.clone();
        let heartbeat = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(25));
            loop {
                ticker.tick().await;
                let mut w = writer_for_heartbeat.lock().await;
                if w.send(WsMessage::Ping(vec![])).await.is_err() {
                    break;
                }
            }
        });

        // 在内部启动快照处理任务
        let client = self.clone();
        let reader_task = tokio::spawn(async move {
            if let Err(e) = client.handle_messages(read).await {
                error!("[Client] 快照处理错误: {}", e);
            }
        });

        let mut tasks = self.bg_tasks.lock().unwrap();
        tasks.push(heartbeat);
        tasks.push(reader_task);

        Ok(())
    }

    /// 断开订阅：取消后台任务与到期检查
    pub fn disconnect(&mut self) {
        info!("[Client] 🔌 断开订阅");
        for task in self.bg_tasks.lock().unwrap().drain(..) {
            task.abort();
        }
        if let Some(task) = self.expiry_task.lock().unwrap().take() {
            task.abort();
        }
        self.writer = None;
    }

    /// 快照推送处理循环
    async fn handle_messages(&self, mut read: WsReader) -> Result<()> {
        while let Some(message) = read.next().await {
            match message {
                Ok(WsMessage::Text(text)) => {
                    self.dispatch_frame_json(text.as_bytes()).await;
                }
                Ok(WsMessage::Binary(data)) => {
                    // compression=gzip 时二进制帧为 gzip 压缩的 JSON
                    let payload = if self.config.compression == "gzip" {
                        match decompress_gzip(&data) {
                            Ok(decompressed) => decompressed,
                            Err(e) => {
                                error!("[Client] ❌ 推送帧解压失败: {}", e);
                                continue;
                            }
                        }
                    } else {
                        data
                    };
                    self.dispatch_frame_json(&payload).await;
                }
                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {}
                Ok(WsMessage::Close(frame)) => {
                    info!("[Client] 🔌 服务器关闭连接: {:?}", frame);
                    break;
                }
                Ok(other) => {
                    debug!("[Client] 忽略帧: {:?}", other);
                }
                Err(e) => {
                    error!("[Client] ❌ WebSocket 读取错误: {}", e);
                    break;
                }
            }
        }
        Ok(())
    }

    async fn dispatch_frame_json(&self, payload: &[u8]) {
        match serde_json::from_slice::<PushFrame>(payload) {
            Ok(frame) => self.handle_push_frame(frame).await,
            Err(e) => {
                error!(
                    "[Client] ❌ 推送帧解析失败: {}, 原始内容: {}",
                    e,
                    String::from_utf8_lossy(payload)
                );
            }
        }
    }

    /// 处理一条推送帧（集合全量快照，整体替换本地副本）
    async fn handle_push_frame(&self, frame: PushFrame) {
        match frame.event.as_str() {
            push_event::CONVERSATIONS => {
                match serde_json::from_value::<Vec<Conversation>>(frame.data) {
                    Ok(conversations) => {
                        info!(
                            "[Client] 📥 收到会话快照，会话数: {}",
                            conversations.len()
                        );
                        let json = serde_json::to_string(&conversations)
                            .unwrap_or_else(|_| "[]".to_string());
                        self.store.replace_conversations(conversations);
                        self.conversation_listener
                            .on_conversations_snapshot(json)
                            .await;
                        let total = self.store.total_unread_message_count();
                        self.conversation_listener
                            .on_total_unread_message_count_changed(total)
                            .await;
                    }
                    Err(e) => error!("[Client] ❌ 会话快照反序列化失败: {}", e),
                }
            }
            push_event::NOTIFICATIONS => {
                match serde_json::from_value::<Vec<Notification>>(frame.data) {
                    Ok(mut notifications) => {
                        info!(
                            "[Client] 📥 收到通知快照，通知数: {}",
                            notifications.len()
                        );
                        // 展示顺序由客户端保证：按时间降序（最新在前）
                        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                        let json = serde_json::to_string(&notifications)
                            .unwrap_or_else(|_| "[]".to_string());
                        self.store.replace_notifications(notifications);
                        self.notification_listener
                            .on_notifications_snapshot(json)
                            .await;
                        let unread = self.store.unread_notification_count();
                        self.notification_listener
                            .on_unread_notification_count_changed(unread)
                            .await;
                    }
                    Err(e) => error!("[Client] ❌ 通知快照反序列化失败: {}", e),
                }
            }
            push_event::AUTH => match serde_json::from_value::<Option<User>>(frame.data) {
                Ok(user) => self.set_current_user(user),
                Err(e) => error!("[Client] ❌ 登录态推送反序列化失败: {}", e),
            },
            other => {
                warn!("[Client] ⚠️ 未处理的推送事件类型: {}", other);
            }
        }
    }

    // ========== 房源变更入口 ==========

    /// 新增房源：先写本地集合（最新在前），再发远端
    pub async fn add_property(&self, property: Property) {
        info!(
            "[Client] 🏠 新增房源: {} ({})",
            property.title, property.property_id
        );
        self.store.insert_property_front(property.clone());
        if let Err(e) = self.property_api.add_property(&property).await {
            warn!("[Client] ⚠️ 房源远端创建失败，本地乐观状态保留: {:#}", e);
        }
    }

    /// 部分更新房源：本地合并后用同一份载荷发远端
    pub async fn update_property(&self, property_id: &str, patch: PropertyPatch) {
        if !self.store.merge_property(property_id, &patch) {
            warn!("[Client] ⚠️ 更新的房源不存在: {}", property_id);
            return;
        }
        if let Err(e) = self.property_api.update_property(property_id, &patch).await {
            warn!("[Client] ⚠️ 房源远端更新失败，本地乐观状态保留: {:#}", e);
        }
    }

    /// 删除房源（确认弹窗由视图层负责）
    pub async fn delete_property(&self, property_id: &str) {
        if !self.store.remove_property(property_id) {
            warn!("[Client] ⚠️ 删除的房源不存在: {}", property_id);
            return;
        }
        info!("[Client] 🗑️ 删除房源: {}", property_id);
        if let Err(e) = self.property_api.delete_property(property_id).await {
            warn!("[Client] ⚠️ 房源远端删除失败，本地乐观状态保留: {:#}", e);
        }
    }

    // ========== 合同变更入口 ==========

    /// 新增合同
    ///
    /// 关联房源必须存在；签约联动房源状态：租赁 → 已出租，买卖 → 已售出
    /// （无论房源之前处于什么状态）。
    pub async fn add_contract(&self, contract: Contract) -> Result<()> {
        if self.store.property_by_id(&contract.property_id).is_none() {
            anyhow::bail!("关联房源不存在: {}", contract.property_id);
        }

        info!(
            "[Client] 📄 新增合同: {} (房源: {})",
            contract.contract_id, contract.property_title
        );
        self.store.insert_contract_front(contract.clone());

        // 签约联动房源状态
        let new_status = match contract.contract_type {
            ContractType::Rent => PropertyStatus::Rented,
            ContractType::Sale => PropertyStatus::Sold,
        };
        self.update_property(
            &contract.property_id,
            PropertyPatch {
                status: Some(new_status),
                ..Default::default()
            },
        )
        .await;

        if let Err(e) = self.contract_api.add_contract(&contract).await {
            warn!("[Client] ⚠️ 合同远端创建失败，本地乐观状态保留: {:#}", e);
        }

        // 合同集合非空后评估到期检查任务
        self.maybe_start_expiry_notifier();
        Ok(())
    }

    /// 部分更新合同
    pub async fn update_contract(&self, contract_id: &str, patch: ContractPatch) {
        if !self.store.merge_contract(contract_id, &patch) {
            warn!("[Client] ⚠️ 更新的合同不存在: {}", contract_id);
            return;
        }
        if let Err(e) = self.contract_api.update_contract(contract_id, &patch).await {
            warn!("[Client] ⚠️ 合同远端更新失败，本地乐观状态保留: {:#}", e);
        }
    }

    /// 删除合同（确认弹窗由视图层负责）
    pub async fn delete_contract(&self, contract_id: &str) {
        if !self.store.remove_contract(contract_id) {
            warn!("[Client] ⚠️ 删除的合同不存在: {}", contract_id);
            return;
        }
        info!("[Client] 🗑️ 删除合同: {}", contract_id);
        if let Err(e) = self.contract_api.delete_contract(contract_id).await {
            warn!("[Client] ⚠️ 合同远端删除失败，本地乐观状态保留: {:#}", e);
        }
    }

    /// 标记本期已收款
    ///
    /// 租赁合同：更新付款状态与收款日期；
    /// 买卖分期合同：已付分期数 +1（不超过分期总数），付满即完成。
    pub async fn mark_contract_paid(&self, contract_id: &str) -> Result<()> {
        let contract = self
            .store
            .contract_by_id(contract_id)
            .ok_or_else(|| anyhow::anyhow!("合同不存在: {}", contract_id))?;

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let mut patch = ContractPatch {
            next_payment_status: Some(PaymentStatus::Paid),
            last_payment_date: Some(today),
            ..Default::default()
        };

        if let Some(total) = contract.installments_total {
            let paid = contract.installments_paid.unwrap_or(0);
            let new_paid = (paid + 1).min(total);
            patch.installments_paid = Some(new_paid);
            if new_paid >= total {
                info!(
                    "[Client] 🎉 合同 {} 分期付清 ({}/{})，转为已完成",
                    contract_id, new_paid, total
                );
                patch.status = Some(ContractStatus::Completed);
            }
        }

        info!("[Client] 💰 标记收款: {}", contract_id);
        self.update_contract(contract_id, patch).await;
        Ok(())
    }

    /// 标记业主打款完成
    pub async fn mark_owner_payout(&self, contract_id: &str) -> Result<()> {
        if self.store.contract_by_id(contract_id).is_none() {
            anyhow::bail!("合同不存在: {}", contract_id);
        }
        info!("[Client] 💸 标记业主打款: {}", contract_id);
        self.update_contract(
            contract_id,
            ContractPatch {
                owner_payout_status: Some(PaymentStatus::Paid),
                ..Default::default()
            },
        )
        .await;
        Ok(())
    }

    // ========== 收藏 ==========

    /// 切换收藏（需要登录；未登录时返回错误，跳转登录由调用方负责）
    ///
    /// 本地先按"有则删、无则增"切换，远端返回服务端计算的集合后以其为准。
    pub async fn toggle_favorite(&self, property_id: &str) -> Result<Vec<String>> {
        let Some(user) = self.current_user() else {
            anyhow::bail!("收藏需要登录账号");
        };

        let mut favorites = user.favorites.clone();
        match favorites.iter().position(|p| p == property_id) {
            Some(pos) => {
                favorites.remove(pos);
                info!("[Client] 💔 取消收藏: {}", property_id);
            }
            None => {
                favorites.push(property_id.to_string());
                info!("[Client] ❤️ 收藏房源: {}", property_id);
            }
        }
        self.apply_favorites(&user.user_id, favorites.clone());

        match self.user_api.toggle_favorite(&user.user_id, property_id).await {
            Ok(server_favorites) => {
                // 以服务端计算结果为准
                self.apply_favorites(&user.user_id, server_favorites.clone());
                Ok(server_favorites)
            }
            Err(e) => {
                warn!("[Client] ⚠️ 收藏远端切换失败，保留本地结果: {:#}", e);
                Ok(favorites)
            }
        }
    }

    fn apply_favorites(&self, user_id: &str, favorites: Vec<String>) {
        self.store.set_user_favorites(user_id, favorites.clone());
        let mut current = self.current_user.write().unwrap();
        if let Some(user) = current.as_mut() {
            if user.user_id == user_id {
                user.favorites = favorites;
            }
        }
    }

    // ========== 消息 ==========

    /// 发送消息并返回会话 ID
    ///
    /// 目标用户缺省为当前登录用户，都没有时落到匿名标识。
    /// 本地先落集合，再单次远端调用同时追加消息与 upsert 会话元数据；
    /// 终端用户发来的消息额外产生一条线索通知。
    pub async fn send_message(
        &self,
        text: &str,
        sender: MessageSender,
        target_user_id: Option<&str>,
    ) -> String {
        let current = self.current_user();
        let target_id = target_user_id
            .map(str::to_string)
            .or_else(|| current.as_ref().map(|u| u.user_id.clone()))
            .unwrap_or_else(|| "anonymous".to_string());
        // 会话 ID 即目标用户 ID 的字符串形式
        let conversation_id = target_id.clone();

        let message = ChatMessage {
            message_id: generate_msg_id(&target_id),
            sender,
            text: text.to_string(),
            time: chrono::Local::now().format("%H:%M").to_string(),
            read: sender == MessageSender::Agent,
        };

        // 会话元数据兜底链：目标用户档案 → 当前登录用户 → 访客默认值
        let meta = self
            .store
            .user_by_id(&target_id)
            .map(|u| ConversationMeta {
                user_name: u.name,
                avatar_url: u.avatar_url,
                role: u.role,
            })
            .or_else(|| {
                current.as_ref().map(|u| ConversationMeta {
                    user_name: u.name.clone(),
                    avatar_url: u.avatar_url.clone(),
                    role: u.role,
                })
            })
            .unwrap_or_else(ConversationMeta::visitor);

        info!(
            "[Client] 💬 发送消息: conversationID={}, sender={:?}",
            conversation_id, sender
        );
        self.store
            .apply_message(&conversation_id, message.clone(), &meta);

        if let Err(e) = self
            .conversation_api
            .save_message(&conversation_id, &message, &meta)
            .await
        {
            warn!("[Client] ⚠️ 消息远端保存失败，本地乐观状态保留: {:#}", e);
        }

        // 终端用户来消息即产生线索
        if sender == MessageSender::User {
            let notification = Notification {
                notification_id: Uuid::new_v4().to_string(),
                kind: NotificationKind::Lead,
                message: format!("新线索：{} 发来了咨询消息", meta.user_name),
                timestamp: chrono::Utc::now().timestamp_millis(),
                read: false,
            };
            self.store.push_notification_front(notification);
            if let Err(e) = self
                .notification_api
                .create_lead_notification(&meta.user_name, None)
                .await
            {
                warn!("[Client] ⚠️ 线索通知远端创建失败: {:#}", e);
            }
        }

        conversation_id
    }

    /// 标记会话已读
    pub async fn mark_conversation_read(&self, conversation_id: &str) {
        if !self.store.mark_conversation_read(conversation_id) {
            warn!("[Client] ⚠️ 标记已读的会话不存在: {}", conversation_id);
            return;
        }
        if let Err(e) = self.conversation_api.mark_read(conversation_id).await {
            warn!("[Client] ⚠️ 会话已读远端标记失败: {:#}", e);
        }
    }

    // ========== 通知 ==========

    /// 标记单条通知已读
    pub async fn mark_notification_read(&self, notification_id: &str) {
        if !self.store.mark_notification_read(notification_id) {
            warn!("[Client] ⚠️ 标记已读的通知不存在: {}", notification_id);
            return;
        }
        if let Err(e) = self.notification_api.mark_read(notification_id).await {
            warn!("[Client] ⚠️ 通知已读远端标记失败: {:#}", e);
        }
    }

    /// 全部标记已读
    pub async fn mark_all_notifications_read(&self) {
        self.store.mark_all_notifications_read();
        if let Err(e) = self.notification_api.mark_all_read().await {
            warn!("[Client] ⚠️ 通知全部已读远端标记失败: {:#}", e);
        }
    }

    /// 清空全部通知（确认弹窗由视图层负责）
    pub async fn clear_all_notifications(&self) {
        self.store.clear_notifications();
        if let Err(e) = self.notification_api.clear_all().await {
            warn!("[Client] ⚠️ 通知远端清空失败: {:#}", e);
        }
    }

    // ========== 深链接 ==========

    /// 解析落地页 query 中的房源 ID 并定位详情视图
    ///
    /// `id` 能解析为数字时按数字语义比较（"042" 与 "42" 视为同一房源），
    /// 否则按字符串精确匹配；缺失或未命中时静默保持当前视图。
    pub fn resolve_deep_link(&self, query: &str) -> Option<Property> {
        let raw = query
            .trim_start_matches('?')
            .split('&')
            .find_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                match (parts.next(), parts.next()) {
                    (Some("id"), Some(value)) if !value.is_empty() => Some(value.to_string()),
                    _ => None,
                }
            })?;

        let numeric = raw.parse::<i64>().ok();
        let found = self.store.properties().into_iter().find(|p| {
            if p.property_id == raw {
                return true;
            }
            match (numeric, p.property_id.parse::<i64>().ok()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        })?;

        info!(
            "[Client] 🔗 深链接定位房源: {} ({})",
            found.title, found.property_id
        );
        let mut ui = self.ui.lock().unwrap();
        ui.selected_property_id = Some(found.property_id.clone());
        ui.active_view = ActiveView::PropertyDetail;
        Some(found)
    }

    // ========== 到期检查任务 ==========

    /// 手动执行一次合同到期检查，返回新生成的提醒数
    pub async fn check_expiring_contracts(&self) -> usize {
        let notifier =
            ContractExpiryNotifier::new(self.store.clone(), self.notification_api.clone());
        notifier.run_once().await
    }

    /// 按启停条件管理到期检查定时任务
    ///
    /// 条件：管理员已登录且合同集合非空。满足时启动（立即跑一轮，
    /// 之后每 24 小时一轮）；不满足时取消已存在的任务。
    pub fn maybe_start_expiry_notifier(&self) {
        let is_admin = matches!(
            self.current_user().map(|u| u.role),
            Some(UserRole::Admin)
        );
        let has_contracts = !self.store.contracts().is_empty();

        let mut task_slot = self.expiry_task.lock().unwrap();
        if is_admin && has_contracts {
            if task_slot.is_some() {
                return;
            }
            info!("[Client] ⏰ 启动合同到期检查任务（每 24 小时）");
            let notifier =
                ContractExpiryNotifier::new(self.store.clone(), self.notification_api.clone());
            let handle = tokio::spawn(async move {
                let mut ticker = interval(Duration::from_secs(EXPIRY_CHECK_INTERVAL_SECS));
                loop {
                    ticker.tick().await;
                    let raised = notifier.run_once().await;
                    debug!("[Client] ⏰ 到期检查轮次结束，新提醒: {}", raised);
                }
            });
            *task_slot = Some(handle);
        } else if let Some(task) = task_slot.take() {
            info!("[Client] ⏹ 停止合同到期检查任务");
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estate::contract::service::EXPIRING_MARKER;
    use std::sync::Once;

    static INIT_LOGGER: Once = Once::new();

    fn init_test_logger() {
        INIT_LOGGER.call_once(|| {
            use tracing_subscriber::prelude::*;
            use tracing_subscriber::EnvFilter;

            // 测试中默认打开当前 crate 的 debug，关闭底层 HTTP 客户端的 debug 噪音
            let filter_layer = EnvFilter::new(
                "info,anju_sdk_core_rust=debug,hyper_util::client=info,reqwest=info",
            );

            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .with_test_writer();

            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt_layer)
                .init();
        });
    }

    // 端口 9（discard）无服务监听，所有远端写入快速失败并被忽略，
    // 正好用来验证本地乐观状态不回滚
    fn test_client() -> EstateClient {
        init_test_logger();
        let mut config = ClientConfig::new("admin-1".to_string(), "test-token".to_string(), 5);
        config.api_base_url = "http://127.0.0.1:9".to_string();
        config.ws_url = "ws://127.0.0.1:9".to_string();
        EstateClient::new(config).unwrap()
    }

    fn admin_user() -> User {
        User {
            user_id: "admin-1".to_string(),
            name: "王经理".to_string(),
            role: UserRole::Admin,
            phone: String::new(),
            avatar_url: String::new(),
            favorites: Vec::new(),
        }
    }

    fn property(id: &str, status: PropertyStatus) -> Property {
        Property {
            property_id: id.to_string(),
            title: format!("测试房源 {}", id),
            status,
            owner_id: "o1".to_string(),
            cover_url: String::new(),
            price: 6000.0,
            location: "测试区".to_string(),
            created_at: 0,
        }
    }

    fn rent_contract(id: &str, property_id: &str) -> Contract {
        Contract {
            contract_id: id.to_string(),
            property_id: property_id.to_string(),
            property_title: format!("测试房源 {}", property_id),
            property_cover: String::new(),
            contract_type: ContractType::Rent,
            status: ContractStatus::Active,
            client_id: "u100".to_string(),
            client_name: "张先生".to_string(),
            client_phone: String::new(),
            owner_id: "o1".to_string(),
            owner_name: "李业主".to_string(),
            owner_phone: String::new(),
            value: 2000.0,
            commission_rate: 10.0,
            due_day: 5,
            start_date: 0,
            end_date: None,
            next_payment_status: PaymentStatus::Pending,
            last_payment_date: String::new(),
            owner_payout_status: PaymentStatus::Pending,
            installments_total: None,
            installments_paid: None,
        }
    }

    #[tokio::test]
    async fn test_add_property_is_optimistic_without_rollback() {
        let client = test_client();
        client.add_property(property("p1", PropertyStatus::Available)).await;
        // 远端不可达，但本地集合已反映变更且不回滚
        let store = client.store();
        assert_eq!(store.properties().len(), 1);
        assert_eq!(store.properties()[0].property_id, "p1");
    }

    #[tokio::test]
    async fn test_add_property_prepends_newest_first() {
        let client = test_client();
        client.add_property(property("p1", PropertyStatus::Available)).await;
        client.add_property(property("p2", PropertyStatus::Available)).await;
        let ids: Vec<String> = client
            .store()
            .properties()
            .into_iter()
            .map(|p| p.property_id)
            .collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_rent_contract_cascades_property_to_rented() {
        let client = test_client();
        client.add_property(property("p1", PropertyStatus::Available)).await;
        client.add_contract(rent_contract("c1", "p1")).await.unwrap();
        assert_eq!(
            client.store().property_by_id("p1").unwrap().status,
            PropertyStatus::Rented
        );
    }

    #[tokio::test]
    async fn test_sale_contract_cascades_property_to_sold_regardless_of_prior_status() {
        let client = test_client();
        // 之前已是"已出租"，签买卖合同后仍然变为"已售出"
        client.add_property(property("p1", PropertyStatus::Rented)).await;
        let mut contract = rent_contract("c1", "p1");
        contract.contract_type = ContractType::Sale;
        client.add_contract(contract).await.unwrap();
        assert_eq!(
            client.store().property_by_id("p1").unwrap().status,
            PropertyStatus::Sold
        );
    }

    #[tokio::test]
    async fn test_add_contract_rejects_missing_property() {
        let client = test_client();
        let result = client.add_contract(rent_contract("c1", "p404")).await;
        assert!(result.is_err());
        assert!(client.store().contracts().is_empty());
    }

    #[tokio::test]
    async fn test_rent_payment_marking() {
        let client = test_client();
        client.add_property(property("p1", PropertyStatus::Available)).await;
        client.add_contract(rent_contract("c7", "p1")).await.unwrap();

        client.mark_contract_paid("c7").await.unwrap();

        let contract = client.store().contract_by_id("c7").unwrap();
        assert_eq!(contract.next_payment_status, PaymentStatus::Paid);
        assert_eq!(
            contract.last_payment_date,
            chrono::Utc::now().format("%Y-%m-%d").to_string()
        );
        // 租赁合同没有分期字段
        assert_eq!(contract.installments_paid, None);
        assert_eq!(contract.status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn test_installment_completion_on_exactly_nth_payment() {
        let client = test_client();
        client.add_property(property("p1", PropertyStatus::Available)).await;
        let mut contract = rent_contract("c1", "p1");
        contract.contract_type = ContractType::Sale;
        contract.installments_total = Some(3);
        contract.installments_paid = Some(0);
        client.add_contract(contract).await.unwrap();

        client.mark_contract_paid("c1").await.unwrap();
        client.mark_contract_paid("c1").await.unwrap();
        let mid = client.store().contract_by_id("c1").unwrap();
        assert_eq!(mid.installments_paid, Some(2));
        assert_eq!(mid.status, ContractStatus::Active);

        client.mark_contract_paid("c1").await.unwrap();
        let done = client.store().contract_by_id("c1").unwrap();
        assert_eq!(done.installments_paid, Some(3));
        assert_eq!(done.status, ContractStatus::Completed);

        // 多标一次也不会超过分期总数
        client.mark_contract_paid("c1").await.unwrap();
        assert_eq!(
            client.store().contract_by_id("c1").unwrap().installments_paid,
            Some(3)
        );
    }

    #[tokio::test]
    async fn test_favorite_toggle_pair_restores_original_set() {
        let client = test_client();
        let mut user = admin_user();
        user.favorites = vec!["p9".to_string()];
        client.store().replace_users(vec![user.clone()]);
        client.set_current_user(Some(user));

        let after_first = client.toggle_favorite("p1").await.unwrap();
        assert_eq!(after_first, vec!["p9".to_string(), "p1".to_string()]);

        let after_second = client.toggle_favorite("p1").await.unwrap();
        assert_eq!(after_second, vec!["p9".to_string()]);
        assert_eq!(
            client.current_user().unwrap().favorites,
            vec!["p9".to_string()]
        );
    }

    #[tokio::test]
    async fn test_favorite_toggle_requires_login() {
        let client = test_client();
        assert!(client.toggle_favorite("p1").await.is_err());
        assert!(client.store().users().is_empty());
    }

    #[tokio::test]
    async fn test_send_message_routes_to_current_user_conversation() {
        let client = test_client();
        let mut user = admin_user();
        user.user_id = "u42".to_string();
        user.role = UserRole::Client;
        user.name = "张先生".to_string();
        client.set_current_user(Some(user));

        let conversation_id = client
            .send_message("这套房子还在吗？", MessageSender::User, None)
            .await;
        assert_eq!(conversation_id, "u42");

        let conversations = client.store().conversations();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].conversation_id, "u42");
        assert_eq!(conversations[0].unread_count, 1);

        // 终端用户来消息产生一条线索通知
        let notifications = client.store().notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Lead);
        assert!(notifications[0].message.contains("张先生"));
    }

    #[tokio::test]
    async fn test_agent_message_is_read_and_raises_no_lead() {
        let client = test_client();
        client
            .send_message("您好，欢迎咨询", MessageSender::Agent, Some("u100"))
            .await;
        let conversations = client.store().conversations();
        assert_eq!(conversations.len(), 1);
        assert!(conversations[0].messages[0].read);
        assert_eq!(conversations[0].unread_count, 0);
        assert!(client.store().notifications().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_fallback_when_not_logged_in() {
        let client = test_client();
        let conversation_id = client
            .send_message("在吗", MessageSender::User, None)
            .await;
        assert_eq!(conversation_id, "anonymous");
        let conversations = client.store().conversations();
        assert_eq!(conversations[0].user_name, "访客");
    }

    #[tokio::test]
    async fn test_deep_link_numeric_coercion_and_miss() {
        let client = test_client();
        client.store().replace_properties(vec![
            property("42", PropertyStatus::Available),
            property("p-a", PropertyStatus::Available),
        ]);

        let found = client.resolve_deep_link("id=42");
        assert_eq!(found.unwrap().property_id, "42");
        let ui = client.ui_state();
        assert_eq!(ui.active_view, ActiveView::PropertyDetail);
        assert_eq!(ui.selected_property_id.as_deref(), Some("42"));

        // 未命中时静默保持当前视图
        client.set_active_view(ActiveView::Dashboard);
        assert!(client.resolve_deep_link("id=9999").is_none());
        assert_eq!(client.ui_state().active_view, ActiveView::Dashboard);

        // 字符串 ID 精确匹配，带 ? 前缀与其他参数
        let found = client.resolve_deep_link("?utm=share&id=p-a");
        assert_eq!(found.unwrap().property_id, "p-a");

        // 缺失 id 参数
        assert!(client.resolve_deep_link("utm=share").is_none());
    }

    #[tokio::test]
    async fn test_notification_snapshot_resorted_descending() {
        let client = test_client();
        let frame = PushFrame {
            event: push_event::NOTIFICATIONS.to_string(),
            data: serde_json::json!([
                {"notificationID": "n-old", "kind": "system", "message": "旧", "timestamp": 100, "read": true},
                {"notificationID": "n-new", "kind": "lead", "message": "新", "timestamp": 300, "read": false},
                {"notificationID": "n-mid", "kind": "contract", "message": "中", "timestamp": 200, "read": false}
            ]),
        };
        client.handle_push_frame(frame).await;

        let ids: Vec<String> = client
            .store()
            .notifications()
            .into_iter()
            .map(|n| n.notification_id)
            .collect();
        assert_eq!(ids, vec!["n-new", "n-mid", "n-old"]);
        assert_eq!(client.store().unread_notification_count(), 2);
    }

    #[tokio::test]
    async fn test_conversation_snapshot_replaces_store() {
        let client = test_client();
        // 先有一条本地会话，快照应整体替换而非合并
        client
            .send_message("本地消息", MessageSender::User, Some("u1"))
            .await;
        let frame = PushFrame {
            event: push_event::CONVERSATIONS.to_string(),
            data: serde_json::json!([
                {"conversationID": "u2", "userName": "刘女士", "unreadCount": 3},
                {"conversationID": "u3", "userName": "陈先生", "unreadCount": 1}
            ]),
        };
        client.handle_push_frame(frame).await;

        let conversations = client.store().conversations();
        assert_eq!(conversations.len(), 2);
        assert_eq!(client.store().total_unread_message_count(), 4);
    }

    #[tokio::test]
    async fn test_expiry_task_follows_activation_condition() {
        let client = test_client();
        // 无合同时即使管理员登录也不启动
        client.set_current_user(Some(admin_user()));
        assert!(client.expiry_task.lock().unwrap().is_none());

        // 合同加载后启动
        client.store().replace_contracts(vec![rent_contract("c1", "p1")]);
        client.maybe_start_expiry_notifier();
        assert!(client.expiry_task.lock().unwrap().is_some());

        // 登出后停止
        client.set_current_user(None);
        assert!(client.expiry_task.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expiry_check_raises_and_dedups() {
        let client = test_client();
        let day_ms = 24 * 60 * 60 * 1000i64;
        let mut contract = rent_contract("c1", "p1");
        contract.property_title = "滨江花园 2301".to_string();
        contract.end_date = Some(chrono::Utc::now().timestamp_millis() + day_ms * 30 - 1);
        client.store().replace_contracts(vec![contract]);

        assert_eq!(client.check_expiring_contracts().await, 1);
        let notifications = client.store().notifications();
        assert!(notifications[0].message.contains(EXPIRING_MARKER));

        // 同日再查去重
        assert_eq!(client.check_expiring_contracts().await, 0);
    }

    // 真机联调测试：需要本地起好 HTTP API 与推送服务后手动运行
    // cargo test run_estate_client -- --ignored --nocapture
    #[tokio::test]
    #[ignore]
    async fn run_estate_client() {
        init_test_logger();

        info!("🔐 正在登录获取 token...");
        let login_resp = match crate::estate::auth::login_async(
            "http://localhost:10002",
            "13800000001".to_string(),
            "123456".to_string(),
            5,
        )
        .await
        {
            Ok(resp) => {
                info!("✅ 登录成功！");
                resp
            }
            Err(e) => {
                tracing::error!("登录失败: {}", e);
                return;
            }
        };

        let Some(data) = login_resp.data else {
            tracing::error!("登录失败：服务器返回数据为空");
            return;
        };

        let config = ClientConfig::new(data.user.user_id.clone(), data.token, 5);
        let mut client = EstateClient::new(config).unwrap();

        // 设置会话监听器
        struct TestConversationListener;
        #[async_trait::async_trait]
        impl ConversationListener for TestConversationListener {
            async fn on_conversations_snapshot(&self, conversation_list: String) {
                info!("[回调/会话] 🔄 会话快照: {}", conversation_list);
            }

            async fn on_total_unread_message_count_changed(&self, total_unread_count: i32) {
                info!("[回调/会话] 📬 总未读消息数变更: {}", total_unread_count);
            }
        }
        client.set_conversation_listener(std::sync::Arc::new(TestConversationListener));

        // 设置通知监听器
        struct TestNotificationListener;
        #[async_trait::async_trait]
        impl NotificationListener for TestNotificationListener {
            async fn on_notifications_snapshot(&self, notification_list: String) {
                info!("[回调/通知] 🔔 通知快照: {}", notification_list);
            }

            async fn on_unread_notification_count_changed(&self, unread_count: i32) {
                info!("[回调/通知] 📬 未读通知数变更: {}", unread_count);
            }
        }
        client.set_notification_listener(std::sync::Arc::new(TestNotificationListener));

        // 连接到服务器（内部会自动启动快照处理）
        match client.connect().await {
            Ok(_) => {
                info!("✅ WebSocket 连接成功！");
            }
            Err(e) => {
                tracing::error!("连接失败: {}", e);
                return;
            }
        }

        client.set_current_user(Some(data.user));
        if let Err(e) = client.bootstrap().await {
            tracing::error!("初始数据加载失败: {:#}", e);
            return;
        }

        // 延迟 3 秒后发送测试消息，确保连接稳定
        let client_for_send = client.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            info!("📤 准备发送测试消息...");
            let conversation_id = client_for_send
                .send_message("Hello from Rust client!", MessageSender::Agent, Some("u100"))
                .await;
            info!("✅ 消息发送成功！conversationID={}", conversation_id);
        });

        // 监听 30 秒后退出
        tokio::time::sleep(Duration::from_secs(30)).await;
        client.logout().await;
        client.disconnect();
        info!("👋 测试结束");
    }

    #[tokio::test]
    async fn test_update_missing_entities_is_silent_noop() {
        let client = test_client();
        client
            .update_property(
                "p404",
                PropertyPatch {
                    status: Some(PropertyStatus::Sold),
                    ..Default::default()
                },
            )
            .await;
        client.delete_property("p404").await;
        client
            .update_contract(
                "c404",
                ContractPatch {
                    status: Some(ContractStatus::Completed),
                    ..Default::default()
                },
            )
            .await;
        assert!(client.store().properties().is_empty());
        assert!(client.store().contracts().is_empty());
        assert!(client.mark_contract_paid("c404").await.is_err());
    }
}
