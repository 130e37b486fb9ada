//! 安居 CLI 客户端（测试版）
//!
//! 非交互式 CLI，用于测试和展示后台管理功能
//! 启动时通过命令行参数指定账号，自动登录连接，只展示接收到的信息

use anju_sdk_core_rust::estate::auth::AuthListener;
use anju_sdk_core_rust::estate::client::{ClientConfig, EstateClient};
use anju_sdk_core_rust::estate::conversation::listener::ConversationListener;
use anju_sdk_core_rust::estate::notification::listener::NotificationListener;
use anju_sdk_core_rust::login_async;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

/// 安居 CLI 客户端
#[derive(Parser, Debug)]
#[command(name = "anju-cli")]
#[command(about = "安居 CLI 客户端 - 用于测试和展示后台管理功能", long_about = None)]
struct Args {
    /// 手机号（默认: 13800000001）
    #[arg(short, long, default_value = "13800000001")]
    phone: String,

    /// 密码
    #[arg(long, default_value = "123456")]
    password: String,

    /// HTTP API 基础地址
    #[arg(long, default_value = "http://localhost:10002")]
    api_url: String,

    /// WebSocket 推送服务器地址
    #[arg(long, default_value = "ws://localhost:10001")]
    ws_url: String,

    /// 落地页 query 字符串（例如 "id=42"，用于演示深链接定位）
    #[arg(long)]
    deep_link: Option<String>,

    /// 运行时长（秒），0 表示持续运行
    #[arg(short, long, default_value = "0")]
    duration: u64,

    /// 日志级别（默认: info,anju_sdk_core_rust=debug）
    #[arg(long, default_value = "info,anju_sdk_core_rust=debug")]
    log_level: String,
}

/// 初始化日志（同时输出到 stdout 和文件）
fn init_logger(log_level: &str) {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    // 创建日志文件（追加模式）
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("无法创建日志文件 debug.log");

    // 输出到 stdout（控制台），保留 ANSI 颜色代码用于终端显示
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码（文件不需要颜色）
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    info!("[CLI] 📝 日志已同时输出到控制台和文件: debug.log");
}

/// 设置监听器（输出所有接收到的信息）
fn setup_listeners(client: &mut EstateClient) {
    // 会话监听器
    struct CliConversationListener;
    #[async_trait::async_trait]
    impl ConversationListener for CliConversationListener {
        async fn on_conversations_snapshot(&self, conversation_list: String) {
            info!("[CLI/Conversation] 🔄 会话快照: {}", conversation_list);
        }

        async fn on_total_unread_message_count_changed(&self, total_unread_count: i32) {
            info!("[CLI/Conversation] 📬 总未读数: {}", total_unread_count);
        }
    }
    client.set_conversation_listener(Arc::new(CliConversationListener));

    // 通知监听器
    struct CliNotificationListener;
    #[async_trait::async_trait]
    impl NotificationListener for CliNotificationListener {
        async fn on_notifications_snapshot(&self, notification_list: String) {
            info!("[CLI/Notification] 🔔 通知快照: {}", notification_list);
        }

        async fn on_unread_notification_count_changed(&self, unread_count: i32) {
            info!("[CLI/Notification] 📬 未读通知数: {}", unread_count);
        }
    }
    client.set_notification_listener(Arc::new(CliNotificationListener));

    // 登录态监听器
    struct CliAuthListener;
    #[async_trait::async_trait]
    impl AuthListener for CliAuthListener {
        async fn on_auth_state_changed(&self, user_json: String) {
            if user_json == "null" {
                error!("[CLI/Auth] ⚠️ 登录态失效");
            } else {
                info!("[CLI/Auth] 👤 登录态变更: {}", user_json);
            }
        }
    }
    client.set_auth_listener(Arc::new(CliAuthListener));
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    init_logger(&args.log_level);

    info!("[CLI] 🚀 安居 CLI 客户端（测试模式）");
    info!("[CLI] 📱 手机号: {}", args.phone);
    info!("[CLI] ⏱️  运行时长: {} 秒（0=持续运行）", args.duration);

    // 登录
    info!("[CLI] 🔐 正在登录...");
    let platform = 5;

    let login_resp = login_async(&args.api_url, args.phone.clone(), args.password.clone(), platform)
        .await
        .map_err(|e| anyhow::anyhow!("登录失败: {}", e))?;

    let Some(data) = login_resp.data else {
        return Err(anyhow::anyhow!(
            "登录失败，错误码: {}, 错误信息: {}",
            login_resp.err_code,
            login_resp.err_msg
        ));
    };

    info!("[CLI] ✅ 登录成功！用户ID: {}", data.user.user_id);

    // 创建客户端
    let mut config = ClientConfig::new(data.user.user_id.clone(), data.token, platform);
    config.api_base_url = args.api_url.clone();
    config.ws_url = args.ws_url.clone();
    let mut client = EstateClient::new(config)?;

    // 设置监听器
    setup_listeners(&mut client);

    // 连接
    info!("[CLI] 🔗 正在连接服务器...");
    client
        .connect()
        .await
        .map_err(|e| anyhow::anyhow!("连接失败: {}", e))?;
    info!("[CLI] ✅ 连接成功！");

    // 登录态就位后拉取初始数据（管理员登录且合同就绪时会自动启动到期检查）
    client.set_current_user(Some(data.user));
    client.bootstrap().await?;

    // 显示初始信息
    let store = client.store();
    let counts = store.property_status_counts();
    info!(
        "[CLI] 🏠 房源（共 {} 套）: 在售/在租 {} | 已出租 {} | 已售出 {}",
        store.properties().len(),
        counts.available,
        counts.rented,
        counts.sold
    );
    info!(
        "[CLI] 📄 合同（共 {} 份），待收款 {} 份，佣金收入合计 {:.2} 元",
        store.contracts().len(),
        store.pending_payment_contracts().len(),
        store.commission_income()
    );
    for contract in store.pending_payment_contracts().iter().take(5) {
        info!(
            "[CLI]   - {} | {} | 每月 {} 日 | {:.2} 元",
            contract.contract_id, contract.property_title, contract.due_day, contract.value
        );
    }
    info!("[CLI] 👥 用户（共 {} 个）", store.users().len());

    // 演示深链接定位
    if let Some(query) = &args.deep_link {
        match client.resolve_deep_link(query) {
            Some(property) => info!(
                "[CLI] 🔗 深链接命中: {} ({})",
                property.title, property.property_id
            ),
            None => info!("[CLI] 🔗 深链接未命中，保持默认视图"),
        }
    }

    info!("[CLI] 📥 开始监听服务器快照推送...");
    info!("[CLI] 💡 提示：程序将持续运行并显示接收到的所有快照和事件");
    if args.duration > 0 {
        info!("[CLI] ⏰ {} 秒后自动退出", args.duration);
        sleep(Duration::from_secs(args.duration)).await;
        client.logout().await;
        client.disconnect();
        info!("[CLI] 👋 程序退出");
    } else {
        info!("[CLI] ⏰ 持续运行中，按 Ctrl+C 退出");
        // 持续运行直到被中断
        loop {
            sleep(Duration::from_secs(3600)).await;
        }
    }

    Ok(())
}
