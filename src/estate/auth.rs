use crate::estate::user::models::User;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// 登录态监听器回调接口
///
/// 每次登录态变化（登录、登出、服务端踢出）都会回调一次，
/// 参数为当前用户的 JSON 字符串，未登录时为 "null"
#[async_trait]
pub trait AuthListener: Send + Sync {
    async fn on_auth_state_changed(&self, user_json: String);
}

/// 空实现（默认监听器）
pub struct EmptyAuthListener;

#[async_trait]
impl AuthListener for EmptyAuthListener {
    async fn on_auth_state_changed(&self, _user_json: String) {}
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub password: String,
    pub platform: i32,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub data: Option<LoginData>,
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub user: User,
}

pub async fn login_async(
    api_base_url: &str,
    phone_number: String,
    password: String,
    platform: i32,
) -> Result<LoginResponse, String> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();

    let login_req = LoginRequest {
        phone_number,
        password,
        platform,
    };

    let url = format!("{}/account/login", api_base_url);

    info!("[Auth] 🔐 正在登录...");
    debug!("[Auth]   URL: {}", url);
    debug!("[Auth]   手机号: {}", login_req.phone_number);
    debug!("[Auth]   OperationID: {}", operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .json(&login_req)
        .send()
        .await
        .map_err(|e| format!("请求失败: {}", e))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| format!("读取响应失败: {}", e))?;

    if !status.is_success() {
        return Err(format!("HTTP 错误 {}: {}", status, text));
    }

    debug!("[Auth] ✅ 登录响应: {}", text);

    let login_resp: LoginResponse = serde_json::from_str(&text)
        .map_err(|e| format!("解析响应失败: {}，原始响应: {}", e, text))?;

    Ok(login_resp)
}

/// 登出（终止服务端会话）
pub async fn logout_async(api_base_url: &str, token: &str) -> Result<(), String> {
    let client = reqwest::Client::new();
    let operation_id = Uuid::new_v4().to_string();
    let url = format!("{}/account/logout", api_base_url);

    info!("[Auth] 🚪 正在登出...");
    debug!("[Auth]   URL: {}, OperationID: {}", url, operation_id);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("operationID", &operation_id)
        .header("token", token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .map_err(|e| format!("请求失败: {}", e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(format!("HTTP 错误 {}: {}", status, text));
    }

    info!("[Auth] ✅ 登出成功");
    Ok(())
}
