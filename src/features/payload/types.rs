use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 支持的载荷类型（闭集）
///
/// 从请求携带的字符串标签解析。解析失败产生 `UnsupportedType`，
/// 批量接口借此实现逐项失败而不是整体反序列化失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    Url,
    Text,
    Email,
    Phone,
    Sms,
    Wifi,
    Vcard,
    Whatsapp,
}

impl FromStr for PayloadType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "url" => Ok(PayloadType::Url),
            "text" => Ok(PayloadType::Text),
            "email" => Ok(PayloadType::Email),
            "phone" => Ok(PayloadType::Phone),
            "sms" => Ok(PayloadType::Sms),
            "wifi" => Ok(PayloadType::Wifi),
            "vcard" => Ok(PayloadType::Vcard),
            "whatsapp" => Ok(PayloadType::Whatsapp),
            other => Err(ValidationError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PayloadType::Url => "url",
            PayloadType::Text => "text",
            PayloadType::Email => "email",
            PayloadType::Phone => "phone",
            PayloadType::Sms => "sms",
            PayloadType::Wifi => "wifi",
            PayloadType::Vcard => "vcard",
            PayloadType::Whatsapp => "whatsapp",
        };
        f.write_str(tag)
    }
}

/// 原始字段集合
///
/// 所有类型共用一个扁平结构，具体哪些字段生效由 `PayloadType` 决定
/// （与前端表单的提交格式保持一致）。
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PayloadFields {
    /// url 类型：目标地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// text 类型：任意文本
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// email 类型：收件地址
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// email 类型：主题（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// email 类型：正文（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// phone/sms/whatsapp/vcard 类型：电话号码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// sms/whatsapp 类型：预填消息（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// wifi 类型：网络名称
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    /// wifi 类型：密码（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// wifi 类型：加密方式（默认 WPA）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<String>,
    /// wifi 类型：是否隐藏网络（默认 false）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    /// vcard 类型：名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// vcard 类型：姓
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// vcard 类型：组织（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// vcard 类型：职位（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// vcard 类型：地址（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PayloadFields {
    /// 判断某个 Option<String> 字段是否"有内容"（存在且非空）。
    pub(crate) fn present(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// 校验策略
///
/// - `Lenient`：交互/预览路径，URL 缺少协议时由格式化器自动补全 `https://`
/// - `Strict`：服务端 API 与批量路径，格式不合法直接拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    Lenient,
    Strict,
}

/// 规范化后的可编码载荷字符串
///
/// 对同一 (类型, 字段) 输入总是产出字节一致的结果，是缓存键与测试断言的基础。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(transparent)]
pub struct EncodedPayload(String);

impl EncodedPayload {
    pub fn new(payload: impl Into<String>) -> Self {
        Self(payload.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 是否为空或仅含空白字符（请求构建器据此拒绝）。
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
