use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 载荷校验错误
///
/// 每个变体对应一种具体的拒绝原因，批量接口会将其逐项上报而不是中断整批。
#[derive(Error, Debug, Clone, PartialEq, Eq, utoipa::ToSchema)]
pub enum ValidationError {
    /// 缺少必填字段
    #[error("缺少必填字段: {0}")]
    MissingField(String),

    /// URL 格式无效（严格策略下拒绝）
    #[error("无效的 URL: {0}")]
    InvalidUrl(String),

    /// 文本超过长度上限
    #[error("文本过长（上限 {max} 字符）")]
    TooLong {
        /// 允许的最大字符数
        max: usize,
    },

    /// 邮箱格式无效
    #[error("无效的邮箱地址")]
    InvalidEmail,

    /// 缺少电话号码
    #[error("缺少电话号码")]
    MissingPhone,

    /// 缺少 WiFi SSID
    #[error("缺少 WiFi SSID")]
    MissingSsid,

    /// vCard 至少需要姓或名之一
    #[error("缺少姓名（firstName/lastName 至少填写一项）")]
    MissingName,

    /// 未知的载荷类型
    #[error("不支持的载荷类型: {0}")]
    UnsupportedType(String),
}

impl ValidationError {
    /// 稳定的原因码，供批量结果与 ProblemDetails 程序化处理。
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "MISSING_FIELD",
            ValidationError::InvalidUrl(_) => "INVALID_URL",
            ValidationError::TooLong { .. } => "TOO_LONG",
            ValidationError::InvalidEmail => "INVALID_EMAIL",
            ValidationError::MissingPhone => "MISSING_PHONE",
            ValidationError::MissingSsid => "MISSING_SSID",
            ValidationError::MissingName => "MISSING_NAME",
            ValidationError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
        }
    }
}

/// 应用统一错误类型
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// 载荷校验错误
    #[error("载荷校验错误: {0}")]
    Validation(#[from] ValidationError),

    /// 规范化后的载荷为空（或仅含空白字符）
    #[error("载荷为空")]
    EmptyPayload,

    /// Logo 超过大小上限
    #[error("Logo 过大: {size} 字节（上限 {limit} 字节）")]
    LogoTooLarge {
        /// 实际字节数
        size: usize,
        /// 配置的上限
        limit: usize,
    },

    /// Logo 无法解码为图片
    #[error("Logo 解码失败: {0}")]
    InvalidLogo(String),

    /// SVG 输出不支持 Logo 合成
    #[error("SVG 输出不支持 Logo 合成")]
    LogoUnsupported,

    /// 批量请求为空
    #[error("批量请求为空")]
    EmptyBatch,

    /// 批量请求超过条数上限
    #[error("批量条数过多: {len}（上限 {max}）")]
    BatchTooLarge {
        /// 实际条数
        len: usize,
        /// 配置的上限
        max: usize,
    },

    /// 渲染选项非法（尺寸为零、颜色无法解析等）
    #[error("渲染选项非法: {0}")]
    InvalidOptions(String),

    /// 外部二维码编码器失败（不重试，原样上报）
    #[error("二维码编码失败: {0}")]
    Encoding(String),

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),

    /// 内部服务器错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// RFC7807 风格的错误响应（Problem Details）。
///
/// 设计目标：
/// - 让所有 API 错误返回结构化 JSON，便于 SDK/调用方稳定处理
/// - 与 OpenAPI 一致（content-type = application/problem+json）
/// - 允许在不破坏主结构的前提下扩展字段（如 requestId）
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// 问题类型（URI）。若无更细分的类型，可使用 about:blank。
    #[serde(rename = "type")]
    #[schema(example = "about:blank")]
    pub type_url: String,

    /// 简短标题，用于概括错误。
    #[schema(example = "Validation Failed")]
    pub title: String,

    /// HTTP 状态码（与响应 status 一致）。
    #[schema(example = 422)]
    pub status: u16,

    /// 人类可读的详细信息（尽量稳定，不建议依赖解析）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// 稳定的错误码，用于程序化处理。
    #[schema(example = "VALIDATION_FAILED")]
    pub code: String,

    /// 校验失败时的具体原因码（如 MISSING_SSID）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// 可选：请求追踪 ID（由 request-id middleware 回填）。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyPayload => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LogoTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InvalidLogo(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LogoUnsupported => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::EmptyBatch => StatusCode::BAD_REQUEST,
            AppError::BatchTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidOptions(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn stable_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::EmptyPayload => "EMPTY_PAYLOAD",
            AppError::LogoTooLarge { .. } => "LOGO_TOO_LARGE",
            AppError::InvalidLogo(_) => "LOGO_INVALID",
            AppError::LogoUnsupported => "LOGO_UNSUPPORTED",
            AppError::EmptyBatch => "BATCH_EMPTY",
            AppError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            AppError::InvalidOptions(_) => "OPTIONS_INVALID",
            AppError::Encoding(_) => "ENCODING_FAILED",
            AppError::Json(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::PAYLOAD_TOO_LARGE => "Payload Too Large",
            StatusCode::UNPROCESSABLE_ENTITY => "Validation Failed",
            StatusCode::INTERNAL_SERVER_ERROR => "Internal Server Error",
            _ => "Error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let title = self.title().to_string();
        let code = self.stable_code().to_string();
        let detail = Some(self.to_string());

        // 仅校验错误附带具体原因码，方便调用方区分 MISSING_SSID / INVALID_URL 等。
        let reason = match &self {
            AppError::Validation(v) => Some(v.reason().to_string()),
            _ => None,
        };

        let problem = ProblemDetails {
            type_url: "about:blank".to_string(),
            title,
            status: status.as_u16(),
            detail,
            code,
            reason,
            request_id: crate::request_id::current_request_id(),
        };

        let mut res = Json(problem).into_response();
        *res.status_mut() = status;
        res.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<qrcode::types::QrError> for AppError {
    fn from(err: qrcode::types::QrError) -> Self {
        AppError::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, ValidationError};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn validation_error_maps_to_unprocessable_entity() {
        let err = AppError::Validation(ValidationError::MissingSsid);
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            res.headers()
                .get(axum::http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
            Some("application/problem+json")
        );
    }

    #[test]
    fn validation_reason_codes_are_stable() {
        assert_eq!(ValidationError::MissingSsid.reason(), "MISSING_SSID");
        assert_eq!(
            ValidationError::InvalidUrl("not a url".to_string()).reason(),
            "INVALID_URL"
        );
        assert_eq!(ValidationError::TooLong { max: 2000 }.reason(), "TOO_LONG");
    }

    #[test]
    fn batch_too_large_maps_to_bad_request() {
        let err = AppError::BatchTooLarge { len: 51, max: 50 };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
