use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AppError;
use crate::features::payload::{self, PayloadFields, PayloadType, ValidationPolicy};
use crate::state::AppState;

use super::batch::{self, BatchItem, BatchResult};
use super::composer;
use super::encoder;
use super::types::{OutputFormat, RenderOptions, build_encode_request};

/// 单个二维码生成请求体
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct GenerateRequest {
    /// 载荷类型标签
    #[serde(rename = "type")]
    #[schema(example = "url")]
    pub payload_type: String,
    /// 类型对应的原始字段
    pub data: PayloadFields,
    /// 渲染选项（缺省全部取默认值）
    #[serde(default)]
    pub options: RenderOptions,
    /// 可选 Logo，base64 编码（允许携带 data URL 前缀），仅 PNG 输出有效
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
}

/// 载荷预览请求体（宽松策略）
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PreviewRequest {
    /// 载荷类型标签
    #[serde(rename = "type")]
    #[schema(example = "url")]
    pub payload_type: String,
    /// 类型对应的原始字段
    pub data: PayloadFields,
}

/// 载荷预览响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PreviewResponse {
    /// 规范化后的可编码载荷字符串
    #[schema(example = "https://example.com")]
    pub payload: String,
}

/// 批量生成请求体
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchGenerateRequest {
    /// 待生成的条目（1..=50）
    pub items: Vec<BatchItem>,
    /// 整批共用的渲染选项（输出固定为 PNG）
    #[serde(default)]
    pub options: RenderOptions,
}

/// 批量生成响应
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchGenerateResponse {
    pub results: Vec<BatchResult>,
}

/// 解析请求中的 base64 Logo 字段，容忍 `data:image/png;base64,` 前缀。
fn decode_logo_field(raw: &str) -> Result<Vec<u8>, AppError> {
    let encoded = raw
        .rsplit_once("base64,")
        .map(|(_, tail)| tail)
        .unwrap_or(raw);
    base64::prelude::BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::InvalidLogo(format!("base64 解码失败: {e}")))
}

/// 生成图片响应：附带下载文件名与禁止缓存的响应头（输出含时间戳文件名，不宜被中间层缓存）。
fn image_response(bytes: Bytes, format: OutputFormat) -> Response {
    let filename = format!(
        "qrcode-{}.{}",
        Utc::now().timestamp_millis(),
        format.extension()
    );
    let mut res = bytes.into_response();
    let headers = res.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    res
}

/// 单请求渲染管线：严格校验 → 格式化 → 构建请求 → 限流渲染（→ Logo 合成）。
///
/// 无 Logo 的输出是输入的确定性函数，命中缓存时跳过渲染。
async fn render_pipeline(
    state: &AppState,
    payload_type: &str,
    data: &PayloadFields,
    options: RenderOptions,
    logo: Option<Vec<u8>>,
) -> Result<(Bytes, OutputFormat), AppError> {
    let limits = &state.config.limits;
    let ty: PayloadType = payload_type.parse()?;
    let encoded = payload::validate_and_format(ty, data, ValidationPolicy::Strict, limits)?;
    let request = build_encode_request(encoded, options, logo, limits)?;
    let format = request.options.format;

    let cacheable = state.config.render.cache_enabled && request.logo.is_none();
    let cache_key = request.options.cache_key(&request.payload);
    if cacheable && let Some(bytes) = state.render_cache.get(&cache_key).await {
        debug!("渲染缓存命中: {} 字节", bytes.len());
        return Ok((bytes, format));
    }

    let permit = state
        .render_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| AppError::Internal(format!("渲染许可获取失败: {e}")))?;

    let bytes: Bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AppError> {
        let _permit = permit;
        match request.options.format {
            OutputFormat::Svg => {
                Ok(encoder::render_svg(&request.payload, &request.options)?.into_bytes())
            }
            OutputFormat::Png => {
                let img = encoder::render_raster(&request.payload, &request.options)?;
                let img = match &request.logo {
                    Some(logo) => composer::compose_logo(&img, logo, request.options.size)?,
                    None => img,
                };
                encoder::encode_png(&img)
            }
        }
    })
    .await
    .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))??
    .into();

    if cacheable {
        state.render_cache.insert(cache_key, bytes.clone()).await;
    }
    Ok((bytes, format))
}

#[utoipa::path(
    post,
    path = "/qr/generate",
    summary = "生成二维码",
    description = "按类型校验并规范化载荷后渲染二维码。PNG 输出可携带 base64 Logo 居中合成；SVG 输出不支持 Logo。响应为图片字节并附下载文件名。",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "图片字节（PNG 或 SVG）"),
        (status = 400, description = "请求格式错误", body = AppError),
        (status = 413, description = "Logo 超过大小上限", body = AppError),
        (status = 422, description = "载荷校验失败", body = AppError)
    ),
    tag = "QR"
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let logo = req.logo.as_deref().map(decode_logo_field).transpose()?;
    let (bytes, format) =
        render_pipeline(&state, &req.payload_type, &req.data, req.options, logo).await?;
    Ok(image_response(bytes, format))
}

#[utoipa::path(
    post,
    path = "/qr/generate-svg",
    summary = "生成 SVG 二维码",
    description = "与 /qr/generate 相同的管线，输出强制为 SVG（忽略选项中的 format）。",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "SVG 文本"),
        (status = 422, description = "载荷校验失败", body = AppError)
    ),
    tag = "QR"
)]
pub async fn generate_svg(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let options = RenderOptions {
        format: OutputFormat::Svg,
        ..req.options
    };
    let (bytes, format) =
        render_pipeline(&state, &req.payload_type, &req.data, options, None).await?;
    Ok(image_response(bytes, format))
}

#[utoipa::path(
    post,
    path = "/qr/preview",
    summary = "预览规范化载荷",
    description = "宽松策略下校验并格式化，返回将被编码的载荷字符串（URL 缺少协议时自动补全 https://）。供交互端实时预览使用。",
    request_body = PreviewRequest,
    responses(
        (status = 200, description = "规范化载荷", body = PreviewResponse),
        (status = 422, description = "载荷校验失败", body = AppError)
    ),
    tag = "QR"
)]
pub async fn preview(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let ty: PayloadType = req.payload_type.parse()?;
    let encoded = payload::validate_and_format(
        ty,
        &req.data,
        ValidationPolicy::Lenient,
        &state.config.limits,
    )?;
    Ok(Json(PreviewResponse {
        payload: encoded.into_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/qr/batch-generate",
    summary = "批量生成二维码",
    description = "最多 50 条，逐项独立成败，结果按输入顺序返回；成功项为 PNG 的 data URL。",
    request_body = BatchGenerateRequest,
    responses(
        (status = 200, description = "逐项结果", body = BatchGenerateResponse),
        (status = 400, description = "批量为空或超限", body = AppError)
    ),
    tag = "QR"
)]
pub async fn batch_generate(
    State(state): State<AppState>,
    Json(req): Json<BatchGenerateRequest>,
) -> Result<Json<BatchGenerateResponse>, AppError> {
    let results = batch::batch_generate(
        req.items,
        req.options,
        &state.config.limits,
        state.render_semaphore.clone(),
    )
    .await?;
    Ok(Json(BatchGenerateResponse { results }))
}

pub fn create_qr_router() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/generate", post(generate))
        .route("/generate-svg", post(generate_svg))
        .route("/preview", post(preview))
        .route("/batch-generate", post(batch_generate))
}
