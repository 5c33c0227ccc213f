use std::sync::Arc;

use base64::Engine;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::config::LimitsConfig;
use crate::error::AppError;
use crate::features::payload::{self, PayloadType, ValidationPolicy};
use crate::features::payload::PayloadFields;

use super::encoder;
use super::types::{OutputFormat, RenderOptions, build_encode_request};

/// 批量生成的单项请求
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchItem {
    /// 载荷类型标签（url/text/email/phone/sms/wifi/vcard/whatsapp）
    #[serde(rename = "type")]
    #[schema(example = "url")]
    pub payload_type: String,
    /// 类型对应的原始字段
    pub data: PayloadFields,
}

/// 批量生成的单项结果
///
/// `index` 对应输入顺序；单项失败不影响其余项。
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchResult {
    /// 输入序号（从 0 开始）
    pub index: usize,
    /// 是否成功
    pub success: bool,
    /// 成功时：PNG 的 data URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// 成功时：建议的下载文件名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// 失败时：人类可读的错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 失败时：稳定的原因码（如 MISSING_SSID）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BatchResult {
    fn success(index: usize, data_url: String) -> Self {
        Self {
            index,
            success: true,
            data: Some(data_url),
            filename: Some(format!("qrcode-{}.png", index + 1)),
            error: None,
            reason: None,
        }
    }

    fn failure(index: usize, err: &AppError) -> Self {
        let reason = match err {
            AppError::Validation(v) => v.reason().to_string(),
            other => other_reason(other).to_string(),
        };
        Self {
            index,
            success: false,
            data: None,
            filename: None,
            error: Some(err.to_string()),
            reason: Some(reason),
        }
    }
}

fn other_reason(err: &AppError) -> &'static str {
    match err {
        AppError::EmptyPayload => "EMPTY_PAYLOAD",
        AppError::Encoding(_) => "ENCODING_FAILED",
        AppError::InvalidOptions(_) => "OPTIONS_INVALID",
        _ => "INTERNAL_ERROR",
    }
}

/// 单项的完整管线：解析类型 → 严格校验 → 格式化 → 构建请求 → 栅格渲染 → data URL。
///
/// CPU 密集，放在阻塞线程池中执行。
fn generate_item(
    index: usize,
    item: BatchItem,
    options: RenderOptions,
    limits: &LimitsConfig,
) -> BatchResult {
    let run = || -> Result<String, AppError> {
        let ty: PayloadType = item.payload_type.parse()?;
        let encoded =
            payload::validate_and_format(ty, &item.data, ValidationPolicy::Strict, limits)?;
        let request = build_encode_request(encoded, options, None, limits)?;
        let img = encoder::render_raster(&request.payload, &request.options)?;
        let png = encoder::encode_png(&img)?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::prelude::BASE64_STANDARD.encode(png)
        ))
    };
    match run() {
        Ok(data_url) => BatchResult::success(index, data_url),
        Err(err) => BatchResult::failure(index, &err),
    }
}

/// 批量生成：整批共用一份渲染选项，逐项独立成败。
///
/// - 空批 → `EmptyBatch`，超限 → `BatchTooLarge`（两者都不产生任何结果）
/// - 各项经渲染信号量限流并发执行，结果按输入序号重组
/// - 批量输出固定为 PNG：选项中的 `format: svg` 被忽略（与历史行为一致）
pub async fn batch_generate(
    items: Vec<BatchItem>,
    options: RenderOptions,
    limits: &LimitsConfig,
    render_semaphore: Arc<Semaphore>,
) -> Result<Vec<BatchResult>, AppError> {
    if items.is_empty() {
        return Err(AppError::EmptyBatch);
    }
    if items.len() > limits.max_batch_items {
        return Err(AppError::BatchTooLarge {
            len: items.len(),
            max: limits.max_batch_items,
        });
    }

    let options = RenderOptions {
        format: OutputFormat::Png,
        ..options
    };

    let mut handles = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let options = options.clone();
        let limits = limits.clone();
        let semaphore = render_semaphore.clone();
        handles.push(tokio::spawn(async move {
            // 信号量关闭只会发生在进程退出路径，此时直接不限流执行
            let _permit = semaphore.acquire_owned().await.ok();
            tokio::task::spawn_blocking(move || generate_item(index, item, options, &limits))
                .await
                .unwrap_or_else(|e| {
                    BatchResult::failure(index, &AppError::Internal(format!("渲染任务失败: {e}")))
                })
        }));
    }

    // join_all 保持 spawn 顺序，即输入顺序
    let mut results = Vec::with_capacity(handles.len());
    for (index, joined) in join_all(handles).await.into_iter().enumerate() {
        results.push(joined.unwrap_or_else(|e| {
            BatchResult::failure(index, &AppError::Internal(format!("渲染任务失败: {e}")))
        }));
    }
    Ok(results)
}
