use qrcode::EcLevel;
use serde::{Deserialize, Serialize};

use crate::config::LimitsConfig;
use crate::error::AppError;
use crate::features::payload::EncodedPayload;

/// 纠错等级（QR 标准的 L/M/Q/H 四档）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, utoipa::ToSchema)]
pub enum CorrectionLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

impl CorrectionLevel {
    /// 映射到 qrcode crate 的纠错等级。
    pub fn to_ec_level(self) -> EcLevel {
        match self {
            CorrectionLevel::L => EcLevel::L,
            CorrectionLevel::M => EcLevel::M,
            CorrectionLevel::Q => EcLevel::Q,
            CorrectionLevel::H => EcLevel::H,
        }
    }

    /// 缓存键中的稳定标识。
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionLevel::L => "L",
            CorrectionLevel::M => "M",
            CorrectionLevel::Q => "Q",
            CorrectionLevel::H => "H",
        }
    }
}

/// 输出图片格式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG（默认，栅格输出，支持 Logo 合成）
    #[default]
    Png,
    /// SVG（矢量输出，不支持 Logo 合成）
    Svg,
}

impl OutputFormat {
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Svg => "image/svg+xml; charset=utf-8",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

/// 渲染选项
///
/// 所有字段带默认值，调用方可只提交关心的项。
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// 纠错等级（默认 M）
    pub error_correction_level: CorrectionLevel,
    /// 输出格式（默认 png）
    pub format: OutputFormat,
    /// 输出边长（像素，默认 256）
    #[schema(example = 256)]
    pub size: u32,
    /// 静区宽度（模块数，默认 1）
    #[schema(example = 1)]
    pub margin: u32,
    /// 前景色（默认 #000000）
    #[schema(example = "#000000")]
    pub foreground_color: String,
    /// 背景色（默认 #FFFFFF）
    #[schema(example = "#FFFFFF")]
    pub background_color: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            error_correction_level: CorrectionLevel::M,
            format: OutputFormat::Png,
            size: 256,
            margin: 1,
            foreground_color: "#000000".to_string(),
            background_color: "#FFFFFF".to_string(),
        }
    }
}

impl RenderOptions {
    /// 渲染缓存键。载荷与选项完全决定输出，键即二者的拼接。
    pub fn cache_key(&self, payload: &EncodedPayload) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.error_correction_level.as_str(),
            self.format.extension(),
            self.size,
            self.margin,
            self.foreground_color,
            self.background_color,
            payload.as_str()
        )
    }
}

/// 规范化后的编码请求：管线交给符号编码器的最终形态。
///
/// 每次调用新建，用完即弃，不含任何跨请求状态。
#[derive(Debug, Clone)]
pub struct EncodeRequest {
    /// 规范载荷字符串
    pub payload: EncodedPayload,
    /// 已填充默认值的渲染选项
    pub options: RenderOptions,
    /// 可选 Logo 原始字节（仅 PNG 输出）
    pub logo: Option<Vec<u8>>,
}

/// 构建编码请求：合并载荷与选项，并在入口处执行资源约束。
///
/// - 空白载荷 → `EmptyPayload`
/// - `size == 0` → `InvalidOptions`
/// - SVG 输出携带 Logo → `LogoUnsupported`（矢量路径未定义 Logo 合成）
/// - Logo 超过配置上限 → `LogoTooLarge`
pub fn build_encode_request(
    payload: EncodedPayload,
    options: RenderOptions,
    logo: Option<Vec<u8>>,
    limits: &LimitsConfig,
) -> Result<EncodeRequest, AppError> {
    if payload.is_blank() {
        return Err(AppError::EmptyPayload);
    }
    if options.size == 0 {
        return Err(AppError::InvalidOptions("size 必须为正整数".to_string()));
    }
    if let Some(logo) = &logo {
        if options.format == OutputFormat::Svg {
            return Err(AppError::LogoUnsupported);
        }
        if logo.len() > limits.max_logo_bytes {
            return Err(AppError::LogoTooLarge {
                size: logo.len(),
                limit: limits.max_logo_bytes,
            });
        }
    }
    Ok(EncodeRequest {
        payload,
        options,
        logo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.error_correction_level, CorrectionLevel::M);
        assert_eq!(opts.format, OutputFormat::Png);
        assert_eq!(opts.size, 256);
        assert_eq!(opts.margin, 1);
        assert_eq!(opts.foreground_color, "#000000");
        assert_eq!(opts.background_color, "#FFFFFF");
    }

    #[test]
    fn options_accept_partial_override() {
        let opts: RenderOptions =
            serde_json::from_str(r#"{"errorCorrectionLevel":"H","format":"svg","size":512}"#)
                .unwrap();
        assert_eq!(opts.error_correction_level, CorrectionLevel::H);
        assert_eq!(opts.format, OutputFormat::Svg);
        assert_eq!(opts.size, 512);
        assert_eq!(opts.margin, 1);
    }

    #[test]
    fn builder_rejects_blank_payload() {
        let err = build_encode_request(
            EncodedPayload::new("   "),
            RenderOptions::default(),
            None,
            &limits(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::EmptyPayload));
    }

    #[test]
    fn builder_rejects_zero_size() {
        let opts = RenderOptions {
            size: 0,
            ..RenderOptions::default()
        };
        let err = build_encode_request(EncodedPayload::new("x"), opts, None, &limits())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOptions(_)));
    }

    #[test]
    fn builder_rejects_logo_for_svg_output() {
        let opts = RenderOptions {
            format: OutputFormat::Svg,
            ..RenderOptions::default()
        };
        let err =
            build_encode_request(EncodedPayload::new("x"), opts, Some(vec![0u8; 8]), &limits())
                .unwrap_err();
        assert!(matches!(err, AppError::LogoUnsupported));
    }

    #[test]
    fn builder_rejects_oversized_logo() {
        let limits = LimitsConfig {
            max_logo_bytes: 16,
            ..LimitsConfig::default()
        };
        let err = build_encode_request(
            EncodedPayload::new("x"),
            RenderOptions::default(),
            Some(vec![0u8; 17]),
            &limits,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            AppError::LogoTooLarge { size: 17, limit: 16 }
        ));
    }

    #[test]
    fn cache_key_is_deterministic_and_distinguishes_options() {
        let payload = EncodedPayload::new("tel:+123");
        let a = RenderOptions::default().cache_key(&payload);
        let b = RenderOptions::default().cache_key(&payload);
        assert_eq!(a, b);

        let other = RenderOptions {
            size: 512,
            ..RenderOptions::default()
        };
        assert_ne!(a, other.cache_key(&payload));
    }
}
