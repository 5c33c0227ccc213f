use image::imageops::FilterType;
use image::{GenericImageView, RgbaImage, imageops};

use crate::error::AppError;

/// Logo 占二维码边长的比例分母（1/5，即 20%）。
///
/// M 级以上纠错足以承受中心 20% 的遮挡，比例再大会影响可扫性。
const LOGO_RATIO_DIVISOR: u32 = 5;

/// 将 Logo 居中合成到二维码栅格上。
///
/// - 目标边长为 `side / 5`（floor(side*0.2)）
/// - 等比缩小放入目标正方形，永不放大
/// - 按实际缩放后的宽高逐轴居中，alpha 混合叠加
///
/// 输入图不被修改，总是返回新的栅格。
pub fn compose_logo(
    qr: &RgbaImage,
    logo_bytes: &[u8],
    side: u32,
) -> Result<RgbaImage, AppError> {
    let logo = image::load_from_memory(logo_bytes)
        .map_err(|e| AppError::InvalidLogo(e.to_string()))?;

    let target = (side / LOGO_RATIO_DIVISOR).max(1);
    let (w, h) = logo.dimensions();

    // resize 保持纵横比缩放进 target×target；原图已足够小时不放大
    let resized = if w > target || h > target {
        logo.resize(target, target, FilterType::Lanczos3).to_rgba8()
    } else {
        logo.to_rgba8()
    };

    let (rw, rh) = resized.dimensions();
    let left = side.saturating_sub(rw) / 2;
    let top = side.saturating_sub(rh) / 2;

    let mut composed = qr.clone();
    imageops::overlay(&mut composed, &resized, i64::from(left), i64::from(top));
    Ok(composed)
}
