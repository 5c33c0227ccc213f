use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage, imageops};
use qrcode::{Color, QrCode};

use crate::error::AppError;
use crate::features::payload::EncodedPayload;

use super::types::RenderOptions;

/// 解析 `#RGB` / `#RRGGBB` 颜色字符串。
///
/// 两条输出路径共用同一解析，保证非法颜色在进入编码器前被拒绝，
/// 也避免把未经检查的字符串直接写进 SVG 属性。
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, AppError> {
    let digits = value
        .strip_prefix('#')
        .ok_or_else(|| AppError::InvalidOptions(format!("无法解析颜色: {value}")))?;

    let parse =
        |s: &str| u8::from_str_radix(s, 16).map_err(|_| {
            AppError::InvalidOptions(format!("无法解析颜色: {value}"))
        });

    let (r, g, b) = match digits.len() {
        3 => {
            let mut chars = digits.chars();
            let mut next = || {
                let c = chars.next().unwrap_or_default();
                parse(&format!("{c}{c}"))
            };
            (next()?, next()?, next()?)
        }
        6 => (
            parse(&digits[0..2])?,
            parse(&digits[2..4])?,
            parse(&digits[4..6])?,
        ),
        _ => {
            return Err(AppError::InvalidOptions(format!("无法解析颜色: {value}")));
        }
    };
    Ok(Rgba([r, g, b, 255]))
}

fn normalized_hex(color: Rgba<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}

/// 构造 QR 符号矩阵（外部编码能力的唯一入口）。
fn build_symbol(payload: &EncodedPayload, options: &RenderOptions) -> Result<QrCode, AppError> {
    Ok(QrCode::with_error_correction_level(
        payload.as_str(),
        options.error_correction_level.to_ec_level(),
    )?)
}

/// 渲染 RGBA 栅格图。
///
/// 先以整数倍模块尺寸铺出符号（margin 个静区模块以背景色填充），
/// 再用最近邻缩放到精确的 size×size，保持模块边缘锐利可扫。
pub fn render_raster(
    payload: &EncodedPayload,
    options: &RenderOptions,
) -> Result<RgbaImage, AppError> {
    let fg = parse_hex_color(&options.foreground_color)?;
    let bg = parse_hex_color(&options.background_color)?;

    let code = build_symbol(payload, options)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let total = modules + 2 * options.margin;
    let scale = (options.size / total).max(1);
    let base_side = total * scale;

    let mut img = RgbaImage::from_pixel(base_side, base_side, bg);
    for y in 0..modules {
        for x in 0..modules {
            if colors[(y * modules + x) as usize] != Color::Dark {
                continue;
            }
            let px = (options.margin + x) * scale;
            let py = (options.margin + y) * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(px + dx, py + dy, fg);
                }
            }
        }
    }

    if base_side != options.size {
        img = imageops::resize(&img, options.size, options.size, FilterType::Nearest);
    }
    Ok(img)
}

/// 渲染 SVG 字符串：单条 path 描出全部暗模块，viewBox 以模块为单位。
pub fn render_svg(payload: &EncodedPayload, options: &RenderOptions) -> Result<String, AppError> {
    let fg = normalized_hex(parse_hex_color(&options.foreground_color)?);
    let bg = normalized_hex(parse_hex_color(&options.background_color)?);

    let code = build_symbol(payload, options)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();

    let margin = options.margin;
    let dimension = modules + 2 * margin;
    let size = options.size;

    let mut path = String::new();
    for y in 0..modules {
        for x in 0..modules {
            if colors[(y * modules + x) as usize] == Color::Dark {
                path.push_str(&format!("M{},{}h1v1h-1z", x + margin, y + margin));
            }
        }
    }

    Ok(format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" ",
            "width=\"{size}\" height=\"{size}\" viewBox=\"0 0 {dim} {dim}\" stroke=\"none\">\n",
            "<rect width=\"100%\" height=\"100%\" fill=\"{bg}\"/>\n",
            "<path d=\"{path}\" fill=\"{fg}\"/>\n",
            "</svg>\n"
        ),
        size = size,
        dim = dimension,
        bg = bg,
        path = path,
        fg = fg,
    ))
}

/// RGBA 栅格编码为 PNG 字节。
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, AppError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| AppError::Encoding(format!("PNG 编码失败: {e}")))?;
    Ok(out)
}
