use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::types::{EncodedPayload, PayloadFields, PayloadType, ValidationPolicy};

/// 与 JS `encodeURIComponent` 对齐的保留集：
/// 字母数字与 `- _ . ! ~ * ' ( )` 不转义，其余字节全部百分号编码。
/// 前端历史上用 encodeURIComponent 生成同样的载荷，保持一致可避免同一输入
/// 在不同入口产出不同字符串。
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// 将已通过校验的字段集格式化为规范载荷字符串。
///
/// 对同一输入严格确定，策略仅影响 URL 类型（宽松策略补全缺失的协议前缀）。
pub fn format(
    ty: PayloadType,
    fields: &PayloadFields,
    policy: ValidationPolicy,
) -> EncodedPayload {
    let payload = match ty {
        PayloadType::Url => {
            let url = fields.url.as_deref().unwrap_or_default();
            if policy == ValidationPolicy::Lenient
                && !url.starts_with("http://")
                && !url.starts_with("https://")
            {
                format!("https://{url}")
            } else {
                url.to_string()
            }
        }
        PayloadType::Text => fields.text.clone().unwrap_or_default(),
        PayloadType::Email => {
            let email = fields.email.as_deref().unwrap_or_default();
            let mut payload = format!("mailto:{email}");
            let mut has_query = false;
            if let Some(subject) = fields.subject.as_deref()
                && !subject.is_empty()
            {
                payload.push_str(&format!("?subject={}", encode_component(subject)));
                has_query = true;
            }
            if let Some(body) = fields.body.as_deref()
                && !body.is_empty()
            {
                let sep = if has_query { '&' } else { '?' };
                payload.push_str(&format!("{sep}body={}", encode_component(body)));
            }
            payload
        }
        PayloadType::Phone => {
            format!("tel:{}", fields.phone.as_deref().unwrap_or_default())
        }
        PayloadType::Sms => {
            let mut payload = format!("sms:{}", fields.phone.as_deref().unwrap_or_default());
            if let Some(message) = fields.message.as_deref()
                && !message.is_empty()
            {
                payload.push_str(&format!("?body={}", encode_component(message)));
            }
            payload
        }
        PayloadType::Wifi => {
            let security = fields.security.as_deref().unwrap_or("WPA");
            let ssid = fields.ssid.as_deref().unwrap_or_default();
            let password = fields.password.as_deref().unwrap_or_default();
            let hidden = if fields.hidden.unwrap_or(false) {
                "true"
            } else {
                "false"
            };
            // 结尾的双分号是 WIFI 二维码约定的一部分，不能省略。
            format!("WIFI:T:{security};S:{ssid};P:{password};H:{hidden};;")
        }
        PayloadType::Vcard => format_vcard(fields),
        PayloadType::Whatsapp => {
            let phone = fields.phone.as_deref().unwrap_or_default();
            let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
            let mut payload = format!("https://wa.me/{digits}");
            if let Some(message) = fields.message.as_deref()
                && !message.is_empty()
            {
                payload.push_str(&format!("?text={}", encode_component(message)));
            }
            payload
        }
    };
    EncodedPayload::new(payload)
}

/// vCard 3.0 文本，行序固定：FN/N 之后按 ORG/TITLE/TEL/EMAIL/URL/ADR 顺序追加可选行。
///
/// 仅提供姓或名之一时，FN 行保留历史上的拼接空格（如 `FN:Jane `）。
/// 线上客户端已依赖该字节序列做缓存比对，这里不做"修复"。
fn format_vcard(fields: &PayloadFields) -> String {
    let first = fields.first_name.as_deref().unwrap_or_default();
    let last = fields.last_name.as_deref().unwrap_or_default();

    let mut vcard = String::from("BEGIN:VCARD\nVERSION:3.0\n");
    vcard.push_str(&format!("FN:{first} {last}\n"));
    vcard.push_str(&format!("N:{last};{first};;;\n"));
    if let Some(org) = fields.organization.as_deref()
        && !org.is_empty()
    {
        vcard.push_str(&format!("ORG:{org}\n"));
    }
    if let Some(title) = fields.title.as_deref()
        && !title.is_empty()
    {
        vcard.push_str(&format!("TITLE:{title}\n"));
    }
    if let Some(phone) = fields.phone.as_deref()
        && !phone.is_empty()
    {
        vcard.push_str(&format!("TEL:{phone}\n"));
    }
    if let Some(email) = fields.email.as_deref()
        && !email.is_empty()
    {
        vcard.push_str(&format!("EMAIL:{email}\n"));
    }
    if let Some(url) = fields.url.as_deref()
        && !url.is_empty()
    {
        vcard.push_str(&format!("URL:{url}\n"));
    }
    if let Some(address) = fields.address.as_deref()
        && !address.is_empty()
    {
        vcard.push_str(&format!("ADR:;;{address};;;;\n"));
    }
    vcard.push_str("END:VCARD");
    vcard
}
